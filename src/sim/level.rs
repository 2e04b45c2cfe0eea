/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   ```text
///   # Level Name
///   @ 0,-1            optional player spawn (x,y), y may be -1
///   ####              board mask
///   ##..
///
///   ##                piece 1
///   #.
///
///   ###               piece 2
///   ```
///
/// The board comes first, then one block per piece. Blocks are separated
/// by blank lines.
///
/// ## Glyphs:
///   board:  '#' = occupiable cell    '.' = void
///   piece:  '#' = occupied sub-cell  '.' = empty slot
///
/// ## Layout
///
/// The board sits `MARGIN` cells from the pixel origin. Pieces rest in a
/// tray to its right, stacked top-down in columns; their tray positions are
/// the rest positions they glide back to.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::board::Board;
use crate::domain::cell::CellStatus;
use crate::domain::detail::{CellAddr, Player, Shape};
use crate::domain::geometry::BoardFrame;
use crate::domain::movement::SKY_ROW;
use super::world::{Phase, WorldState};

/// Board offset from the pixel origin, in cells (leaves room for the sky row).
pub const MARGIN: usize = 2;
/// Gap between the board and the tray, and between stacked pieces, in cells.
const TRAY_GAP: usize = 2;
/// Minimum tray column height in cells before wrapping to a new column.
const TRAY_MIN_ROWS: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no board")]
    MissingBoard,
    #[error("board row {row} has a different width")]
    RaggedBoard { row: usize },
    #[error("board has no occupiable cell")]
    EmptyBoard,
    #[error("piece {index} has no occupied cell")]
    EmptyPiece { index: usize },
    #[error("piece {index} row {row} has a different width")]
    RaggedPiece { index: usize, row: usize },
    #[error("unexpected '{ch}' on line {line}")]
    UnknownGlyph { line: usize, ch: char },
    #[error("bad spawn line: {0}")]
    BadSpawn(String),
    #[error("spawn ({x}, {y}) is not an open board cell")]
    SpawnOutside { x: i32, y: i32 },
}

/// Runtime level data (owned, loaded from file or embedded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub spawn: Option<CellAddr>,
    pub mask: Vec<Vec<u8>>,
    pub pieces: Vec<Vec<Vec<u8>>>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Every playable level: `levels_dir` if it holds any valid `.txt` file,
/// otherwise the built-in set.
pub fn available_levels(levels_dir: &Path) -> Vec<LevelDef> {
    let from_dir = load_from_directory(levels_dir);
    if !from_dir.is_empty() {
        info!(count = from_dir.len(), dir = %levels_dir.display(), "levels loaded from directory");
        return from_dir;
    }
    embedded_levels()
}

/// Load a level into the world state. Past the last level the session
/// moves to `GameComplete`.
pub fn load_level(world: &mut WorldState, levels: &[LevelDef], level_idx: usize, cell_size: f32) {
    world.total_levels = levels.len();
    let Some(def) = levels.get(level_idx) else {
        world.phase = Phase::GameComplete;
        info!(levels = levels.len(), "all levels complete");
        return;
    };

    let mut board = Board::from_mask(&def.mask);
    let margin = MARGIN as f32 * cell_size;
    let frame = BoardFrame::new(margin, margin, board.width(), board.height(), cell_size);

    if let Some(spawn) = def.spawn {
        if spawn.y != SKY_ROW {
            if let Err(e) = board.set(spawn.x, spawn.y, CellStatus::Player) {
                warn!(%e, "spawn cell rejected");
            }
        }
    }

    world.reset_level_state(board, frame);
    world.current_level = level_idx;
    world.level_name = def.name.clone();

    for (shape, (x, y)) in tray_layout(def, &frame) {
        world.add_detail(shape, x, y);
    }

    world.player = def.spawn.map(|spawn| {
        let (vx, vy) = frame.cell_origin(spawn);
        Player::new(spawn, vx, vy)
    });

    info!(
        level = level_idx,
        name = %def.name,
        width = frame.cols,
        height = frame.rows,
        pieces = def.pieces.len(),
        piece_cells = world.details.iter().map(|d| d.shape.cell_count()).sum::<usize>(),
        "level loaded"
    );
}

/// Reload the current level from its definition.
pub fn restart_level(world: &mut WorldState, levels: &[LevelDef], cell_size: f32) {
    let idx = world.current_level;
    load_level(world, levels, idx, cell_size);
}

/// Rest-position centres for every piece, in definition order.
pub fn tray_layout(def: &LevelDef, frame: &BoardFrame) -> Vec<(Shape, (f32, f32))> {
    let cell = frame.cell_size;
    let column_rows = frame.rows.max(TRAY_MIN_ROWS);
    let mut col_x = MARGIN + frame.cols + TRAY_GAP;
    let mut row_y = MARGIN;
    let mut col_width = 0;
    let mut out = Vec::with_capacity(def.pieces.len());

    for matrix in &def.pieces {
        let shape = Shape::from_matrix(matrix);
        let (w, h) = (shape.cols(), shape.rows());
        if row_y > MARGIN && row_y + h > MARGIN + column_rows {
            col_x += col_width + TRAY_GAP;
            row_y = MARGIN;
            col_width = 0;
        }
        let cx = (col_x as f32 + w as f32 / 2.0) * cell;
        let cy = (row_y as f32 + h as f32 / 2.0) * cell;
        out.push((shape, (cx, cy)));
        row_y += h + 1;
        col_width = col_width.max(w);
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level(content: &str) -> Result<LevelDef, LevelError> {
    let mut name = String::new();
    let mut spawn_text: Option<&str> = None;
    let mut blocks: Vec<Vec<(usize, &str)>> = vec![];
    let mut current: Vec<(usize, &str)> = vec![];

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_end();
        let line_no = idx + 1;
        if line.starts_with('#') && name.is_empty() && blocks.is_empty() && current.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else if let Some(rest) = line.strip_prefix('@') {
            spawn_text = Some(rest.trim());
        } else if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push((line_no, line));
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    let mut blocks = blocks.into_iter();
    let board_block = blocks.next().ok_or(LevelError::MissingBoard)?;
    let mask = parse_grid(&board_block)
        .map_err(|e| match e {
            GridError::Ragged(row) => LevelError::RaggedBoard { row },
            GridError::Glyph(line, ch) => LevelError::UnknownGlyph { line, ch },
        })?;
    if !mask.iter().flatten().any(|&m| m != 0) {
        return Err(LevelError::EmptyBoard);
    }

    let mut pieces = vec![];
    for (index, block) in blocks.enumerate() {
        let matrix = parse_grid(&block).map_err(|e| match e {
            GridError::Ragged(row) => LevelError::RaggedPiece { index, row },
            GridError::Glyph(line, ch) => LevelError::UnknownGlyph { line, ch },
        })?;
        if !matrix.iter().flatten().any(|&m| m != 0) {
            return Err(LevelError::EmptyPiece { index });
        }
        pieces.push(matrix);
    }

    let spawn = spawn_text.map(parse_spawn).transpose()?;
    if let Some(s) = spawn {
        let width = mask[0].len() as i32;
        let open_cell = s.y >= 0
            && (s.y as usize) < mask.len()
            && s.x >= 0
            && s.x < width
            && mask[s.y as usize][s.x as usize] != 0;
        let on_sky = s.y == SKY_ROW && s.x >= 0 && s.x < width;
        if !(open_cell || on_sky) {
            return Err(LevelError::SpawnOutside { x: s.x, y: s.y });
        }
    }

    if name.is_empty() {
        name = "Untitled".to_string();
    }

    Ok(LevelDef { name, spawn, mask, pieces })
}

enum GridError {
    Ragged(usize),
    Glyph(usize, char),
}

/// `#`/`.` rows → 0/1 matrix. All rows must share one width.
fn parse_grid(lines: &[(usize, &str)]) -> Result<Vec<Vec<u8>>, GridError> {
    let width = lines.first().map_or(0, |(_, l)| l.chars().count());
    let mut out = Vec::with_capacity(lines.len());
    for (row, &(line_no, line)) in lines.iter().enumerate() {
        if line.chars().count() != width {
            return Err(GridError::Ragged(row));
        }
        let cells = line
            .chars()
            .map(|ch| match ch {
                '#' => Ok(1),
                '.' => Ok(0),
                other => Err(GridError::Glyph(line_no, other)),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        out.push(cells);
    }
    Ok(out)
}

fn parse_spawn(text: &str) -> Result<CellAddr, LevelError> {
    let bad = || LevelError::BadSpawn(text.to_string());
    let (x, y) = text.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse::<i32>().map_err(|_| bad())?;
    let y = y.trim().parse::<i32>().map_err(|_| bad())?;
    Ok(CellAddr::new(x, y))
}

/// Distinguish `# Level Name` from `####` (board data).
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic())
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "txt"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), %e, "could not read level");
                continue;
            }
        };
        match parse_level(&content) {
            Ok(def) => results.push(def),
            Err(e) => warn!(path = %path.display(), %e, "skipping level"),
        }
    }
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
    "# First Fit
##
##

##

##
",
    "# Corner Shop
###
###
##.

#.
##

##
.#

##
",
    "# The Climb
@ 0,-1
####
####
####

#...
####

####

###
",
    "# Notch
.##.
####
####

#..#
####

##
##
",
    "# Long Haul
@ 0,-1
#####
#####
#####
#####

##
##

###
#..

#..
###

##
##

##

##
",
];

fn embedded_levels() -> Vec<LevelDef> {
    EMBEDDED
        .iter()
        .filter_map(|text| match parse_level(text) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!(%e, "built-in level rejected");
                None
            }
        })
        .collect()
}
