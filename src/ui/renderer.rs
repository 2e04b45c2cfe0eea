/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// ## Pixel ↔ terminal mapping
/// One board cell is `CELL_W` terminal columns by one terminal row, so a
/// terminal column spans `cell_size / CELL_W` pixels and a terminal row spans
/// `cell_size` pixels. Pixel `(0, 0)` sits at the top-left of `MAP_ROW`.
/// Details and the character are drawn from their *visual* pixel positions,
/// which is what makes glides visible.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use tracing::debug;

use crate::domain::cell::CellStatus;
use crate::domain::detail::{Detail, Facing};
use crate::domain::movement::SKY_ROW;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, also used
    /// for `Clear`, so inter-row gaps match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 4],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel that differs from any real cell; forces a full repaint.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// One board cell: `CELL_W` columns with the same glyph and colours.
    fn put_block(&mut self, col: usize, row: usize, ch: char, fg: Color, bg: Color) {
        for dx in 0..CELL_W {
            self.set(col + dx, row, Cell::from_char(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, row: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, row, Cell::from_char(' ', Color::White, bg));
        }
    }
}

// ── Coordinate mapping ──

/// Terminal columns per board cell.
pub const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Pixel point at the centre of terminal cell `(col, row)`.
pub fn terminal_to_pixel(col: u16, row: u16, cell_size: f32) -> (f32, f32) {
    let col_px = cell_size / CELL_W as f32;
    (
        (col as f32 + 0.5) * col_px,
        (row as f32 - MAP_ROW as f32 + 0.5) * cell_size,
    )
}

/// Terminal cell holding pixel `(x, y)`, rounded to the nearest column/row.
/// `None` when the point lies above or left of the screen.
fn pixel_to_terminal(x: f32, y: f32, cell_size: f32) -> Option<(usize, usize)> {
    let col = (x / (cell_size / CELL_W as f32)).round();
    let row = (y / cell_size).round() + MAP_ROW as f32;
    if col < 0.0 || row < 0.0 {
        return None;
    }
    Some((col as usize, row as usize))
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const EMPTY_BG: Color = Color::Rgb { r: 45, g: 48, b: 70 };
const SKY_BG: Color = Color::Rgb { r: 30, g: 36, b: 62 };
const TRAIL_BG: Color = Color::Rgb { r: 60, g: 52, b: 80 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };

const DETAIL_COLORS: [Color; 6] = [
    Color::Rgb { r: 230, g: 90, b: 80 },
    Color::Rgb { r: 80, g: 170, b: 240 },
    Color::Rgb { r: 120, g: 210, b: 110 },
    Color::Rgb { r: 240, g: 180, b: 60 },
    Color::Rgb { r: 190, g: 120, b: 230 },
    Color::Rgb { r: 70, g: 210, b: 200 },
];

fn detail_color(d: &Detail) -> Color {
    DETAIL_COLORS[d.id.0 % DETAIL_COLORS.len()]
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    last_level: usize,
    /// Release events are trustworthy (keyboard enhancement accepted).
    pub keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            last_level: 0,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            self.keyboard_enhanced = execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();
        }
        debug!(keyboard_enhanced = self.keyboard_enhanced, "terminal initialised");

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            DisableMouseCapture,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase or level change → clear for a clean transition
        if self.last_phase != Some(world.phase) || self.last_level != world.current_level {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
            self.last_level = world.current_level;
        }

        self.front.clear();

        match world.phase {
            Phase::Playing => self.compose_game(world),
            Phase::LevelComplete => {
                self.compose_game(world);
                self.compose_level_complete(world);
            }
            Phase::GameComplete => self.compose_game_complete(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        // ── HUD row ──
        self.front.fill_row(HUD_ROW, HUD_BG);
        let hud = format!(
            " Level {}/{}  {:<16}  Placed {}/{} ",
            w.current_level + 1,
            w.total_levels,
            w.level_name,
            w.placed_count(),
            w.details.len(),
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        self.compose_board(w);

        // Details bottom-to-top so the last in draw_order wins overlaps
        for &id in &w.draw_order {
            if let Some(d) = w.detail(id) {
                self.compose_detail(w, d);
            }
        }

        self.compose_player(w);

        // ── Message bar ──
        let msg_row = self.front.height.saturating_sub(3);
        if !w.message.is_empty() && msg_row > MAP_ROW {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }

        // ── Help bar ──
        let help_row = self.front.height.saturating_sub(1);
        if help_row > MAP_ROW {
            let help = " Drag:place  DblClick:take back  RClick/R:rotate  ←→/AD:walk  F2:restart  Esc:quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_board(&mut self, w: &WorldState) {
        let cell = w.frame.cell_size;

        // Sky row: walkable strip above the board, never part of the grid.
        if let Some((col, row)) = pixel_to_terminal(w.frame.origin_x, w.frame.origin_y + SKY_ROW as f32 * cell, cell) {
            for x in 0..w.frame.cols {
                self.front.put_block(col + x * CELL_W, row, ' ', Color::White, SKY_BG);
            }
        }

        for (y, cells) in w.board.rows().iter().enumerate() {
            for (x, status) in cells.iter().enumerate() {
                let px = w.frame.origin_x + x as f32 * cell;
                let py = w.frame.origin_y + y as f32 * cell;
                let Some((col, row)) = pixel_to_terminal(px, py, cell) else { continue };
                match status {
                    None => {}
                    Some(CellStatus::Empty) => self.front.put_block(col, row, '·', Color::DarkGrey, EMPTY_BG),
                    Some(CellStatus::Filled) => self.front.put_block(col, row, ' ', Color::White, EMPTY_BG),
                    Some(CellStatus::Player) => self.front.put_block(col, row, '░', Color::Grey, TRAIL_BG),
                }
            }
        }
    }

    fn compose_detail(&mut self, w: &WorldState, d: &Detail) {
        let cell = w.frame.cell_size;
        let (bw, bh) = w.frame.shape_size(&d.shape);
        let left = d.x - bw / 2.0;
        let top = d.y - bh / 2.0;

        let base = detail_color(d);
        let (ch, fg) = if d.is_dragged {
            ('▓', Color::White)
        } else if d.is_placed() {
            ('█', base)
        } else {
            ('▒', base)
        };

        for (sx, sy) in d.shape.occupied() {
            let px = left + sx as f32 * cell;
            let py = top + sy as f32 * cell;
            if let Some((col, row)) = pixel_to_terminal(px, py, cell) {
                self.front.put_block(col, row, ch, fg, base);
            }
        }
    }

    fn compose_player(&mut self, w: &WorldState) {
        let Some(p) = &w.player else { return };
        let Some((col, row)) = pixel_to_terminal(p.visual_x, p.visual_y, w.frame.cell_size) else { return };
        let ch = match p.facing {
            Facing::Left => '🚶',
            Facing::Right => '🏃',
        };
        self.front.set(col, row, Cell::from_char_wide(ch, Color::Reset, Color::Reset));
        self.front.set(col + 1, row, Cell::WIDE_CONT);
    }

    fn compose_level_complete(&mut self, w: &WorldState) {
        let last = w.current_level + 1 >= w.total_levels;
        let next = if last { "ENTER: finish" } else { "ENTER: next level" };
        let lines = [
            "╔════════════════════════════╗".to_string(),
            "║      BOARD COMPLETE!       ║".to_string(),
            format!("║  {:<26}║", next),
            "╚════════════════════════════╝".to_string(),
        ];
        let box_w = 30;
        let x = self.front.width.saturating_sub(box_w) / 2;
        let y = MAP_ROW + self.front.height.saturating_sub(MAP_ROW + lines.len()) / 2;
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(x, y + i, l, GOLD, HUD_BG);
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        let box_art = [
            "╔════════════════════════════════════╗",
            "║   ★ EVERY BOARD FILLED. WELL DONE ★ ║",
            "╚════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let levels = format!("◈ All {} levels cleared!", w.total_levels);
        self.front.put_str(6, 9, &levels, GREEN, Color::Reset);
        self.front.put_str(6, 11, "▸ ENTER: Play again   ESC: Quit", GREEN, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_cell_maps_to_its_pixel_centre() {
        // 60px cells → 30px per column, 60px per row; MAP_ROW is pixel y 0
        assert_eq!(terminal_to_pixel(0, MAP_ROW as u16, 60.0), (15.0, 30.0));
        assert_eq!(terminal_to_pixel(4, 4, 60.0), (135.0, 150.0));
    }

    #[test]
    fn rows_above_the_map_give_negative_pixels() {
        let (_, y) = terminal_to_pixel(0, 0, 60.0);
        assert!(y < 0.0);
    }

    #[test]
    fn cell_origin_lands_on_its_block() {
        // Board cell (0, 0) at MARGIN = 2 cells: pixel (120, 120) → col 4, row 4
        assert_eq!(pixel_to_terminal(120.0, 120.0, 60.0), Some((4, 4)));
        // Sky row one cell higher
        assert_eq!(pixel_to_terminal(120.0, 60.0, 60.0), Some((4, 3)));
        assert_eq!(pixel_to_terminal(-40.0, 0.0, 60.0), None);
    }

    #[test]
    fn click_inside_a_cell_hits_that_cell() {
        // Both columns of the block for cell (0, 0) map back into its pixel square
        for col in [4u16, 5] {
            let (x, y) = terminal_to_pixel(col, 4, 60.0);
            assert!((120.0..180.0).contains(&x));
            assert!((120.0..180.0).contains(&y));
        }
    }

    #[test]
    fn wide_cell_round_trips_its_glyph() {
        let c = Cell::from_char_wide('🏃', Color::Reset, Color::Reset);
        assert_eq!(c.as_str(), "🏃");
        assert!(c.wide);
        assert_eq!(c.bg, Cell::BASE_BG);
    }
}
