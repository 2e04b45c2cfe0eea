/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `warnings` and logged once the
/// subscriber is up (stdout belongs to the renderer).

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub placement: PlacementConfig,
    pub movement: MovementConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct BoardConfig {
    pub cell_size: f32,          // pixels per grid unit, shared by both engines
}

#[derive(Clone, Debug)]
pub struct PlacementConfig {
    pub double_click_ms: u64,
    pub reset_rotation_on_return: bool,
    pub rotatable: bool,
    pub glide_px_per_ms: f32,    // tween speed: duration = distance / speed
}

#[derive(Clone, Debug)]
pub struct MovementConfig {
    pub debounce_ms: u64,
    pub clear_vacated_cell: bool,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub rotate: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    placement: TomlPlacement,
    #[serde(default)]
    movement: TomlMovement,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_cell_size")]
    cell_size: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlacement {
    #[serde(default = "default_double_click")]
    double_click_ms: u64,
    #[serde(default = "default_true")]
    reset_rotation_on_return: bool,
    #[serde(default = "default_true")]
    rotatable: bool,
    #[serde(default = "default_glide_speed")]
    glide_px_per_ms: f32,
}

#[derive(Deserialize, Debug)]
struct TomlMovement {
    #[serde(default = "default_debounce")]
    debounce_ms: u64,
    #[serde(default)]
    clear_vacated_cell: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_rotate")]
    rotate: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_cell_size() -> f32 { 60.0 }
fn default_double_click() -> u64 { 300 }
fn default_true() -> bool { true }
fn default_glide_speed() -> f32 { 2.5 }
fn default_debounce() -> u64 { 250 }

fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_rotate() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "blockstep.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard { cell_size: default_cell_size() }
    }
}

impl Default for TomlPlacement {
    fn default() -> Self {
        TomlPlacement {
            double_click_ms: default_double_click(),
            reset_rotation_on_return: true,
            rotatable: true,
            glide_px_per_ms: default_glide_speed(),
        }
    }
}

impl Default for TomlMovement {
    fn default() -> Self {
        TomlMovement {
            debounce_ms: default_debounce(),
            clear_vacated_cell: false,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            rotate: default_rotate(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), &[PathBuf::from(".")])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        GameConfig::load_from(&candidate_dirs())
    }

    /// Load from the first `config.toml` found in `search_dirs`.
    /// Lookup warnings come first, then value warnings.
    fn load_from(search_dirs: &[PathBuf]) -> Self {
        let mut warnings = vec![];
        let toml_cfg = load_toml(search_dirs, &mut warnings);
        let mut cfg = GameConfig::from_schema(toml_cfg, search_dirs);
        warnings.append(&mut cfg.warnings);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse a config document directly (no file lookup).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let parsed = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_schema(parsed, &[PathBuf::from(".")]))
    }

    fn from_schema(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let mut warnings = vec![];

        let mut cell_size = toml_cfg.board.cell_size;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            warnings.push(format!("board.cell_size {cell_size} is invalid; using default"));
            cell_size = default_cell_size();
        }
        let mut glide = toml_cfg.placement.glide_px_per_ms;
        if !(glide.is_finite() && glide > 0.0) {
            warnings.push(format!("placement.glide_px_per_ms {glide} is invalid; using default"));
            glide = default_glide_speed();
        }

        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let log_file = if toml_cfg.general.log_file.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(&toml_cfg.general.log_file))
        };

        GameConfig {
            board: BoardConfig { cell_size },
            placement: PlacementConfig {
                double_click_ms: toml_cfg.placement.double_click_ms,
                reset_rotation_on_return: toml_cfg.placement.reset_rotation_on_return,
                rotatable: toml_cfg.placement.rotatable,
                glide_px_per_ms: glide,
            },
            movement: MovementConfig {
                debounce_ms: toml_cfg.movement.debounce_ms,
                clear_vacated_cell: toml_cfg.movement.clear_vacated_cell,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
                rotate: toml_cfg.gamepad.rotate,
            },
            levels_dir,
            log_file,
            log_level: toml_cfg.general.log_level,
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/blockstep)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/blockstep");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/blockstep)
    let sys = PathBuf::from("/usr/share/blockstep");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("config.toml parse error: {e}; using default settings"));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.board.cell_size, 60.0);
        assert_eq!(cfg.placement.double_click_ms, 300);
        assert!(cfg.placement.reset_rotation_on_return);
        assert!(cfg.placement.rotatable);
        assert_eq!(cfg.placement.glide_px_per_ms, 2.5);
        assert_eq!(cfg.movement.debounce_ms, 250);
        assert!(!cfg.movement.clear_vacated_cell);
        assert_eq!(cfg.log_file, Some(PathBuf::from("blockstep.log")));
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[movement]\nclear_vacated_cell = true\n[board]\ncell_size = 32.0\n",
        ).unwrap();
        assert!(cfg.movement.clear_vacated_cell);
        assert_eq!(cfg.movement.debounce_ms, 250);
        assert_eq!(cfg.board.cell_size, 32.0);
    }

    #[test]
    fn invalid_cell_size_falls_back() {
        let cfg = GameConfig::from_toml_str("[board]\ncell_size = -4.0\n").unwrap();
        assert_eq!(cfg.board.cell_size, 60.0);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn empty_log_file_disables_logging() {
        let cfg = GameConfig::from_toml_str("[general]\nlog_file = \"\"\n").unwrap();
        assert_eq!(cfg.log_file, None);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(GameConfig::from_toml_str("[board\ncell_size = 1").is_err());
    }

    /// Fresh directory under the system temp dir holding `config.toml`.
    fn dir_with_config(name: &str, text: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blockstep-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.toml"), text).unwrap();
        dir
    }

    #[test]
    fn load_keeps_value_warnings() {
        let dir = dir_with_config("bad-values", "[board]\ncell_size = -4.0\n");
        let cfg = GameConfig::load_from(&[dir.clone()]);
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(cfg.board.cell_size, 60.0);
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("cell_size"));
    }

    #[test]
    fn load_reports_parse_error_once() {
        let dir = dir_with_config("parse-error", "[board\ncell_size = 1");
        let cfg = GameConfig::load_from(&[dir.clone()]);
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(cfg.board.cell_size, 60.0);
        assert_eq!(cfg.warnings.len(), 1);
        assert!(cfg.warnings[0].contains("parse error"));
    }
}
