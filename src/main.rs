/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{error, info, warn, Level};

use config::GameConfig;
use domain::detail::{DetailId, Facing};
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::placement::{self, DropOutcome};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, PointerKind};
use ui::renderer::{self, Renderer};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const MESSAGE_MS: u64 = 1500;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        warn!("{w}");
    }

    let levels = level::available_levels(&config.levels_dir);
    let mut world = WorldState::new(config.placement.clone(), config.movement.clone());
    level::load_level(&mut world, &levels, 0, config.board.cell_size);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        error!(%e, "terminal init failed");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();
    if sound.is_none() {
        info!("no audio output, running silent");
    }

    let result = game_loop(&mut world, &levels, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!(%e, "game loop aborted");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Blockstep!");
    println!("Levels cleared: {}/{}", cleared_levels(&world), world.total_levels);
}

/// stdout belongs to the renderer, so logs go to a file or nowhere.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.log_file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .with_target(false)
        .init();
    info!(log_level = %level, "logging started");
}

fn cleared_levels(world: &WorldState) -> usize {
    match world.phase {
        Phase::GameComplete => world.total_levels,
        Phase::LevelComplete => world.current_level + 1,
        Phase::Playing => world.current_level,
    }
}

fn game_loop(
    world: &mut WorldState,
    levels: &[LevelDef],
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let clock = Instant::now();
    let mut last_ms: u64 = 0;
    let mut events: Vec<GameEvent> = Vec::with_capacity(16);

    loop {
        kb.drain_events();
        gp.update();
        let now_ms = clock.elapsed().as_millis() as u64;

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, levels, &kb, &gp, config) {
            break;
        }

        // The character walks on after the board is complete.
        if let Some(dir) = detect_move_press(&kb, &gp) {
            step::request_move(world, dir, now_ms);
        }

        if world.phase == Phase::Playing {
            handle_pointer(world, &kb, config.board.cell_size, now_ms, &mut events);

            if kb.any_pressed(KEYS_ROTATE) || gp.rotate_pressed() {
                if let Some(id) = rotate_target(world, &kb, config.board.cell_size) {
                    placement::rotate(world, id, &mut events);
                }
            }
        }

        step::tick(world, now_ms, now_ms.saturating_sub(last_ms), &mut events);
        last_ms = now_ms;

        process_sound_events(sound, &events);
        events.clear();

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_ROTATE: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn detect_move_press(kb: &InputState, gp: &GamepadState) -> Option<Facing> {
    if kb.any_pressed(KEYS_LEFT) || gp.left_pressed() {
        Some(Facing::Left)
    } else if kb.any_pressed(KEYS_RIGHT) || gp.right_pressed() {
        Some(Facing::Right)
    } else {
        None
    }
}

/// Quit, restart and level progression. Returns `true` to leave the loop.
fn handle_meta(
    world: &mut WorldState,
    levels: &[LevelDef],
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
) -> bool {
    let cell_size = config.board.cell_size;

    if kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
        info!(level = world.current_level, "quit requested");
        return true;
    }

    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let restart = kb.any_pressed(&[KeyCode::F(2)]) || gp.restart_pressed();

    match world.phase {
        Phase::Playing | Phase::LevelComplete if restart => {
            level::restart_level(world, levels, cell_size);
            world.set_message("Level restarted", MESSAGE_MS);
        }
        Phase::LevelComplete if confirm => {
            let next = world.current_level + 1;
            level::load_level(world, levels, next, cell_size);
        }
        Phase::GameComplete if confirm => {
            level::load_level(world, levels, 0, cell_size);
        }
        _ => {}
    }
    false
}

/// Replay this frame's mouse gestures against the placement engine.
fn handle_pointer(
    world: &mut WorldState,
    kb: &InputState,
    cell_size: f32,
    now_ms: u64,
    events: &mut Vec<GameEvent>,
) {
    for p in &kb.pointer_events {
        let (px, py) = renderer::terminal_to_pixel(p.col, p.row, cell_size);
        match p.kind {
            PointerKind::Down => {
                let hit = world.hit_test(px, py);
                placement::pointer_down(world, hit, px, py, now_ms, events);
            }
            PointerKind::Drag => placement::drag_move(world, px, py),
            PointerKind::Up => {
                if placement::drag_end(world, events) == DropOutcome::Rejected {
                    world.set_message("No room there", MESSAGE_MS);
                }
            }
            PointerKind::Secondary => {
                if let Some(id) = world.hit_test(px, py) {
                    placement::rotate(world, id, events);
                }
            }
        }
    }
}

/// Keyboard/gamepad rotation acts on the detail under the pointer, or on
/// the topmost detail still in the tray.
fn rotate_target(world: &WorldState, kb: &InputState, cell_size: f32) -> Option<DetailId> {
    let hovered = kb.pointer_at.and_then(|(col, row)| {
        let (px, py) = renderer::terminal_to_pixel(col, row, cell_size);
        world.hit_test(px, py)
    });
    let unplaced = |id: &DetailId| world.detail(*id).map_or(false, |d| !d.is_placed());
    hovered
        .filter(unplaced)
        .or_else(|| world.draw_order.iter().rev().copied().find(unplaced))
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for (i, event) in events.iter().enumerate() {
        match event {
            GameEvent::DragStarted { .. } => sfx.play_grab(),
            GameEvent::DetailPlaced { .. } => sfx.play_place(),
            GameEvent::DetailPickedUp { .. } => sfx.play_pickup(),
            GameEvent::DetailReturned { id } => {
                // A pick-up already has its own sound for the trip home.
                let after_pickup = i > 0
                    && events[i - 1] == GameEvent::DetailPickedUp { id: *id };
                if !after_pickup {
                    sfx.play_return();
                }
            }
            GameEvent::DetailRotated { .. } => sfx.play_rotate(),
            GameEvent::BoardCompleted => sfx.play_win(),
            GameEvent::PlayerMoved { transition, .. } => {
                if transition.is_jump() {
                    sfx.play_jump();
                } else {
                    sfx.play_step();
                }
            }
        }
    }
}
