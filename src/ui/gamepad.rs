/// Gamepad input via gilrs.
///
/// Only down-edges matter here: every action (walk one step, rotate,
/// restart, confirm, quit) fires once per press, like the keyboard.
///
/// ┌────────────────────────────┬────────────────────────────┐
/// │ Input                       │ Action (default binding)   │
/// ├────────────────────────────┼────────────────────────────┤
/// │ D-pad ←→ / left stick ←→    │ walk left / right          │
/// │ A, X                        │ rotate                     │
/// │ Y                           │ restart level              │
/// │ Start                       │ confirm (next level)       │
/// │ Select                      │ quit                       │
/// └────────────────────────────┴────────────────────────────┘
/// Bindings come from `[gamepad]` in config.toml.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::detail::Facing;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Face and shoulder buttons that can be bound to an action.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    const ALL: [Btn; 8] = [Btn::A, Btn::B, Btn::X, Btn::Y, Btn::L1, Btn::R1, Btn::Start, Btn::Select];

    /// Config name → button. Position names (South, East...) are accepted too.
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER" => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        Some(match btn {
            Button::South => Btn::A,
            Button::East => Btn::B,
            Button::West => Btn::X,
            Button::North => Btn::Y,
            Button::LeftTrigger => Btn::L1,
            Button::RightTrigger => Btn::R1,
            Button::Start => Btn::Start,
            Button::Select => Btn::Select,
            _ => return None,
        })
    }
}

/// Action → buttons. An empty or unparsable config list keeps the default.
#[derive(Debug)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    rotate: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start],
            cancel: vec![Btn::Select],
            restart: vec![Btn::Y],
            rotate: vec![Btn::A, Btn::X],
        }
    }
}

impl ActionMap {
    fn apply(&mut self, cfg: &GamepadConfig) {
        fn bind(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        bind(&mut self.confirm, &cfg.confirm);
        bind(&mut self.cancel, &cfg.cancel);
        bind(&mut self.restart, &cfg.restart);
        bind(&mut self.rotate, &cfg.rotate);
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons that went down since the last `update`.
    pressed: Vec<Btn>,
    /// Walk direction whose d-pad button or stick edge fired this frame.
    walk: Option<Facing>,
    /// Stick side currently past the deadzone, for edge detection.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_side: Option<Facing>,

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: Gilrs::new().ok(),
            pressed: Vec::with_capacity(Btn::ALL.len()),
            walk: None,
            stick_side: None,
            action_map: ActionMap::default(),
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        self.action_map.apply(cfg);
    }

    /// Drain pad events. Call once per frame.
    pub fn update(&mut self) {
        self.pressed.clear();
        self.walk = None;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(Button::DPadLeft, _) => self.walk = Some(Facing::Left),
                EventType::ButtonPressed(Button::DPadRight, _) => self.walk = Some(Facing::Right),
                EventType::ButtonPressed(btn, _) => {
                    if let Some(b) = Btn::from_gilrs(btn) {
                        self.pressed.push(b);
                    }
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_moved(value),
                EventType::Disconnected => self.stick_side = None,
                _ => {}
            }
        }
    }

    /// Stick crossing the deadzone counts as one press on that side.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn stick_moved(&mut self, x: f32) {
        let side = if x < -STICK_DEADZONE {
            Some(Facing::Left)
        } else if x > STICK_DEADZONE {
            Some(Facing::Right)
        } else {
            None
        };
        if side.is_some() && side != self.stick_side {
            self.walk = side;
        }
        self.stick_side = side;
    }

    // ── Action queries ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|b| self.pressed.contains(b))
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.cancel)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.restart)
    }

    pub fn rotate_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.rotate)
    }

    pub fn left_pressed(&self) -> bool {
        self.walk == Some(Facing::Left)
    }

    pub fn right_pressed(&self) -> bool {
        self.walk == Some(Facing::Right)
    }
}
