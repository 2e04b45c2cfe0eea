pub mod click;
pub mod debounce;
pub mod event;
pub mod level;
pub mod placement;
pub mod step;
pub mod tween;
pub mod world;
