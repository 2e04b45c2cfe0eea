pub mod board;
pub mod cell;
pub mod detail;
pub mod geometry;
pub mod movement;
pub mod rules;
