pub mod input;
pub mod port;
pub mod renderer;
pub mod sound;
