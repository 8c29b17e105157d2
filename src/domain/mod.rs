pub mod difficulty;
pub mod round;
pub mod secret;
