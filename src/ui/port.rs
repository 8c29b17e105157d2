/// Presentation port: what the round controller needs from a front end.
///
/// `Display` is shared with the countdown thread, so it takes `&self` and
/// must be `Send + Sync`. `LineSource` is only ever driven from the thread
/// running the round.

use std::io;

use thiserror::Error;

use crate::domain::round::RoundSnapshot;
use crate::sim::cancel::CancelToken;

/// Messages shown between screens, outside the round snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The live wire was cut; the keypad is next.
    WireCut(String),
    /// A dud wire was cut; the bomb goes off.
    WrongWire(String),
    /// The code did not match; the bomb goes off.
    WrongCode,
    /// Unknown wire label; lists the valid ones.
    InvalidWire(Vec<String>),
    /// Code was not exactly this many digits.
    MalformedCode(u32),
}

#[derive(Debug, Error)]
pub enum PromptError {
    /// The player asked to quit.
    #[error("interrupted by player")]
    Interrupted,
    /// The cancel token tripped while waiting for input.
    #[error("prompt cancelled")]
    Cancelled,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub trait Display: Send + Sync {
    /// Draw the round. Called once per tick and on every phase change;
    /// a terminal phase draws the outcome screen.
    fn render(&self, snapshot: &RoundSnapshot) -> io::Result<()>;

    fn notify(&self, notice: &Notice) -> io::Result<()>;
}

pub trait LineSource {
    /// Block until the player enters a line, `cancel` trips, or the player
    /// interrupts.
    fn prompt_line(&mut self, message: &str, cancel: &CancelToken) -> Result<String, PromptError>;
}
