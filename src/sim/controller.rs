/// Round controller: one countdown thread racing one player.
///
/// ## Concurrency
///
/// The round lives in an `Arc<Mutex<RoundState>>`. That mutex is the only
/// mutation path: the countdown thread takes it to `tick`, the player's
/// submissions take it to `submit_*`. Whichever gets the lock first wins a
/// same-instant race; the loser sees a terminal phase and backs off
/// (`tick` is a no-op, a submission gets `Rejection::OutOfPhase`).
///
/// The player's prompt blocks outside the lock. When the clock runs out
/// while the player is still typing, the countdown trips the expiry token
/// and the prompt returns `PromptError::Cancelled`.
///
/// ## Exit paths
///
///   terminal phase   → stop timer, draw outcome once, return it
///   player interrupt → stop timer, draw nothing, `RoundError::Interrupted`
///   terminal I/O     → stop timer, `RoundError::Io`

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::domain::round::{Phase, Rejection, RoundOutcome, RoundState};
use crate::sim::cancel::CancelToken;
use crate::sim::timer::Countdown;
use crate::ui::port::{Display, LineSource, Notice, PromptError};

pub const WIRE_PROMPT: &str = "Which wire do you cut? ";

#[derive(Debug, Error)]
pub enum RoundError {
    #[error("round interrupted by player")]
    Interrupted,
    #[error("countdown thread panicked")]
    TimerPanicked,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl From<PromptError> for RoundError {
    fn from(e: PromptError) -> Self {
        match e {
            // Outside a running round nothing trips the token; treat it as a quit.
            PromptError::Interrupted | PromptError::Cancelled => RoundError::Interrupted,
            PromptError::Io(e) => RoundError::Io(e),
        }
    }
}

/// Lock a round, recovering the state if another holder panicked.
/// `RoundState` has no half-applied mutations, so the data stays coherent.
pub(crate) fn lock_round(round: &Mutex<RoundState>) -> MutexGuard<'_, RoundState> {
    round.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn code_prompt(code_length: u32) -> String {
    format!("Enter the {code_length}-digit disarm code: ")
}

pub struct RoundController {
    tick: Duration,
}

impl RoundController {
    pub fn new(tick: Duration) -> Self {
        RoundController { tick }
    }

    /// Play one round to its end.
    pub fn run(
        &self,
        state: RoundState,
        display: Arc<dyn Display>,
        input: &mut dyn LineSource,
    ) -> Result<RoundOutcome, RoundError> {
        let round = Arc::new(Mutex::new(state));
        let expired = CancelToken::new();

        display.render(&lock_round(&round).snapshot())?;

        let countdown = Countdown::start(
            Arc::clone(&round),
            Arc::clone(&display),
            expired.clone(),
            self.tick,
        )?;

        let played = play(&round, display.as_ref(), input, &expired);
        let stopped = countdown.stop();

        if let Err(e) = &played {
            log::info!("round aborted: {e}");
        }
        played?;
        stopped?;

        let state = lock_round(&round);
        let snapshot = state.snapshot();
        let outcome = state
            .outcome()
            .ok_or_else(|| io::Error::other("round loop left a running round"))?;
        drop(state);

        log::info!(
            "round over: {:?} with {}s left",
            outcome.outcome,
            outcome.remaining_secs
        );
        display.render(&snapshot)?;
        Ok(outcome)
    }
}

/// Prompt-and-submit loop. Returns once the round is terminal.
fn play(
    round: &Mutex<RoundState>,
    display: &dyn Display,
    input: &mut dyn LineSource,
    expired: &CancelToken,
) -> Result<(), RoundError> {
    loop {
        let (phase, code_length) = {
            let state = lock_round(round);
            (state.phase(), state.profile().code_length())
        };
        let prompt = match phase {
            Phase::AwaitingWire => WIRE_PROMPT.to_string(),
            Phase::AwaitingCode => code_prompt(code_length),
            Phase::Won | Phase::LostExploded | Phase::LostTimeout => return Ok(()),
        };

        let line = match input.prompt_line(&prompt, expired) {
            Ok(line) => line,
            // The countdown finished the round; the next pass sees it.
            Err(PromptError::Cancelled) => continue,
            Err(e) => return Err(e.into()),
        };

        let mut state = lock_round(round);
        let verdict = match phase {
            Phase::AwaitingWire => state.submit_wire(&line),
            _ => state.submit_code(&line),
        };
        match verdict {
            Ok(Phase::AwaitingCode) => {
                display.render(&state.snapshot())?;
                display.notify(&Notice::WireCut(line))?;
            }
            Ok(Phase::LostExploded) => {
                // The notice may linger on screen; the countdown must not wait on it.
                drop(state);
                display.notify(&match phase {
                    Phase::AwaitingWire => Notice::WrongWire(line),
                    _ => Notice::WrongCode,
                })?;
            }
            // Terminal: drawn by `run` after the countdown has stopped.
            Ok(_) => {}
            Err(Rejection::InvalidChoice) => {
                log::debug!("unknown wire {line:?}");
                display.notify(&Notice::InvalidWire(state.profile().wires().to_vec()))?;
            }
            Err(Rejection::MalformedInput) => {
                log::debug!("malformed code {line:?}");
                display.notify(&Notice::MalformedCode(code_length))?;
            }
            Err(Rejection::OutOfPhase) => {
                log::debug!("submission lost the race against the clock");
            }
        }
    }
}
