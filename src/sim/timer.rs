/// Countdown: the background thread that ticks a round once per period.
///
/// The thread sleeps on a stop channel rather than `thread::sleep`, so
/// `stop()` wakes it immediately. Deadlines are computed from the start
/// instant; slow renders do not make the clock drift.
///
/// Each tick is applied and drawn while holding the round lock. Frames
/// therefore reach the display in the same order as the transitions that
/// produced them. The tick that ends the round is NOT drawn here: it trips
/// the expiry token and the controller draws the outcome once.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::domain::round::RoundState;
use crate::sim::cancel::CancelToken;
use crate::sim::controller::{lock_round, RoundError};
use crate::ui::port::Display;

pub struct Countdown {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start(
        round: Arc<Mutex<RoundState>>,
        display: Arc<dyn Display>,
        expired: CancelToken,
        period: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("countdown".into())
            .spawn(move || run_countdown(stop_rx, &round, display.as_ref(), &expired, period))?;
        Ok(Countdown { stop_tx, handle })
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(self) -> Result<(), RoundError> {
        // Already gone if the round expired; the send error is expected then.
        let _ = self.stop_tx.send(());
        self.handle.join().map_err(|_| {
            log::error!("countdown thread panicked");
            RoundError::TimerPanicked
        })
    }
}

fn run_countdown(
    stop_rx: Receiver<()>,
    round: &Mutex<RoundState>,
    display: &dyn Display,
    expired: &CancelToken,
    period: Duration,
) {
    let started = Instant::now();
    let mut ticks: u32 = 0;

    loop {
        ticks += 1;
        let deadline = started + period * ticks;
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                log::debug!("countdown stopped after {} ticks", ticks - 1);
                return;
            }
        }

        let mut state = lock_round(round);
        if state.is_over() {
            log::debug!("round already over; countdown exits");
            return;
        }
        state.tick();
        if state.is_over() {
            log::info!("time is up");
            expired.cancel();
            return;
        }
        if let Err(e) = display.render(&state.snapshot()) {
            log::warn!("tick render failed: {e}");
        }
    }
}
