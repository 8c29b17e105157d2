/// RoundState: the rules of one round, with no clocks and no I/O.
///
/// ## State machine
///
/// ```text
///   AwaitingWire --(correct wire)--> AwaitingCode
///   AwaitingWire --(wrong wire)----> LostExploded
///   AwaitingCode --(correct code)--> Won
///   AwaitingCode --(wrong code)----> LostExploded
///   AwaitingWire | AwaitingCode --(remaining hits 0)--> LostTimeout
/// ```
///
/// `Won`, `LostExploded` and `LostTimeout` are terminal: nothing leaves them,
/// and `tick` stops counting once one is reached.
///
/// Every mutation is a `&mut self` method, so whoever shares a round across
/// threads has to serialize access (see `sim::controller`).

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::domain::difficulty::DifficultyProfile;
use crate::domain::secret::{self, is_well_formed_code};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    AwaitingWire,
    AwaitingCode,
    Won,
    LostExploded,
    LostTimeout,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        self.outcome().is_some()
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Phase::Won => Some(Outcome::Won),
            Phase::LostExploded => Some(Outcome::LostExploded),
            Phase::LostTimeout => Some(Outcome::LostTimeout),
            Phase::AwaitingWire | Phase::AwaitingCode => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    LostExploded,
    LostTimeout,
}

impl Outcome {
    pub fn is_loss(self) -> bool {
        !matches!(self, Outcome::Won)
    }
}

/// How a finished round ended, and with how much time left.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RoundOutcome {
    pub outcome: Outcome,
    pub remaining_secs: u32,
}

/// Recoverable refusals. The round continues and the player is asked again.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("no such wire on this bomb")]
    InvalidChoice,
    #[error("the code must be exactly the right number of digits")]
    MalformedInput,
    #[error("that step is not open right now")]
    OutOfPhase,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("wire {0:?} is not one of the profile's wires")]
    UnknownWire(String),
    #[error("code {code:?} is not {length} decimal digits")]
    MalformedCode { code: String, length: u32 },
}

/// Secrets revealed to the player after a loss.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Revealed {
    pub wire: String,
    pub code: String,
}

/// Read-only view handed to the presentation layer.
#[derive(Clone, Debug)]
pub struct RoundSnapshot {
    pub profile: Arc<DifficultyProfile>,
    pub remaining_secs: u32,
    pub phase: Phase,
    /// Only `Some` once the round is lost.
    pub revealed: Option<Revealed>,
}

#[derive(Debug)]
pub struct RoundState {
    profile: Arc<DifficultyProfile>,
    remaining_secs: u32,
    secret_wire: String,
    secret_code: String,
    phase: Phase,
}

impl RoundState {
    /// Fresh round with secrets drawn from `rng`.
    pub fn new(profile: Arc<DifficultyProfile>, rng: &mut impl Rng) -> Self {
        let secret_wire = secret::pick_wire(rng, profile.wires());
        let secret_code = secret::generate_code(rng, profile.code_length());
        log::debug!(
            "new round: difficulty={} time={}s wires={}",
            profile.name(),
            profile.time_limit_secs(),
            profile.wires().len()
        );
        Self::build(profile, secret_wire, secret_code)
    }

    /// Round with caller-chosen secrets.
    #[allow(dead_code)]
    pub fn with_secrets(
        profile: Arc<DifficultyProfile>,
        wire: &str,
        code: &str,
    ) -> Result<Self, SecretError> {
        if !profile.has_wire(wire) {
            return Err(SecretError::UnknownWire(wire.to_string()));
        }
        if !is_well_formed_code(code, profile.code_length()) {
            return Err(SecretError::MalformedCode {
                code: code.to_string(),
                length: profile.code_length(),
            });
        }
        Ok(Self::build(profile, wire.to_string(), code.to_string()))
    }

    fn build(profile: Arc<DifficultyProfile>, secret_wire: String, secret_code: String) -> Self {
        RoundState {
            remaining_secs: profile.time_limit_secs(),
            profile,
            secret_wire,
            secret_code,
            phase: Phase::AwaitingWire,
        }
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[allow(dead_code)]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_over(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.phase.outcome().map(|outcome| RoundOutcome {
            outcome,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Cut a wire. A wrong but valid wire ends the round; an unknown one
    /// is refused.
    pub fn submit_wire(&mut self, choice: &str) -> Result<Phase, Rejection> {
        if self.phase != Phase::AwaitingWire {
            return Err(Rejection::OutOfPhase);
        }
        if !self.profile.has_wire(choice) {
            return Err(Rejection::InvalidChoice);
        }
        let next = if choice == self.secret_wire {
            Phase::AwaitingCode
        } else {
            Phase::LostExploded
        };
        self.transition(next);
        Ok(next)
    }

    /// Key in the disarm code. A wrong but well-formed code ends the round.
    pub fn submit_code(&mut self, input: &str) -> Result<Phase, Rejection> {
        if self.phase != Phase::AwaitingCode {
            return Err(Rejection::OutOfPhase);
        }
        if !is_well_formed_code(input, self.profile.code_length()) {
            return Err(Rejection::MalformedInput);
        }
        let next = if input == self.secret_code {
            Phase::Won
        } else {
            Phase::LostExploded
        };
        self.transition(next);
        Ok(next)
    }

    /// One elapsed second. No-op once the round is over.
    pub fn tick(&mut self) -> Phase {
        if self.phase.is_terminal() {
            return self.phase;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.transition(Phase::LostTimeout);
        }
        self.phase
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let revealed = match self.phase.outcome() {
            Some(o) if o.is_loss() => Some(Revealed {
                wire: self.secret_wire.clone(),
                code: self.secret_code.clone(),
            }),
            _ => None,
        };
        RoundSnapshot {
            profile: Arc::clone(&self.profile),
            remaining_secs: self.remaining_secs,
            phase: self.phase,
            revealed,
        }
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(!self.phase.is_terminal(), "left terminal phase {:?}", self.phase);
        log::info!(
            "phase {:?} -> {:?} ({}s left)",
            self.phase,
            next,
            self.remaining_secs
        );
        self.phase = next;
    }

    #[cfg(test)]
    pub(crate) fn secrets(&self) -> (&str, &str) {
        (&self.secret_wire, &self.secret_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::difficulty::labels;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn easy_kanji() -> Arc<DifficultyProfile> {
        Arc::new(DifficultyProfile::new("easy", 90, labels(&["赤", "青", "黄"]), 3).unwrap())
    }

    fn normal() -> Arc<DifficultyProfile> {
        Arc::new(
            DifficultyProfile::new(
                "normal",
                60,
                labels(&["red", "blue", "yellow", "green", "white"]),
                4,
            )
            .unwrap(),
        )
    }

    #[test]
    fn correct_wire_then_correct_code_wins() {
        let mut r = RoundState::with_secrets(easy_kanji(), "青", "042").unwrap();
        assert_eq!(r.phase(), Phase::AwaitingWire);
        assert_eq!(r.submit_wire("青"), Ok(Phase::AwaitingCode));
        assert_eq!(r.submit_code("042"), Ok(Phase::Won));
        let out = r.outcome().unwrap();
        assert_eq!(out.outcome, Outcome::Won);
        assert_eq!(out.remaining_secs, 90);
    }

    #[test]
    fn wrong_wire_explodes_immediately() {
        let mut r = RoundState::with_secrets(easy_kanji(), "青", "042").unwrap();
        assert_eq!(r.submit_wire("赤"), Ok(Phase::LostExploded));
        assert!(r.is_over());
        // the code stage is never reached
        assert_eq!(r.submit_code("042"), Err(Rejection::OutOfPhase));
        assert_eq!(r.phase(), Phase::LostExploded);
    }

    #[test]
    fn unknown_wire_is_rejected_without_state_change() {
        let mut r = RoundState::with_secrets(easy_kanji(), "青", "042").unwrap();
        assert_eq!(r.submit_wire("緑"), Err(Rejection::InvalidChoice));
        assert_eq!(r.submit_wire(""), Err(Rejection::InvalidChoice));
        assert_eq!(r.phase(), Phase::AwaitingWire);
        assert_eq!(r.submit_wire("青"), Ok(Phase::AwaitingCode));
    }

    #[test]
    fn wrong_code_explodes() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        r.submit_wire("blue").unwrap();
        assert_eq!(r.submit_code("9999"), Ok(Phase::LostExploded));
    }

    #[test]
    fn malformed_code_is_rejected_without_state_change() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        r.submit_wire("blue").unwrap();
        assert_eq!(r.submit_code("12"), Err(Rejection::MalformedInput));
        assert_eq!(r.submit_code("12ab"), Err(Rejection::MalformedInput));
        assert_eq!(r.submit_code("12345"), Err(Rejection::MalformedInput));
        assert_eq!(r.phase(), Phase::AwaitingCode);
        assert_eq!(r.submit_code("1234"), Ok(Phase::Won));
    }

    #[test]
    fn code_before_wire_is_out_of_phase() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        assert_eq!(r.submit_code("1234"), Err(Rejection::OutOfPhase));
        assert_eq!(r.phase(), Phase::AwaitingWire);
    }

    #[test]
    fn ticking_out_the_clock_times_out() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        for i in 1..60 {
            assert_eq!(r.tick(), Phase::AwaitingWire);
            assert_eq!(r.remaining_secs(), 60 - i);
        }
        assert_eq!(r.tick(), Phase::LostTimeout);
        assert_eq!(r.remaining_secs(), 0);
    }

    #[test]
    fn timeout_during_code_stage() {
        let p = Arc::new(DifficultyProfile::new("t", 2, labels(&["a", "b"]), 1).unwrap());
        let mut r = RoundState::with_secrets(p, "a", "7").unwrap();
        r.submit_wire("a").unwrap();
        r.tick();
        assert_eq!(r.tick(), Phase::LostTimeout);
        assert_eq!(r.submit_code("7"), Err(Rejection::OutOfPhase));
    }

    #[test]
    fn tick_after_terminal_changes_nothing() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        r.tick();
        r.submit_wire("red").unwrap();
        assert_eq!(r.remaining_secs(), 59);
        for _ in 0..100 {
            assert_eq!(r.tick(), Phase::LostExploded);
        }
        assert_eq!(r.remaining_secs(), 59);

        let mut t = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        for _ in 0..60 {
            t.tick();
        }
        t.tick();
        assert_eq!(t.phase(), Phase::LostTimeout);
        assert_eq!(t.remaining_secs(), 0);
    }

    #[test]
    fn secrets_hidden_until_loss() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        assert!(r.snapshot().revealed.is_none());
        r.submit_wire("blue").unwrap();
        assert!(r.snapshot().revealed.is_none());
        r.submit_code("1111").unwrap();
        let shown = r.snapshot().revealed.unwrap();
        assert_eq!(shown.wire, "blue");
        assert_eq!(shown.code, "1234");
    }

    #[test]
    fn win_does_not_reveal_secrets() {
        let mut r = RoundState::with_secrets(normal(), "blue", "1234").unwrap();
        r.submit_wire("blue").unwrap();
        r.submit_code("1234").unwrap();
        assert_eq!(r.snapshot().phase, Phase::Won);
        assert!(r.snapshot().revealed.is_none());
    }

    #[test]
    fn with_secrets_validates() {
        assert_eq!(
            RoundState::with_secrets(normal(), "pink", "1234").unwrap_err(),
            SecretError::UnknownWire("pink".into())
        );
        assert!(matches!(
            RoundState::with_secrets(normal(), "red", "12a4"),
            Err(SecretError::MalformedCode { length: 4, .. })
        ));
    }

    #[test]
    fn random_rounds_draw_valid_secrets() {
        let p = normal();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let r = RoundState::new(Arc::clone(&p), &mut rng);
            let (wire, code) = r.secrets();
            assert!(p.has_wire(wire));
            assert_eq!(code.len(), 4);
            assert!(!code.starts_with('0'));
            assert_eq!(r.phase(), Phase::AwaitingWire);
            assert_eq!(r.remaining_secs(), 60);
        }
    }

    #[test]
    fn sequential_rounds_do_not_share_state() {
        let p = normal();
        let mut rng = StdRng::seed_from_u64(5);
        let mut first = RoundState::new(Arc::clone(&p), &mut rng);
        let (w1, c1) = {
            let (w, c) = first.secrets();
            (w.to_string(), c.to_string())
        };
        first.tick();
        first.submit_wire(&w1).unwrap();

        let mut differs = false;
        for _ in 0..20 {
            let next = RoundState::new(Arc::clone(&p), &mut rng);
            assert_eq!(next.phase(), Phase::AwaitingWire);
            assert_eq!(next.remaining_secs(), 60);
            let (w2, c2) = next.secrets();
            differs |= w2 != w1 || c2 != c1;
        }
        assert!(differs, "every later round repeated the first round's secrets");
        // the first round is untouched by creating others
        assert_eq!(first.phase(), Phase::AwaitingCode);
        assert_eq!(first.remaining_secs(), 59);
    }
}
