/// Entry point: welcome screen, difficulty menu, and the replay loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::process::ExitCode;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use domain::difficulty::Difficulty;
use domain::round::{Outcome, RoundOutcome, RoundState};
use sim::cancel::CancelToken;
use sim::controller::{RoundController, RoundError};
use ui::input::TerminalInput;
use ui::port::LineSource;
use ui::renderer::TerminalRenderer;
use ui::sound::SoundEngine;

fn main() -> ExitCode {
    // stdout belongs to the game screen; logs go to stderr and stay off
    // unless RUST_LOG asks for them.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let config = match GameConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Preset table error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let renderer = Arc::new(TerminalRenderer::new(SoundEngine::new()));
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let mut input = TerminalInput::new();
    let mut rng = StdRng::from_os_rng();
    let mut stats = SessionStats::default();

    let result = game_loop(&config, &renderer, &mut input, &mut rng, &mut stats);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = &result {
        if !matches!(e, RoundError::Interrupted) {
            eprintln!("Game error: {e}");
        }
    }
    for l in closing_lines(&result, &stats) {
        println!("{l}");
    }
    match result {
        Ok(()) | Err(RoundError::Interrupted) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// What is printed once the terminal is restored. An interrupt only
/// acknowledges the quit.
fn closing_lines(result: &Result<(), RoundError>, stats: &SessionStats) -> Vec<String> {
    match result {
        Ok(()) => vec![
            String::new(),
            "Thanks for playing Time Bomb!".to_string(),
            format!("Bombs defused: {} of {}", stats.defused, stats.played),
        ],
        Err(RoundError::Interrupted) => vec!["Quitting the game...".to_string()],
        Err(_) => Vec::new(),
    }
}

/// Tally across rounds of one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct SessionStats {
    played: u32,
    defused: u32,
}

impl SessionStats {
    fn record(&mut self, outcome: &RoundOutcome) {
        self.played += 1;
        if outcome.outcome == Outcome::Won {
            self.defused += 1;
        }
    }
}

fn game_loop(
    config: &GameConfig,
    renderer: &Arc<TerminalRenderer>,
    input: &mut TerminalInput,
    rng: &mut StdRng,
    stats: &mut SessionStats,
) -> Result<(), RoundError> {
    // Menus never get cancelled; only the player can leave them.
    let idle = CancelToken::new();
    let controller = RoundController::new(config.tick);

    renderer.show_welcome()?;
    input.prompt_line("Press Enter to start...", &idle)?;

    loop {
        let difficulty = select_difficulty(config, renderer, input, &idle)?;
        log::info!("starting {difficulty} round");

        // Fresh state every round; nothing carries over.
        let state = RoundState::new(Arc::clone(config.profile(difficulty)), rng);
        let outcome = controller.run(state, renderer.clone(), input)?;
        stats.record(&outcome);

        let answer = input.prompt_line("Play again? (y/n): ", &idle)?;
        if !wants_replay(&answer) {
            return Ok(());
        }
    }
}

fn select_difficulty(
    config: &GameConfig,
    renderer: &TerminalRenderer,
    input: &mut TerminalInput,
    idle: &CancelToken,
) -> Result<Difficulty, RoundError> {
    renderer.show_difficulty_menu(config)?;
    loop {
        let choice = input.prompt_line("Select (1-3): ", idle)?;
        match Difficulty::from_menu_choice(&choice) {
            Some(d) => return Ok(d),
            None => {
                // Fresh menu so repeated mistakes never scroll it away.
                renderer.show_difficulty_menu(config)?;
                renderer.hint("Please enter a number from 1 to 3.")?;
            }
        }
    }
}

fn wants_replay(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
