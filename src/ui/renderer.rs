/// Presentation layer: crossterm renderer for the bomb, menus and outcomes.
///
/// Screen layout while a round runs:
///
/// ```text
///   row 0-2   title box
///   row 3     timer line        <- redrawn in place on every tick
///   row 4..   bomb art, wire list, keypad
///   next      notice line       <- cleared by every frame
///   next      prompt            <- owned by `TerminalInput`
/// ```
///
/// A tick only rewrites row 3 between `SavePosition` / `RestorePosition`,
/// so whatever the player is typing on the prompt line survives. A notice
/// redraws the whole frame before printing its line, so the prompt always
/// lands on the same row and the screen never scrolls under the timer.
/// Every write holds the stdout lock for the whole frame; frames from the
/// countdown thread and the main thread never interleave.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo, RestorePosition, SavePosition},
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute, queue,
    style::{Color, Print, ResetColor, SetAttribute, Attribute, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::GameConfig;
use crate::domain::difficulty::Difficulty;
use crate::domain::round::{Phase, RoundSnapshot};
use crate::ui::port::{Display, Notice};
use crate::ui::sound::{Sfx, SoundEngine};

const TIMER_ROW: u16 = 3;
const TIMER_BAR_WIDTH: usize = 24;
/// Seconds left at which the timer turns red and the tick turns urgent.
const URGENT_SECS: u32 = 10;
/// Beat between a fatal move and the explosion.
const ARMING_PAUSE: Duration = Duration::from_secs(1);

const TITLE_BOX: [&str; 3] = [
    "╔══════════════════════════════════════════════╗",
    "║              T I M E    B O M B              ║",
    "╚══════════════════════════════════════════════╝",
];

const BOMB_ART: [&str; 5] = [
    "              ,--.!,",
    "           __/   -*-",
    "         ,d08b.  '|`",
    "         0088MM",
    "         `9MMP'",
];

const EXPLOSION_ART: [&str; 6] = [
    "      _ ._  _ , _ ._",
    "    (_ ' ( `  )_  .__)",
    "  ( (  (    )   `)  ) _)",
    " (__ (_   (_ . _) _) ,__)",
    "     `~~`\\ ' . /`~~`",
    "          ;   ;",
];

const DEFUSED_ART: [&str; 5] = [
    "      .-\"\"\"-.",
    "     /  ___  \\     DISARMED",
    "    |  |   |  |",
    "     \\  ---  /",
    "      `-...-'",
];

pub struct TerminalRenderer {
    sound: Option<SoundEngine>,
    screen: Mutex<Screen>,
}

#[derive(Default)]
struct Screen {
    /// Last running-round frame on screen; notices redraw it.
    frame: Option<RoundSnapshot>,
    /// What set the bomb off, for the outcome headline.
    cause: Option<String>,
}

impl TerminalRenderer {
    pub fn new(sound: Option<SoundEngine>) -> Self {
        TerminalRenderer {
            sound,
            screen: Mutex::new(Screen::default()),
        }
    }

    pub fn init(&self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            EnableBracketedPaste,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )
    }

    pub fn cleanup(&self) -> io::Result<()> {
        execute!(
            io::stdout(),
            ResetColor,
            cursor::Show,
            DisableBracketedPaste,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    // ── Menus (outside a round) ──

    pub fn show_welcome(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        begin_screen(&mut out)?;
        line(&mut out, "", Color::Reset)?;
        line(&mut out, "  Welcome to Time Bomb!", Color::White)?;
        line(&mut out, "  You are on the bomb squad. Disarm the bomb before the timer hits zero.", Color::Reset)?;
        line(&mut out, "  Cut the right wire first, then key in the disarm code.", Color::Reset)?;
        line(&mut out, "  One wrong wire or one wrong code and it goes off.", Color::Reset)?;
        line(&mut out, "", Color::Reset)?;
        line(&mut out, "  Ctrl+C quits at any prompt.", Color::DarkGrey)?;
        line(&mut out, "", Color::Reset)?;
        out.flush()
    }

    pub fn show_difficulty_menu(&self, config: &GameConfig) -> io::Result<()> {
        let mut out = io::stdout().lock();
        begin_screen(&mut out)?;
        line(&mut out, "", Color::Reset)?;
        line(&mut out, "  Choose a difficulty:", Color::White)?;
        for (i, d) in Difficulty::ALL.iter().enumerate() {
            let p = config.profile(*d);
            let text = format!(
                "    {}. {:<7} ({}s, {} wires, {}-digit code)",
                i + 1,
                d.label(),
                p.time_limit_secs(),
                p.wires().len(),
                p.code_length()
            );
            line(&mut out, &text, Color::Cyan)?;
        }
        line(&mut out, "", Color::Reset)?;
        out.flush()
    }

    /// One-line hint at the cursor, used for re-prompts.
    pub fn hint(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        line(&mut out, &format!("  {text}"), Color::Yellow)?;
        out.flush()
    }

    fn play(&self, sfx: Sfx) {
        if let Some(engine) = &self.sound {
            engine.play(sfx);
        }
    }
}

impl Display for TerminalRenderer {
    fn render(&self, snapshot: &RoundSnapshot) -> io::Result<()> {
        let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
        let mut out = io::stdout().lock();

        if snapshot.phase.is_terminal() {
            draw_outcome(&mut out, snapshot, screen.cause.take().as_deref())?;
            screen.frame = None;
            self.play(if snapshot.phase == Phase::Won { Sfx::Defused } else { Sfx::Explosion });
        } else {
            let same_phase = screen.frame.as_ref().map(|f| f.phase) == Some(snapshot.phase);
            if same_phase {
                redraw_timer(&mut out, snapshot)?;
                self.play(if snapshot.remaining_secs <= URGENT_SECS { Sfx::TickUrgent } else { Sfx::Tick });
            } else {
                draw_bomb(&mut out, snapshot)?;
            }
            screen.frame = Some(snapshot.clone());
        }
        out.flush()
    }

    fn notify(&self, notice: &Notice) -> io::Result<()> {
        let (text, color) = notice_line(notice);
        let cause = fatal_cause(notice);
        let fatal = cause.is_some();
        match notice {
            Notice::WireCut(_) | Notice::WrongWire(_) => self.play(Sfx::WireCut),
            _ => {}
        }
        {
            let mut screen = self.screen.lock().unwrap_or_else(PoisonError::into_inner);
            if cause.is_some() {
                screen.cause = cause;
            }
            let mut out = io::stdout().lock();
            compose_notice(&mut out, screen.frame.as_ref(), &text, color)?;
            out.flush()?;
        }
        if fatal {
            thread::sleep(ARMING_PAUSE);
        }
        Ok(())
    }
}

// ── Frames ──

fn begin_screen(out: &mut impl Write) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    for l in TITLE_BOX {
        line(out, l, Color::Red)?;
    }
    Ok(())
}

/// Full round frame. Its height depends only on the phase, never on how
/// many notices came before it.
fn draw_bomb(out: &mut impl Write, s: &RoundSnapshot) -> io::Result<()> {
    begin_screen(out)?;
    draw_timer_row(out, s)?;
    line(out, "", Color::Reset)?;
    for l in BOMB_ART {
        line(out, l, Color::DarkGrey)?;
    }
    line(out, "", Color::Reset)?;

    queue!(out, SetForegroundColor(Color::White), Print("  Wires:"))?;
    for wire in s.profile.wires() {
        queue!(out, Print("  "), SetForegroundColor(wire_color(wire)), Print(wire))?;
    }
    line(out, "", Color::Reset)?;
    line(out, "", Color::Reset)?;
    match s.phase {
        Phase::AwaitingCode => {
            line(out, "  Wire cut ✔", Color::Green)?;
            let slots = "_ ".repeat(s.profile.code_length() as usize);
            line(out, &format!("  Keypad [0-9]:  {}", slots.trim_end()), Color::White)?;
        }
        _ => line(out, "  Keypad [0-9]: locked until a wire is cut", Color::DarkGrey)?,
    }
    line(out, "", Color::Reset)
}

/// Redraw `frame` (when a round is on screen) and put one notice line
/// under it. The prompt then starts on the row after.
fn compose_notice(out: &mut impl Write, frame: Option<&RoundSnapshot>, text: &str, color: Color) -> io::Result<()> {
    if let Some(frame) = frame {
        draw_bomb(out, frame)?;
    }
    line(out, text, color)
}

fn redraw_timer(out: &mut impl Write, s: &RoundSnapshot) -> io::Result<()> {
    queue!(out, SavePosition, MoveTo(0, TIMER_ROW))?;
    draw_timer_row(out, s)?;
    queue!(out, RestorePosition)
}

fn draw_outcome(out: &mut impl Write, s: &RoundSnapshot, cause: Option<&str>) -> io::Result<()> {
    begin_screen(out)?;
    line(out, "", Color::Reset)?;
    match s.phase {
        Phase::Won => {
            line(out, "  ★ BOMB DEFUSED! ★", Color::Green)?;
            line(out, "", Color::Reset)?;
            for l in DEFUSED_ART {
                line(out, l, Color::Green)?;
            }
            line(out, "", Color::Reset)?;
            line(out, "  Congratulations, you disarmed the bomb!", Color::White)?;
            line(out, &format!("  Time left: {}s", s.remaining_secs), Color::White)?;
        }
        _ => {
            let headline = if s.phase == Phase::LostTimeout {
                "  ✕ TIME'S UP! GAME OVER ✕"
            } else {
                "  ✕ WRONG MOVE! GAME OVER ✕"
            };
            line(out, headline, Color::Red)?;
            if let Some(cause) = cause {
                line(out, &format!("  {cause}"), Color::Yellow)?;
            }
            line(out, "", Color::Reset)?;
            for l in EXPLOSION_ART {
                line(out, l, Color::DarkYellow)?;
            }
            line(out, "", Color::Reset)?;
            line(out, "  💥 The bomb exploded! 💥", Color::Red)?;
            if let Some(r) = &s.revealed {
                line(out, "", Color::Reset)?;
                line(out, "  The answer was:", Color::White)?;
                queue!(out, Print("   - wire to cut: "))?;
                line(out, &r.wire, wire_color(&r.wire))?;
                line(out, &format!("   - disarm code: {}", r.code), Color::White)?;
            }
        }
    }
    line(out, "", Color::Reset)
}

fn notice_line(notice: &Notice) -> (String, Color) {
    match notice {
        Notice::WireCut(wire) => (
            format!("  ✂ You cut the {wire} wire. First step done! Now the disarm code."),
            Color::Green,
        ),
        Notice::WrongWire(wire) => (
            format!("  ✂ You cut the {wire} wire. Wrong one! The bomb is arming..."),
            Color::Red,
        ),
        Notice::WrongCode => ("  Wrong code! The bomb is arming...".to_string(), Color::Red),
        Notice::InvalidWire(options) => (
            format!("  Pick one of the wires: {}", options.join(", ")),
            Color::Yellow,
        ),
        Notice::MalformedCode(n) => (format!("  Enter exactly {n} digits."), Color::Yellow),
    }
}

fn fatal_cause(notice: &Notice) -> Option<String> {
    match notice {
        Notice::WrongWire(wire) => Some(format!("The {wire} wire was the wrong one.")),
        Notice::WrongCode => Some("The disarm code was wrong.".to_string()),
        _ => None,
    }
}

// ── Helpers ──

/// Print one line in `fg`, then move to column 0 of the next row (raw mode).
fn line(out: &mut impl Write, text: &str, fg: Color) -> io::Result<()> {
    queue!(out, SetForegroundColor(fg), Print(text), ResetColor, Print("\r\n"))
}

fn draw_timer_row(out: &mut impl Write, s: &RoundSnapshot) -> io::Result<()> {
    let limit = s.profile.time_limit_secs().max(1) as usize;
    let filled = (s.remaining_secs as usize * TIMER_BAR_WIDTH + limit - 1) / limit;
    let bar = format!(
        "{}{}",
        "█".repeat(filled.min(TIMER_BAR_WIDTH)),
        "░".repeat(TIMER_BAR_WIDTH - filled.min(TIMER_BAR_WIDTH))
    );
    let color = timer_color(s.remaining_secs, s.profile.time_limit_secs());
    queue!(
        out,
        Clear(ClearType::CurrentLine),
        SetAttribute(Attribute::Bold),
        SetForegroundColor(color),
        Print(format!("  TIME LEFT: {:>3}s  {bar}", s.remaining_secs)),
        SetAttribute(Attribute::Reset),
        ResetColor,
        Print(format!("   [{}]\r\n", s.profile.name())),
    )
}

fn timer_color(remaining: u32, limit: u32) -> Color {
    if remaining <= URGENT_SECS {
        Color::Red
    } else if remaining * 2 <= limit {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn wire_color(label: &str) -> Color {
    match label {
        "red" => Color::Red,
        "blue" => Color::Blue,
        "yellow" => Color::Yellow,
        "green" => Color::Green,
        "white" => Color::White,
        "black" => Color::DarkGrey,
        "purple" => Color::Magenta,
        _ => Color::Reset,
    }
}
