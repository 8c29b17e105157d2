/// Line input on a raw-mode terminal.
///
/// Raw mode is what lets Ctrl+C arrive as a key event instead of a signal,
/// so an interrupt unwinds through normal returns (`PromptError::Interrupted`)
/// with the countdown thread still joinable.
///
/// Supports:
///   - printable characters and bracketed paste
///   - Backspace, Esc (clear line), Enter (submit, surrounding spaces trimmed)
///   - Ctrl+C / Ctrl+D → interrupt
///
/// The event wait is sliced into short polls; between slices the cancel
/// token is checked so an expired round frees the prompt promptly.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use crate::sim::cancel::CancelToken;
use crate::ui::port::{LineSource, PromptError};

const POLL_SLICE: Duration = Duration::from_millis(50);

pub struct TerminalInput {
    buffer: String,
}

/// What one key does to the line being edited.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
    Insert(char),
    Backspace,
    ClearLine,
    Submit,
    Interrupt,
    Ignore,
}

impl TerminalInput {
    pub fn new() -> Self {
        TerminalInput {
            buffer: String::with_capacity(32),
        }
    }

    fn redraw(&self, message: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        queue!(
            out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(message),
            Print(&self.buffer)
        )?;
        out.flush()
    }

    fn end_line(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        queue!(out, Print("\r\n"))?;
        out.flush()
    }

    /// Apply one edit; returns true when the buffer changed.
    fn apply(&mut self, edit: &Edit) -> bool {
        match edit {
            Edit::Insert(c) => {
                self.buffer.push(*c);
                true
            }
            Edit::Backspace => self.buffer.pop().is_some(),
            Edit::ClearLine => {
                let had = !self.buffer.is_empty();
                self.buffer.clear();
                had
            }
            Edit::Submit | Edit::Interrupt | Edit::Ignore => false,
        }
    }
}

impl LineSource for TerminalInput {
    fn prompt_line(&mut self, message: &str, cancel: &CancelToken) -> Result<String, PromptError> {
        self.buffer.clear();
        self.redraw(message)?;

        loop {
            if cancel.is_cancelled() {
                self.end_line()?;
                return Err(PromptError::Cancelled);
            }
            if !event::poll(POLL_SLICE)? {
                continue;
            }
            let edits: Vec<Edit> = match event::read()? {
                Event::Key(key) => vec![classify(&key)],
                Event::Paste(text) => text.chars().filter(|c| !c.is_control()).map(Edit::Insert).collect(),
                _ => continue,
            };
            let mut dirty = false;
            for edit in edits {
                match edit {
                    Edit::Interrupt => {
                        self.end_line()?;
                        log::info!("interrupt at prompt");
                        return Err(PromptError::Interrupted);
                    }
                    Edit::Submit => {
                        self.end_line()?;
                        return Ok(self.buffer.trim().to_string());
                    }
                    other => dirty |= self.apply(&other),
                }
            }
            if dirty {
                self.redraw(message)?;
            }
        }
    }
}

fn classify(key: &KeyEvent) -> Edit {
    if key.kind == KeyEventKind::Release {
        return Edit::Ignore;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Char('d') | KeyCode::Char('D') => {
                Edit::Interrupt
            }
            _ => Edit::Ignore,
        };
    }
    match key.code {
        KeyCode::Enter => Edit::Submit,
        KeyCode::Backspace => Edit::Backspace,
        KeyCode::Esc => Edit::ClearLine,
        KeyCode::Char(c) if !c.is_control() => Edit::Insert(c),
        _ => Edit::Ignore,
    }
}
