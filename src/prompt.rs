// Operator input: a real terminal, or a scripted queue for tests

use anyhow::{anyhow, bail, Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

pub trait Prompt {
    /// Show `message` and read one line, without its line terminator
    fn read_line(&mut self, message: &str) -> Result<String>;

    /// Like `read_line` but the answer is not echoed
    fn read_password(&mut self, message: &str) -> Result<String>;

    /// Print a line of text
    fn say(&mut self, text: &str) -> Result<()>;
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// stdin / stdout
pub struct Console {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Console {
    pub fn new() -> Self {
        Console {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }

    fn read_raw_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self
            .stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            bail!("unexpected end of input");
        }
        Ok(strip_line_ending(line))
    }

    fn show(&mut self, message: &str) -> Result<()> {
        self.stdout.write_all(message.as_bytes())?;
        self.stdout.flush()?;
        Ok(())
    }

    fn read_masked(&mut self) -> Result<String> {
        let _raw = RawMode::enable()?;
        let mut buf = String::new();

        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match apply_key(&mut buf, key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Done => return Ok(buf),
                KeyOutcome::Abort => bail!("interrupted"),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Done,
    Abort,
}

/// Edit the masked buffer for one key press
fn apply_key(buf: &mut String, key: KeyEvent) -> KeyOutcome {
    let chorded = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

    match key.code {
        KeyCode::Enter => KeyOutcome::Done,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyOutcome::Abort
        }
        KeyCode::Backspace => {
            buf.pop();
            KeyOutcome::Continue
        }
        // Ctrl-U, Alt-B and friends are not part of the password
        KeyCode::Char(_) if chorded => KeyOutcome::Continue,
        KeyCode::Char(c) => {
            buf.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for Console {
    fn read_line(&mut self, message: &str) -> Result<String> {
        self.show(message)?;
        self.read_raw_line()
    }

    fn read_password(&mut self, message: &str) -> Result<String> {
        self.show(message)?;

        // Piped input has no echo to hide
        if !self.stdin.is_terminal() {
            return self.read_raw_line();
        }

        let password = self.read_masked();
        // Enter was swallowed by raw mode
        self.show("\n")?;
        password
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.stdout, "{}", text)?;
        Ok(())
    }
}

/// Restores cooked mode on drop, including on the error path
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self> {
        enable_raw_mode().context("Failed to disable terminal echo")?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Answers from a queue; records everything shown
#[derive(Debug, Default)]
pub struct Scripted {
    answers: VecDeque<String>,
    pub shown: Vec<String>,
}

impl Scripted {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scripted {
            answers: answers.into_iter().map(Into::into).collect(),
            shown: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self) -> Result<String> {
        self.answers
            .pop_front()
            .map(strip_line_ending)
            .ok_or_else(|| anyhow!("unexpected end of input"))
    }
}

impl Prompt for Scripted {
    fn read_line(&mut self, message: &str) -> Result<String> {
        self.shown.push(message.to_string());
        self.next_answer()
    }

    fn read_password(&mut self, message: &str) -> Result<String> {
        self.shown.push(message.to_string());
        self.next_answer()
    }

    fn say(&mut self, text: &str) -> Result<()> {
        self.shown.push(text.to_string());
        Ok(())
    }
}
