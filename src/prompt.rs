use crate::error::FatimaError;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use std::io::{self, BufRead, IsTerminal, Write};

/// Asks the operator a yes/no question.
pub trait Confirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool, FatimaError>;
}

/// Answers yes without asking (`--yes`).
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, prompt: &str) -> Result<bool, FatimaError> {
        tracing::debug!(prompt, "confirmation skipped by --yes");
        Ok(true)
    }
}

/// Interactive prompt on a terminal, plain `y`/`n` lines when stdin is piped.
pub struct OperatorConfirmer;

impl Confirmer for OperatorConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool, FatimaError> {
        if io::stdin().is_terminal() && io::stderr().is_terminal() {
            let theme = ColorfulTheme::default();
            return Ok(Confirm::with_theme(&theme)
                .with_prompt(prompt)
                .interact()?);
        }
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        let mut stderr = io::stderr();
        read_yes_no(&mut reader, &mut stderr, prompt)
    }
}

/// Re-prompts until a line reads `y` or `n`. End of input declines.
pub fn read_yes_no<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
) -> Result<bool, FatimaError> {
    loop {
        write!(writer, "{prompt} (y/n) ")?;
        writer.flush()?;
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            writeln!(writer)?;
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => continue,
        }
    }
}
