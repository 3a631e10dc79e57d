//! Terminal input prompt for dynamic inputs.
//!
//! Values given with `--input` are used first; anything else is asked for
//! on the terminal. Candidates are listed with numbers and can be picked by
//! number or typed. An empty line or end of input cancels.

use std::io::{BufRead, Write};

use db_questionnaire::query::{InputPrompt, InputRequest, PresetInputs};
use tracing::debug;

/// Prompts on `output` and reads answers from `input`.
pub struct TerminalPrompt<R, W> {
    preset: PresetInputs,
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompts on stderr so stdout carries only results.
    pub fn stdio(preset: PresetInputs) -> Self {
        Self::new(preset, std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(preset: PresetInputs, input: R, output: W) -> Self {
        Self {
            preset,
            input,
            output,
        }
    }

    fn ask(&mut self, request: &InputRequest<'_>) -> std::io::Result<Option<String>> {
        if let Some(error) = &request.lookup_error {
            writeln!(
                self.output,
                "Could not list values of {} ({error}).",
                request.column
            )?;
        }

        match &request.candidates {
            Some(candidates) => {
                writeln!(
                    self.output,
                    "Select a value for {} in '{}':",
                    request.placeholder, request.question
                )?;
                for (i, candidate) in candidates.iter().enumerate() {
                    writeln!(self.output, "  {}) {}", i + 1, candidate)?;
                }
                write!(self.output, "Choice (number or value, empty to cancel): ")?;
            }
            None => {
                write!(
                    self.output,
                    "Enter a value for {} in '{}' (empty to cancel): ",
                    request.placeholder, request.question
                )?;
            }
        }
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.trim_end_matches(['\n', '\r']);
        if answer.is_empty() {
            return Ok(None);
        }

        let picked = request.candidates.as_ref().and_then(|candidates| {
            answer
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=candidates.len()).contains(n))
                .filter(|_| !candidates.iter().any(|c| c == answer))
                .map(|n| candidates[n - 1].clone())
        });

        Ok(Some(picked.unwrap_or_else(|| answer.to_string())))
    }
}

impl<R: BufRead, W: Write> InputPrompt for TerminalPrompt<R, W> {
    fn prompt(&mut self, request: &InputRequest<'_>) -> Option<String> {
        if let Some(value) = self.preset.prompt(request) {
            return Some(value);
        }

        match self.ask(request) {
            Ok(answer) => answer,
            Err(e) => {
                debug!("Reading input for {} failed: {e}", request.placeholder);
                None
            }
        }
    }
}
