//! Free-text prompts used by actions

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::core::Interrupt;

/// Line-oriented questions to the user
pub trait Prompt {
    /// Ask for a value; empty input yields the default. `None` on end of input.
    fn ask(&mut self, question: &str, default: Option<&str>) -> Option<String>;

    /// Yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> bool;

    /// Wait for Enter
    fn pause(&mut self);
}

/// Reads answers from stdin, writes questions to stdout
///
/// Ctrl-C while waiting makes the answer `None`, the same as end of input.
#[derive(Debug, Default)]
pub struct StdinPrompt {
    interrupt: Interrupt,
}

impl StdinPrompt {
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }

    fn read_answer(&self, question: &str) -> Option<String> {
        print!("{}", question);
        io::stdout().flush().ok();

        let mut input = String::new();
        let read = io::stdin().lock().read_line(&mut input);
        if self.interrupt.take() {
            println!();
            return None;
        }
        match read {
            Ok(0) | Err(_) => {
                println!();
                None
            }
            Ok(_) => Some(input.trim().to_string()),
        }
    }
}

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Option<String> {
        let label = match default {
            Some(d) if !d.is_empty() => format!("{} [{}]: ", question, d),
            _ => format!("{}: ", question),
        };
        let answer = self.read_answer(&label)?;
        if answer.is_empty() {
            default.map(str::to_string)
        } else {
            Some(answer)
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        match self.read_answer(&format!("{} {} ", question, hint)) {
            Some(answer) if answer.is_empty() => default,
            Some(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }

    fn pause(&mut self) {
        self.read_answer("\nPress Enter to continue...");
    }
}

/// Answers questions from a fixed list
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    /// Every question asked, in order
    pub asked: Vec<String>,
    pub pauses: usize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str, default: Option<&str>) -> Option<String> {
        self.asked.push(question.to_string());
        let answer = self.answers.pop_front()?;
        if answer.is_empty() {
            default.map(str::to_string)
        } else {
            Some(answer)
        }
    }

    fn confirm(&mut self, question: &str, default: bool) -> bool {
        self.asked.push(question.to_string());
        match self.answers.pop_front() {
            Some(answer) if answer.is_empty() => default,
            Some(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }

    fn pause(&mut self) {
        self.pauses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_defaults_and_exhaustion() {
        let mut prompt = ScriptedPrompt::new(["", "custom", "y", ""]);
        assert_eq!(prompt.ask("Name", Some("default")), Some("default".into()));
        assert_eq!(prompt.ask("Path", Some("/x")), Some("custom".into()));
        assert!(prompt.confirm("Sure?", false));
        assert!(prompt.confirm("Again?", true));
        assert_eq!(prompt.ask("More", None), None);
        assert!(!prompt.confirm("Out of answers", true));
        assert_eq!(prompt.asked.len(), 6);
    }
}
