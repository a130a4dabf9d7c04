//! Interactive prompts
//!
//! Commands never talk to the terminal directly. They describe what they want to ask
//! as a [`Prompt`] and hand it to a [`Prompter`]: [`TerminalPrompter`] renders it with
//! `dialoguer`, [`ScriptedPrompter`] replays canned answers so flows can run without a
//! terminal.

use anyhow::{anyhow, bail, Result};
use dialoguer::{Confirm, Input, Select};
use std::collections::VecDeque;

/// A single question
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// Yes/no question
    Confirm { message: String, default: bool },
    /// Free text, optionally pre-filled
    Input {
        message: String,
        default: Option<String>,
    },
    /// Pick one of `items`
    Select {
        message: String,
        items: Vec<String>,
        default: usize,
    },
}

impl Prompt {
    pub fn confirm(message: impl Into<String>, default: bool) -> Self {
        Prompt::Confirm {
            message: message.into(),
            default,
        }
    }

    pub fn input(message: impl Into<String>, default: Option<String>) -> Self {
        Prompt::Input {
            message: message.into(),
            default,
        }
    }

    pub fn select(message: impl Into<String>, items: Vec<String>) -> Self {
        Prompt::Select {
            message: message.into(),
            items,
            default: 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Prompt::Confirm { message, .. }
            | Prompt::Input { message, .. }
            | Prompt::Select { message, .. } => message,
        }
    }

    fn default_answer(&self) -> Option<Answer> {
        match self {
            Prompt::Confirm { default, .. } => Some(Answer::Confirmed(*default)),
            Prompt::Input { default, .. } => default.clone().map(Answer::Text),
            Prompt::Select { items, default, .. } if !items.is_empty() => {
                Some(Answer::Selected(*default))
            }
            Prompt::Select { .. } => None,
        }
    }
}

/// The answer to a [`Prompt`]
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Confirmed(bool),
    Text(String),
    Selected(usize),
}

pub trait Prompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        match self.ask(&Prompt::confirm(message, default))? {
            Answer::Confirmed(yes) => Ok(yes),
            other => Err(anyhow!("expected a yes/no answer to '{message}', got {other:?}")),
        }
    }

    fn input(&mut self, message: &str, default: Option<String>) -> Result<String> {
        match self.ask(&Prompt::input(message, default))? {
            Answer::Text(text) => Ok(text),
            other => Err(anyhow!("expected text for '{message}', got {other:?}")),
        }
    }

    fn select(&mut self, message: &str, items: Vec<String>) -> Result<usize> {
        let len = items.len();
        match self.ask(&Prompt::select(message, items))? {
            Answer::Selected(idx) if idx < len => Ok(idx),
            other => Err(anyhow!("expected one of {len} choices for '{message}', got {other:?}")),
        }
    }
}

/// Renders prompts on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer> {
        match prompt {
            Prompt::Confirm { message, default } => {
                let yes = Confirm::new()
                    .with_prompt(message)
                    .default(*default)
                    .interact()?;
                Ok(Answer::Confirmed(yes))
            }
            Prompt::Input { message, default } => {
                let mut input = Input::<String>::new().with_prompt(message);
                if let Some(d) = default {
                    input = input.default(d.clone());
                }
                Ok(Answer::Text(input.interact_text()?))
            }
            Prompt::Select {
                message,
                items,
                default,
            } => {
                if items.is_empty() {
                    bail!("nothing to choose from for '{message}'");
                }
                let idx = Select::new()
                    .with_prompt(message)
                    .items(items)
                    .default(*default)
                    .interact()?;
                Ok(Answer::Selected(idx))
            }
        }
    }
}

/// Answers prompts from a queue
///
/// When the queue runs dry the prompt's own default is used, so a script only needs
/// to list the answers that differ from the defaults up to the last one it cares about.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<Prompt>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Every prompt asked so far, in order
    pub fn asked(&self) -> &[Prompt] {
        &self.asked
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &Prompt) -> Result<Answer> {
        self.asked.push(prompt.clone());
        self.answers
            .pop_front()
            .or_else(|| prompt.default_answer())
            .ok_or_else(|| anyhow!("no scripted answer for '{}'", prompt.message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_then_defaults() {
        let mut p = ScriptedPrompter::new([Answer::Text("person".into())]);
        assert_eq!(p.input("Name", None).unwrap(), "person");
        assert!(!p.confirm("Overwrite?", false).unwrap());
        assert_eq!(p.input("Path", Some("./person".into())).unwrap(), "./person");
        assert!(p.input("Author", None).is_err());
        assert_eq!(p.asked().len(), 4);
    }

    #[test]
    fn test_answer_kind_mismatch_is_an_error() {
        let mut p = ScriptedPrompter::new([Answer::Text("yes".into())]);
        assert!(p.confirm("Continue?", false).is_err());

        let mut p = ScriptedPrompter::new([Answer::Selected(3)]);
        assert!(p.select("License", vec!["MIT".into()]).is_err());
    }
}
