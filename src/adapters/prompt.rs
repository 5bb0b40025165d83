//! Terminal prompts built on dialoguer.

use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Select};

use crate::domain::ManifestTemplate;

use super::Confirmer;

/// Interactive prompt on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

/// Choice offered when a project has no manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestChoice {
    Create(ManifestTemplate),
    Exit,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }

    /// Ask which starter manifest to write
    pub fn choose_manifest(&self, manifest_name: &str) -> Result<ManifestChoice> {
        let choices = ["Create Sample Package", "Create Empty Package", "Exit"];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "The {manifest_name} package does not exist. Create it?"
            ))
            .items(&choices)
            .default(0)
            .interact()
            .context("Failed to read selection")?;

        Ok(match selection {
            0 => ManifestChoice::Create(ManifestTemplate::Sample),
            1 => ManifestChoice::Create(ManifestTemplate::Empty),
            _ => ManifestChoice::Exit,
        })
    }
}

impl Confirmer for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(true)
            .interact()
            .context("Failed to read confirmation")
    }
}

/// Confirmer that always gives the same answer (non-interactive runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_answer() {
        assert!(FixedAnswer(true).confirm("create?").unwrap());
        assert!(!FixedAnswer(false).confirm("create?").unwrap());
    }
}
