//! `patterns` command implementation.

use clap::Args;
use imgcaptions_filter::{Grammar, Rule};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the patterns command.
#[derive(Args)]
pub(crate) struct PatternsArgs {
    /// Only print the rule with this name (e.g. `markdown_image`).
    #[arg(short, long)]
    rule: Option<String>,
}

impl PatternsArgs {
    /// Execute the patterns command.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar fails to build or the rule is unknown.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let grammar = Grammar::shared()?;

        let rules = match self.rule.as_deref() {
            Some(name) => vec![find_rule(name)?],
            None => Rule::ALL.to_vec(),
        };
        for rule in rules {
            output.heading(rule.name())?;
            output.print(&format!("  {}\n", grammar.pattern(rule).delimited()))?;
        }
        Ok(())
    }
}

fn find_rule(name: &str) -> Result<Rule, CliError> {
    Rule::ALL
        .into_iter()
        .find(|rule| rule.name() == name)
        .ok_or_else(|| {
            let known: Vec<_> = Rule::ALL.iter().map(|rule| rule.name()).collect();
            CliError::Validation(format!(
                "Unknown rule '{name}' (expected one of: {})",
                known.join(", ")
            ))
        })
}
