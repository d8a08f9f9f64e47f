//! Interactive mode prompts.
//!
//! Reads from any `BufRead` so the prompt loops are testable without a
//! terminal. Empty or unrecognized input re-prompts; end of input is an
//! error rather than a spin.
use crate::cli::Action;
use crate::workspace::{self, Workspace};
use anyhow::{anyhow, Context, Result};
use std::io::{self, BufRead, Write};

/// What the operator picked at the action prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Run(Action),
    Exit,
}

/// Prompt until the operator names a workspace from the listing.
pub fn prompt_workspace<'a>(
    workspaces: &'a [Workspace],
    input: &mut impl BufRead,
) -> Result<&'a Workspace> {
    loop {
        prompt("\nEnter the Workspace ID of the workspace you want to control: ");
        let line = read_line(input)?;
        if line.is_empty() {
            continue;
        }
        match workspace::find_by_id(workspaces, &line) {
            Some(found) => return Ok(found),
            None => println!("No workspace with ID {line}"),
        }
    }
}

/// Prompt until the operator picks apply, destroy, or exit.
pub fn prompt_action(input: &mut impl BufRead) -> Result<Choice> {
    loop {
        prompt("Enter D for a destroy run, A for an apply run, or E to exit: ");
        let line = read_line(input)?;
        if line.eq_ignore_ascii_case("a") {
            return Ok(Choice::Run(Action::Apply));
        }
        if line.eq_ignore_ascii_case("d") {
            return Ok(Choice::Run(Action::Destroy));
        }
        if line.eq_ignore_ascii_case("e") {
            return Ok(Choice::Exit);
        }
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = io::stdout().flush();
}

fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("read stdin")?;
    if read == 0 {
        return Err(anyhow!("input closed before a choice was made"));
    }
    Ok(line.trim().to_string())
}
