//! Completions command for the gofetch CLI.
//!
//! ```bash
//! gofetch completions bash > /etc/bash_completion.d/gofetch
//! gofetch completions zsh > "${fpath[1]}/_gofetch"
//! ```

use std::io::Write;

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::Cli;

/// Arguments for the completions command.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[clap(value_enum)]
    pub shell: Shell,
}

/// Writes the completion script for `args.shell` to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be flushed.
pub fn execute(args: &CompletionsArgs) -> Result<()> {
    let mut stdout = std::io::stdout();
    write_completions(args.shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, out);
}
