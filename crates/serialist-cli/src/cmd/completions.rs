use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate the completion script for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `srl` to stdout.
///
/// # Errors
///
/// Does not currently fail.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    generate(shell, command, "srl", &mut std::io::stdout().lock());
    Ok(())
}
