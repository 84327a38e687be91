#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "srl",
    author,
    version,
    about = "srl: continuity engine for serialized fiction",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags, environment and user config.
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a serialist project",
        long_about = "Create the project skeleton in the current directory, record the project \
                      metadata in the continuity store and write the chapter 1 request.",
        after_help = "EXAMPLES:\n    # Start a new serial\n    srl init --project tides --topic \"a harbour mystery\"\n\n    # Longer chapters, fewer threads in the digest\n    srl init --project tides --topic \"a harbour mystery\" --chapter-words 3000 --threads 3"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Write the request for the next chapter",
        long_about = "Rebuild chapters/NNNN/prompt_next.md from the current continuity state, \
                      the previous chapter's pack and the project's style sources.",
        after_help = "EXAMPLES:\n    # Request for the next chapter to draft\n    srl next\n\n    # Rebuild the request for chapter 4 and print it\n    srl next --chapter 4 --print"
    )]
    Next(cmd::next::NextArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Ingest a drafted chapter and its pack",
        long_about = "Split a response into chapter text and pack, validate the pack, store both \
                      under chapters/NNNN/, merge the pack into the continuity store and write \
                      the next request. Nothing is written when validation fails.",
        after_help = "EXAMPLES:\n    # Ingest from a saved response\n    srl ingest --chapter 3 --from-file response.md\n\n    # Ingest straight from the clipboard\n    pbpaste | srl ingest --chapter 3 --from-stdin"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        next_help_heading = "Inspection",
        about = "Validate a chapter pack without ingesting it",
        long_about = "Check a full response (with section markers) or a bare pack JSON document \
                      against the pack schema. Violations are listed by location.",
        after_help = "EXAMPLES:\n    # Check a response file\n    srl validate response.md\n\n    # Check a pack from stdin\n    cat pack.json | srl validate"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        next_help_heading = "Inspection",
        about = "Show progress and open threads",
        after_help = "EXAMPLES:\n    # Human summary\n    srl status\n\n    # For scripts\n    srl status --json"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Output",
        about = "Export all ingested chapters as one manuscript",
        after_help = "EXAMPLES:\n    # Plain text (default)\n    srl export\n\n    # Markdown with chapter headings\n    srl export --format markdown\n\n    # Word document\n    srl export --format docx"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Output",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    srl completions bash > ~/.local/share/bash-completion/completions/srl"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("SERIALIST_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "serialist=debug,srl=debug,info"
        } else {
            "serialist=info,srl=info,warn"
        })
    });

    let format = env::var("SERIALIST_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            let err = anyhow::Error::from(err).context("cannot read the current directory");
            // Nothing else can be reported if stderr is gone.
            let _ = output::render_error(output, &CliError::from(&err));
            return ExitCode::FAILURE;
        }
    };

    let command_result = match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, cli.quiet, &project_root),
        Commands::Next(ref args) => cmd::next::run_next(args, output, &project_root),
        Commands::Ingest(ref args) => {
            cmd::ingest::run_ingest(args, output, cli.quiet, &project_root)
        }
        Commands::Validate(ref args) => cmd::validate::run_validate(args, output),
        Commands::Status(ref args) => cmd::status::run_status(args, output, &project_root),
        Commands::Export(ref args) => cmd::export::run_export(args, output, &project_root),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };

    match command_result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            let _ = output::render_error(output, &CliError::from(&err));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["srl", "--json", "status"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["srl", "status", "--json"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn quiet_flag_parsed() {
        let cli = Cli::parse_from(["srl", "-q", "status"]);
        assert!(cli.quiet);
    }

    #[test]
    fn init_requires_project_and_topic() {
        assert!(Cli::try_parse_from(["srl", "init"]).is_err());
        assert!(Cli::try_parse_from(["srl", "init", "--project", "tides"]).is_err());
        let cli = Cli::parse_from(["srl", "init", "--project", "tides", "--topic", "harbour"]);
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.project, "tides");
                assert_eq!(args.topic, "harbour");
                assert_eq!(args.target_words, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn ingest_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["srl", "ingest", "--chapter", "2"]).is_err());
        assert!(
            Cli::try_parse_from([
                "srl",
                "ingest",
                "--chapter",
                "2",
                "--from-file",
                "r.md",
                "--from-stdin"
            ])
            .is_err()
        );
        let cli = Cli::parse_from(["srl", "ingest", "--chapter", "2", "--from-stdin"]);
        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.chapter, 2);
                assert!(args.source.from_stdin);
                assert!(args.source.from_file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn export_format_parses_aliases() {
        let cli = Cli::parse_from(["srl", "export", "--format", "md"]);
        assert!(matches!(
            cli.command,
            Commands::Export(cmd::export::ExportArgs {
                format: Some(serialist_core::export::ExportFormat::Markdown),
            })
        ));
    }

    #[test]
    fn export_format_accepts_docx() {
        let cli = Cli::parse_from(["srl", "export", "--format", "docx"]);
        assert!(matches!(
            cli.command,
            Commands::Export(cmd::export::ExportArgs {
                format: Some(serialist_core::export::ExportFormat::Docx),
            })
        ));
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["srl", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["srl", "init", "--project", "p", "--topic", "t"],
            vec!["srl", "next"],
            vec!["srl", "next", "--chapter", "3", "--print"],
            vec!["srl", "ingest", "--chapter", "1", "--from-file", "x.md"],
            vec!["srl", "validate"],
            vec!["srl", "validate", "pack.json"],
            vec!["srl", "status"],
            vec!["srl", "export"],
            vec!["srl", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?} - error: {:?}",
                args,
                result.err()
            );
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
