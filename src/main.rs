mod common;
mod completions;
mod ui;
mod video;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueHint};

use crate::completions::CompletionArgs;
use crate::ui::prelude::*;
use crate::video::{CommandOutcome, VideoCommands, VideoConfig, handle_video_command};

/// Narration, timeline and keyframe tooling for Remotion explainer videos
#[derive(Parser, Debug)]
#[command(name = "eduvid", author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format for messages and summaries
    #[arg(long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (default: ~/.config/eduvid/video.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Video(VideoCommands),
    /// Print or install shell completions
    Completions(CompletionArgs),
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

fn run_completions(args: CompletionArgs) -> anyhow::Result<CommandOutcome> {
    if !args.install {
        print_block("completions.script", &completions::generate(args.shell)?);
        return Ok(CommandOutcome::Success);
    }
    let path = completions::install(args.shell, args.path, args.force)?;
    emit(
        Level::Success,
        "completions.installed",
        &format!("Installed {} completions to {}", args.shell, path.display()),
        None,
    );
    emit(
        Level::Info,
        "completions.instructions",
        &completions::instructions(args.shell, &path),
        None,
    );
    Ok(CommandOutcome::Success)
}

async fn run(cli: Cli) -> anyhow::Result<CommandOutcome> {
    match cli.command {
        Commands::Completions(args) => run_completions(args),
        Commands::Video(command) => {
            let config = VideoConfig::load_or_default_path(cli.config.as_deref())?;
            emit(
                Level::Debug,
                "config.loaded",
                &format!("Settings: {config:?}"),
                None,
            );
            handle_video_command(command, &config).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Exit code 2 is reserved for the timeline deviation warning
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    ui::set_debug_mode(cli.debug);
    ui::init(cli.output, !cli.no_color && std::io::stdout().is_terminal());

    match run(cli).await {
        Ok(outcome) => outcome.into(),
        Err(err) => {
            emit(Level::Error, "error", &format!("Error: {err:#}"), None);
            ExitCode::FAILURE
        }
    }
}
