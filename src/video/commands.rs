use anyhow::Result;
use std::process::ExitCode;

use super::cli::VideoCommands;
use super::config::VideoConfig;
use super::keyframes::handle_keyframes;
use super::timeline::handle_timeline;
use super::tts::handle_tts;

/// How a command finished, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Work completed, but the result should be reviewed (exit 2).
    NeedsAttention,
    /// Some items failed; a summary has already been printed (exit 1).
    Failed,
}

impl CommandOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            CommandOutcome::Success => 0,
            CommandOutcome::Failed => 1,
            CommandOutcome::NeedsAttention => 2,
        }
    }
}

impl From<CommandOutcome> for ExitCode {
    fn from(outcome: CommandOutcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

pub async fn handle_video_command(
    command: VideoCommands,
    config: &VideoConfig,
) -> Result<CommandOutcome> {
    match command {
        VideoCommands::Timeline(args) => handle_timeline(args, config).await,
        VideoCommands::Tts(args) => handle_tts(args, config).await,
        VideoCommands::Keyframes(args) => handle_keyframes(args, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(CommandOutcome::Success.exit_code(), 0);
        assert_eq!(CommandOutcome::Failed.exit_code(), 1);
        assert_eq!(CommandOutcome::NeedsAttention.exit_code(), 2);
    }
}
