pub mod cli;
pub mod commands;
pub mod config;
mod constants;
mod keyframes;
mod narration;
mod project;
mod support;
mod timeline;
mod tts;

pub use cli::VideoCommands;
pub use commands::{CommandOutcome, handle_video_command};
pub use config::VideoConfig;
