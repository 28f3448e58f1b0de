use clap::{Args, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum VideoCommands {
    /// Rebuild SCENES, TOTAL_FRAMES and AUDIO_SEGMENTS from measured narration clips
    Timeline(TimelineArgs),
    /// Generate narration clips with edge-tts
    Tts(TtsArgs),
    /// Render keyframe screenshots for visual review
    Keyframes(KeyframesArgs),
}

/// Arguments shared by every command that works on one composition.
#[derive(Args, Debug, Clone)]
pub struct CompositionArgs {
    /// Composition name; the folder under src/ holding constants.ts
    pub composition: String,

    /// Remotion project root (the directory containing src/ and public/)
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    pub project_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub target: CompositionArgs,

    /// Directory with <scene>-seg<NN>.mp3 clips, relative to the project root
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub audio_dir: Option<PathBuf>,

    /// Frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Frames between consecutive clips of a scene
    #[arg(long = "gap")]
    pub gap_frames: Option<i64>,

    /// Frames before the first and after the last clip of a scene
    #[arg(long = "pad")]
    pub pad_frames: Option<i64>,

    /// Crossfade overlap between scenes (default: TRANSITION_DURATION or 0)
    #[arg(long = "transition")]
    pub transition_frames: Option<i64>,

    /// Rewrite constants.ts in place instead of printing the code
    #[arg(long)]
    pub write: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TtsArgs {
    #[command(flatten)]
    pub target: CompositionArgs,

    /// edge-tts voice name
    #[arg(long)]
    pub voice: Option<String>,

    /// Speech rate passed to edge-tts, e.g. "-10%" or "+5%"
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<String>,

    /// Where to write the clips, relative to the project root
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// List the segments that would be synthesized without calling edge-tts
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct KeyframesArgs {
    #[command(flatten)]
    pub target: CompositionArgs,

    /// Directory for the rendered PNG files
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Keyframes per scene (default: 4 up to 10 scenes, otherwise 2)
    #[arg(long, value_enum)]
    pub frames_per_scene: Option<FramesPerScene>,

    /// Number of renders running at once
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramesPerScene {
    #[value(name = "2")]
    Two,
    #[value(name = "4")]
    Four,
}

impl FramesPerScene {
    pub fn count(self) -> usize {
        match self {
            FramesPerScene::Two => 2,
            FramesPerScene::Four => 4,
        }
    }
}
