use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::config::DocumentedConfig;
use crate::common::paths;
use crate::documented_config;

/// Defaults shared by the timeline, tts and keyframes commands.
///
/// Command-line flags override every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub fps: u32,
    pub gap_frames: u32,
    pub pad_frames: u32,
    pub audio_dir: PathBuf,
    /// Percent change of TOTAL_FRAMES above which a rebuild asks for attention
    pub deviation_threshold: f64,
    pub tts_voice: String,
    pub tts_rate: String,
    pub keyframe_output_dir: PathBuf,
    pub keyframe_concurrency: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: Self::DEFAULT_FPS,
            gap_frames: 6,
            pad_frames: 15,
            audio_dir: PathBuf::from(Self::DEFAULT_AUDIO_DIR),
            deviation_threshold: Self::DEFAULT_DEVIATION_THRESHOLD,
            tts_voice: "zh-CN-XiaoxiaoNeural".to_string(),
            tts_rate: "-10%".to_string(),
            keyframe_output_dir: PathBuf::from("/tmp/style-check"),
            keyframe_concurrency: Self::DEFAULT_KEYFRAME_CONCURRENCY,
        }
    }
}

impl VideoConfig {
    pub const DEFAULT_FPS: u32 = 30;
    pub const DEFAULT_AUDIO_DIR: &'static str = "public/audio/narration";
    pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 20.0;
    pub const DEFAULT_KEYFRAME_CONCURRENCY: usize = 3;

    /// Load from an explicit path, or from the user config directory.
    pub fn load_or_default_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path_documented(&paths::expand_user_path(path)),
            None => Self::load(),
        }
    }

    fn repair(&mut self) {
        if self.fps == 0 {
            self.fps = Self::DEFAULT_FPS;
        }
        if !self.deviation_threshold.is_finite() || self.deviation_threshold < 0.0 {
            self.deviation_threshold = Self::DEFAULT_DEVIATION_THRESHOLD;
        }
        if self.keyframe_concurrency == 0 {
            self.keyframe_concurrency = Self::DEFAULT_KEYFRAME_CONCURRENCY;
        }
        if self.audio_dir.as_os_str().is_empty() {
            self.audio_dir = PathBuf::from(Self::DEFAULT_AUDIO_DIR);
        }
    }
}

documented_config!(VideoConfig,
    fps, "Frame rate of the compositions",
    gap_frames, "Silence between narration segments, in frames",
    pad_frames, "Padding at the start and end of every scene, in frames",
    audio_dir, "Narration audio directory, relative to the project directory",
    deviation_threshold, "Percent change of TOTAL_FRAMES that triggers a rate warning",
    tts_voice, "edge-tts voice name",
    tts_rate, "edge-tts speech rate, e.g. \"-10%\"",
    keyframe_output_dir, "Where keyframe screenshots are written",
    keyframe_concurrency, "Number of keyframes rendered at the same time",
    => paths::eduvid_config_dir().map(|dir| dir.join("video.toml"))
);
