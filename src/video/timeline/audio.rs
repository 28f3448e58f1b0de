use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::video::support::ffmpeg::{MediaProber, probe_duration_ms};

/// One narration clip on disk, named `<sceneKey>-seg<NN>.mp3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub segment_index: u32,
    pub filename: String,
    /// Measured length; `0` marks a failed measurement.
    pub duration_ms: u64,
}

impl AudioClip {
    pub fn measurement_failed(&self) -> bool {
        self.duration_ms == 0
    }
}

/// Clips of one scene, ascending by segment index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneClips {
    pub scene_key: String,
    pub clips: Vec<AudioClip>,
}

/// Parse `<sceneKey>-seg<NN>.mp3`; anything else is not a narration clip.
pub fn parse_clip_filename(pattern: &Regex, filename: &str) -> Option<(String, u32)> {
    let caps = pattern.captures(filename)?;
    let index = caps[2].parse().ok()?;
    Some((caps[1].to_string(), index))
}

pub fn clip_pattern() -> Result<Regex> {
    Ok(Regex::new(r"^([A-Za-z0-9_]+)-seg([0-9]+)\.mp3$")?)
}

/// List narration clips in `dir`, grouped by scene key in first-seen order
/// of the sorted file names. Durations are left at zero.
pub fn scan_audio_dir(dir: &Path) -> Result<Vec<SceneClips>> {
    let pattern = clip_pattern()?;
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read audio directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let mut groups: Vec<SceneClips> = Vec::new();
    for filename in names {
        let Some((scene_key, segment_index)) = parse_clip_filename(&pattern, &filename) else {
            continue;
        };
        let clip = AudioClip {
            segment_index,
            filename,
            duration_ms: 0,
        };
        match groups.iter_mut().find(|g| g.scene_key == scene_key) {
            Some(group) => group.clips.push(clip),
            None => groups.push(SceneClips {
                scene_key,
                clips: vec![clip],
            }),
        }
    }

    for group in &mut groups {
        group.clips.sort_by_key(|clip| clip.segment_index);
    }
    Ok(groups)
}

pub fn clip_path(dir: &Path, clip: &AudioClip) -> PathBuf {
    dir.join(&clip.filename)
}

/// Measure every clip one at a time, in scene then index order.
///
/// `on_measured` runs after each clip, for progress reporting.
pub async fn measure_clips(
    prober: &dyn MediaProber,
    dir: &Path,
    groups: &mut [SceneClips],
    mut on_measured: impl FnMut(&AudioClip),
) {
    for group in groups.iter_mut() {
        for clip in group.clips.iter_mut() {
            clip.duration_ms = probe_duration_ms(prober, &clip_path(dir, clip)).await;
            on_measured(clip);
        }
    }
}
