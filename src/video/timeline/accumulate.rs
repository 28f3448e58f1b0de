//! Frame arithmetic for rebuilding a composition timeline.

use super::audio::SceneClips;
use crate::video::constants::SceneDecl;

/// Global timing parameters, all in frames except `fps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineParams {
    pub fps: u32,
    pub gap_frames: i64,
    pub pad_frames: i64,
    pub transition_frames: i64,
}

/// Scene-local placement of one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipTiming {
    /// Position within the scene's sorted clip list.
    pub position: usize,
    pub filename: String,
    pub start_frame: i64,
    pub end_frame: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTiming {
    pub key: String,
    pub old_duration: i64,
    pub start: i64,
    pub duration: i64,
    /// Empty when the scene had no audio and kept its declared duration.
    pub clips: Vec<ClipTiming>,
}

impl SceneTiming {
    pub fn delta(&self) -> i64 {
        self.duration - self.old_duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub params: TimelineParams,
    pub scenes: Vec<SceneTiming>,
    pub total_frames: i64,
}

/// `ceil(ms / 1000 * fps)`
pub fn duration_to_frames(duration_ms: u64, fps: u32) -> i64 {
    (duration_ms as f64 / 1000.0 * f64::from(fps)).ceil() as i64
}

/// Lay clips out one after another, `pad` frames in from the scene start
/// and `gap` frames apart. Returns the timings and the scene duration.
pub fn layout_scene(clips: &SceneClips, params: &TimelineParams) -> (Vec<ClipTiming>, i64) {
    let mut cursor = params.pad_frames;
    let mut timings = Vec::with_capacity(clips.clips.len());
    for (position, clip) in clips.clips.iter().enumerate() {
        let frames = duration_to_frames(clip.duration_ms, params.fps);
        let start_frame = cursor;
        let end_frame = cursor + frames;
        timings.push(ClipTiming {
            position,
            filename: clip.filename.clone(),
            start_frame,
            end_frame,
        });
        cursor = end_frame + params.gap_frames;
    }
    let duration = cursor - params.gap_frames + params.pad_frames;
    (timings, duration)
}

/// Rebuild every scene in declaration order and chain them, overlapping
/// neighbours by `transition_frames`.
pub fn rebuild_timeline(
    declared: &[SceneDecl],
    audio: &[SceneClips],
    params: TimelineParams,
) -> Timeline {
    let mut cursor: i64 = 0;
    let mut scenes = Vec::with_capacity(declared.len());

    for decl in declared {
        let (clips, duration) = match audio
            .iter()
            .find(|group| group.scene_key == decl.key && !group.clips.is_empty())
        {
            Some(group) => layout_scene(group, &params),
            None => (Vec::new(), decl.duration),
        };
        scenes.push(SceneTiming {
            key: decl.key.clone(),
            old_duration: decl.duration,
            start: cursor,
            duration,
            clips,
        });
        cursor += duration - params.transition_frames;
    }

    Timeline {
        params,
        scenes,
        total_frames: cursor + params.transition_frames,
    }
}

/// Signed percentage change from `old` to `new`; `0` without a baseline.
pub fn deviation_percent(old: i64, new: i64) -> f64 {
    if old == 0 {
        return 0.0;
    }
    (new - old) as f64 * 100.0 / old as f64
}
