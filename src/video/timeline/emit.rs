//! Text rendering of a rebuilt timeline: generated TypeScript and the
//! human-readable summary.

use std::fmt::Write as _;

use super::accumulate::{Timeline, deviation_percent};
use crate::video::constants::patch::GeneratedDeclarations;
use crate::video::narration::SegmentTexts;
use crate::video::narration::resolve::placeholder_text;

pub const CODE_HEADER: &str = "// --- REBUILT TIMELINE (generated by eduvid timeline) ---";

/// Escape text for a single-quoted TypeScript string literal.
pub fn escape_single_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

fn seconds(frames: i64, fps: u32) -> f64 {
    frames as f64 / f64::from(fps)
}

fn render_scenes(timeline: &Timeline) -> String {
    let fps = timeline.params.fps;
    let mut out = String::from("export const SCENES = {\n");
    for scene in &timeline.scenes {
        let _ = writeln!(
            out,
            "  {}: {{ start: {}, duration: {} }}, // {:.1}s",
            scene.key,
            scene.start,
            scene.duration,
            seconds(scene.duration, fps)
        );
    }
    out.push_str("} as const;");
    out
}

fn render_total(timeline: &Timeline) -> String {
    format!(
        "export const TOTAL_FRAMES = {}; // {:.1} minutes",
        timeline.total_frames,
        seconds(timeline.total_frames, timeline.params.fps) / 60.0
    )
}

/// `file_prefix` is the audio directory as served by the framework, e.g.
/// `audio/narration`.
fn render_audio_segments(
    timeline: &Timeline,
    texts: Option<&SegmentTexts>,
    file_prefix: &str,
) -> String {
    let mut out = String::from("export const AUDIO_SEGMENTS = {\n");
    for scene in timeline.scenes.iter().filter(|s| !s.clips.is_empty()) {
        let _ = writeln!(out, "  {}: [", scene.key);
        for clip in &scene.clips {
            let text = match texts {
                Some(texts) => texts.text_for(&scene.key, clip.position),
                None => placeholder_text(clip.position),
            };
            let file = if file_prefix.is_empty() {
                clip.filename.clone()
            } else {
                format!("{file_prefix}/{}", clip.filename)
            };
            let _ = writeln!(
                out,
                "    {{ text: '{}', file: '{}', startFrame: {}, endFrame: {} }},",
                escape_single_quoted(&text),
                escape_single_quoted(&file),
                clip.start_frame,
                clip.end_frame
            );
        }
        out.push_str("  ],\n");
    }
    out.push_str("} as const;\n");
    out
}

pub fn generated_declarations(
    timeline: &Timeline,
    texts: Option<&SegmentTexts>,
    file_prefix: &str,
) -> GeneratedDeclarations {
    GeneratedDeclarations {
        scenes: render_scenes(timeline),
        total_frames: render_total(timeline),
        audio_segments: render_audio_segments(timeline, texts, file_prefix),
    }
}

/// The full code block printed when not writing in place.
pub fn render_code_block(generated: &GeneratedDeclarations) -> String {
    format!(
        "{CODE_HEADER}\n\n{}\n\n{}\n\n{}",
        generated.scenes, generated.total_frames, generated.audio_segments
    )
}

/// Deviation between declared and rebuilt totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub old_total: i64,
    pub new_total: i64,
    pub percent: f64,
    pub threshold: f64,
}

impl Deviation {
    pub fn new(old_total: i64, new_total: i64, threshold: f64) -> Self {
        Self {
            old_total,
            new_total,
            percent: deviation_percent(old_total, new_total),
            threshold,
        }
    }

    pub fn exceeds_threshold(&self) -> bool {
        self.percent.abs() > self.threshold
    }

    pub fn signed(&self) -> String {
        if self.percent >= 0.0 {
            format!("+{:.1}%", self.percent)
        } else {
            format!("{:.1}%", self.percent)
        }
    }

    /// Speech-rate advice when the rebuild drifted too far, if any.
    pub fn suggestion(&self) -> Option<&'static str> {
        if !self.exceeds_threshold() {
            None
        } else if self.percent > 0.0 {
            Some("Suggestion: increase --rate (e.g., \"+5%\" or \"+10%\") to shorten audio")
        } else {
            Some("Suggestion: decrease --rate (e.g., \"-15%\" or \"-20%\") to lengthen audio")
        }
    }
}

fn signed_frames(delta: i64) -> String {
    if delta >= 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

pub fn render_summary(timeline: &Timeline, deviation: &Deviation) -> String {
    let mut out = String::from("========== Timeline Rebuild Summary ==========\n");
    let _ = writeln!(out, "Original TOTAL_FRAMES: {}", deviation.old_total);
    let _ = writeln!(
        out,
        "New TOTAL_FRAMES: {} (change: {})",
        deviation.new_total,
        deviation.signed()
    );
    if let Some(suggestion) = deviation.suggestion() {
        let _ = writeln!(
            out,
            "⚠️  Deviation > {}%. Consider adjusting TTS --rate.",
            deviation.threshold
        );
        let _ = writeln!(out, "   {suggestion}");
    }
    out.push_str("\nScene changes:\n");
    for scene in &timeline.scenes {
        let _ = writeln!(
            out,
            "  {:<18} {} → {} frames ({})",
            scene.key,
            scene.old_duration,
            scene.duration,
            signed_frames(scene.delta())
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::narration::resolve::TextSource;
    use crate::video::timeline::accumulate::{ClipTiming, SceneTiming, TimelineParams};

    fn timeline() -> Timeline {
        Timeline {
            params: TimelineParams {
                fps: 30,
                gap_frames: 6,
                pad_frames: 15,
                transition_frames: 0,
            },
            scenes: vec![
                SceneTiming {
                    key: "hook".to_string(),
                    old_duration: 150,
                    start: 0,
                    duration: 181,
                    clips: vec![
                        ClipTiming {
                            position: 0,
                            filename: "hook-seg00.mp3".to_string(),
                            start_frame: 15,
                            end_frame: 60,
                        },
                        ClipTiming {
                            position: 1,
                            filename: "hook-seg01.mp3".to_string(),
                            start_frame: 66,
                            end_frame: 166,
                        },
                    ],
                },
                SceneTiming {
                    key: "outro".to_string(),
                    old_duration: 90,
                    start: 181,
                    duration: 90,
                    clips: Vec::new(),
                },
            ],
            total_frames: 271,
        }
    }

    fn texts() -> SegmentTexts {
        SegmentTexts::new(
            TextSource::Narration,
            vec![("hook".to_string(), vec!["It's \\ here".to_string()])],
        )
    }

    #[test]
    fn renders_code_block() {
        let generated = generated_declarations(&timeline(), Some(&texts()), "audio/narration");
        let block = render_code_block(&generated);
        let expected = "\
// --- REBUILT TIMELINE (generated by eduvid timeline) ---

export const SCENES = {
  hook: { start: 0, duration: 181 }, // 6.0s
  outro: { start: 181, duration: 90 }, // 3.0s
} as const;

export const TOTAL_FRAMES = 271; // 0.2 minutes

export const AUDIO_SEGMENTS = {
  hook: [
    { text: 'It\\'s \\\\ here', file: 'audio/narration/hook-seg00.mp3', startFrame: 15, endFrame: 60 },
    { text: '(segment 1)', file: 'audio/narration/hook-seg01.mp3', startFrame: 66, endFrame: 166 },
  ],
} as const;
";
        assert_eq!(block, expected);
    }

    #[test]
    fn escapes_line_breaks() {
        assert_eq!(escape_single_quoted("a\nb"), "a\\nb");
    }

    #[test]
    fn summary_lists_scene_changes() {
        let deviation = Deviation::new(240, 271, 20.0);
        let summary = render_summary(&timeline(), &deviation);
        assert!(summary.contains("Original TOTAL_FRAMES: 240\n"));
        assert!(summary.contains("New TOTAL_FRAMES: 271 (change: +12.9%)\n"));
        assert!(summary.contains("  hook               150 → 181 frames (+31)\n"));
        assert!(summary.contains("  outro              90 → 90 frames (+0)\n"));
        assert!(!summary.contains("Suggestion"));
    }

    #[test]
    fn large_deviation_suggests_rate_change() {
        let up = Deviation::new(570, 700, 20.0);
        assert_eq!(up.signed(), "+22.8%");
        assert!(up.exceeds_threshold());
        assert!(up.suggestion().unwrap().contains("increase --rate"));

        let down = Deviation::new(1000, 700, 20.0);
        assert_eq!(down.signed(), "-30.0%");
        assert!(down.suggestion().unwrap().contains("decrease --rate"));

        let edge = Deviation::new(1000, 1200, 20.0);
        assert!(!edge.exceeds_threshold());
    }

    #[test]
    fn missing_baseline_has_no_deviation() {
        let deviation = Deviation::new(0, 500, 20.0);
        assert_eq!(deviation.signed(), "+0.0%");
        assert!(deviation.suggestion().is_none());
    }
}
