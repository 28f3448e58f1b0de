//! `eduvid timeline`: re-derive scene timing from measured narration clips.

pub mod accumulate;
pub mod audio;
pub mod emit;

use anyhow::{Context, Result, bail};
use serde_json::json;

use self::accumulate::{TimelineParams, rebuild_timeline};
use self::audio::{SceneClips, measure_clips, scan_audio_dir};
use self::emit::{Deviation, generated_declarations, render_code_block, render_summary};
use super::cli::TimelineArgs;
use super::commands::CommandOutcome;
use super::config::VideoConfig;
use super::constants::{ConstantsFile, SceneDecl, patch};
use super::narration::resolve_segment_texts;
use super::project::ProjectLayout;
use super::support::ffmpeg::{FfprobeProber, MediaProber};
use super::support::utils::write_atomically;
use crate::common::deps::FFPROBE;
use crate::common::progress::create_counter;
use crate::ui::prelude::*;

/// Resolve timing parameters: flags, then constants.ts, then config.
fn timeline_params(
    args: &TimelineArgs,
    constants: &ConstantsFile,
    config: &VideoConfig,
) -> Result<TimelineParams> {
    let fps = args.fps.unwrap_or(config.fps);
    if fps == 0 {
        bail!("--fps must be greater than zero");
    }
    let transition_frames = match args.transition_frames {
        Some(frames) => frames,
        None => constants
            .integer_constant("TRANSITION_DURATION")?
            .unwrap_or(0),
    };
    Ok(TimelineParams {
        fps,
        gap_frames: args.gap_frames.unwrap_or(i64::from(config.gap_frames)),
        pad_frames: args.pad_frames.unwrap_or(i64::from(config.pad_frames)),
        transition_frames,
    })
}

/// Drop clip groups whose scene is not declared in `SCENES`, with a warning
/// for each.
fn drop_orphans(declared: &[SceneDecl], groups: &mut Vec<SceneClips>) {
    groups.retain(|group| {
        let known = declared.iter().any(|scene| scene.key == group.scene_key);
        if !known {
            emit(
                Level::Warn,
                "video.timeline.orphan_audio",
                &format!(
                    "Ignoring {} clip(s) for '{}': scene is not declared in SCENES",
                    group.clips.len(),
                    group.scene_key
                ),
                Some(json!({ "scene": group.scene_key, "clips": group.clips.len() })),
            );
        }
        known
    });
}

pub async fn handle_timeline(args: TimelineArgs, config: &VideoConfig) -> Result<CommandOutcome> {
    FFPROBE.require()?;
    run_timeline(args, config, &FfprobeProber::default()).await
}

pub async fn run_timeline(
    args: TimelineArgs,
    config: &VideoConfig,
    prober: &dyn MediaProber,
) -> Result<CommandOutcome> {
    let layout = ProjectLayout::from_args(&args.target);
    let constants = ConstantsFile::load(&layout.constants_path())?;

    let declared = constants.scenes()?;
    if declared.is_empty() {
        bail!("No scenes found in SCENES export");
    }
    let old_total = constants.integer_constant("TOTAL_FRAMES")?.unwrap_or(0);
    let params = timeline_params(&args, &constants, config)?;
    let audio_dir = layout.resolve(args.audio_dir.as_deref().unwrap_or(&config.audio_dir));

    let keys: Vec<&str> = declared.iter().map(|s| s.key.as_str()).collect();
    emit(
        Level::Info,
        "video.timeline.context",
        &format!("Composition: {}", layout.composition()),
        None,
    );
    emit(
        Level::Info,
        "video.timeline.context",
        &format!("Scenes: {} ({})", declared.len(), keys.join(", ")),
        None,
    );
    emit(
        Level::Info,
        "video.timeline.context",
        &format!("Original TOTAL_FRAMES: {old_total}"),
        None,
    );
    emit(
        Level::Info,
        "video.timeline.context",
        &format!("Audio directory: {}", audio_dir.display()),
        None,
    );
    emit(
        Level::Info,
        "video.timeline.context",
        &format!(
            "FPS: {}, GAP: {} frames, PAD: {} frames, TRANSITION: {} frames",
            params.fps, params.gap_frames, params.pad_frames, params.transition_frames
        ),
        None,
    );

    if !audio_dir.is_dir() {
        bail!("Audio directory not found: {}", audio_dir.display());
    }
    let mut groups = scan_audio_dir(&audio_dir)?;
    let clip_count: usize = groups.iter().map(|g| g.clips.len()).sum();
    if clip_count == 0 {
        bail!(
            "No audio files matching <sceneKey>-seg<NN>.mp3 found in {}",
            audio_dir.display()
        );
    }
    emit(
        Level::Info,
        "video.timeline.audio",
        &format!("Found {clip_count} audio files"),
        None,
    );
    drop_orphans(&declared, &mut groups);
    let measured_count: usize = groups.iter().map(|g| g.clips.len()).sum();

    let progress = create_counter(measured_count as u64, "Measuring audio durations");
    measure_clips(prober, &audio_dir, &mut groups, |clip| {
        progress.set_message(clip.filename.clone());
        progress.inc(1);
    })
    .await;
    progress.finish_and_clear();

    let failed: Vec<String> = groups
        .iter()
        .flat_map(|g| g.clips.iter())
        .filter(|clip| clip.measurement_failed())
        .map(|clip| clip.filename.clone())
        .collect();

    let texts = resolve_segment_texts(&constants, &layout.scenes_dir())?;
    match &texts {
        Some(texts) => emit(
            Level::Debug,
            "video.timeline.texts",
            &format!(
                "Segment texts from {} ({} segments)",
                texts.source.describe(),
                texts.segment_count()
            ),
            None,
        ),
        None => emit(
            Level::Warn,
            "video.timeline.texts",
            "No narration text found; AUDIO_SEGMENTS will use placeholders",
            None,
        ),
    }

    let timeline = rebuild_timeline(&declared, &groups, params);
    for scene in timeline.scenes.iter().filter(|s| s.clips.is_empty()) {
        emit(
            Level::Info,
            "video.timeline.no_audio",
            &format!(
                "  {}: no audio files, keeping original duration {}",
                scene.key, scene.old_duration
            ),
            None,
        );
    }

    let generated = generated_declarations(
        &timeline,
        texts.as_ref(),
        &layout.static_file_prefix(&audio_dir),
    );
    let deviation = Deviation::new(old_total, timeline.total_frames, config.deviation_threshold);

    if args.write {
        if failed.is_empty() {
            let patched = patch::apply(constants.source(), &generated)?;
            write_atomically(constants.path(), &patched).with_context(|| {
                format!("Failed to update {}", constants.path().display())
            })?;
            emit(
                Level::Success,
                "video.timeline.written",
                &format!("✅ constants.ts updated: {}", constants.path().display()),
                None,
            );
        } else {
            emit(
                Level::Error,
                "video.timeline.write_skipped",
                &format!(
                    "Not writing {}: {} clip(s) could not be measured",
                    constants.path().display(),
                    failed.len()
                ),
                None,
            );
        }
    } else {
        print_block("video.timeline.code", &render_code_block(&generated));
    }

    let mut summary = render_summary(&timeline, &deviation);
    if !failed.is_empty() {
        summary.push_str("\nFailed to measure:\n");
        for name in &failed {
            summary.push_str(&format!("  {name}\n"));
        }
    }
    separator(false);
    print_block("video.timeline.summary", &summary);

    if !failed.is_empty() {
        return Ok(CommandOutcome::Failed);
    }
    if deviation.exceeds_threshold() {
        return Ok(CommandOutcome::NeedsAttention);
    }
    Ok(CommandOutcome::Success)
}
