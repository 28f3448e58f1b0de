//! `eduvid tts`: synthesize one narration clip per segment with edge-tts.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use tokio::process::Command;

use super::cli::TtsArgs;
use super::commands::CommandOutcome;
use super::config::VideoConfig;
use super::constants::ConstantsFile;
use super::narration::{Preprocessor, SegmentTexts, resolve_segment_texts};
use super::project::ProjectLayout;
use super::support::utils::first_line;
use crate::common::deps::EDGE_TTS;
use crate::common::progress::create_counter;
use crate::ui::prelude::*;

pub const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// One clip to synthesize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsSegment {
    pub scene_key: String,
    pub index: usize,
    /// Text as written in the narration.
    pub text: String,
    /// Text after speech preprocessing.
    pub spoken: String,
}

impl TtsSegment {
    pub fn filename(&self) -> String {
        format!("{}-seg{:02}.mp3", self.scene_key, self.index)
    }
}

pub fn plan_segments(texts: &SegmentTexts, preprocessor: &Preprocessor) -> Vec<TtsSegment> {
    texts
        .scenes()
        .iter()
        .flat_map(|(key, pieces)| {
            pieces.iter().enumerate().map(move |(index, text)| TtsSegment {
                scene_key: key.clone(),
                index,
                text: text.clone(),
                spoken: preprocessor.apply(text),
            })
        })
        .collect()
}

/// Turns text into an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct EdgeTts {
    pub voice: String,
    pub rate: String,
    pub timeout: Duration,
}

#[async_trait]
impl SpeechSynthesizer for EdgeTts {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
        let mut write_media = std::ffi::OsString::from("--write-media=");
        write_media.push(output.as_os_str());

        let child = Command::new("edge-tts")
            .arg(format!("--voice={}", self.voice))
            .arg(format!("--rate={}", self.rate))
            .arg(format!("--text={text}"))
            .arg(write_media)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| anyhow!("edge-tts timed out after {}s", self.timeout.as_secs()))?
            .context("Failed to run edge-tts")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("{}", first_line(&stderr));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TtsResult {
    pub filename: String,
    pub error: Option<String>,
}

/// Synthesize every segment in order, continuing past failures.
pub async fn generate_all(
    synthesizer: &dyn SpeechSynthesizer,
    segments: &[TtsSegment],
    output_dir: &Path,
) -> Vec<TtsResult> {
    let progress = create_counter(segments.len() as u64, "Generating narration");
    let mut results = Vec::with_capacity(segments.len());
    for segment in segments {
        let filename = segment.filename();
        progress.set_message(filename.clone());
        let error = synthesizer
            .synthesize(&segment.spoken, &output_dir.join(&filename))
            .await
            .err()
            .map(|err| first_line(&format!("{err:#}")).to_string());
        if let Some(error) = &error {
            emit(
                Level::Debug,
                "video.tts.segment_failed",
                &format!("{filename}: {error}"),
                None,
            );
        }
        results.push(TtsResult { filename, error });
        progress.inc(1);
    }
    progress.finish_and_clear();
    results
}

pub fn render_summary(segments: &[TtsSegment], results: &[TtsResult], output_dir: &Path) -> String {
    let mut scene_keys: Vec<&str> = segments.iter().map(|s| s.scene_key.as_str()).collect();
    scene_keys.dedup();
    let failed: Vec<&TtsResult> = results.iter().filter(|r| r.error.is_some()).collect();

    let mut out = String::from("========== TTS Generation Summary ==========\n");
    let _ = writeln!(
        out,
        "Scenes: {}, Total segments: {}",
        scene_keys.len(),
        segments.len()
    );
    let _ = writeln!(
        out,
        "Success: {}, Failed: {}",
        results.len() - failed.len(),
        failed.len()
    );
    let _ = writeln!(out, "Output: {}/", output_dir.display());

    if !failed.is_empty() {
        out.push_str("\nFailed:\n");
        for result in &failed {
            let _ = writeln!(
                out,
                "  {}: {}",
                result.filename,
                result.error.as_deref().unwrap_or_default()
            );
        }
    }

    out.push_str("\nFiles:\n");
    for result in results.iter().filter(|r| r.error.is_none()) {
        let _ = writeln!(out, "  {}", result.filename);
    }
    out
}

fn render_plan(segments: &[TtsSegment]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Text", "Spoken"]);
    for segment in segments {
        table.add_row(vec![
            segment.filename(),
            segment.text.clone(),
            segment.spoken.clone(),
        ]);
    }
    format!("{table}\n")
}

fn output_dir(args: &TtsArgs, config: &VideoConfig, layout: &ProjectLayout) -> PathBuf {
    layout.resolve(args.output_dir.as_deref().unwrap_or(&config.audio_dir))
}

pub async fn handle_tts(args: TtsArgs, config: &VideoConfig) -> Result<CommandOutcome> {
    if !args.dry_run {
        EDGE_TTS.require()?;
    }
    let synthesizer = EdgeTts {
        voice: args.voice.clone().unwrap_or_else(|| config.tts_voice.clone()),
        rate: args.rate.clone().unwrap_or_else(|| config.tts_rate.clone()),
        timeout: SYNTHESIS_TIMEOUT,
    };
    run_tts(args, config, &synthesizer).await
}

pub async fn run_tts(
    args: TtsArgs,
    config: &VideoConfig,
    synthesizer: &dyn SpeechSynthesizer,
) -> Result<CommandOutcome> {
    let layout = ProjectLayout::from_args(&args.target);
    let constants = ConstantsFile::load(&layout.constants_path())?;

    let Some(texts) = resolve_segment_texts(&constants, &layout.scenes_dir())? else {
        bail!(
            "Could not extract subtitle text. Expected either a NARRATION object in \
             constants.ts or text fields in scene TSX files."
        );
    };
    let preprocessor = Preprocessor::new()?;
    let segments = plan_segments(&texts, &preprocessor);

    emit(
        Level::Info,
        "video.tts.source",
        &format!("Text source: {}", texts.source.describe()),
        None,
    );
    emit(
        Level::Info,
        "video.tts.segments",
        &format!("Extracted {} segments", segments.len()),
        None,
    );

    let output_dir = output_dir(&args, config, &layout);
    if args.dry_run {
        print_block("video.tts.plan", &render_plan(&segments));
        return Ok(CommandOutcome::Success);
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let results = generate_all(synthesizer, &segments, &output_dir).await;
    separator(false);
    print_block(
        "video.tts.summary",
        &render_summary(&segments, &results, &output_dir),
    );

    if results.iter().any(|r| r.error.is_some()) {
        Ok(CommandOutcome::Failed)
    } else {
        Ok(CommandOutcome::Success)
    }
}
