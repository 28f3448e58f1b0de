//! `eduvid keyframes`: render review stills for every scene.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::process::Command;

use super::cli::KeyframesArgs;
use super::commands::CommandOutcome;
use super::config::VideoConfig;
use super::constants::{ConstantsFile, SceneDecl};
use super::project::ProjectLayout;
use super::support::utils::first_line;
use crate::common::deps::NPX;
use crate::common::progress::create_counter;
use crate::ui::prelude::*;

/// `TRANSITION_FRAMES` when a `SCENE_FRAMES` composition does not declare it.
pub const DEFAULT_TRANSITION_FRAMES: i64 = 15;
/// The last keyframe sits this many frames before the scene ends.
const TAIL_OFFSET: i64 = 30;
/// Scene count above which only two keyframes per scene are rendered.
const DENSE_SCENE_COUNT: usize = 10;
/// Upper bound for one `remotion still` invocation, bundling included.
pub const STILL_TIMEOUT: Duration = Duration::from_secs(180);

/// A scene placed on the global timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSpan {
    pub key: String,
    pub start: i64,
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyframe {
    pub scene: String,
    pub frame: i64,
}

impl Keyframe {
    pub fn filename(&self) -> String {
        format!("scene-{}-f{}.png", self.scene, self.frame)
    }
}

pub fn default_frames_per_scene(scene_count: usize) -> usize {
    if scene_count > DENSE_SCENE_COUNT { 2 } else { 4 }
}

/// Keyframes for every scene. With 4 per scene: start, one third, two
/// thirds and shortly before the end; with 2: the thirds only. Frames that
/// coincide within a scene are rendered once.
pub fn plan_keyframes(scenes: &[SceneSpan], per_scene: usize) -> Vec<Keyframe> {
    let mut seen = HashSet::new();
    let mut keyframes = Vec::new();
    for scene in scenes {
        let first_third = scene.start + scene.duration.div_euclid(3);
        let second_third = scene.start + (scene.duration * 2).div_euclid(3);
        let frames = if per_scene == 4 {
            vec![
                scene.start,
                first_third,
                second_third,
                scene.start.max(scene.start + scene.duration - TAIL_OFFSET),
            ]
        } else {
            vec![first_third, second_third]
        };
        for frame in frames {
            let keyframe = Keyframe {
                scene: scene.key.clone(),
                frame,
            };
            if seen.insert(keyframe.clone()) {
                keyframes.push(keyframe);
            }
        }
    }
    keyframes
}

/// `SCENE_FRAMES` durations chained into start offsets.
pub fn chain_scene_frames(entries: &[(String, i64)], transition_frames: i64) -> Vec<SceneSpan> {
    let mut start = 0;
    entries
        .iter()
        .map(|(key, duration)| {
            let scene = SceneSpan {
                key: key.clone(),
                start,
                duration: *duration,
            };
            start += duration - transition_frames;
            scene
        })
        .collect()
}

/// Declared `SCENES` entries as spans. A start that is not an integer
/// literal follows on from the previous scene.
pub fn place_declared_scenes(declared: &[SceneDecl], transition_frames: i64) -> Vec<SceneSpan> {
    let mut spans: Vec<SceneSpan> = Vec::with_capacity(declared.len());
    for decl in declared {
        let start = decl.start.unwrap_or_else(|| {
            spans
                .last()
                .map(|prev| prev.start + prev.duration - transition_frames)
                .unwrap_or(0)
        });
        spans.push(SceneSpan {
            key: decl.key.clone(),
            start,
            duration: decl.duration,
        });
    }
    spans
}

/// Scenes from `SCENES`, or from `SCENE_FRAMES` when `SCENES` is absent.
pub fn load_scenes(constants: &ConstantsFile) -> Result<Vec<SceneSpan>> {
    if constants.declaration("SCENES")?.is_some() {
        let transition = constants
            .integer_constant("TRANSITION_DURATION")?
            .unwrap_or(0);
        return Ok(place_declared_scenes(&constants.scenes()?, transition));
    }
    if let Some(entries) = constants.scene_frames()? {
        let transition = constants
            .integer_constant("TRANSITION_FRAMES")?
            .unwrap_or(DEFAULT_TRANSITION_FRAMES);
        return Ok(chain_scene_frames(&entries, transition));
    }
    bail!(
        "SCENES or SCENE_FRAMES export not found in {}",
        constants.path().display()
    )
}

/// Renders a single frame of a composition to an image.
#[async_trait]
pub trait StillRenderer: Send + Sync {
    async fn render_still(&self, composition: &str, frame: i64, output: &Path) -> Result<()>;
}

/// `npx remotion still`, run from the project root.
#[derive(Debug, Clone)]
pub struct RemotionStill {
    pub project_root: PathBuf,
    /// Launcher, `npx` unless overridden.
    pub program: PathBuf,
    pub timeout: Duration,
}

impl RemotionStill {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            program: PathBuf::from("npx"),
            timeout: STILL_TIMEOUT,
        }
    }
}

#[async_trait]
impl StillRenderer for RemotionStill {
    async fn render_still(&self, composition: &str, frame: i64, output: &Path) -> Result<()> {
        let child = Command::new(&self.program)
            .args(["remotion", "still", "--frame"])
            .arg(frame.to_string())
            .arg("--output")
            .arg(output)
            .arg(composition)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                anyhow!(
                    "remotion still timed out after {}s at frame {frame}",
                    self.timeout.as_secs()
                )
            })?
            .context("Failed to run npx remotion still")?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stdout = String::from_utf8_lossy(&result.stdout);
            let message = if stderr.trim().is_empty() { stdout } else { stderr };
            bail!("{}", first_line(&message));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RenderFailure {
    pub keyframe: Keyframe,
    pub error: String,
}

/// Render keyframes in batches of `concurrency`, collecting failures.
pub async fn render_all(
    renderer: &dyn StillRenderer,
    composition: &str,
    keyframes: &[Keyframe],
    output_dir: &Path,
    concurrency: usize,
) -> Vec<RenderFailure> {
    let progress = create_counter(keyframes.len() as u64, "Rendering keyframes");
    let mut failures = Vec::new();

    for batch in keyframes.chunks(concurrency.max(1)) {
        let renders = batch.iter().map(|keyframe| async move {
            let output = output_dir.join(keyframe.filename());
            let result = renderer
                .render_still(composition, keyframe.frame, &output)
                .await;
            (keyframe, result)
        });
        for (keyframe, result) in join_all(renders).await {
            progress.inc(1);
            if let Err(err) = result {
                let error = first_line(&format!("{err:#}")).to_string();
                emit(
                    Level::Warn,
                    "video.keyframes.failed",
                    &format!("  FAILED: {} frame {}: {error}", keyframe.scene, keyframe.frame),
                    None,
                );
                failures.push(RenderFailure {
                    keyframe: keyframe.clone(),
                    error,
                });
            }
        }
    }

    progress.finish_and_clear();
    failures
}

fn png_files(dir: &Path) -> Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".png"))
        .collect();
    names.sort();
    Ok(names)
}

/// Remove screenshots left over from a previous run.
fn clean_old_screenshots(dir: &Path) -> Result<usize> {
    let old = png_files(dir)?;
    for name in &old {
        let path = dir.join(name);
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(old.len())
}

pub fn render_summary(
    total: usize,
    failures: &[RenderFailure],
    output_dir: &Path,
    files: &[String],
) -> String {
    let mut out = String::from("========== Render Summary ==========\n");
    let _ = writeln!(out, "Total:   {total}");
    let _ = writeln!(out, "Success: {}", total - failures.len());
    let _ = writeln!(out, "Failed:  {}", failures.len());

    if !failures.is_empty() {
        out.push_str("\nFailed frames:\n");
        for failure in failures {
            let _ = writeln!(
                out,
                "  - {} frame {}: {}",
                failure.keyframe.scene, failure.keyframe.frame, failure.error
            );
        }
    }

    let _ = writeln!(out, "\nGenerated files ({}):", files.len());
    for file in files {
        let _ = writeln!(out, "  {}", output_dir.join(file).display());
    }
    out
}

pub async fn handle_keyframes(args: KeyframesArgs, config: &VideoConfig) -> Result<CommandOutcome> {
    NPX.require()?;
    let renderer = RemotionStill::new(ProjectLayout::from_args(&args.target).root());
    run_keyframes(args, config, &renderer).await
}

pub async fn run_keyframes(
    args: KeyframesArgs,
    config: &VideoConfig,
    renderer: &dyn StillRenderer,
) -> Result<CommandOutcome> {
    let layout = ProjectLayout::from_args(&args.target);
    let constants = ConstantsFile::load(&layout.constants_path())?;
    let scenes = load_scenes(&constants)?;

    let per_scene = args
        .frames_per_scene
        .map(|choice| choice.count())
        .unwrap_or_else(|| default_frames_per_scene(scenes.len()));
    let concurrency = args.concurrency.unwrap_or(config.keyframe_concurrency);
    if concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }
    emit(
        Level::Info,
        "video.keyframes.plan",
        &format!("Scenes: {}, frames per scene: {per_scene}", scenes.len()),
        None,
    );

    let output_dir = layout.resolve(
        args.output_dir
            .as_deref()
            .unwrap_or(&config.keyframe_output_dir),
    );
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let cleaned = clean_old_screenshots(&output_dir)?;
    if cleaned > 0 {
        emit(
            Level::Info,
            "video.keyframes.clean",
            &format!("Cleaning {cleaned} old screenshots..."),
            None,
        );
    }

    let keyframes = plan_keyframes(&scenes, per_scene);
    emit(
        Level::Info,
        "video.keyframes.total",
        &format!("Total keyframes to render: {}", keyframes.len()),
        None,
    );
    emit(
        Level::Info,
        "video.keyframes.output",
        &format!("Output directory: {}", output_dir.display()),
        None,
    );

    let failures = render_all(
        renderer,
        layout.composition(),
        &keyframes,
        &output_dir,
        concurrency,
    )
    .await;

    let files = png_files(&output_dir)?;
    separator(false);
    print_block(
        "video.keyframes.summary",
        &render_summary(keyframes.len(), &failures, &output_dir, &files),
    );

    if failures.is_empty() {
        Ok(CommandOutcome::Success)
    } else {
        Ok(CommandOutcome::Failed)
    }
}
