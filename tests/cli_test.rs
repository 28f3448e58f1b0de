mod common;
mod utils;

use anyhow::Result;
use common::{COMPOSITION, TestEnvironment};

const CONSTANTS: &str = "\
export const SCENES = {
  hook: { start: 0, duration: 150 },
  outro: { start: 150, duration: 90 },
} as const;

export const TOTAL_FRAMES = 240;

export const NARRATION = {
  hook: '你有没有想过。天空为什么是蓝色的？',
};
";

fn project_with_clips(clips: &[(&str, &str)]) -> Result<TestEnvironment> {
    let env = TestEnvironment::new()?;
    env.write_constants(CONSTANTS)?;
    for (name, seconds) in clips {
        env.write_clip(name, seconds)?;
    }
    #[cfg(unix)]
    env.install_ffprobe_stub()?;
    Ok(env)
}

#[cfg(unix)]
#[test]
fn test_timeline_prints_rebuilt_code_and_summary() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "1.5"), ("hook-seg01.mp3", "2.21")])?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION])?;
    assert_eq!(output.exit_code, 0, "timeline failed: {}", output.stderr);

    assert!(output.stdout.contains("// --- REBUILT TIMELINE (generated by eduvid timeline) ---"));
    assert!(output.stdout.contains("  hook: { start: 0, duration: 148 }, // 4.9s"));
    assert!(output.stdout.contains("  outro: { start: 148, duration: 90 }, // 3.0s"));
    assert!(output.stdout.contains("export const TOTAL_FRAMES = 238; // 0.1 minutes"));
    assert!(output.stdout.contains(
        "{ text: '天空为什么是蓝色的？', file: 'audio/narration/hook-seg01.mp3', startFrame: 66, endFrame: 133 }"
    ));
    assert!(output.stdout.contains("New TOTAL_FRAMES: 238 (change: -0.8%)"));
    assert!(output.stdout.contains("Found 2 audio files"));

    // Printing never touches the file
    assert_eq!(utils::read_file(&env.constants_path())?, CONSTANTS);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_timeline_write_is_idempotent() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "1.5"), ("hook-seg01.mp3", "2.21")])?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION, "--write"])?;
    assert_eq!(output.exit_code, 0, "timeline --write failed: {}", output.stderr);
    assert!(!output.stdout.contains("REBUILT TIMELINE"));

    let written = utils::read_file(&env.constants_path())?;
    assert!(written.contains("export const TOTAL_FRAMES = 238; // 0.1 minutes\n"));
    assert!(written.contains("export const AUDIO_SEGMENTS = {\n  hook: [\n"));
    assert!(written.contains("export const NARRATION = {"));

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION, "--write"])?;
    assert_eq!(output.exit_code, 0);
    assert_eq!(utils::read_file(&env.constants_path())?, written);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_large_deviation_exits_with_two() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "10")])?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION])?;
    assert_eq!(output.exit_code, 2, "stdout: {}", output.stdout);
    assert!(output.stdout.contains("New TOTAL_FRAMES: 420 (change: +75.0%)"));
    assert!(output.stdout.contains("Deviation > 20%"));
    assert!(output.stdout.contains("increase --rate"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_threshold_from_settings_file() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "10")])?;
    std::fs::write(env.config_path(), "deviation_threshold = 80.0\n")?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION])?;
    assert_eq!(output.exit_code, 0, "stdout: {}", output.stdout);
    assert!(!output.stdout.contains("Suggestion"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unmeasurable_clip_blocks_write() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "1.5"), ("hook-seg01.mp3", "")])?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION, "--write"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stdout.contains("Failed to measure:"));
    assert!(output.stdout.contains("  hook-seg01.mp3"));
    assert!(output.stderr.contains("Not writing"));
    assert_eq!(utils::read_file(&env.constants_path())?, CONSTANTS);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_json_output_is_one_event_per_line() -> Result<()> {
    let env = project_with_clips(&[("hook-seg00.mp3", "1.5"), ("hook-seg01.mp3", "2.21")])?;

    let output = utils::run_eduvid(&env, &["--output", "json", "timeline", COMPOSITION])?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);

    let codes: Vec<String> = output
        .stdout
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line)
                .unwrap_or_else(|err| panic!("not JSON ({err}): {line}"));
            event["code"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert!(codes.iter().any(|c| c == "video.timeline.code"));
    assert!(codes.iter().any(|c| c == "video.timeline.summary"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_missing_constants_fails() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.install_ffprobe_stub()?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("constants.ts not found"), "{}", output.stderr);
    Ok(())
}

#[test]
fn test_tts_dry_run_lists_planned_clips() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_constants(CONSTANTS)?;

    let output = utils::run_eduvid(&env, &["tts", COMPOSITION, "--dry-run"])?;
    assert_eq!(output.exit_code, 0, "tts --dry-run failed: {}", output.stderr);
    assert!(output.stdout.contains("Extracted 2 segments"));
    assert!(output.stdout.contains("hook-seg00.mp3"));
    assert!(output.stdout.contains("hook-seg01.mp3"));
    assert!(!env.audio_dir().join("hook-seg00.mp3").exists());
    Ok(())
}

#[test]
fn test_unknown_flag_exits_with_one() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = utils::run_eduvid(&env, &["timeline", COMPOSITION, "--bogus"])?;
    assert_eq!(output.exit_code, 1);

    let output = utils::run_eduvid(&env, &["keyframes", COMPOSITION, "--frames-per-scene", "3"])?;
    assert_eq!(output.exit_code, 1);

    let output = utils::run_eduvid(&env, &["--help"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("timeline"));
    Ok(())
}

#[test]
fn test_completions_print_script() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = utils::run_eduvid(&env, &["completions", "bash"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("_eduvid()"));
    assert!(output.stdout.contains("keyframes"));
    Ok(())
}

#[test]
fn test_completions_install_to_path() -> Result<()> {
    let env = TestEnvironment::new()?;
    let target = env.root().join("completions").join("eduvid.bash");
    let target_arg = target.to_string_lossy().to_string();

    let output = utils::run_eduvid(
        &env,
        &["completions", "bash", "--install", "--path", &target_arg],
    )?;
    assert_eq!(output.exit_code, 0, "stderr: {}", output.stderr);
    assert!(utils::read_file(&target)?.contains("_eduvid()"));
    Ok(())
}
