use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tokio::process::Command;

use crate::ui::prelude::{Level, emit};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Measures playback durations of media files.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn duration_seconds(&self, path: &Path) -> Result<f64>;
}

#[derive(Debug, Clone)]
pub struct FfprobeProber {
    pub timeout: Duration,
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn duration_seconds(&self, path: &Path) -> Result<f64> {
        let child = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                anyhow!(
                    "ffprobe timed out after {}s for {}",
                    self.timeout.as_secs(),
                    path.display()
                )
            })?
            .with_context(|| format!("Failed to run ffprobe for {}", path.display()))?;

        if !output.status.success() {
            bail!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_duration_output(stdout: &str) -> Result<f64> {
    let value = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .context("ffprobe returned no duration")?;
    let seconds: f64 = value
        .parse()
        .with_context(|| format!("Failed to parse ffprobe duration '{value}' as f64"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("ffprobe reported an invalid duration '{value}'");
    }
    Ok(seconds)
}

pub fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

/// Probe a clip in milliseconds; `0` marks a failed measurement.
///
/// Failures are reported as warnings so one bad clip does not stop a batch.
pub async fn probe_duration_ms(prober: &dyn MediaProber, path: &Path) -> u64 {
    match prober.duration_seconds(path).await {
        Ok(seconds) => seconds_to_millis(seconds),
        Err(error) => {
            emit(
                Level::Warn,
                "video.probe.failed",
                &format!("  Failed to measure {}: {error:#}", path.display()),
                None,
            );
            0
        }
    }
}
