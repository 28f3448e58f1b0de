use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const COMPOSITION: &str = "SkyBlue";

/// A throwaway Remotion project plus an isolated settings file and a
/// `bin/` directory placed first on PATH for stub tools.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let env = Self {
            temp_dir: tempfile::tempdir()?,
        };
        fs::create_dir_all(env.composition_dir())?;
        fs::create_dir_all(env.audio_dir())?;
        fs::create_dir_all(env.bin_dir())?;
        Ok(env)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn composition_dir(&self) -> PathBuf {
        self.root().join("src").join(COMPOSITION)
    }

    pub fn constants_path(&self) -> PathBuf {
        self.composition_dir().join("constants.ts")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root().join("public").join("audio").join("narration")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root().join("bin")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("video.toml")
    }

    pub fn write_constants(&self, contents: &str) -> Result<()> {
        fs::write(self.constants_path(), contents)?;
        Ok(())
    }

    /// Create a clip whose contents the stub ffprobe reports as its
    /// duration in seconds. An empty `seconds` makes probing fail.
    pub fn write_clip(&self, name: &str, seconds: &str) -> Result<()> {
        fs::write(self.audio_dir().join(name), seconds)?;
        Ok(())
    }

    /// Install a fake `ffprobe` that answers `-version` and prints the
    /// probed file's contents as its duration.
    #[cfg(unix)]
    pub fn install_ffprobe_stub(&self) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let script = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffprobe version stub"
    exit 0
fi
for last; do :; done
if [ ! -s "$last" ]; then
    echo "$last: Invalid data found when processing input" >&2
    exit 1
fi
cat "$last"
"#;
        let path = self.bin_dir().join("ffprobe");
        fs::write(&path, script)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(())
    }

    pub fn path_var(&self) -> String {
        let inherited = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", self.bin_dir().display(), inherited)
    }
}
