use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Get the eduvid config directory, creating it if needed
pub fn eduvid_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("eduvid");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Expand `~` and environment variables in a user supplied path
pub fn expand_user_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

/// Render a path with forward slashes, as used inside generated TypeScript
pub fn to_slash_string(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_string_drops_current_dir_components() {
        let path = Path::new("./audio").join("narration");
        assert_eq!(to_slash_string(&path), "audio/narration");
        assert_eq!(to_slash_string(Path::new("/tmp/take2")), "/tmp/take2");
    }

    #[test]
    fn expand_leaves_plain_paths_alone() {
        let path = Path::new("public/audio/narration");
        assert_eq!(expand_user_path(path), PathBuf::from("public/audio/narration"));
    }
}
