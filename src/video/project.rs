use std::path::{Path, PathBuf};

use super::cli::CompositionArgs;
use crate::common::paths::{expand_user_path, to_slash_string};

/// Where a composition's files live inside a Remotion project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
    composition: String,
}

impl ProjectLayout {
    pub fn new(root: &Path, composition: &str) -> Self {
        Self {
            root: expand_user_path(root),
            composition: composition.to_string(),
        }
    }

    pub fn from_args(args: &CompositionArgs) -> Self {
        Self::new(&args.project_dir, &args.composition)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn composition_dir(&self) -> PathBuf {
        self.root.join("src").join(&self.composition)
    }

    pub fn constants_path(&self) -> PathBuf {
        self.composition_dir().join("constants.ts")
    }

    pub fn scenes_dir(&self) -> PathBuf {
        self.composition_dir().join("scenes")
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join("public")
    }

    /// Resolve a user path against the project root unless it is absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let expanded = expand_user_path(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.root.join(expanded)
        }
    }

    /// How the framework refers to a directory under `public/`, e.g.
    /// `audio/narration`. Directories outside `public/` keep their path.
    pub fn static_file_prefix(&self, dir: &Path) -> String {
        match dir.strip_prefix(self.public_dir()) {
            Ok(relative) => to_slash_string(relative),
            Err(_) => to_slash_string(dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_paths() {
        let layout = ProjectLayout::new(Path::new("/work/video"), "SkyBlue");
        assert_eq!(
            layout.constants_path(),
            PathBuf::from("/work/video/src/SkyBlue/constants.ts")
        );
        assert_eq!(layout.scenes_dir(), PathBuf::from("/work/video/src/SkyBlue/scenes"));
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let layout = ProjectLayout::new(Path::new("/work/video"), "SkyBlue");
        assert_eq!(
            layout.resolve(Path::new("public/audio/narration")),
            PathBuf::from("/work/video/public/audio/narration")
        );
        assert_eq!(layout.resolve(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn static_prefix_is_relative_to_public() {
        let layout = ProjectLayout::new(Path::new("."), "SkyBlue");
        let dir = layout.resolve(Path::new("public/audio/narration"));
        assert_eq!(layout.static_file_prefix(&dir), "audio/narration");

        let outside = layout.resolve(Path::new("recordings/take2"));
        assert_eq!(layout.static_file_prefix(&outside), "recordings/take2");
    }
}
