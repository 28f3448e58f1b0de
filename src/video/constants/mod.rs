//! Reading and rewriting a composition's `constants.ts`.

pub mod patch;
mod scanner;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

pub use self::scanner::Declaration;
pub(crate) use self::scanner::{blank_comments, read_string_literal};
use self::scanner::find_declaration;

#[derive(Debug, thiserror::Error)]
pub enum ConstantsError {
    #[error("could not find `export const {name}` in constants.ts")]
    Missing { name: String },
    #[error("`{name}` is not terminated (unbalanced brackets)")]
    Unterminated { name: String },
    #[error("`{name}` is malformed: {reason}")]
    Malformed { name: String, reason: String },
    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

/// One entry of the `SCENES` map, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneDecl {
    pub key: String,
    /// `None` when `start` is an expression rather than an integer literal.
    pub start: Option<i64>,
    pub duration: i64,
}

#[derive(Debug, Clone)]
pub struct ConstantsFile {
    path: PathBuf,
    source: String,
}

impl ConstantsFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("constants.ts not found: {}", path.display());
        }
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_source(path, source))
    }

    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn declaration(&self, name: &str) -> Result<Option<Declaration>, ConstantsError> {
        find_declaration(&self.source, name)
    }

    /// Object literal body of a declaration with comments blanked out, or
    /// `None` when the declaration does not exist.
    fn object_body(&self, name: &str) -> Result<Option<String>, ConstantsError> {
        let Some(decl) = self.declaration(name)? else {
            return Ok(None);
        };
        let init = blank_comments(&self.source[decl.initializer.clone()]);
        let open = init.find('{').filter(|&i| init[..i].trim().is_empty());
        let close = init.rfind('}');
        match (open, close) {
            (Some(open), Some(close)) if close > open => {
                Ok(Some(init[open + 1..close].to_string()))
            }
            _ => Err(ConstantsError::Malformed {
                name: name.to_string(),
                reason: "expected an object literal".to_string(),
            }),
        }
    }

    /// The `SCENES` map. Every entry needs an integer `duration`; `start`
    /// is optional.
    pub fn scenes(&self) -> Result<Vec<SceneDecl>, ConstantsError> {
        let body = self
            .object_body("SCENES")?
            .ok_or_else(|| ConstantsError::Missing {
                name: "SCENES".to_string(),
            })?;

        let entry_re = Regex::new(r#"['"]?([A-Za-z0-9_]+)['"]?\s*:\s*\{([^{}]*)\}"#)?;
        let start_re = Regex::new(r"\bstart\s*:\s*(-?\d+)\s*(?:,|$)")?;
        let duration_re = Regex::new(r"\bduration\s*:\s*(-?\d+)\s*(?:,|$)")?;

        let mut scenes = Vec::new();
        for caps in entry_re.captures_iter(&body) {
            let key = caps[1].to_string();
            let fields = &caps[2];
            let Some(duration) = duration_re
                .captures(fields)
                .and_then(|c| c[1].parse().ok())
            else {
                return Err(ConstantsError::Malformed {
                    name: "SCENES".to_string(),
                    reason: format!("scene '{key}' has no integer duration"),
                });
            };
            let start = start_re.captures(fields).and_then(|c| c[1].parse().ok());
            scenes.push(SceneDecl {
                key,
                start,
                duration,
            });
        }
        Ok(scenes)
    }

    /// The alternative `SCENE_FRAMES` map (`name: duration`), if declared.
    pub fn scene_frames(&self) -> Result<Option<Vec<(String, i64)>>, ConstantsError> {
        let Some(body) = self.object_body("SCENE_FRAMES")? else {
            return Ok(None);
        };
        let entry_re = Regex::new(r#"['"]?([A-Za-z0-9_]+)['"]?\s*:\s*(\d+)"#)?;
        let entries = entry_re
            .captures_iter(&body)
            .filter_map(|caps| Some((caps[1].to_string(), caps[2].parse().ok()?)))
            .collect();
        Ok(Some(entries))
    }

    /// Value of a constant whose initializer is a plain integer literal.
    ///
    /// Declarations initialized with an expression yield `None`.
    pub fn integer_constant(&self, name: &str) -> Result<Option<i64>, ConstantsError> {
        let Some(decl) = self.declaration(name)? else {
            return Ok(None);
        };
        let init = blank_comments(&self.source[decl.initializer]);
        let literal = init
            .trim()
            .trim_end_matches("as const")
            .trim()
            .replace('_', "");
        Ok(literal.parse().ok())
    }

    /// The `NARRATION` map (scene key to full spoken text), in declaration
    /// order. Entries whose value is not a plain string literal are skipped.
    pub fn narration(&self) -> Result<Option<Vec<(String, String)>>, ConstantsError> {
        let Some(body) = self.object_body("NARRATION")? else {
            return Ok(None);
        };

        let key_re = Regex::new(r#"(?:^|[,{\s])['"]?([A-Za-z0-9_]+)['"]?\s*:\s*"#)?;
        let mut entries = Vec::new();
        let mut cursor = 0;
        while let Some(caps) = key_re.captures_at(&body, cursor) {
            let Some(whole) = caps.get(0) else { break };
            let value_start = whole.end();
            match read_string_literal(&body, value_start) {
                Some((value, end)) => {
                    entries.push((caps[1].to_string(), value));
                    cursor = end;
                }
                None => cursor = value_start,
            }
        }
        Ok(Some(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONSTANTS: &str = r##"import { Easing } from "remotion";

export const COLORS = { primary: "#1a1a2e" };

// Phase 4: estimated durations
export const SCENES = {
  hook: { start: 0, duration: 150 }, // 5.0s
  'concept': { duration: 300, start: 150 },
  summary: { start: 450, duration: 120 },
} as const;

export const TRANSITION_DURATION = 20;

export const TOTAL_FRAMES = 570;

export const NARRATION: Record<string, string> = {
  hook: "你有没有想过，为什么天空是蓝色的？",
  concept:
    '秘密要从阳光说起。阳光看起来是白色的。',
  // summary: "commented out",
  summary: `所以我们看到的蓝天，就是散射的蓝色光。`,
} as const;
"##;

    fn file() -> ConstantsFile {
        ConstantsFile::from_source("constants.ts", CONSTANTS)
    }

    #[test]
    fn parses_scenes_in_declaration_order() {
        let scenes = file().scenes().unwrap();
        let keys: Vec<_> = scenes.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["hook", "concept", "summary"]);
        assert_eq!(scenes[1].start, Some(150));
        assert_eq!(scenes[1].duration, 300);
    }

    #[test]
    fn scenes_keep_expression_and_negative_starts() {
        let file = ConstantsFile::from_source(
            "c.ts",
            "export const SCENES = {\n  hook: { start: 0, duration: 60 },\n  outro: { start: HOOK_FRAMES, duration: 90 },\n  end: { start: -10, duration: 30 }, // 1.0s\n} as const;\n",
        );
        let scenes = file.scenes().unwrap();
        let keys: Vec<_> = scenes.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["hook", "outro", "end"]);
        assert_eq!(scenes[1].start, None);
        assert_eq!(scenes[1].duration, 90);
        assert_eq!(scenes[2].start, Some(-10));
    }

    #[test]
    fn scene_without_integer_duration_is_malformed() {
        let file = ConstantsFile::from_source(
            "c.ts",
            "export const SCENES = {\n  hook: { start: 0, duration: 60 },\n  outro: { start: 60, duration: OUTRO_FRAMES },\n};\n",
        );
        assert!(matches!(
            file.scenes(),
            Err(ConstantsError::Malformed { reason, .. }) if reason.contains("outro")
        ));
    }

    #[test]
    fn missing_scenes_is_reported() {
        let file = ConstantsFile::from_source("c.ts", "export const TOTAL_FRAMES = 1;\n");
        assert!(matches!(
            file.scenes(),
            Err(ConstantsError::Missing { name }) if name == "SCENES"
        ));
    }

    #[test]
    fn integer_constants() {
        let file = file();
        assert_eq!(file.integer_constant("TOTAL_FRAMES").unwrap(), Some(570));
        assert_eq!(file.integer_constant("TRANSITION_DURATION").unwrap(), Some(20));
        assert_eq!(file.integer_constant("TRANSITION_FRAMES").unwrap(), None);
    }

    #[test]
    fn expression_total_is_not_an_integer() {
        let file = ConstantsFile::from_source(
            "c.ts",
            "export const TOTAL_FRAMES = SCENES.summary.start + SCENES.summary.duration;\n",
        );
        assert_eq!(file.integer_constant("TOTAL_FRAMES").unwrap(), None);
    }

    #[test]
    fn narration_entries_skip_comments_and_keep_order() {
        let narration = file().narration().unwrap().unwrap();
        let keys: Vec<_> = narration.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["hook", "concept", "summary"]);
        assert_eq!(narration[2].1, "所以我们看到的蓝天，就是散射的蓝色光。");
    }

    #[test]
    fn narration_absent_is_none() {
        let file = ConstantsFile::from_source("c.ts", "export const SCENES = {};\n");
        assert!(file.narration().unwrap().is_none());
    }

    #[test]
    fn scene_frames_map() {
        let file = ConstantsFile::from_source(
            "c.ts",
            "export const SCENE_FRAMES = {\n  intro: 90,\n  outro: 60,\n};\nexport const TRANSITION_FRAMES = 10;\n",
        );
        let frames = file.scene_frames().unwrap().unwrap();
        assert_eq!(
            frames,
            vec![("intro".to_string(), 90), ("outro".to_string(), 60)]
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ConstantsFile::load(Path::new("/nonexistent/src/Demo/constants.ts")).unwrap_err();
        assert!(err.to_string().contains("constants.ts not found"));
    }
}
