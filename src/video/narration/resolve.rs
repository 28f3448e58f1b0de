use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use super::scene_key::derive_scene_key;
use super::split::split_narration_text;
use crate::ui::prelude::{Level, emit};
use crate::video::constants::{ConstantsFile, blank_comments, read_string_literal};

/// Where segment texts came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Narration,
    SceneSources,
}

impl TextSource {
    pub fn describe(self) -> &'static str {
        match self {
            TextSource::Narration => "NARRATION object in constants.ts",
            TextSource::SceneSources => "text fields in scene TSX files",
        }
    }
}

/// Ordered segment texts per scene key.
#[derive(Debug, Clone)]
pub struct SegmentTexts {
    pub source: TextSource,
    scenes: Vec<(String, Vec<String>)>,
}

impl SegmentTexts {
    pub fn new(source: TextSource, scenes: Vec<(String, Vec<String>)>) -> Self {
        Self { source, scenes }
    }

    pub fn scenes(&self) -> &[(String, Vec<String>)] {
        &self.scenes
    }

    pub fn for_scene(&self, key: &str) -> &[String] {
        self.scenes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, texts)| texts.as_slice())
            .unwrap_or(&[])
    }

    /// Text for the clip at `position` within a scene, or a visible
    /// placeholder when the scene has fewer texts than clips.
    pub fn text_for(&self, key: &str, position: usize) -> String {
        self.for_scene(key)
            .get(position)
            .cloned()
            .unwrap_or_else(|| placeholder_text(position))
    }

    pub fn segment_count(&self) -> usize {
        self.scenes.iter().map(|(_, texts)| texts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }
}

pub fn placeholder_text(position: usize) -> String {
    format!("(segment {position})")
}

/// Split every NARRATION entry into TTS-sized pieces.
pub fn texts_from_narration(entries: &[(String, String)]) -> SegmentTexts {
    let scenes = entries
        .iter()
        .map(|(key, text)| (key.clone(), split_narration_text(text)))
        .filter(|(_, pieces)| !pieces.is_empty())
        .collect();
    SegmentTexts::new(TextSource::Narration, scenes)
}

/// Literal `text:` fields of one scene component, in declaration order.
pub fn text_fields(source: &str) -> Result<Vec<String>> {
    let code = blank_comments(source);
    let field_re = Regex::new(r"\btext\s*:\s*")?;
    let mut texts = Vec::new();
    let mut cursor = 0;
    while let Some(m) = field_re.find_at(&code, cursor) {
        match read_string_literal(&code, m.end()) {
            Some((value, end)) => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    texts.push(trimmed.to_string());
                }
                cursor = end;
            }
            None => cursor = m.end(),
        }
    }
    Ok(texts)
}

fn scene_source_files(scenes_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(scenes_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "tsx"))
        .collect();
    files.sort();
    files
}

/// Collect texts from `scenes/**/*.tsx`, keyed by the derived scene key.
pub fn texts_from_scene_sources(scenes_dir: &Path) -> Result<SegmentTexts> {
    let mut scenes: Vec<(String, Vec<String>)> = Vec::new();

    for file in scene_source_files(scenes_dir) {
        let content = fs::read_to_string(&file)
            .with_context(|| format!("Failed to read scene source {}", file.display()))?;
        let texts = text_fields(&content)?;
        if texts.is_empty() {
            continue;
        }
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = derive_scene_key(&stem);

        if let Some(existing) = scenes.iter_mut().find(|(k, _)| *k == key) {
            emit(
                Level::Warn,
                "video.narration.duplicate_scene",
                &format!(
                    "Scene key '{key}' is derived from more than one file; using {}",
                    file.display()
                ),
                None,
            );
            existing.1 = texts;
        } else {
            scenes.push((key, texts));
        }
    }

    Ok(SegmentTexts::new(TextSource::SceneSources, scenes))
}

/// Resolve segment texts: the NARRATION map first, scene sources second.
///
/// Returns `None` when neither strategy finds any text.
pub fn resolve_segment_texts(
    constants: &ConstantsFile,
    scenes_dir: &Path,
) -> Result<Option<SegmentTexts>> {
    if let Some(entries) = constants.narration()? {
        let texts = texts_from_narration(&entries);
        if !texts.is_empty() {
            return Ok(Some(texts));
        }
    }

    let texts = texts_from_scene_sources(scenes_dir)?;
    Ok((!texts.is_empty()).then_some(texts))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_SOURCE: &str = r#"
import { SubtitleSequence } from "../SubtitleSequence";

// { text: 'commented out' }
const segments = [
  { text: '你有没有想过', startFrame: 15, endFrame: 50 },
  { text: "为什么天空是蓝色的", startFrame: 55, endFrame: 110 },
  { text: '   ' },
];
"#;

    #[test]
    fn extracts_text_fields_in_order() {
        let texts = text_fields(SCENE_SOURCE).unwrap();
        assert_eq!(texts, vec!["你有没有想过", "为什么天空是蓝色的"]);
    }

    #[test]
    fn narration_strategy_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let scenes_dir = dir.path().join("scenes");
        fs::create_dir_all(&scenes_dir).unwrap();
        fs::write(scenes_dir.join("Scene01Hook.tsx"), SCENE_SOURCE).unwrap();

        let constants = ConstantsFile::from_source(
            "constants.ts",
            "export const NARRATION = { hook: '秘密要从阳光说起。阳光看起来是白色的。' };\n",
        );
        let texts = resolve_segment_texts(&constants, &scenes_dir).unwrap().unwrap();
        assert_eq!(texts.source, TextSource::Narration);
        assert_eq!(
            texts.for_scene("hook"),
            &["秘密要从阳光说起。".to_string(), "阳光看起来是白色的。".to_string()]
        );
    }

    #[test]
    fn falls_back_to_scene_sources() {
        let dir = tempfile::tempdir().unwrap();
        let scenes_dir = dir.path().join("scenes");
        fs::create_dir_all(scenes_dir.join("nested")).unwrap();
        fs::write(scenes_dir.join("Scene01Hook.tsx"), SCENE_SOURCE).unwrap();
        fs::write(
            scenes_dir.join("nested").join("SummaryScene.tsx"),
            "const s = [{ text: '所以我们看到的蓝天' }];",
        )
        .unwrap();
        fs::write(scenes_dir.join("notes.ts"), "const x = { text: 'ignored' };").unwrap();

        let constants = ConstantsFile::from_source("constants.ts", "export const SCENES = {};\n");
        let texts = resolve_segment_texts(&constants, &scenes_dir).unwrap().unwrap();
        assert_eq!(texts.source, TextSource::SceneSources);
        assert_eq!(texts.for_scene("hook").len(), 2);
        assert_eq!(texts.for_scene("summary"), &["所以我们看到的蓝天".to_string()]);
        assert!(texts.for_scene("ignored").is_empty());
    }

    #[test]
    fn nothing_found_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let constants = ConstantsFile::from_source("constants.ts", "export const SCENES = {};\n");
        assert!(
            resolve_segment_texts(&constants, &dir.path().join("missing"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn missing_positions_get_placeholders() {
        let texts = SegmentTexts::new(
            TextSource::Narration,
            vec![("hook".to_string(), vec!["一".to_string()])],
        );
        assert_eq!(texts.text_for("hook", 0), "一");
        assert_eq!(texts.text_for("hook", 1), "(segment 1)");
        assert_eq!(texts.text_for("other", 0), "(segment 0)");
    }
}
