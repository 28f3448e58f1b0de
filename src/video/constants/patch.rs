//! In-place rewriting of the generated declarations in `constants.ts`.

use super::ConstantsError;
use super::scanner::find_declaration;

/// Replacement text for the three generated declarations.
#[derive(Debug, Clone)]
pub struct GeneratedDeclarations {
    /// `export const SCENES = { ... } as const;`
    pub scenes: String,
    /// `export const TOTAL_FRAMES = N; // comment`
    pub total_frames: String,
    /// `export const AUDIO_SEGMENTS = { ... } as const;`
    pub audio_segments: String,
}

fn replace_declaration(
    source: &str,
    name: &str,
    replacement: &str,
) -> Result<String, ConstantsError> {
    let decl = find_declaration(source, name)?.ok_or_else(|| ConstantsError::Missing {
        name: name.to_string(),
    })?;
    let mut out = String::with_capacity(source.len() + replacement.len());
    out.push_str(&source[..decl.span.start]);
    out.push_str(replacement);
    out.push_str(&source[decl.span.end..]);
    Ok(out)
}

/// Remove a declaration together with the blank lines around it.
fn remove_declaration(source: &str, name: &str) -> Result<String, ConstantsError> {
    let Some(decl) = find_declaration(source, name)? else {
        return Ok(source.to_string());
    };
    let before = source[..decl.span.start].trim_end_matches(['\n', '\r', ' ', '\t']);
    let after = source[decl.span.end..].trim_start_matches(['\n', '\r']);
    let mut out = String::with_capacity(source.len());
    out.push_str(before);
    if !before.is_empty() {
        out.push('\n');
    }
    if !after.is_empty() {
        out.push('\n');
        out.push_str(after);
    }
    Ok(out)
}

/// Replace `SCENES` and `TOTAL_FRAMES`, then move a fresh `AUDIO_SEGMENTS`
/// to the end of the file. All other text is kept byte for byte.
///
/// Applying the same declarations twice yields the same file.
pub fn apply(source: &str, generated: &GeneratedDeclarations) -> Result<String, ConstantsError> {
    let updated = replace_declaration(source, "SCENES", &generated.scenes)?;
    let updated = replace_declaration(&updated, "TOTAL_FRAMES", &generated.total_frames)?;
    let updated = remove_declaration(&updated, "AUDIO_SEGMENTS")?;

    let mut out = updated.trim_end().to_string();
    out.push_str("\n\n");
    out.push_str(generated.audio_segments.trim_end());
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "import { x } from './x';\n\
\n\
export const SCENES = {\n\
  hook: { start: 0, duration: 150 },\n\
} as const;\n\
\n\
export const TOTAL_FRAMES =\n\
  SCENES.hook.start + SCENES.hook.duration;\n\
\n\
export const AUDIO_SEGMENTS = {\n\
  hook: [],\n\
} as const;\n\
\n\
export const NARRATION = { hook: '天空' };\n";

    fn generated() -> GeneratedDeclarations {
        GeneratedDeclarations {
            scenes: "export const SCENES = {\n  hook: { start: 0, duration: 181 }, // 6.0s\n} as const;".to_string(),
            total_frames: "export const TOTAL_FRAMES = 181; // 0.1 minutes".to_string(),
            audio_segments: "export const AUDIO_SEGMENTS = {\n  hook: [\n  ],\n} as const;\n".to_string(),
        }
    }

    #[test]
    fn replaces_and_moves_generated_blocks() {
        let patched = apply(ORIGINAL, &generated()).unwrap();
        assert!(patched.starts_with("import { x } from './x';\n\nexport const SCENES = {\n  hook: { start: 0, duration: 181 }, // 6.0s\n} as const;\n"));
        assert!(patched.contains("export const TOTAL_FRAMES = 181; // 0.1 minutes\n"));
        assert!(!patched.contains("SCENES.hook.start"));
        assert_eq!(patched.matches("AUDIO_SEGMENTS").count(), 1);
        assert!(patched.ends_with("export const NARRATION = { hook: '天空' };\n\nexport const AUDIO_SEGMENTS = {\n  hook: [\n  ],\n} as const;\n"));
    }

    #[test]
    fn second_application_is_byte_identical() {
        let once = apply(ORIGINAL, &generated()).unwrap();
        let twice = apply(&once, &generated()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn trailing_comment_on_total_is_not_duplicated() {
        let source = "export const SCENES = {} as const;\nexport const TOTAL_FRAMES = 90; // 0.1 minutes\n";
        let patched = apply(source, &generated()).unwrap();
        assert_eq!(patched.matches("minutes").count(), 1);
    }

    #[test]
    fn missing_total_frames_is_fatal() {
        let source = "export const SCENES = {} as const;\n";
        assert!(matches!(
            apply(source, &generated()),
            Err(ConstantsError::Missing { name }) if name == "TOTAL_FRAMES"
        ));
    }

    #[test]
    fn missing_scenes_is_fatal() {
        let source = "export const TOTAL_FRAMES = 1;\n";
        assert!(matches!(
            apply(source, &generated()),
            Err(ConstantsError::Missing { name }) if name == "SCENES"
        ));
    }
}
