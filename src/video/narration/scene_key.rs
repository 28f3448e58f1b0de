/// Derive a scene key from a scene component's file stem.
///
/// `Scene01Hook` becomes `hook`, `HookScene` becomes `hook`; a stem that is
/// nothing but the affixes falls back to its lowercase form.
pub fn derive_scene_key(stem: &str) -> String {
    let mut key = stem;
    if let Some(rest) = key.strip_prefix("Scene") {
        key = rest.trim_start_matches(|c: char| c.is_ascii_digit());
    }
    let key = key.strip_suffix("Scene").unwrap_or(key);

    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => stem.to_lowercase(),
    }
}
