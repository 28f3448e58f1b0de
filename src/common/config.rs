//! Documented configuration files
//!
//! Settings are stored as TOML with a trailing comment on every field, so a
//! freshly generated file doubles as its own reference.
//!
//! ```ignore
//! documented_config!(VideoConfig,
//!     fps, "Frame rate of the composition",
//!     gap_frames, "Silence between narration segments, in frames",
//!     => paths::eduvid_config_dir().map(|dir| dir.join("video.toml"))
//! );
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata about a configuration field
#[derive(Debug, Clone)]
pub struct ConfigFieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

/// Configs that can write themselves with inline documentation.
///
/// Implemented through the `documented_config!` macro.
pub trait DocumentedConfig: Sized + Default + serde::Serialize {
    fn field_metadata() -> Vec<ConfigFieldMeta>;

    /// TOML rendering of a single field, e.g. `30` or `"public/audio"`
    fn field_value(&self, field_name: &str) -> Option<String>;

    fn default_path() -> Result<PathBuf>;

    /// Called after deserialization to repair out-of-range values.
    fn sanitize(&mut self) {}

    fn render_documented(&self) -> String {
        let mut output = String::new();
        for field in Self::field_metadata() {
            let Some(value) = self.field_value(field.name) else {
                continue;
            };
            output.push_str(&format!(
                "{} = {}  # {}\n",
                field.name, value, field.description
            ));
        }
        output
    }

    fn save_with_documentation(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        fs::write(path, self.render_documented())
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Load from `path`, writing a documented default file when it is missing.
    fn load_from_path_documented(path: &Path) -> Result<Self>
    where
        for<'de> Self: serde::de::Deserialize<'de>,
    {
        if !path.exists() {
            let config = Self::default();
            config.save_with_documentation(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    fn load() -> Result<Self>
    where
        for<'de> Self: serde::de::Deserialize<'de>,
    {
        Self::load_from_path_documented(&Self::default_path()?)
    }
}

/// Implements [`DocumentedConfig`] for a struct whose fields all serialize to
/// TOML values.
#[macro_export]
macro_rules! documented_config {
    (
        $config_name:ident,
        $($field:ident, $desc:expr),+ $(,)?
        => $path:expr
    ) => {
        impl $crate::common::config::DocumentedConfig for $config_name {
            fn field_metadata() -> Vec<$crate::common::config::ConfigFieldMeta> {
                vec![
                    $(
                        $crate::common::config::ConfigFieldMeta {
                            name: stringify!($field),
                            description: $desc,
                        },
                    )+
                ]
            }

            fn field_value(&self, field_name: &str) -> Option<String> {
                match field_name {
                    $(
                        stringify!($field) => toml::Value::try_from(&self.$field)
                            .map(|v| v.to_string())
                            .ok(),
                    )+
                    _ => None,
                }
            }

            fn default_path() -> anyhow::Result<std::path::PathBuf> {
                $path
            }

            fn sanitize(&mut self) {
                <$config_name>::repair(self)
            }
        }
    };
}
