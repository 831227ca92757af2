use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outline::settings::OutlineSettings;
use crate::outline::style::StyleDefinition;
use crate::view::render_pass::{MaterialHandle, MaterialLibrary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read outline config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid outline config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("style `{style}` refers to unknown material `{material}`")]
    UnknownMaterial { style: String, material: String },
}

/// Loadable form of a style; materials are referenced by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default)]
    pub outline_material: Option<String>,
    #[serde(default)]
    pub infill_material: Option<String>,
    #[serde(default = "default_occlusion")]
    pub use_scene_depth_for_occlusion: bool,
}

fn default_width() -> f32 {
    StyleDefinition::DEFAULT_WIDTH
}

fn default_occlusion() -> bool {
    true
}

impl StyleConfig {
    /// Builds a definition, looking material names up with `lookup`.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<MaterialHandle>,
    ) -> Result<StyleDefinition, ConfigError> {
        let find = |material: &str| {
            lookup(material).ok_or_else(|| ConfigError::UnknownMaterial {
                style: self.name.clone(),
                material: material.to_string(),
            })
        };
        let mut style = StyleDefinition::new(self.name.as_str())
            .with_width(self.width)
            .with_scene_depth_occlusion(self.use_scene_depth_for_occlusion);
        if let Some(material) = &self.outline_material {
            style = style.with_outline_material(find(material.as_str())?);
        }
        if let Some(material) = &self.infill_material {
            style = style.with_infill_material(find(material.as_str())?);
        }
        Ok(style)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    pub settings: OutlineSettings,
    #[serde(rename = "style")]
    pub styles: Vec<StyleConfig>,
}

impl OutlineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(
            path = %path.display(),
            styles = config.styles.len(),
            "loaded outline config"
        );
        Ok(config)
    }

    /// Resolves every style against the registered materials.
    pub fn resolve_styles(
        &self,
        materials: &MaterialLibrary,
    ) -> Result<Vec<Arc<StyleDefinition>>, ConfigError> {
        self.styles
            .iter()
            .map(|style| {
                style
                    .resolve(|name| materials.handle_by_name(name))
                    .map(Arc::new)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::settings::InjectionPoint;
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"
        [settings]
        injection_point = "after_rendering_transparents"

        [[style]]
        name = "selection"
        width = 3.5
        outline_material = "glow"

        [[style]]
        name = "hover"
        infill_material = "tint"
        use_scene_depth_for_occlusion = false
    "#;

    fn lookup(name: &str) -> Option<MaterialHandle> {
        match name {
            "glow" => Some(MaterialHandle::from_raw(1)),
            "tint" => Some(MaterialHandle::from_raw(2)),
            _ => None,
        }
    }

    #[test]
    fn parses_settings_and_style_defaults() {
        let config = OutlineConfig::from_toml_str(CONFIG).expect("config parses");
        assert_eq!(
            config.settings.injection_point,
            InjectionPoint::AfterRenderingTransparents
        );
        assert_eq!(
            config.styles[1],
            StyleConfig {
                name: "hover".to_string(),
                width: 5.0,
                outline_material: None,
                infill_material: Some("tint".to_string()),
                use_scene_depth_for_occlusion: false,
            }
        );
        assert!(config.styles[0].use_scene_depth_for_occlusion);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = OutlineConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, OutlineConfig::default());
    }

    #[test]
    fn resolves_material_names() {
        let config = OutlineConfig::from_toml_str(CONFIG).expect("config parses");
        let style = config.styles[0].resolve(lookup).expect("materials resolve");
        assert_eq!(style.name(), "selection");
        assert_eq!(style.width(), 3.5);
        assert_eq!(style.outline_material(), Some(MaterialHandle::from_raw(1)));
        assert_eq!(style.infill_material(), None);
    }

    #[test]
    fn unknown_material_is_an_error() {
        let config = StyleConfig {
            name: "broken".to_string(),
            width: 1.0,
            outline_material: Some("missing".to_string()),
            infill_material: None,
            use_scene_depth_for_occlusion: true,
        };
        let err = config.resolve(lookup).expect_err("missing material fails");
        assert!(matches!(
            err,
            ConfigError::UnknownMaterial { ref style, ref material }
                if style == "broken" && material == "missing"
        ));
    }

    #[test]
    fn negative_width_is_clamped() {
        let config = OutlineConfig::from_toml_str(
            "[[style]]\nname = \"thin\"\nwidth = -2.0\noutline_material = \"glow\"\n",
        )
        .expect("config parses");
        let style = config.styles[0].resolve(lookup).expect("materials resolve");
        assert_eq!(style.width(), 0.0);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            OutlineConfig::from_toml_str("[[style]]\nwidth = \"wide\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
