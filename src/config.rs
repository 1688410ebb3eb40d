//! Scene configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::render::geometry::Winding;
use crate::render::layout::{Align, LayoutOptions};
use crate::render::mesh::{DisplayParameters, SdfUniforms};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sdf-text.toml";

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 640.0,
            title: "SDF Text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub font_path: PathBuf,
    /// Overrides the font's first page
    pub atlas_path: Option<PathBuf>,
    pub text: String,
    pub letter_spacing: f32,
    pub align: Align,
    pub line_height: Option<f32>,
    pub flip_y: bool,
    pub winding: Winding,
    pub window: WindowConfig,
    pub background: [f32; 3],
    pub text_color: [f32; 3],
    pub outline_color: [f32; 3],
    pub opacity: f32,
    pub parameters: DisplayParameters,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let uniforms = SdfUniforms::default();
        Self {
            font_path: PathBuf::from("assets/roboto.fnt"),
            atlas_path: None,
            text: "Lorem ipsum dolor sit amet".to_string(),
            letter_spacing: 1.0,
            align: Align::Left,
            line_height: None,
            flip_y: false,
            winding: Winding::Clockwise,
            window: WindowConfig::default(),
            // 0x888888
            background: [136.0 / 255.0; 3],
            text_color: uniforms.text_color,
            outline_color: uniforms.outline_color,
            opacity: uniforms.opacity,
            parameters: DisplayParameters::default(),
        }
    }
}

impl SceneConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Config from `path`, else `sdf-text.toml` if it exists, else defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from_file(default_path)
        } else {
            log::info!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("font_path must not be empty".into()));
        }
        if !self.letter_spacing.is_finite() {
            return Err(ConfigError::Invalid("letter_spacing must be finite".into()));
        }
        if let Some(lh) = self.line_height {
            if !(lh.is_finite() && lh > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "line_height must be positive, got {lh}"
                )));
            }
        }
        if !(self.window.width >= 1.0 && self.window.height >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "window size must be at least 1x1, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Invalid(format!(
                "opacity must be within 0..=1, got {}",
                self.opacity
            )));
        }
        for (name, color) in [
            ("background", self.background),
            ("text_color", self.text_color),
            ("outline_color", self.outline_color),
        ] {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ConfigError::Invalid(format!(
                    "{name} components must be within 0..=1, got {color:?}"
                )));
            }
        }
        let p = &self.parameters;
        if !p.scale.is_finite() || p.scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "parameters.scale must be positive, got {}",
                p.scale
            )));
        }
        for (name, value) in [("buffer", p.buffer), ("outline_size", p.outline_size)] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "parameters.{name} must be finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            letter_spacing: self.letter_spacing,
            align: self.align,
            line_height: self.line_height,
            ..LayoutOptions::default()
        }
    }

    /// Initial uniforms with the configured colours
    pub fn uniforms(&self) -> SdfUniforms {
        SdfUniforms {
            text_color: self.text_color,
            outline_color: self.outline_color,
            opacity: self.opacity,
            ..SdfUniforms::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
        assert_eq!(config.text, "Lorem ipsum dolor sit amet");
        assert_eq!(config.parameters, DisplayParameters::default());
    }

    #[test]
    fn parses_partial_document() {
        let config = SceneConfig::from_toml_str(
            r#"
            font_path = "fonts/dejavu.fnt"
            text = "Hello"
            align = "center"
            winding = "counter_clockwise"
            flip_y = true

            [window]
            width = 800

            [parameters]
            scale = 2.5
            draw_uv = true
            "#,
        )
        .unwrap();
        assert_eq!(config.font_path, PathBuf::from("fonts/dejavu.fnt"));
        assert_eq!(config.align, Align::Center);
        assert_eq!(config.winding, Winding::CounterClockwise);
        assert!(config.flip_y);
        assert_eq!(config.window.width, 800.0);
        assert_eq!(config.window.height, 640.0);
        assert_eq!(config.parameters.scale, 2.5);
        assert!(config.parameters.draw_uv);
        assert_eq!(config.parameters.buffer, 0.3);
    }

    #[test]
    fn example_config_is_valid() {
        let config = SceneConfig::from_toml_str(include_str!("../sdf-text.example.toml")).unwrap();
        assert_eq!(config.parameters, DisplayParameters::default());
        assert_eq!(config.winding, Winding::Clockwise);
        assert_eq!(config.window.width, 1024.0);
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            SceneConfig::from_toml_str("text = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        for doc in [
            "opacity = 1.5",
            "background = [0.0, 2.0, 0.0]",
            "line_height = 0.0",
            "font_path = \"\"",
            "[parameters]\nscale = 0.0",
            "[parameters]\nbuffer = nan",
            "[parameters]\noutline_size = inf",
            "[parameters]\nbuffer = nan\noutline_size = inf",
            "[window]\nwidth = 0",
        ] {
            assert!(
                matches!(SceneConfig::from_toml_str(doc), Err(ConfigError::Invalid(_))),
                "accepted: {doc}"
            );
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SceneConfig::load_from_file(Path::new("/nonexistent/sdf-text.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn uniforms_take_configured_colours() {
        let config = SceneConfig {
            text_color: [1.0, 0.0, 0.0],
            opacity: 0.5,
            ..Default::default()
        };
        let u = config.uniforms();
        assert_eq!(u.text_color, [1.0, 0.0, 0.0]);
        assert_eq!(u.opacity, 0.5);
        assert_eq!(u.smoothing, 0.1);
    }
}
