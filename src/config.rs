//! Watermark configuration.
//!
//! Handles loading, validating, and merging watermark settings. A config file
//! is sparse: stock defaults are overridden by whatever keys the file sets,
//! and command-line overrides are merged on top of that.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! min_width = 0             # Images at or below BOTH thresholds are left untouched
//! min_height = 0
//!
//! [text]
//! enabled = false
//! content = ""
//! color = "#ff0000"
//! rotation = 0              # Clockwise degrees
//! font = "fonts/DejaVuSans-Bold.ttf"
//!
//! [text.placement]
//! size_percent = 60.0       # Size budget as a percentage of the image
//! opacity = 0.4
//! anchors = ["center"]
//!
//! [image]
//! enabled = false
//! path = "marker.png"
//! rotation = 0
//!
//! [image.placement]
//! size_percent = 20.0
//! opacity = 0.5
//! anchors = ["bottom-left"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! Read through [`parse_config`] or [`load_config`], every table may be
//! partial, `[text.placement]` and `[image.placement]` included: missing keys
//! come from that layer's defaults. A bare `toml::from_str` into
//! [`WatermarkSettings`] fills missing layer tables but needs complete
//! placement tables, since the two layers default them differently.
//!
//! ## Threshold semantics
//!
//! Watermarking runs when the image is taller than `min_height` **or** wider
//! than `min_width`. An image is only passed through untouched when it is
//! small in both dimensions.

use crate::imaging::Color;
use crate::types::Anchor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Watermark settings loaded from a TOML file.
///
/// All fields have sensible defaults. Config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkSettings {
    /// Width threshold; see the module docs for the OR semantics.
    pub min_width: u32,
    /// Height threshold; see the module docs for the OR semantics.
    pub min_height: u32,
    /// Text layer.
    pub text: TextLayerSettings,
    /// Image (marker bitmap) layer.
    pub image: ImageLayerSettings,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            min_width: 0,
            min_height: 0,
            text: TextLayerSettings::default(),
            image: ImageLayerSettings::default(),
        }
    }
}

impl WatermarkSettings {
    /// Validate values of the enabled layers.
    ///
    /// Disabled layers are not checked: their settings are never read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.text.enabled {
            self.text.placement.validate("text")?;
        }
        if self.image.enabled {
            self.image.placement.validate("image")?;
        }
        Ok(())
    }

    /// Check that files the enabled layers need up front exist.
    ///
    /// A text layer with text cannot render without its font, so a missing
    /// font file is an error here rather than at the first apply. A missing
    /// marker image is not: the image layer is skipped instead.
    pub fn check_files(&self) -> Result<(), ConfigError> {
        let text = &self.text;
        if text.enabled && !text.content.is_empty() && !Path::new(&text.font).is_file() {
            return Err(ConfigError::Validation(format!(
                "text.font {:?} does not exist or is not a file",
                text.font
            )));
        }
        Ok(())
    }

    /// Whether an image of the given size gets watermarked at all.
    pub fn should_watermark(&self, width: u32, height: u32) -> bool {
        height > self.min_height || width > self.min_width
    }
}

/// Size, opacity, and placement shared by both layer kinds.
///
/// No serde default: each layer supplies its own through [`parse_config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSettings {
    /// Size budget as a percentage of the canvas, in `(0, 100]`.
    pub size_percent: f64,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
    /// One draw per entry; duplicates draw twice.
    pub anchors: Vec<Anchor>,
}

impl LayerSettings {
    fn validate(&self, layer: &str) -> Result<(), ConfigError> {
        if !self.size_percent.is_finite() || self.size_percent <= 0.0 || self.size_percent > 100.0
        {
            return Err(ConfigError::Validation(format!(
                "{layer}.placement.size_percent must be in (0, 100], got {}",
                self.size_percent
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Validation(format!(
                "{layer}.placement.opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        if self.anchors.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{layer}.placement.anchors must not be empty"
            )));
        }
        Ok(())
    }
}

/// Text watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextLayerSettings {
    pub enabled: bool,
    /// The watermark text. An empty string disables the layer.
    pub content: String,
    pub color: Color,
    /// Clockwise rotation in degrees.
    pub rotation: i32,
    /// Path to a TrueType/OpenType font file.
    pub font: String,
    pub placement: LayerSettings,
}

impl Default for TextLayerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            content: String::new(),
            color: Color::red(),
            rotation: 0,
            font: "fonts/DejaVuSans-Bold.ttf".to_string(),
            placement: LayerSettings {
                size_percent: 60.0,
                opacity: 0.4,
                anchors: vec![Anchor::Center],
            },
        }
    }
}

/// Image watermark settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageLayerSettings {
    pub enabled: bool,
    /// Marker bitmap, loaded once per compositor.
    pub path: PathBuf,
    /// Clockwise rotation in degrees.
    pub rotation: i32,
    pub placement: LayerSettings,
}

impl Default for ImageLayerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("marker.png"),
            rotation: 0,
            placement: LayerSettings {
                size_percent: 20.0,
                opacity: 0.5,
                anchors: vec![Anchor::BottomLeft],
            },
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(WatermarkSettings::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<WatermarkSettings, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: WatermarkSettings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Parse a config file's contents, filling every missing key from the
/// stock defaults, then validate.
pub fn parse_config(content: &str) -> Result<WatermarkSettings, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    resolve_config(stock_defaults_value(), [overlay])
}

impl FromStr for WatermarkSettings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_config(s)
    }
}

/// Load settings from an optional config file plus optional overrides.
///
/// With no file, the stock defaults are used. Overrides (e.g. from command
/// line flags) are applied last.
pub fn load_config(
    path: Option<&Path>,
    overrides: Option<toml::Value>,
) -> Result<WatermarkSettings, ConfigError> {
    let file = path.map(load_raw_config).transpose()?;
    resolve_config(stock_defaults_value(), file.into_iter().chain(overrides))
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Watermarker Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Images are watermarked when taller than min_height OR wider than min_width.
# Only images small in both dimensions are left untouched.
min_width = 0
min_height = 0

# ---------------------------------------------------------------------------
# Text watermark
# ---------------------------------------------------------------------------
[text]
enabled = false

# The text to draw. An empty string disables the layer.
content = ""

# Text color as #RRGGBB or #RGB.
color = "#ff0000"

# Clockwise rotation in degrees.
rotation = 0

# Path to a TrueType/OpenType font file, relative to the working directory.
# It must exist whenever the text layer is enabled with text.
font = "fonts/DejaVuSans-Bold.ttf"

[text.placement]
# Largest font size whose rotated text fits in this percentage of the image.
size_percent = 60.0

# 0.0 = invisible, 1.0 = opaque.
opacity = 0.4

# Any of: top-left, top-center, top-right, center-left, center,
# center-right, bottom-left, bottom-center, bottom-right.
# Each entry draws one copy; duplicates draw twice.
anchors = ["center"]

# ---------------------------------------------------------------------------
# Image watermark
# ---------------------------------------------------------------------------
[image]
enabled = false

# Marker bitmap. A missing or unreadable file silently disables the layer.
path = "marker.png"

# Clockwise rotation in degrees, applied before scaling.
rotation = 0

[image.placement]
# The marker is scaled down (never up) to fit this percentage of the image.
size_percent = 20.0
opacity = 0.5
anchors = ["bottom-left"]
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_has_layer_defaults() {
        let config = WatermarkSettings::default();
        assert!(!config.text.enabled);
        assert_eq!(config.text.color, Color::red());
        assert_eq!(config.text.placement.size_percent, 60.0);
        assert_eq!(config.text.placement.anchors, vec![Anchor::Center]);
        assert!(!config.image.enabled);
        assert_eq!(config.image.path, PathBuf::from("marker.png"));
        assert_eq!(config.image.placement.opacity, 0.5);
        assert_eq!(config.image.placement.anchors, vec![Anchor::BottomLeft]);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[text]
enabled = true
content = "WM"
color = "#00f"
"##;
        let config: WatermarkSettings = toml::from_str(toml).unwrap();
        assert!(config.text.enabled);
        assert_eq!(config.text.content, "WM");
        assert_eq!(config.text.color, Color::new(0, 0, 255));
        // Default values preserved
        assert_eq!(config.text.placement.opacity, 0.4);
        assert_eq!(config.image, ImageLayerSettings::default());
    }

    #[test]
    fn parse_placement_with_duplicate_anchors() {
        let toml = r##"
[image]
enabled = true
rotation = 45

[image.placement]
size_percent = 30.0
opacity = 1.0
anchors = ["top-right", "top-right", "bottom-center"]
"##;
        let config: WatermarkSettings = toml::from_str(toml).unwrap();
        assert_eq!(config.image.rotation, 45);
        assert_eq!(
            config.image.placement.anchors,
            vec![Anchor::TopRight, Anchor::TopRight, Anchor::BottomCenter]
        );
        config.validate().unwrap();
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<WatermarkSettings, _> = toml::from_str("min_widht = 10");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<WatermarkSettings, _> = toml::from_str("[text]\nsize = 10");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_anchor_rejected() {
        let toml = "[text.placement]\nsize_percent = 5.0\nopacity = 1.0\nanchors = [\"middle\"]";
        let result: Result<WatermarkSettings, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_color_rejected() {
        let result: Result<WatermarkSettings, _> = toml::from_str("[text]\ncolor = \"red\"");
        assert!(result.is_err());
    }

    // =========================================================================
    // Threshold tests
    // =========================================================================

    #[test]
    fn threshold_uses_or_semantics() {
        let config = WatermarkSettings {
            min_width: 500,
            min_height: 500,
            ..WatermarkSettings::default()
        };
        assert!(!config.should_watermark(500, 500));
        assert!(!config.should_watermark(100, 200));
        // Either dimension above its threshold is enough
        assert!(config.should_watermark(501, 10));
        assert!(config.should_watermark(10, 501));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    fn text_enabled() -> WatermarkSettings {
        let mut config = WatermarkSettings::default();
        config.text.enabled = true;
        config.text.content = "WM".to_string();
        config
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(WatermarkSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_size_percent_bounds() {
        for bad in [0.0, -5.0, 100.5, f64::NAN, f64::INFINITY] {
            let mut config = text_enabled();
            config.text.placement.size_percent = bad;
            assert!(config.validate().is_err(), "accepted size_percent {bad}");
        }
        let mut config = text_enabled();
        config.text.placement.size_percent = 100.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_opacity_bounds() {
        for bad in [-0.1, 1.01, f64::NAN] {
            let mut config = text_enabled();
            config.text.placement.opacity = bad;
            assert!(config.validate().is_err(), "accepted opacity {bad}");
        }
        for good in [0.0, 1.0] {
            let mut config = text_enabled();
            config.text.placement.opacity = good;
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn validate_empty_anchors_for_enabled_layer() {
        let mut config = WatermarkSettings::default();
        config.image.enabled = true;
        config.image.placement.anchors.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("image.placement.anchors"));
    }

    #[test]
    fn validate_ignores_disabled_layers() {
        let mut config = WatermarkSettings::default();
        config.image.placement.anchors.clear();
        config.text.placement.size_percent = -1.0;
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // Merging and loading tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base: toml::Value =
            toml::from_str("[text.placement]\nopacity = 0.4\nsize_percent = 60.0").unwrap();
        let overlay: toml::Value = toml::from_str("[text.placement]\nopacity = 0.9").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["text"]["placement"]["opacity"].as_float(), Some(0.9));
        assert_eq!(
            merged["text"]["placement"]["size_percent"].as_float(),
            Some(60.0)
        );
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("anchors = [\"center\"]").unwrap();
        let overlay: toml::Value = toml::from_str("anchors = [\"top-left\", \"top-right\"]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["anchors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config, WatermarkSettings::default());
    }

    #[test]
    fn load_config_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watermark.toml");
        fs::write(
            &path,
            r##"
min_height = 300

[text]
enabled = true
content = "© Studio"
rotation = -30

[text.placement]
size_percent = 50.0
opacity = 0.25
anchors = ["bottom-right"]
"##,
        )
        .unwrap();

        let config = load_config(Some(&path), None).unwrap();
        assert_eq!(config.min_height, 300);
        assert_eq!(config.min_width, 0);
        assert_eq!(config.text.content, "© Studio");
        assert_eq!(config.text.rotation, -30);
        assert_eq!(config.text.placement.anchors, vec![Anchor::BottomRight]);
        // Untouched sections keep defaults
        assert_eq!(config.text.color, Color::red());
        assert_eq!(config.image, ImageLayerSettings::default());
    }

    #[test]
    fn load_config_overrides_win() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watermark.toml");
        fs::write(&path, "[text]\ncontent = \"from file\"\n").unwrap();

        let overrides: toml::Value =
            toml::from_str("[text]\nenabled = true\ncontent = \"from flag\"").unwrap();
        let config = load_config(Some(&path), Some(overrides)).unwrap();
        assert!(config.text.enabled);
        assert_eq!(config.text.content, "from flag");
    }

    #[test]
    fn parse_config_fills_partial_placement_per_layer() {
        let config = parse_config(
            r##"
[text]
enabled = true
content = "WM"

[text.placement]
opacity = 0.7

[image.placement]
anchors = ["top-left", "center"]
"##,
        )
        .unwrap();
        assert_eq!(config.text.placement.opacity, 0.7);
        assert_eq!(config.text.placement.size_percent, 60.0);
        assert_eq!(config.text.placement.anchors, vec![Anchor::Center]);
        assert_eq!(config.image.placement.size_percent, 20.0);
        assert_eq!(config.image.placement.opacity, 0.5);
        assert_eq!(
            config.image.placement.anchors,
            vec![Anchor::TopLeft, Anchor::Center]
        );
    }

    #[test]
    fn from_str_matches_parse_config() {
        let toml = "[image.placement]\nsize_percent = 35.0";
        let parsed: WatermarkSettings = toml.parse().unwrap();
        assert_eq!(parsed, parse_config(toml).unwrap());
        assert_eq!(parsed.image.placement.size_percent, 35.0);
    }

    #[test]
    fn parse_config_rejects_unknown_placement_key() {
        let result = parse_config("[text.placement]\nopacty = 0.7");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn parse_config_validates_values() {
        let result = parse_config("[text]\nenabled = true\n[text.placement]\nopacity = 2.0");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // File checks
    // =========================================================================

    #[test]
    fn check_files_rejects_missing_font_for_enabled_text() {
        let tmp = TempDir::new().unwrap();
        let mut config = text_enabled();
        config.text.font = tmp.path().join("absent.ttf").to_string_lossy().into_owned();
        assert!(matches!(
            config.check_files(),
            Err(ConfigError::Validation(msg)) if msg.contains("absent.ttf")
        ));
    }

    #[test]
    fn check_files_accepts_existing_font() {
        let tmp = TempDir::new().unwrap();
        let font = tmp.path().join("face.ttf");
        fs::write(&font, b"font bytes").unwrap();
        let mut config = text_enabled();
        config.text.font = font.to_string_lossy().into_owned();
        config.check_files().unwrap();
    }

    #[test]
    fn check_files_ignores_unused_font_and_missing_marker() {
        let mut config = WatermarkSettings::default();
        config.text.font = "/nonexistent/font.ttf".to_string();
        config.image.enabled = true;
        config.image.path = PathBuf::from("/nonexistent/marker.png");
        config.check_files().unwrap();

        // Enabled but empty text is skipped at apply time, so no font is needed
        config.text.enabled = true;
        config.check_files().unwrap();
    }

    #[test]
    fn load_config_missing_file_is_io_error() {
        let result = load_config(Some(Path::new("/nonexistent/watermark.toml")), None);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watermark.toml");
        fs::write(&path, "this is not toml [[[").unwrap();
        assert!(matches!(
            load_config(Some(&path), None),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("watermark.toml");
        fs::write(
            &path,
            "[image]\nenabled = true\n[image.placement]\nsize_percent = 150.0\nopacity = 0.5\nanchors = [\"center\"]\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(Some(&path), None),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: WatermarkSettings = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, WatermarkSettings::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        let table = value.as_table().unwrap();
        for key in ["min_width", "min_height", "text", "image"] {
            assert!(table.contains_key(key), "missing {key}");
        }
    }
}
