//! Scene configuration.
//!
//! Every component is built from an explicit config value passed to its
//! constructor; nothing reads a global. A full [`SceneConfig`] comes from
//! [`SceneConfig::for_theme`](crate::theme) or from a JSON file:
//!
//! ```json
//! {
//!   "theme": "snowy",
//!   "ornaments": [
//!     { "name": "bell", "count": 60, "type": "cone",
//!       "colorPalette": ["#d4af37", "#c0c0c0"],
//!       "scaleRange": [0.25, 0.4], "weight": 1.3 }
//!   ]
//! }
//! ```
//!
//! Fields missing from the file are taken from the theme's tables.

use crate::distribution::ConeShape;
use crate::error::ConfigError;
use crate::theme::Theme;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Linear RGB color, written as `#rrggbb` (sRGB) in config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub Vec3);

impl Color {
    /// From 8-bit sRGB components.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self(Vec3::new(
            srgb_to_linear(r as f32 / 255.0),
            srgb_to_linear(g as f32 / 255.0),
            srgb_to_linear(b as f32 / 255.0),
        ))
    }

    /// Parse `#rrggbb` or `rrggbb`.
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ConfigError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        Ok(Self::rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear RGB.
    #[inline]
    pub fn linear(&self) -> Vec3 {
        self.0
    }

    /// Back to 8-bit sRGB.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let c = |v: f32| (linear_to_srgb(v).clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.0.x), c(self.0.y), c(self.0.z)]
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.to_rgb8();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Primitive shape of an instanced ornament.
///
/// Parsing is lenient: any unrecognized name becomes [`ShapeKind::Sphere`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeKind {
    Box,
    #[default]
    Sphere,
    Cylinder,
    Cone,
    Dodecahedron,
    /// Octahedron stretched into a star.
    Star,
    /// Box squashed flat along Z.
    FlatBox,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Box,
        ShapeKind::Sphere,
        ShapeKind::Cylinder,
        ShapeKind::Cone,
        ShapeKind::Dodecahedron,
        ShapeKind::Star,
        ShapeKind::FlatBox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Box => "box",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Cone => "cone",
            ShapeKind::Dodecahedron => "dodecahedron",
            ShapeKind::Star => "star",
            ShapeKind::FlatBox => "flatBox",
        }
    }
}

impl From<&str> for ShapeKind {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "box" => ShapeKind::Box,
            "sphere" => ShapeKind::Sphere,
            "cylinder" => ShapeKind::Cylinder,
            "cone" => ShapeKind::Cone,
            "dodecahedron" => ShapeKind::Dodecahedron,
            "star" | "octahedron" => ShapeKind::Star,
            "flatbox" | "flat_box" | "flat" => ShapeKind::FlatBox,
            _ => ShapeKind::Sphere,
        }
    }
}

impl From<String> for ShapeKind {
    fn from(name: String) -> Self {
        ShapeKind::from(name.as_str())
    }
}

impl From<ShapeKind> for String {
    fn from(kind: ShapeKind) -> Self {
        kind.name().to_string()
    }
}

fn default_weight() -> f32 {
    1.0
}

fn default_emissive_intensity() -> f32 {
    1.0
}

/// One configurable field of instanced ornaments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrnamentFieldConfig {
    /// Label used in logs and errors.
    pub name: String,
    /// Population size. 0 renders nothing.
    pub count: usize,
    /// Primitive shape.
    #[serde(rename = "type")]
    pub shape: ShapeKind,
    /// One color is sampled per instance. Must not be empty.
    pub color_palette: Vec<Color>,
    /// Uniform random scale bounds `[min, max]`.
    pub scale_range: [f32; 2],
    /// Convergence speed multiplier; heavier fields use lower values.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Self-lit pulsing once nearly formed.
    #[serde(default)]
    pub emissive: bool,
    #[serde(default = "default_emissive_intensity")]
    pub emissive_intensity: f32,
    /// Per-axis stretch applied after the base scale.
    #[serde(default)]
    pub geometry_scale: Option<Vec3>,
}

impl OrnamentFieldConfig {
    pub fn new(name: impl Into<String>, shape: ShapeKind, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
            shape,
            color_palette: vec![Color(Vec3::ONE)],
            scale_range: [0.2, 0.3],
            weight: default_weight(),
            emissive: false,
            emissive_intensity: default_emissive_intensity(),
            geometry_scale: None,
        }
    }

    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        self.color_palette = palette;
        self
    }

    pub fn with_scale_range(mut self, min: f32, max: f32) -> Self {
        self.scale_range = [min, max];
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_emissive(mut self, intensity: f32) -> Self {
        self.emissive = true;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_geometry_scale(mut self, scale: Vec3) -> Self {
        self.geometry_scale = Some(scale);
        self
    }

    /// Reject configs the animation core must never see.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count > 0 && self.color_palette.is_empty() {
            return Err(ConfigError::EmptyPalette(self.name.clone()));
        }
        let [min, max] = self.scale_range;
        if !(min > 0.0 && min <= max) {
            return Err(ConfigError::InvalidScaleRange {
                name: self.name.clone(),
                min,
                max,
            });
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(ConfigError::InvalidWeight {
                name: self.name.clone(),
                weight: self.weight,
            });
        }
        Ok(())
    }
}

/// Point field variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointFieldKind {
    /// Dense needles on the cone surface.
    Foliage,
    /// Sparse larger glints just outside the foliage.
    Glitter,
    /// Fairy lights on a spiral string.
    Lights,
    /// Snow settling on the ground.
    Snow,
}

/// One point field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointFieldConfig {
    pub kind: PointFieldKind,
    pub count: usize,
    pub palette: Vec<Color>,
    /// Base point size in world units.
    pub size: f32,
    /// Damping rate in 1/s.
    pub damping: f32,
}

/// Tree silhouette and chaos extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    pub cone: ConeShape,
    /// Radius of the chaos ball every population scatters into.
    pub chaos_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrunkConfig {
    pub segments: usize,
    pub radius: f32,
    /// Portion of the trunk below the cone base.
    pub below_base: f32,
    pub color: Color,
    pub damping: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavesConfig {
    pub count: usize,
    pub palette: Vec<Color>,
    pub scale_range: [f32; 2],
    pub damping: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RibbonConfig {
    pub segments: usize,
    /// Number of full turns from base to apex.
    pub turns: f32,
    pub width: f32,
    pub color: Color,
    pub damping: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarConfig {
    pub color: Color,
    pub size: f32,
    pub damping: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoConfig {
    /// Card edge length in world units.
    pub card_size: f32,
    /// How far cards hang outside the cone surface.
    pub margin: f32,
    pub frame_color: Color,
    pub damping: f32,
}

/// Everything needed to build a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub theme: Theme,
    pub tree: TreeConfig,
    pub point_fields: Vec<PointFieldConfig>,
    pub ornaments: Vec<OrnamentFieldConfig>,
    pub trunk: TrunkConfig,
    pub leaves: LeavesConfig,
    pub ribbon: RibbonConfig,
    pub star: StarConfig,
    pub photos: PhotoConfig,
    pub background: Color,
}

/// Partial config read from JSON; missing sections come from the theme.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneOverrides {
    theme: Option<Theme>,
    tree: Option<TreeConfig>,
    point_fields: Option<Vec<PointFieldConfig>>,
    ornaments: Option<Vec<OrnamentFieldConfig>>,
    trunk: Option<TrunkConfig>,
    leaves: Option<LeavesConfig>,
    ribbon: Option<RibbonConfig>,
    star: Option<StarConfig>,
    photos: Option<PhotoConfig>,
    background: Option<Color>,
}

impl SceneConfig {
    /// Parse JSON, filling gaps from the named (or default) theme.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let o: SceneOverrides = serde_json::from_str(json)?;
        let base = SceneConfig::for_theme(o.theme.unwrap_or_default());
        let config = SceneConfig {
            theme: base.theme,
            tree: o.tree.unwrap_or(base.tree),
            point_fields: o.point_fields.unwrap_or(base.point_fields),
            ornaments: o.ornaments.unwrap_or(base.ornaments),
            trunk: o.trunk.unwrap_or(base.trunk),
            leaves: o.leaves.unwrap_or(base.leaves),
            ribbon: o.ribbon.unwrap_or(base.ribbon),
            star: o.star.unwrap_or(base.star),
            photos: o.photos.unwrap_or(base.photos),
            background: o.background.unwrap_or(base.background),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check every table the animation core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cone = self.tree.cone;
        if !(cone.base_radius > 0.0 && cone.height > 0.0 && self.tree.chaos_radius > 0.0) {
            return Err(ConfigError::InvalidGeometry);
        }
        for field in &self.ornaments {
            field.validate()?;
        }
        for field in &self.point_fields {
            if field.count > 0 && field.palette.is_empty() {
                return Err(ConfigError::EmptyPalette(format!("{:?}", field.kind)));
            }
        }
        if self.leaves.count > 0 && self.leaves.palette.is_empty() {
            return Err(ConfigError::EmptyPalette("leaves".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex_roundtrip() {
        let c = Color::from_hex("#d4af37").unwrap();
        assert_eq!(c.to_rgb8(), [0xd4, 0xaf, 0x37]);
        assert_eq!(c.to_string(), "#d4af37");
    }

    #[test]
    fn test_color_rejects_garbage() {
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("zzzzzz").is_err());
        assert!(Color::from_hex("#+f+f+f").is_err());
        assert!(Color::from_hex("-1ffff").is_err());
    }

    #[test]
    fn test_unknown_shape_falls_back_to_sphere() {
        assert_eq!(ShapeKind::from("teapot"), ShapeKind::Sphere);
        assert_eq!(ShapeKind::from("Cone"), ShapeKind::Cone);
        let parsed: ShapeKind = serde_json::from_str("\"pyramid\"").unwrap();
        assert_eq!(parsed, ShapeKind::Sphere);
    }

    #[test]
    fn test_ornament_field_from_json() {
        let json = r##"{
            "name": "cane", "count": 30, "type": "cylinder",
            "colorPalette": ["#ff0000", "#ffffff"],
            "scaleRange": [0.2, 0.3],
            "geometryScale": [0.3, 2.5, 0.3]
        }"##;
        let field: OrnamentFieldConfig = serde_json::from_str(json).unwrap();
        assert_eq!(field.shape, ShapeKind::Cylinder);
        assert_eq!(field.weight, 1.0);
        assert!(!field.emissive);
        assert_eq!(field.geometry_scale, Some(Vec3::new(0.3, 2.5, 0.3)));
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_palette() {
        let field = OrnamentFieldConfig::new("ball", ShapeKind::Sphere, 10).with_palette(vec![]);
        assert!(matches!(field.validate(), Err(ConfigError::EmptyPalette(_))));
    }

    #[test]
    fn test_validate_allows_empty_palette_for_zero_count() {
        let field = OrnamentFieldConfig::new("ball", ShapeKind::Sphere, 0).with_palette(vec![]);
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_scale() {
        let field = OrnamentFieldConfig::new("ball", ShapeKind::Sphere, 1).with_scale_range(0.5, 0.2);
        assert!(matches!(field.validate(), Err(ConfigError::InvalidScaleRange { .. })));
    }

    #[test]
    fn test_validate_rejects_non_positive_weight() {
        for weight in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let field = OrnamentFieldConfig::new("bell", ShapeKind::Cone, 5).with_weight(weight);
            assert!(
                matches!(field.validate(), Err(ConfigError::InvalidWeight { .. })),
                "weight {} accepted",
                weight
            );
        }
        let json = r##"{"ornaments": [{"name": "bell", "count": 4, "type": "cone",
            "colorPalette": ["#d4af37"], "scaleRange": [0.25, 0.4], "weight": 0}]}"##;
        assert!(matches!(
            SceneConfig::from_json_str(json),
            Err(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_scene_overrides_fill_from_theme() {
        let config = SceneConfig::from_json_str(r#"{ "theme": "icy" }"#).unwrap();
        assert_eq!(config, SceneConfig::for_theme(Theme::Icy));
    }

    #[test]
    fn test_scene_override_ornaments() {
        let json = r##"{
            "ornaments": [{
                "name": "bell", "count": 60, "type": "cone",
                "colorPalette": ["#d4af37"], "scaleRange": [0.25, 0.4]
            }]
        }"##;
        let config = SceneConfig::from_json_str(json).unwrap();
        assert_eq!(config.theme, Theme::Classic);
        assert_eq!(config.ornaments.len(), 1);
        assert_eq!(config.ornaments[0].count, 60);
    }

    #[test]
    fn test_scene_config_serializes() {
        let config = SceneConfig::for_theme(Theme::Snowy);
        let json = serde_json::to_string(&config).unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ornaments.len(), config.ornaments.len());
        assert_eq!(back.theme, Theme::Snowy);
    }
}
