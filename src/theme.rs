//! Theme tables.
//!
//! A theme picks palettes and population counts for every component. The
//! geometry of the tree is shared; only the dressing changes.

use crate::config::{
    Color, LeavesConfig, OrnamentFieldConfig, PhotoConfig, PointFieldConfig, PointFieldKind,
    RibbonConfig, SceneConfig, ShapeKind, StarConfig, TreeConfig, TrunkConfig,
};
use crate::distribution::ConeShape;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Visual theme of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Deep green tree, red and gold ornaments.
    #[default]
    Classic,
    /// Frosted tree with falling snow.
    Snowy,
    /// Pale blue and silver.
    Icy,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Classic, Theme::Snowy, Theme::Icy];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Snowy => "snowy",
            Theme::Icy => "icy",
        }
    }
}

/// Shared silhouette: a cone 16 tall with a 6.5 base, centered on the origin.
const TREE_CONE: ConeShape = ConeShape::new(6.5, 16.0, -8.0);
const CHAOS_RADIUS: f32 = 22.0;

/// Per-theme ornament counts, in table order:
/// box, ball, star, drum, cane, bell, pine, flat.
struct OrnamentCounts([usize; 8]);

struct Palettes {
    foliage: Vec<Color>,
    lights: Vec<Color>,
    glitter: Vec<Color>,
    warm: Vec<Color>,
    metal: Vec<Color>,
    accent: Vec<Color>,
    cane: Vec<Color>,
    pine: Vec<Color>,
    leaves: Vec<Color>,
    ribbon: Color,
    trunk: Color,
    star: Color,
    frame: Color,
    background: Color,
}

fn palettes(theme: Theme) -> Palettes {
    match theme {
        Theme::Classic => Palettes {
            foliage: vec![
                Color::rgb8(0x0b, 0x3d, 0x1f),
                Color::rgb8(0x14, 0x5a, 0x32),
                Color::rgb8(0x1e, 0x7a, 0x3c),
            ],
            lights: vec![
                Color::rgb8(0xff, 0xd5, 0x80),
                Color::rgb8(0xff, 0xb3, 0x47),
                Color::rgb8(0xff, 0xf1, 0xc1),
            ],
            glitter: vec![Color::rgb8(0xff, 0xd7, 0x00), Color::rgb8(0xff, 0xf8, 0xdc)],
            warm: vec![
                Color::rgb8(0xc4, 0x1e, 0x3a),
                Color::rgb8(0x8b, 0x00, 0x00),
                Color::rgb8(0xd4, 0xaf, 0x37),
            ],
            metal: vec![Color::rgb8(0xd4, 0xaf, 0x37), Color::rgb8(0xc0, 0xc0, 0xc0)],
            accent: vec![Color::rgb8(0x0f, 0x52, 0xba), Color::rgb8(0xc4, 0x1e, 0x3a)],
            cane: vec![Color::rgb8(0xff, 0xff, 0xff), Color::rgb8(0xd0, 0x1c, 0x1f)],
            pine: vec![Color::rgb8(0x6b, 0x44, 0x23), Color::rgb8(0x8b, 0x5a, 0x2b)],
            leaves: vec![Color::rgb8(0x2e, 0x8b, 0x57), Color::rgb8(0x22, 0x6b, 0x3a)],
            ribbon: Color::rgb8(0xd4, 0xaf, 0x37),
            trunk: Color::rgb8(0x4a, 0x2c, 0x17),
            star: Color::rgb8(0xff, 0xd7, 0x00),
            frame: Color::rgb8(0xfa, 0xf7, 0xf0),
            background: Color::rgb8(0x05, 0x08, 0x10),
        },
        Theme::Snowy => Palettes {
            foliage: vec![
                Color::rgb8(0x2f, 0x5d, 0x48),
                Color::rgb8(0xdf, 0xee, 0xe9),
                Color::rgb8(0x3f, 0x73, 0x5a),
            ],
            lights: vec![Color::rgb8(0xff, 0xff, 0xff), Color::rgb8(0xff, 0xf4, 0xe0)],
            glitter: vec![Color::rgb8(0xff, 0xff, 0xff), Color::rgb8(0xe6, 0xf0, 0xff)],
            warm: vec![
                Color::rgb8(0xb2, 0x22, 0x22),
                Color::rgb8(0xff, 0xff, 0xff),
                Color::rgb8(0xc0, 0xc0, 0xc0),
            ],
            metal: vec![Color::rgb8(0xe5, 0xe4, 0xe2), Color::rgb8(0xc0, 0xc0, 0xc0)],
            accent: vec![Color::rgb8(0xb2, 0x22, 0x22), Color::rgb8(0xf5, 0xf5, 0xf5)],
            cane: vec![Color::rgb8(0xff, 0xff, 0xff), Color::rgb8(0xb2, 0x22, 0x22)],
            pine: vec![Color::rgb8(0x7a, 0x5c, 0x3e), Color::rgb8(0xf0, 0xf0, 0xf0)],
            leaves: vec![Color::rgb8(0x3f, 0x73, 0x5a), Color::rgb8(0xf0, 0xf8, 0xff)],
            ribbon: Color::rgb8(0xb2, 0x22, 0x22),
            trunk: Color::rgb8(0x5a, 0x3a, 0x22),
            star: Color::rgb8(0xff, 0xff, 0xf0),
            frame: Color::rgb8(0xff, 0xff, 0xff),
            background: Color::rgb8(0x0d, 0x15, 0x24),
        },
        Theme::Icy => Palettes {
            foliage: vec![
                Color::rgb8(0x5f, 0x9e, 0xa0),
                Color::rgb8(0xaf, 0xee, 0xee),
                Color::rgb8(0x46, 0x82, 0xb4),
            ],
            lights: vec![Color::rgb8(0xa0, 0xe6, 0xff), Color::rgb8(0xff, 0xff, 0xff)],
            glitter: vec![Color::rgb8(0xe0, 0xff, 0xff), Color::rgb8(0xb0, 0xe0, 0xe6)],
            warm: vec![
                Color::rgb8(0x87, 0xce, 0xeb),
                Color::rgb8(0xe0, 0xff, 0xff),
                Color::rgb8(0xc0, 0xc0, 0xc0),
            ],
            metal: vec![Color::rgb8(0xc0, 0xc0, 0xc0), Color::rgb8(0xe5, 0xe4, 0xe2)],
            accent: vec![Color::rgb8(0x41, 0x69, 0xe1), Color::rgb8(0xb0, 0xc4, 0xde)],
            cane: vec![Color::rgb8(0xff, 0xff, 0xff), Color::rgb8(0x41, 0x69, 0xe1)],
            pine: vec![Color::rgb8(0xb0, 0xc4, 0xde), Color::rgb8(0xe0, 0xe8, 0xf0)],
            leaves: vec![Color::rgb8(0xaf, 0xee, 0xee), Color::rgb8(0x87, 0xce, 0xfa)],
            ribbon: Color::rgb8(0xc0, 0xc0, 0xc0),
            trunk: Color::rgb8(0x6e, 0x7b, 0x8b),
            star: Color::rgb8(0xe0, 0xff, 0xff),
            frame: Color::rgb8(0xf0, 0xf8, 0xff),
            background: Color::rgb8(0x04, 0x0c, 0x18),
        },
    }
}

fn ornament_counts(theme: Theme) -> OrnamentCounts {
    match theme {
        Theme::Classic => OrnamentCounts([40, 120, 30, 25, 30, 60, 40, 25]),
        Theme::Snowy => OrnamentCounts([30, 100, 40, 15, 35, 60, 50, 20]),
        Theme::Icy => OrnamentCounts([25, 140, 45, 20, 20, 60, 30, 15]),
    }
}

fn ornament_fields(theme: Theme, p: &Palettes) -> Vec<OrnamentFieldConfig> {
    let OrnamentCounts([boxes, balls, stars, drums, canes, bells, pines, flats]) =
        ornament_counts(theme);

    vec![
        OrnamentFieldConfig::new("box", ShapeKind::Box, boxes)
            .with_palette(p.warm.clone())
            .with_scale_range(0.3, 0.5)
            .with_weight(0.8),
        OrnamentFieldConfig::new("ball", ShapeKind::Sphere, balls)
            .with_palette(p.warm.iter().chain(&p.metal).copied().collect())
            .with_scale_range(0.2, 0.35)
            .with_weight(1.2),
        OrnamentFieldConfig::new("star", ShapeKind::Star, stars)
            .with_palette(vec![p.star])
            .with_scale_range(0.15, 0.25)
            .with_weight(1.5)
            .with_emissive(2.0),
        OrnamentFieldConfig::new("drum", ShapeKind::Cylinder, drums)
            .with_palette(p.accent.clone())
            .with_scale_range(0.25, 0.35)
            .with_weight(0.9),
        OrnamentFieldConfig::new("cane", ShapeKind::Cylinder, canes)
            .with_palette(p.cane.clone())
            .with_scale_range(0.2, 0.3)
            .with_geometry_scale(Vec3::new(0.25, 2.5, 0.25)),
        OrnamentFieldConfig::new("bell", ShapeKind::Cone, bells)
            .with_palette(p.metal.clone())
            .with_scale_range(0.25, 0.4)
            .with_weight(1.3),
        OrnamentFieldConfig::new("pine", ShapeKind::Dodecahedron, pines)
            .with_palette(p.pine.clone())
            .with_scale_range(0.2, 0.3)
            .with_weight(1.1)
            .with_geometry_scale(Vec3::new(0.8, 1.3, 0.8)),
        OrnamentFieldConfig::new("flat", ShapeKind::FlatBox, flats)
            .with_palette(p.pine.clone())
            .with_scale_range(0.3, 0.45)
            .with_geometry_scale(Vec3::new(1.0, 1.2, 0.25)),
    ]
}

fn point_fields(theme: Theme, p: &Palettes) -> Vec<PointFieldConfig> {
    let foliage_count = match theme {
        Theme::Classic => 15_000,
        Theme::Snowy => 12_000,
        Theme::Icy => 14_000,
    };
    let mut fields = vec![
        PointFieldConfig {
            kind: PointFieldKind::Foliage,
            count: foliage_count,
            palette: p.foliage.clone(),
            size: 0.06,
            damping: 1.2,
        },
        PointFieldConfig {
            kind: PointFieldKind::Glitter,
            count: 1_200,
            palette: p.glitter.clone(),
            size: 0.1,
            damping: 1.6,
        },
        PointFieldConfig {
            kind: PointFieldKind::Lights,
            count: 600,
            palette: p.lights.clone(),
            size: 0.14,
            damping: 1.8,
        },
    ];
    if theme == Theme::Snowy {
        fields.push(PointFieldConfig {
            kind: PointFieldKind::Snow,
            count: 4_000,
            palette: vec![Color::rgb8(0xff, 0xff, 0xff)],
            size: 0.07,
            damping: 0.9,
        });
    }
    fields
}

impl SceneConfig {
    /// Built-in tables for a theme.
    pub fn for_theme(theme: Theme) -> Self {
        let p = palettes(theme);
        SceneConfig {
            theme,
            tree: TreeConfig {
                cone: TREE_CONE,
                chaos_radius: CHAOS_RADIUS,
            },
            point_fields: point_fields(theme, &p),
            ornaments: ornament_fields(theme, &p),
            trunk: TrunkConfig {
                segments: 10,
                radius: 0.45,
                below_base: 1.5,
                color: p.trunk,
                damping: 1.0,
            },
            leaves: LeavesConfig {
                count: 220,
                palette: p.leaves.clone(),
                scale_range: [0.18, 0.3],
                damping: 1.4,
            },
            ribbon: RibbonConfig {
                segments: 160,
                turns: 5.0,
                width: 0.18,
                color: p.ribbon,
                damping: 1.1,
            },
            star: StarConfig {
                color: p.star,
                size: 0.9,
                damping: 0.8,
            },
            photos: PhotoConfig {
                card_size: 1.1,
                margin: 0.6,
                frame_color: p.frame,
                damping: 1.5,
            },
            background: p.background,
        }
    }
}
