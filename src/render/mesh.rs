//! Renderable text mesh: geometry, SDF material and placement.

use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::font::atlas::SdfAtlas;

use super::geometry::GeometryBuffers;
use super::layout::TextBounds;

/// Panel-controlled values pushed into the mesh every frame.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DisplayParameters {
    pub draw_uv: bool,
    pub draw_distance: bool,
    pub scale: f32,
    pub buffer: f32,
    pub outline_size: f32,
}

impl DisplayParameters {
    pub const SCALE_RANGE: RangeInclusive<f32> = 0.1..=10.0;
    pub const BUFFER_RANGE: RangeInclusive<f32> = 0.0..=0.5;
    pub const OUTLINE_RANGE: RangeInclusive<f32> = 0.0..=1.0;

    /// Copy with every numeric field clamped to its panel range. NaN falls
    /// back to the field's default.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let clamp = |v: f32, r: &RangeInclusive<f32>, default: f32| {
            if v.is_nan() {
                default
            } else {
                v.clamp(*r.start(), *r.end())
            }
        };
        Self {
            scale: clamp(self.scale, &Self::SCALE_RANGE, defaults.scale),
            buffer: clamp(self.buffer, &Self::BUFFER_RANGE, defaults.buffer),
            outline_size: clamp(self.outline_size, &Self::OUTLINE_RANGE, defaults.outline_size),
            ..self
        }
    }
}

impl Default for DisplayParameters {
    fn default() -> Self {
        Self {
            draw_uv: false,
            draw_distance: false,
            scale: 1.0,
            buffer: 0.3,
            outline_size: 0.2,
        }
    }
}

/// Shader uniforms. Colours are linear RGB in 0..1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SdfUniforms {
    pub text_color: [f32; 3],
    pub outline_color: [f32; 3],
    pub smoothing: f32,
    pub buffer: f32,
    pub outline_size: f32,
    pub opacity: f32,
    pub draw_uv: bool,
    pub draw_distance: bool,
}

impl Default for SdfUniforms {
    fn default() -> Self {
        Self {
            text_color: [1.0, 1.0, 1.0],
            outline_color: [0.1, 0.1, 0.1],
            smoothing: 0.1,
            buffer: 0.1,
            outline_size: 0.1,
            opacity: 1.0,
            draw_uv: false,
            draw_distance: false,
        }
    }
}

/// Uniforms plus the atlas they sample.
#[derive(Debug, Clone)]
pub struct SdfMaterial {
    pub uniforms: SdfUniforms,
    pub atlas: Arc<SdfAtlas>,
}

/// `screen = local * scale + position`, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    pub position: [f32; 2],
    pub scale: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: 1.0,
        }
    }
}

impl Transform2D {
    #[inline]
    pub fn apply(&self, p: [f32; 2]) -> [f32; 2] {
        [
            p[0] * self.scale + self.position[0],
            p[1] * self.scale + self.position[1],
        ]
    }

    /// The same placement in a coordinate system `factor` times finer, e.g.
    /// points to physical pixels.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            position: [self.position[0] * factor, self.position[1] * factor],
            scale: self.scale * factor,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextMesh {
    pub geometry: GeometryBuffers,
    pub material: SdfMaterial,
    /// Local-space bounds of the glyph quads
    pub bounds: TextBounds,
    pub transform: Transform2D,
}

impl TextMesh {
    pub fn new(geometry: GeometryBuffers, atlas: Arc<SdfAtlas>, bounds: TextBounds) -> Self {
        Self {
            geometry,
            material: SdfMaterial {
                uniforms: SdfUniforms::default(),
                atlas,
            },
            bounds,
            transform: Transform2D::default(),
        }
    }

    /// Per-frame update: copy the panel values into the uniforms, derive
    /// smoothing from the scale and centre the scaled mesh in `viewport`.
    pub fn apply_parameters(&mut self, params: &DisplayParameters, viewport: [f32; 2]) {
        let params = params.clamped();
        let u = &mut self.material.uniforms;
        u.draw_uv = params.draw_uv;
        u.draw_distance = params.draw_distance;
        u.buffer = params.buffer;
        u.outline_size = params.outline_size;
        u.smoothing = 0.1 / params.scale;

        let center = self.bounds.center();
        self.transform = Transform2D {
            scale: params.scale,
            position: [
                viewport[0] * 0.5 - center[0] * params.scale,
                viewport[1] * 0.5 - center[1] * params.scale,
            ],
        };
    }

    /// Scaled width on screen
    pub fn width(&self) -> f32 {
        self.bounds.width() * self.transform.scale
    }

    pub fn height(&self) -> f32 {
        self.bounds.height() * self.transform.scale
    }

    /// Screen-space bounds under the current transform
    pub fn screen_bounds(&self) -> TextBounds {
        let [min_x, min_y] = self.transform.apply([self.bounds.min_x, self.bounds.min_y]);
        let [max_x, max_y] = self.transform.apply([self.bounds.max_x, self.bounds.max_y]);
        TextBounds {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn atlas(&self) -> &SdfAtlas {
        &self.material.atlas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::geometry::AtlasSize;
    use approx::assert_abs_diff_eq;

    fn mesh() -> TextMesh {
        let atlas = SdfAtlas::new(AtlasSize::new(1, 1).unwrap(), vec![0]).unwrap();
        TextMesh::new(
            GeometryBuffers::default(),
            Arc::new(atlas),
            TextBounds {
                min_x: 0.0,
                min_y: 10.0,
                max_x: 100.0,
                max_y: 30.0,
            },
        )
    }

    #[test]
    fn initial_uniforms() {
        let u = mesh().material.uniforms;
        assert_eq!(u.text_color, [1.0, 1.0, 1.0]);
        assert_eq!(u.outline_color, [0.1, 0.1, 0.1]);
        assert_eq!((u.smoothing, u.buffer, u.outline_size, u.opacity), (0.1, 0.1, 0.1, 1.0));
        assert!(!u.draw_uv && !u.draw_distance);
    }

    #[test]
    fn smoothing_follows_scale() {
        let mut m = mesh();
        for scale in [0.1, 0.5, 1.0, 4.0, 10.0] {
            let params = DisplayParameters {
                scale,
                ..Default::default()
            };
            m.apply_parameters(&params, [800.0, 600.0]);
            assert_abs_diff_eq!(m.material.uniforms.smoothing, 0.1 / scale, epsilon = 1e-6);
            assert_eq!(m.transform.scale, scale);
        }
    }

    #[test]
    fn copies_panel_values() {
        let mut m = mesh();
        let params = DisplayParameters {
            draw_uv: true,
            draw_distance: true,
            scale: 2.0,
            buffer: 0.25,
            outline_size: 0.5,
        };
        m.apply_parameters(&params, [800.0, 600.0]);
        let u = m.material.uniforms;
        assert!(u.draw_uv && u.draw_distance);
        assert_eq!((u.buffer, u.outline_size), (0.25, 0.5));
    }

    #[test]
    fn recentres_scaled_bounds() {
        let mut m = mesh();
        let params = DisplayParameters {
            scale: 2.0,
            ..Default::default()
        };
        m.apply_parameters(&params, [800.0, 600.0]);
        let b = m.screen_bounds();
        assert_abs_diff_eq!(b.center()[0], 400.0);
        assert_abs_diff_eq!(b.center()[1], 300.0);
        assert_abs_diff_eq!(m.width(), 200.0);
        assert_abs_diff_eq!(m.height(), 40.0);
    }

    #[test]
    fn scaled_transform_maps_to_finer_grid() {
        let t = Transform2D {
            position: [10.0, 20.0],
            scale: 1.5,
        };
        let p = [4.0, 6.0];
        let coarse = t.apply(p);
        let fine = t.scaled(2.0).apply(p);
        assert_abs_diff_eq!(fine[0], coarse[0] * 2.0);
        assert_abs_diff_eq!(fine[1], coarse[1] * 2.0);
    }

    #[test]
    fn out_of_range_parameters_are_clamped() {
        let p = DisplayParameters {
            scale: 0.0,
            buffer: 0.9,
            outline_size: -1.0,
            ..Default::default()
        }
        .clamped();
        assert_eq!((p.scale, p.buffer, p.outline_size), (0.1, 0.5, 0.0));
    }

    #[test]
    fn nan_parameters_fall_back_to_defaults() {
        let p = DisplayParameters {
            scale: f32::NAN,
            buffer: f32::NAN,
            outline_size: f32::INFINITY,
            ..Default::default()
        }
        .clamped();
        assert_eq!((p.scale, p.buffer, p.outline_size), (1.0, 0.3, 1.0));
    }
}
