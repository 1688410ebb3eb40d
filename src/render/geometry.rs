//! Glyph quad geometry.
//!
//! Turns a laid-out glyph sequence into flat GPU buffers. Every glyph becomes
//! four vertices in the order top-left, top-right, bottom-left, bottom-right
//! (y grows downward), in both the position and the UV buffer, followed by
//! six indices forming two triangles.

use std::fmt;

use super::layout::GlyphPlacement;

pub const VERTICES_PER_GLYPH: usize = 4;
pub const FLOATS_PER_GLYPH: usize = VERTICES_PER_GLYPH * 2;
pub const INDICES_PER_GLYPH: usize = 6;

/// Largest glyph count whose vertex indices fit in `u16`.
pub const MAX_GLYPHS: usize = (u16::MAX as usize + 1) / VERTICES_PER_GLYPH;

/// Rejected geometry input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Atlas texture dimensions in pixels. Both are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtlasSize {
    width: u32,
    height: u32,
}

impl AtlasSize {
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidArgument(format!(
                "atlas dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for AtlasSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Triangle winding as seen on a y-down screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Winding {
    /// Index pattern for one TL, TR, BL, BR quad
    fn pattern(self) -> [u16; INDICES_PER_GLYPH] {
        match self {
            Winding::Clockwise => [0, 1, 2, 1, 3, 2],
            Winding::CounterClockwise => [0, 2, 1, 1, 2, 3],
        }
    }
}

/// Vertex positions, two floats per vertex.
pub fn generate_positions(glyphs: &[GlyphPlacement]) -> Vec<f32> {
    let mut positions = Vec::with_capacity(glyphs.len() * FLOATS_PER_GLYPH);
    for g in glyphs {
        let (x0, y0) = (g.x, g.y);
        let (x1, y1) = (g.x + g.width, g.y + g.height);
        positions.extend_from_slice(&[x0, y0, x1, y0, x0, y1, x1, y1]);
    }
    positions
}

/// Normalized texture coordinates, two floats per vertex, in the same corner
/// order as [`generate_positions`].
///
/// `flip_y` maps `v` to `1 - v` for atlases whose origin is the bottom-left
/// corner; each vertex keeps sampling its own corner of the glyph.
pub fn generate_uvs(
    glyphs: &[GlyphPlacement],
    atlas_width: u32,
    atlas_height: u32,
    flip_y: bool,
) -> Result<Vec<f32>, GeometryError> {
    let size = AtlasSize::new(atlas_width, atlas_height)?;
    let inv_w = 1.0 / size.width as f32;
    let inv_h = 1.0 / size.height as f32;

    let mut uvs = Vec::with_capacity(glyphs.len() * FLOATS_PER_GLYPH);
    for g in glyphs {
        let src = &g.source;
        let u0 = src.x * inv_w;
        let u1 = (src.x + src.width) * inv_w;
        let mut v0 = src.y * inv_h;
        let mut v1 = (src.y + src.height) * inv_h;
        if flip_y {
            v0 = 1.0 - v0;
            v1 = 1.0 - v1;
        }
        uvs.extend_from_slice(&[u0, v0, u1, v0, u0, v1, u1, v1]);
    }
    Ok(uvs)
}

/// Triangle indices for `glyph_count` contiguous quads.
pub fn generate_indices(glyph_count: usize, winding: Winding) -> Result<Vec<u16>, GeometryError> {
    if glyph_count > MAX_GLYPHS {
        return Err(GeometryError::InvalidArgument(format!(
            "{glyph_count} glyphs exceed the u16 index range ({MAX_GLYPHS} max)"
        )));
    }
    let pattern = winding.pattern();
    let mut indices = Vec::with_capacity(glyph_count * INDICES_PER_GLYPH);
    for quad in 0..glyph_count {
        let base = (quad * VERTICES_PER_GLYPH) as u16;
        indices.extend(pattern.iter().map(|i| base + i));
    }
    Ok(indices)
}

/// Position, UV and index buffers for one text mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffers {
    pub positions: Vec<f32>,
    pub uvs: Vec<f32>,
    pub indices: Vec<u16>,
}

impl GeometryBuffers {
    pub fn build(
        glyphs: &[GlyphPlacement],
        atlas: AtlasSize,
        flip_y: bool,
        winding: Winding,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            positions: generate_positions(glyphs),
            uvs: generate_uvs(glyphs, atlas.width, atlas.height, flip_y)?,
            indices: generate_indices(glyphs.len(), winding)?,
        })
    }

    pub fn glyph_count(&self) -> usize {
        self.positions.len() / FLOATS_PER_GLYPH
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position and UV of vertex `i`
    pub fn vertex(&self, i: usize) -> ([f32; 2], [f32; 2]) {
        (
            [self.positions[i * 2], self.positions[i * 2 + 1]],
            [self.uvs[i * 2], self.uvs[i * 2 + 1]],
        )
    }
}
