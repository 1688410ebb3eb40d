//! CPU rasterizer for SDF text meshes.
//!
//! Used when no wgpu adapter is available. Every glyph quad is drawn as the
//! two triangles of its index buffer, sampled at pixel centres with
//! barycentric UV interpolation, shaded by [`shade`] and composited
//! (premultiplied) over the background in glyph order. Rows are rendered in
//! parallel with rayon.

use rayon::prelude::*;

use super::geometry::{INDICES_PER_GLYPH, VERTICES_PER_GLYPH};
use super::mesh::TextMesh;
use super::shading::shade;

/// One glyph quad in screen space
struct ScreenQuad {
    /// Two triangles, each as (position, uv) per corner
    triangles: [[([f32; 2], [f32; 2]); 3]; 2],
    min: [f32; 2],
    max: [f32; 2],
}

impl ScreenQuad {
    /// UV at `p`, if it falls inside either triangle. The first triangle wins
    /// on the shared diagonal so a pixel is blended once per glyph.
    fn uv_at(&self, p: [f32; 2]) -> Option<[f32; 2]> {
        self.triangles.iter().find_map(|tri| barycentric_uv(tri, p))
    }
}

fn barycentric_uv(tri: &[([f32; 2], [f32; 2]); 3], p: [f32; 2]) -> Option<[f32; 2]> {
    let [(a, ua), (b, ub), (c, uc)] = *tri;
    let det = (b[1] - c[1]) * (a[0] - c[0]) + (c[0] - b[0]) * (a[1] - c[1]);
    if det.abs() < f32::EPSILON {
        return None;
    }
    let w0 = ((b[1] - c[1]) * (p[0] - c[0]) + (c[0] - b[0]) * (p[1] - c[1])) / det;
    let w1 = ((c[1] - a[1]) * (p[0] - c[0]) + (a[0] - c[0]) * (p[1] - c[1])) / det;
    let w2 = 1.0 - w0 - w1;
    const EPS: f32 = -1e-5;
    if w0 < EPS || w1 < EPS || w2 < EPS {
        return None;
    }
    Some([
        ua[0] * w0 + ub[0] * w1 + uc[0] * w2,
        ua[1] * w0 + ub[1] * w1 + uc[1] * w2,
    ])
}

/// Transform every glyph of `mesh` into screen space.
fn screen_quads(mesh: &TextMesh) -> Vec<ScreenQuad> {
    let geometry = &mesh.geometry;
    (0..geometry.glyph_count())
        .map(|glyph| {
            let first_index = glyph * INDICES_PER_GLYPH;
            let corner = |slot: usize| {
                let vertex = geometry.indices[first_index + slot] as usize;
                let (pos, uv) = geometry.vertex(vertex);
                (mesh.transform.apply(pos), uv)
            };
            let triangles = [
                [corner(0), corner(1), corner(2)],
                [corner(3), corner(4), corner(5)],
            ];

            let base = glyph * VERTICES_PER_GLYPH;
            let mut min = [f32::INFINITY; 2];
            let mut max = [f32::NEG_INFINITY; 2];
            for v in base..base + VERTICES_PER_GLYPH {
                let p = mesh.transform.apply(geometry.vertex(v).0);
                min = [min[0].min(p[0]), min[1].min(p[1])];
                max = [max[0].max(p[0]), max[1].max(p[1])];
            }
            ScreenQuad { triangles, min, max }
        })
        .collect()
}

/// Render `mesh` into an opaque RGBA8 buffer of `width * height` pixels.
/// `background` is linear RGB in 0..1.
pub fn render_mesh_cpu(
    mesh: &TextMesh,
    width: usize,
    height: usize,
    background: [f32; 3],
) -> Vec<u8> {
    let mut pixels = vec![0u8; width * height * 4];
    if width == 0 || height == 0 {
        return pixels;
    }

    let quads = screen_quads(mesh);
    let atlas = mesh.atlas();
    let uniforms = &mesh.material.uniforms;
    let row_size = width * 4;

    pixels
        .par_chunks_exact_mut(row_size)
        .enumerate()
        .for_each(|(y, row)| {
            let py = y as f32 + 0.5;
            let in_row: Vec<&ScreenQuad> = quads
                .iter()
                .filter(|q| q.min[1] <= py && py <= q.max[1])
                .collect();

            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                let px = x as f32 + 0.5;
                let mut color = background;

                for quad in &in_row {
                    if px < quad.min[0] || px > quad.max[0] {
                        continue;
                    }
                    let Some(uv) = quad.uv_at([px, py]) else {
                        continue;
                    };
                    let d = atlas.sample(uv[0], uv[1]);
                    let src = shade(d, uv, uniforms);
                    let keep = 1.0 - src[3].clamp(0.0, 1.0);
                    for c in 0..3 {
                        color[c] = src[c] + color[c] * keep;
                    }
                }

                out[0] = to_u8(color[0]);
                out[1] = to_u8(color[1]);
                out[2] = to_u8(color[2]);
                out[3] = 255;
            }
        });

    pixels
}

#[inline(always)]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::atlas::SdfAtlas;
    use crate::render::geometry::{AtlasSize, GeometryBuffers, Winding};
    use crate::render::layout::{AtlasRect, GlyphPlacement, TextBounds};
    use crate::render::mesh::DisplayParameters;
    use std::sync::Arc;

    const BG: [f32; 3] = [0.5, 0.5, 0.5];

    /// One 20x20 glyph sampling a uniform atlas of distance `level`
    fn square_mesh(level: u8, winding: Winding) -> TextMesh {
        let size = AtlasSize::new(4, 4).unwrap();
        let atlas = SdfAtlas::new(size, vec![level; 16]).unwrap();
        let glyph = GlyphPlacement {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 20.0,
            source: AtlasRect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
            },
            index: 0,
            line: 0,
        };
        let geometry = GeometryBuffers::build(&[glyph], size, false, winding).unwrap();
        let bounds = TextBounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 20.0,
            max_y: 20.0,
        };
        let mut mesh = TextMesh::new(geometry, Arc::new(atlas), bounds);
        mesh.apply_parameters(&DisplayParameters::default(), [40.0, 40.0]);
        mesh
    }

    fn pixel(buf: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * width + x) * 4;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn output_has_requested_size() {
        let buf = render_mesh_cpu(&square_mesh(255, Winding::Clockwise), 40, 30, BG);
        assert_eq!(buf.len(), 40 * 30 * 4);
    }

    #[test]
    fn empty_mesh_renders_background() {
        let mut mesh = square_mesh(255, Winding::Clockwise);
        mesh.geometry = GeometryBuffers::default();
        let buf = render_mesh_cpu(&mesh, 8, 8, BG);
        assert!(buf.chunks_exact(4).all(|p| p == [128, 128, 128, 255]));
    }

    #[test]
    fn inside_glyph_is_text_colour() {
        for winding in [Winding::Clockwise, Winding::CounterClockwise] {
            let buf = render_mesh_cpu(&square_mesh(255, winding), 40, 40, BG);
            // centred: quad covers 10..30
            assert_eq!(pixel(&buf, 40, 20, 20), [255, 255, 255, 255]);
            // both triangles are filled
            assert_eq!(pixel(&buf, 40, 12, 27), [255, 255, 255, 255]);
            assert_eq!(pixel(&buf, 40, 27, 12), [255, 255, 255, 255]);
            assert_eq!(pixel(&buf, 40, 2, 2), [128, 128, 128, 255]);
        }
    }

    #[test]
    fn outside_distance_leaves_background() {
        let buf = render_mesh_cpu(&square_mesh(0, Winding::Clockwise), 40, 40, BG);
        assert_eq!(pixel(&buf, 40, 20, 20), [128, 128, 128, 255]);
    }

    #[test]
    fn uv_debug_view_shows_coordinates() {
        let mut mesh = square_mesh(255, Winding::Clockwise);
        mesh.material.uniforms.draw_uv = true;
        let buf = render_mesh_cpu(&mesh, 40, 40, BG);
        // top-left corner of the quad: u, v near 0
        let tl = pixel(&buf, 40, 10, 10);
        assert!(tl[0] < 10 && tl[1] < 10);
        // bottom-right: u, v near 1
        let br = pixel(&buf, 40, 29, 29);
        assert!(br[0] > 245 && br[1] > 245);
    }

    #[test]
    fn zero_size_frame_is_empty() {
        assert!(render_mesh_cpu(&square_mesh(255, Winding::Clockwise), 0, 10, BG).is_empty());
    }
}
