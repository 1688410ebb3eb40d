//! SDF fragment shading, shared by the CPU renderer and mirrored in WGSL.

use super::mesh::SdfUniforms;

/// Hermite interpolation between 0 and 1.
///
/// A degenerate edge pair (`edge0 >= edge1`) acts as a hard step at `edge0`.
#[inline(always)]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline(always)]
pub fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Shade one fragment from its sampled distance `d` and texture coordinate.
/// Returns premultiplied RGBA.
pub fn shade(d: f32, uv: [f32; 2], u: &SdfUniforms) -> [f32; 4] {
    if u.draw_distance {
        return [d, d, d, d];
    }
    if u.draw_uv {
        return [uv[0], uv[1], 0.0, 1.0];
    }

    let alpha = smoothstep(u.buffer - u.smoothing, u.buffer + u.smoothing, d);
    let edge = u.buffer + u.outline_size;
    let border = smoothstep(edge - u.smoothing, edge + u.smoothing, d);
    let color = mix(u.outline_color, u.text_color, border);
    let a = alpha * u.opacity;
    [color[0] * a, color[1] * a, color[2] * a, a]
}
