//! SDF glyph atlas: one distance sample per texel.

use crate::render::geometry::{AtlasSize, GeometryError};

/// Distance-field plane of the atlas texture.
///
/// Only the alpha channel of the source image is kept; a value of 255 is
/// deep inside a glyph, 0 far outside, and the glyph edge sits around the
/// shader's `buffer` threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SdfAtlas {
    size: AtlasSize,
    distance: Vec<u8>,
}

impl SdfAtlas {
    /// Wrap a row-major distance plane. `distance.len()` must equal
    /// `width * height`.
    pub fn new(size: AtlasSize, distance: Vec<u8>) -> Result<Self, GeometryError> {
        let expected = size.width() as usize * size.height() as usize;
        if distance.len() != expected {
            return Err(GeometryError::InvalidArgument(format!(
                "atlas plane has {} texels, expected {}x{} = {}",
                distance.len(),
                size.width(),
                size.height(),
                expected
            )));
        }
        Ok(Self { size, distance })
    }

    /// Keep the alpha channel of an RGBA image.
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self, GeometryError> {
        let size = AtlasSize::new(image.width(), image.height())?;
        let distance = image.pixels().map(|p| p.0[3]).collect();
        Self::new(size, distance)
    }

    pub fn size(&self) -> AtlasSize {
        self.size
    }

    /// Raw row-major plane, for texture upload
    pub fn texels(&self) -> &[u8] {
        &self.distance
    }

    /// Texel at integer coordinates, clamped to the edge.
    pub fn texel(&self, x: i64, y: i64) -> f32 {
        let w = self.size.width() as i64;
        let h = self.size.height() as i64;
        let x = x.clamp(0, w - 1) as usize;
        let y = y.clamp(0, h - 1) as usize;
        self.distance[y * w as usize + x] as f32 * (1.0 / 255.0)
    }

    /// Bilinear sample at normalized coordinates (clamp-to-edge), matching a
    /// linear-filtered GPU sampler.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        let fx = u * self.size.width() as f32 - 0.5;
        let fy = v * self.size.height() as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = lerp(self.texel(x0, y0), self.texel(x0 + 1, y0), tx);
        let bottom = lerp(self.texel(x0, y0 + 1), self.texel(x0 + 1, y0 + 1), tx);
        lerp(top, bottom, ty)
    }
}

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_by_one() -> SdfAtlas {
        SdfAtlas::new(AtlasSize::new(2, 1).unwrap(), vec![0, 255]).unwrap()
    }

    #[test]
    fn rejects_wrong_plane_length() {
        let size = AtlasSize::new(4, 4).unwrap();
        assert!(SdfAtlas::new(size, vec![0; 15]).is_err());
    }

    #[test]
    fn texel_clamps_to_edge() {
        let atlas = two_by_one();
        assert_abs_diff_eq!(atlas.texel(-5, 0), 0.0);
        assert_abs_diff_eq!(atlas.texel(9, 3), 1.0);
    }

    #[test]
    fn sample_interpolates_between_texel_centres() {
        let atlas = two_by_one();
        // Texel centres at u = 0.25 and u = 0.75
        assert_abs_diff_eq!(atlas.sample(0.25, 0.5), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(atlas.sample(0.5, 0.5), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(atlas.sample(0.75, 0.5), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(atlas.sample(1.0, 0.5), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn from_rgba_keeps_alpha() {
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(1, 1, image::Rgba([10, 20, 30, 200]));
        let atlas = SdfAtlas::from_rgba(&img).unwrap();
        assert_eq!(atlas.texels(), &[0, 0, 0, 200]);
    }
}
