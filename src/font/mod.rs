//! BMFont description data model.
//!
//! A `BmFont` holds the per-glyph metrics, kerning pairs and atlas layout of
//! an AngelCode bitmap font. The distance-field atlas itself lives in
//! [`atlas::SdfAtlas`]; fonts and atlases are loaded together by
//! [`loader::load_font_assets`].

pub mod atlas;
pub mod binary;
pub mod loader;
pub mod parser;

use std::collections::HashMap;

use crate::render::geometry::{AtlasSize, GeometryError};

/// Errors raised while decoding a font description.
#[derive(Debug, thiserror::Error)]
pub enum FontParseError {
    #[error("line {line}: `{tag}` is missing required key `{key}`")]
    MissingKey {
        line: usize,
        tag: &'static str,
        key: &'static str,
    },

    #[error("line {line}: invalid value `{value}` for `{key}`")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("font description has no `{0}` block")]
    MissingBlock(&'static str),

    #[error("not a binary BMFont file (bad magic)")]
    BadMagic,

    #[error("unsupported binary BMFont version {0}")]
    UnsupportedVersion(u8),

    #[error("binary block {block} truncated: need {needed} bytes, have {available}")]
    Truncated {
        block: u8,
        needed: usize,
        available: usize,
    },

    #[error("font description is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),
}

/// `info` block: how the font was rasterized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    pub face: String,
    pub size: i32,
    pub bold: bool,
    pub italic: bool,
    pub unicode: bool,
    pub stretch_h: u32,
    pub smooth: bool,
    pub aa: u32,
    /// Up, right, down, left
    pub padding: [i32; 4],
    /// Horizontal, vertical
    pub spacing: [i32; 2],
}

/// `common` block: line metrics and atlas dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontCommon {
    pub line_height: f32,
    /// Distance from the top of a line to the baseline
    pub base: f32,
    pub scale_w: u32,
    pub scale_h: u32,
    pub pages: u32,
    pub packed: bool,
}

/// Metrics and atlas location of a single glyph.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BmGlyph {
    pub id: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub xoffset: f32,
    pub yoffset: f32,
    pub xadvance: f32,
    pub page: u32,
    pub chnl: u32,
}

impl BmGlyph {
    /// True when the glyph box covers no pixels (whitespace).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A bitmap font description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BmFont {
    pub info: FontInfo,
    pub common: FontCommon,
    /// Atlas page file names, indexed by page id
    pub pages: Vec<String>,
    pub glyphs: HashMap<u32, BmGlyph>,
    pub kernings: HashMap<(u32, u32), f32>,
}

impl BmFont {
    /// Decode a font description, detecting the binary encoding by its
    /// `BMF` magic and falling back to the text encoding otherwise.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontParseError> {
        if bytes.starts_with(binary::MAGIC) {
            binary::parse_binary(bytes)
        } else {
            parser::parse_text(std::str::from_utf8(bytes)?)
        }
    }

    pub fn glyph(&self, ch: char) -> Option<&BmGlyph> {
        self.glyphs.get(&(ch as u32))
    }

    /// Kerning adjustment between two consecutive characters (0 if none).
    pub fn kerning(&self, first: char, second: char) -> f32 {
        self.kernings
            .get(&(first as u32, second as u32))
            .copied()
            .unwrap_or(0.0)
    }

    /// Atlas dimensions the glyph rectangles are expressed against.
    pub fn atlas_size(&self) -> Result<AtlasSize, GeometryError> {
        AtlasSize::new(self.common.scale_w, self.common.scale_h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kerning_defaults_to_zero() {
        let mut font = BmFont::default();
        font.kernings.insert(('A' as u32, 'V' as u32), -3.0);
        assert_eq!(font.kerning('A', 'V'), -3.0);
        assert_eq!(font.kerning('V', 'A'), 0.0);
    }

    #[test]
    fn whitespace_glyph_is_empty() {
        let space = BmGlyph {
            id: 32,
            xadvance: 10.0,
            ..Default::default()
        };
        assert!(space.is_empty());
    }

    #[test]
    fn zero_sized_atlas_is_rejected() {
        let font = BmFont::default();
        assert!(font.atlas_size().is_err());
    }
}
