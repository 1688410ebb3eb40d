//! Binary BMFont (version 3) parser.
//!
//! Layout: the magic `BMF`, a version byte, then a sequence of blocks each
//! prefixed by a one-byte type and a little-endian `u32` size.

use super::{BmFont, BmGlyph, FontCommon, FontInfo, FontParseError};

pub const MAGIC: &[u8] = b"BMF";
const VERSION: u8 = 3;

const BLOCK_INFO: u8 = 1;
const BLOCK_COMMON: u8 = 2;
const BLOCK_PAGES: u8 = 3;
const BLOCK_CHARS: u8 = 4;
const BLOCK_KERNING: u8 = 5;

const INFO_FIXED_LEN: usize = 14;
const COMMON_LEN: usize = 15;
const CHAR_LEN: usize = 20;
const KERNING_LEN: usize = 10;

/// Little-endian cursor over one block
struct Reader<'a> {
    block: u8,
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(block: u8, data: &'a [u8]) -> Self {
        Self { block, data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FontParseError> {
        let end = self.pos + n;
        if end > self.data.len() {
            return Err(FontParseError::Truncated {
                block: self.block,
                needed: end,
                available: self.data.len(),
            });
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8, FontParseError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, FontParseError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> Result<i16, FontParseError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, FontParseError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// NUL-terminated string; an unterminated tail is taken whole.
    fn cstr(&mut self) -> String {
        let rest = &self.data[self.pos..];
        let len = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
        self.pos += (len + 1).min(rest.len());
        String::from_utf8_lossy(&rest[..len]).into_owned()
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

/// Parse a binary BMFont description.
pub fn parse_binary(bytes: &[u8]) -> Result<BmFont, FontParseError> {
    if !bytes.starts_with(MAGIC) {
        return Err(FontParseError::BadMagic);
    }
    let mut header = Reader::new(0, bytes);
    header.take(MAGIC.len())?;
    let version = header.u8()?;
    if version != VERSION {
        return Err(FontParseError::UnsupportedVersion(version));
    }

    let mut font = BmFont::default();
    let mut has_common = false;

    while header.remaining() > 0 {
        let block_type = header.u8()?;
        let size = header.u32()? as usize;
        let data = header.take(size).map_err(|_| FontParseError::Truncated {
            block: block_type,
            needed: size,
            available: header.remaining(),
        })?;
        let mut r = Reader::new(block_type, data);

        match block_type {
            BLOCK_INFO => font.info = read_info(&mut r)?,
            BLOCK_COMMON => {
                font.common = read_common(&mut r)?;
                has_common = true;
            }
            BLOCK_PAGES => {
                while r.remaining() > 0 {
                    font.pages.push(r.cstr());
                }
            }
            BLOCK_CHARS => {
                for _ in 0..data.len() / CHAR_LEN {
                    let glyph = read_char(&mut r)?;
                    font.glyphs.insert(glyph.id, glyph);
                }
            }
            BLOCK_KERNING => {
                for _ in 0..data.len() / KERNING_LEN {
                    let first = r.u32()?;
                    let second = r.u32()?;
                    let amount = r.i16()?;
                    font.kernings.insert((first, second), amount as f32);
                }
            }
            other => log::debug!("skipping unknown BMFont block {}", other),
        }
    }

    if !has_common {
        return Err(FontParseError::MissingBlock("common"));
    }

    log::debug!(
        "parsed binary BMFont '{}': {} glyphs, {} kerning pairs",
        font.info.face,
        font.glyphs.len(),
        font.kernings.len()
    );

    Ok(font)
}

fn read_info(r: &mut Reader<'_>) -> Result<FontInfo, FontParseError> {
    if r.remaining() < INFO_FIXED_LEN {
        return Err(FontParseError::Truncated {
            block: BLOCK_INFO,
            needed: INFO_FIXED_LEN,
            available: r.remaining(),
        });
    }
    let size = r.i16()?;
    let bits = r.u8()?;
    let _charset = r.u8()?;
    let stretch_h = r.u16()?;
    let aa = r.u8()?;
    let padding = [r.u8()?, r.u8()?, r.u8()?, r.u8()?];
    let spacing = [r.u8()?, r.u8()?];
    let _outline = r.u8()?;
    let face = r.cstr();

    // bit 0: smooth, 1: unicode, 2: italic, 3: bold
    Ok(FontInfo {
        face,
        size: size as i32,
        bold: bits & 0b1000 != 0,
        italic: bits & 0b0100 != 0,
        unicode: bits & 0b0010 != 0,
        stretch_h: stretch_h as u32,
        smooth: bits & 0b0001 != 0,
        aa: aa as u32,
        padding: padding.map(i32::from),
        spacing: spacing.map(i32::from),
    })
}

fn read_common(r: &mut Reader<'_>) -> Result<FontCommon, FontParseError> {
    if r.remaining() < COMMON_LEN {
        return Err(FontParseError::Truncated {
            block: BLOCK_COMMON,
            needed: COMMON_LEN,
            available: r.remaining(),
        });
    }
    let line_height = r.u16()?;
    let base = r.u16()?;
    let scale_w = r.u16()?;
    let scale_h = r.u16()?;
    let pages = r.u16()?;
    // bit 7: packed
    let bits = r.u8()?;

    Ok(FontCommon {
        line_height: line_height as f32,
        base: base as f32,
        scale_w: scale_w as u32,
        scale_h: scale_h as u32,
        pages: pages as u32,
        packed: bits & 0x80 != 0,
    })
}

fn read_char(r: &mut Reader<'_>) -> Result<BmGlyph, FontParseError> {
    Ok(BmGlyph {
        id: r.u32()?,
        x: r.u16()? as u32,
        y: r.u16()? as u32,
        width: r.u16()? as u32,
        height: r.u16()? as u32,
        xoffset: r.i16()? as f32,
        yoffset: r.i16()? as f32,
        xadvance: r.i16()? as f32,
        page: r.u8()? as u32,
        chnl: r.u8()? as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::parser::parse_text;

    fn block(out: &mut Vec<u8>, kind: u8, data: &[u8]) {
        out.push(kind);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }

    /// Binary equivalent of the text font in `equivalent_text_font`
    fn sample_binary() -> Vec<u8> {
        let mut out = b"BMF\x03".to_vec();

        let mut info = Vec::new();
        info.extend_from_slice(&42i16.to_le_bytes());
        info.push(0b0000_0011); // smooth + unicode
        info.push(0);
        info.extend_from_slice(&100u16.to_le_bytes());
        info.push(1);
        info.extend_from_slice(&[0, 0, 0, 0, 1, 1, 0]);
        info.extend_from_slice(b"Roboto\0");
        block(&mut out, BLOCK_INFO, &info);

        let mut common = Vec::new();
        for v in [49u16, 39, 512, 256, 1] {
            common.extend_from_slice(&v.to_le_bytes());
        }
        common.extend_from_slice(&[0, 0, 4, 4, 4]);
        block(&mut out, BLOCK_COMMON, &common);

        block(&mut out, BLOCK_PAGES, b"roboto.png\0");

        let mut chars = Vec::new();
        for (id, x, y, w, h, xo, yo, xa) in [
            (32u32, 0u16, 0u16, 0u16, 0u16, 0i16, 0i16, 10i16),
            (65, 10, 20, 26, 30, -1, 9, 25),
        ] {
            chars.extend_from_slice(&id.to_le_bytes());
            for v in [x, y, w, h] {
                chars.extend_from_slice(&v.to_le_bytes());
            }
            for v in [xo, yo, xa] {
                chars.extend_from_slice(&v.to_le_bytes());
            }
            chars.extend_from_slice(&[0, 15]);
        }
        block(&mut out, BLOCK_CHARS, &chars);

        let mut kerning = Vec::new();
        kerning.extend_from_slice(&65u32.to_le_bytes());
        kerning.extend_from_slice(&32u32.to_le_bytes());
        kerning.extend_from_slice(&(-2i16).to_le_bytes());
        block(&mut out, BLOCK_KERNING, &kerning);

        out
    }

    fn equivalent_text_font() -> BmFont {
        parse_text(
            "info face=\"Roboto\" size=42 bold=0 italic=0 unicode=1 stretchH=100 smooth=1 aa=1 padding=0,0,0,0 spacing=1,1\n\
             common lineHeight=49 base=39 scaleW=512 scaleH=256 pages=1 packed=0\n\
             page id=0 file=\"roboto.png\"\n\
             char id=32 x=0 y=0 width=0 height=0 xoffset=0 yoffset=0 xadvance=10 page=0 chnl=15\n\
             char id=65 x=10 y=20 width=26 height=30 xoffset=-1 yoffset=9 xadvance=25 page=0 chnl=15\n\
             kerning first=65 second=32 amount=-2\n",
        )
        .unwrap()
    }

    #[test]
    fn binary_matches_text_encoding() {
        let binary = parse_binary(&sample_binary()).unwrap();
        assert_eq!(binary, equivalent_text_font());
    }

    #[test]
    fn from_bytes_detects_binary() {
        let font = BmFont::from_bytes(&sample_binary()).unwrap();
        assert_eq!(font.info.face, "Roboto");
        assert_eq!(font.kerning('A', ' '), -2.0);
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert!(matches!(
            parse_binary(b"XYZ\x03"),
            Err(FontParseError::BadMagic)
        ));
    }

    #[test]
    fn other_versions_are_rejected() {
        assert!(matches!(
            parse_binary(b"BMF\x02"),
            Err(FontParseError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let mut bytes = sample_binary();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            parse_binary(&bytes),
            Err(FontParseError::Truncated { .. })
        ));
    }

    #[test]
    fn missing_common_block_is_rejected() {
        let mut out = b"BMF\x03".to_vec();
        block(&mut out, BLOCK_PAGES, b"a.png\0");
        assert!(matches!(
            parse_binary(&out),
            Err(FontParseError::MissingBlock("common"))
        ));
    }
}
