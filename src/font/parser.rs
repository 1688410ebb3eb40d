//! Text-encoded BMFont (`.fnt`) parser.
//!
//! Each line is a tag followed by `key=value` pairs:
//!
//! ```text
//! info face="Roboto" size=42 bold=0 italic=0 padding=0,0,0,0 spacing=0,0
//! common lineHeight=49 base=39 scaleW=512 scaleH=256 pages=1 packed=0
//! page id=0 file="roboto.png"
//! char id=65 x=0 y=0 width=26 height=30 xoffset=0 yoffset=9 xadvance=26 page=0 chnl=15
//! kerning first=65 second=86 amount=-2
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use super::{BmFont, BmGlyph, FontCommon, FontInfo, FontParseError};

/// Attributes of one line, keyed by name
struct Line<'a> {
    number: usize,
    pairs: HashMap<&'a str, &'a str>,
}

impl<'a> Line<'a> {
    fn get<T: FromStr>(&self, key: &str) -> Result<Option<T>, FontParseError> {
        match self.pairs.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| FontParseError::InvalidValue {
                    line: self.number,
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, FontParseError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn require<T: FromStr>(&self, tag: &'static str, key: &'static str) -> Result<T, FontParseError> {
        self.get(key)?.ok_or(FontParseError::MissingKey {
            line: self.number,
            tag,
            key,
        })
    }

    fn flag(&self, key: &str) -> Result<bool, FontParseError> {
        Ok(self.get_or::<i32>(key, 0)? != 0)
    }

    fn string(&self, key: &str) -> String {
        self.pairs.get(key).map(|s| s.to_string()).unwrap_or_default()
    }

    /// Comma-separated integer list such as `padding=1,2,3,4`
    fn list<const N: usize>(&self, key: &str) -> Result<[i32; N], FontParseError> {
        let mut out = [0; N];
        let Some(raw) = self.pairs.get(key) else {
            return Ok(out);
        };
        for (slot, part) in out.iter_mut().zip(raw.split(',')) {
            *slot = part.trim().parse().map_err(|_| FontParseError::InvalidValue {
                line: self.number,
                key: key.to_string(),
                value: raw.to_string(),
            })?;
        }
        Ok(out)
    }
}

/// Parse a text-encoded BMFont description.
pub fn parse_text(contents: &str) -> Result<BmFont, FontParseError> {
    let mut font = BmFont::default();
    let mut has_common = false;
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);

    for (idx, raw) in contents.lines().enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let (tag, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
        let line = Line {
            number: idx + 1,
            pairs: split_pairs(rest),
        };

        match tag {
            "info" => font.info = parse_info(&line)?,
            "common" => {
                font.common = parse_common(&line)?;
                has_common = true;
            }
            "page" => {
                let id: usize = line.require("page", "id")?;
                // binary fonts store page ids in a u8
                if id > u8::MAX as usize {
                    return Err(FontParseError::InvalidValue {
                        line: line.number,
                        key: "id".to_string(),
                        value: id.to_string(),
                    });
                }
                if font.pages.len() <= id {
                    font.pages.resize(id + 1, String::new());
                }
                font.pages[id] = line.string("file");
            }
            "char" => {
                let glyph = parse_char(&line)?;
                font.glyphs.insert(glyph.id, glyph);
            }
            "kerning" => {
                let first: u32 = line.require("kerning", "first")?;
                let second: u32 = line.require("kerning", "second")?;
                let amount: f32 = line.get_or("amount", 0.0)?;
                font.kernings.insert((first, second), amount);
            }
            // `chars count=..` / `kernings count=..` are only hints
            _ => {}
        }
    }

    if !has_common {
        return Err(FontParseError::MissingBlock("common"));
    }

    log::debug!(
        "parsed text BMFont '{}': {} glyphs, {} kerning pairs",
        font.info.face,
        font.glyphs.len(),
        font.kernings.len()
    );

    Ok(font)
}

fn parse_info(line: &Line<'_>) -> Result<FontInfo, FontParseError> {
    Ok(FontInfo {
        face: line.string("face"),
        size: line.get_or("size", 0)?,
        bold: line.flag("bold")?,
        italic: line.flag("italic")?,
        unicode: line.flag("unicode")?,
        stretch_h: line.get_or("stretchH", 100)?,
        smooth: line.flag("smooth")?,
        aa: line.get_or("aa", 1)?,
        padding: line.list::<4>("padding")?,
        spacing: line.list::<2>("spacing")?,
    })
}

fn parse_common(line: &Line<'_>) -> Result<FontCommon, FontParseError> {
    Ok(FontCommon {
        line_height: line.require("common", "lineHeight")?,
        base: line.get_or("base", 0.0)?,
        scale_w: line.require("common", "scaleW")?,
        scale_h: line.require("common", "scaleH")?,
        pages: line.get_or("pages", 1)?,
        packed: line.flag("packed")?,
    })
}

fn parse_char(line: &Line<'_>) -> Result<BmGlyph, FontParseError> {
    Ok(BmGlyph {
        id: line.require("char", "id")?,
        x: line.get_or("x", 0)?,
        y: line.get_or("y", 0)?,
        width: line.get_or("width", 0)?,
        height: line.get_or("height", 0)?,
        xoffset: line.get_or("xoffset", 0.0)?,
        yoffset: line.get_or("yoffset", 0.0)?,
        xadvance: line.get_or("xadvance", 0.0)?,
        page: line.get_or("page", 0)?,
        chnl: line.get_or("chnl", 15)?,
    })
}

/// Split `key=value key2="quoted value"` into pairs. Quotes are stripped;
/// a token without `=` is ignored.
fn split_pairs(rest: &str) -> HashMap<&str, &str> {
    let mut pairs = HashMap::new();
    let mut s = rest.trim_start();

    while !s.is_empty() {
        let Some(eq) = s.find('=') else { break };
        let key = s[..eq].trim();
        // A stray word before the key, e.g. `foo key=1`
        let key = key.rsplit(char::is_whitespace).next().unwrap_or(key);
        let after = &s[eq + 1..];

        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (&quoted[..end], &quoted[end + 1..]),
                None => (quoted, ""),
            }
        } else {
            match after.find(char::is_whitespace) {
                Some(end) => (&after[..end], &after[end..]),
                None => (after, ""),
            }
        };

        if !key.is_empty() {
            pairs.insert(key, value);
        }
        s = remainder.trim_start();
    }

    pairs
}
