use crate::font::{BmFont, BmGlyph};

/// Horizontal alignment of lines against the widest line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Pixel rectangle of a glyph inside the atlas
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AtlasRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One positioned glyph: its box in layout space (y down) and where its
/// image lives in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source: AtlasRect,
    /// Character index in the source string
    pub index: usize,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Extra advance after every glyph
    pub letter_spacing: f32,
    pub align: Align,
    /// Overrides the font's `lineHeight`
    pub line_height: Option<f32>,
    /// Width of a tab in space advances
    pub tab_size: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            letter_spacing: 1.0,
            align: Align::Left,
            line_height: None,
            tab_size: 4,
        }
    }
}

/// Bounding box of the glyph boxes in a layout
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> [f32; 2] {
        [
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        ]
    }
}

/// Result of laying out one string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub glyphs: Vec<GlyphPlacement>,
    /// Widest line, measured by pen advance
    pub width: f32,
    pub height: f32,
    pub line_height: f32,
    /// Baseline of the first line
    pub baseline: f32,
    pub lines: usize,
}

impl TextLayout {
    pub fn bounds(&self) -> TextBounds {
        let mut glyphs = self.glyphs.iter();
        let Some(first) = glyphs.next() else {
            return TextBounds::default();
        };
        let init = TextBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + first.width,
            max_y: first.y + first.height,
        };
        glyphs.fold(init, |b, g| TextBounds {
            min_x: b.min_x.min(g.x),
            min_y: b.min_y.min(g.y),
            max_x: b.max_x.max(g.x + g.width),
            max_y: b.max_y.max(g.y + g.height),
        })
    }
}

/// A character resolved against the font
enum Step<'a> {
    Glyph(char, &'a BmGlyph),
    /// Tab: moves the pen and breaks the kerning chain
    Advance(f32),
    /// `\r` or a character the font lacks
    Skip,
}

/// Lay out `text` as a block of lines, one per `\n`.
///
/// Line `k` starts at pen `(0, k * line_height)`. Each glyph is placed at the
/// pen plus its `xoffset`/`yoffset`, after applying kerning with the previous
/// glyph of the line; the pen then advances by `xadvance + letter_spacing`.
/// Zero-area glyphs only advance the pen. Characters the font lacks are
/// skipped.
pub fn layout_text(font: &BmFont, text: &str, options: &LayoutOptions) -> TextLayout {
    let line_height = options.line_height.unwrap_or(font.common.line_height);
    let space_advance = font.glyph(' ').map(|g| g.xadvance).unwrap_or(0.0);

    let lines: Vec<Vec<Step<'_>>> = text
        .split('\n')
        .map(|line| resolve_line(font, line, space_advance, options.tab_size))
        .collect();

    let widths: Vec<f32> = lines
        .iter()
        .map(|steps| line_width(font, steps, options.letter_spacing))
        .collect();
    let max_width = widths.iter().copied().fold(0.0, f32::max);

    let mut glyphs = Vec::new();
    let mut index = 0;
    for (line_idx, (steps, width)) in lines.iter().zip(&widths).enumerate() {
        let align_offset = match options.align {
            Align::Left => 0.0,
            Align::Center => (max_width - width) * 0.5,
            Align::Right => max_width - width,
        };
        let pen_y = line_idx as f32 * line_height;
        let mut pen_x = 0.0;
        let mut prev: Option<char> = None;

        for step in steps {
            match *step {
                Step::Skip => {}
                Step::Advance(amount) => {
                    pen_x += amount;
                    prev = None;
                }
                Step::Glyph(ch, glyph) => {
                    if let Some(p) = prev {
                        pen_x += font.kerning(p, ch);
                    }
                    if !glyph.is_empty() {
                        glyphs.push(GlyphPlacement {
                            x: align_offset + pen_x + glyph.xoffset,
                            y: pen_y + glyph.yoffset,
                            width: glyph.width as f32,
                            height: glyph.height as f32,
                            source: AtlasRect {
                                x: glyph.x as f32,
                                y: glyph.y as f32,
                                width: glyph.width as f32,
                                height: glyph.height as f32,
                            },
                            index,
                            line: line_idx,
                        });
                    }
                    pen_x += glyph.xadvance + options.letter_spacing;
                    prev = Some(ch);
                }
            }
            index += 1;
        }
        // the '\n' itself
        index += 1;
    }

    TextLayout {
        glyphs,
        width: max_width,
        height: lines.len() as f32 * line_height,
        line_height,
        baseline: font.common.base,
        lines: lines.len(),
    }
}

/// Resolve characters to glyphs. Skipped characters keep their slot so
/// `GlyphPlacement::index` stays a character index into the source.
fn resolve_line<'a>(font: &'a BmFont, line: &str, space_advance: f32, tab_size: u32) -> Vec<Step<'a>> {
    line.chars()
        .map(|ch| match ch {
            '\t' => Step::Advance(space_advance * tab_size as f32),
            '\r' => Step::Skip,
            _ => match font.glyph(ch) {
                Some(glyph) => Step::Glyph(ch, glyph),
                None => {
                    log::debug!("no glyph for {:?} (U+{:04X}), skipping", ch, ch as u32);
                    Step::Skip
                }
            },
        })
        .collect()
}

/// Pen advance of a line without the trailing letter spacing
fn line_width(font: &BmFont, steps: &[Step<'_>], letter_spacing: f32) -> f32 {
    let mut pen = 0.0;
    let mut prev: Option<char> = None;
    let mut trailing = 0.0;
    for step in steps {
        match *step {
            Step::Skip => {}
            Step::Advance(amount) => {
                pen += amount;
                prev = None;
                trailing = 0.0;
            }
            Step::Glyph(ch, glyph) => {
                if let Some(p) = prev {
                    pen += font.kerning(p, ch);
                }
                pen += glyph.xadvance + letter_spacing;
                trailing = letter_spacing;
                prev = Some(ch);
            }
        }
    }
    pen - trailing
}
