//! Text measurement and rasterization seam
//!
//! Renderers never call the host's text API directly. On Windows the GDI
//! implementation lives in `host::gdi_text`; tests use a deterministic block
//! rasterizer.

use crate::error::Result;
use crate::render::surface::{Argb, PixelBuffer, Rect};

/// Standard UI typeface
pub const UI_FONT_FACE: &str = "Segoe UI";

/// Font request in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSpec {
    pub size_px: i32,
    pub bold: bool,
}

impl FontSpec {
    /// Scale a DIP font size to physical pixels
    pub fn ui(size_dip: f32, dpi_scale: f32, bold: bool) -> Self {
        FontSpec {
            size_px: scale_dip(size_dip, dpi_scale).max(1),
            bold,
        }
    }
}

/// Convert device independent pixels to physical pixels
pub fn scale_dip(dip: f32, dpi_scale: f32) -> i32 {
    (dip * dpi_scale).round() as i32
}

/// Measured size of a (possibly wrapped) text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextExtent {
    pub width: i32,
    pub height: i32,
}

impl TextExtent {
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Left aligned, top anchored, word wrapped
    TopLeft,
    /// Single line centered both ways
    Center,
}

pub trait TextRasterizer {
    /// Measure `text` word-wrapped to `max_width`
    fn measure(&self, text: &str, font: FontSpec, max_width: i32) -> Result<TextExtent>;

    /// Draw `text` into `target` inside `layout`. Only the color channels of
    /// touched pixels are meaningful afterwards; alpha is left to the caller.
    fn draw(
        &self,
        target: &mut PixelBuffer,
        text: &str,
        font: FontSpec,
        layout: Rect,
        color: Argb,
        align: TextAlign,
    ) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixed-advance block font for tests

    use super::*;

    /// Each character is `size_px / 2` wide; lines are `size_px * 5 / 4`
    /// tall. Glyphs are drawn as solid blocks in the requested color.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct BlockRasterizer;

    impl BlockRasterizer {
        pub fn advance(font: FontSpec) -> i32 {
            (font.size_px / 2).max(1)
        }

        pub fn line_height(font: FontSpec) -> i32 {
            font.size_px + font.size_px / 4
        }

        pub fn wrap(text: &str, font: FontSpec, max_width: i32) -> Vec<String> {
            let advance = Self::advance(font);
            let max_chars = if max_width > 0 {
                (max_width / advance).max(1) as usize
            } else {
                usize::MAX
            };

            let mut lines = Vec::new();
            for paragraph in text.split('\n') {
                let mut line = String::new();
                for word in paragraph.split_whitespace() {
                    let candidate = if line.is_empty() {
                        word.to_string()
                    } else {
                        format!("{} {}", line, word)
                    };
                    if candidate.chars().count() <= max_chars || line.is_empty() {
                        line = candidate;
                    } else {
                        lines.push(std::mem::take(&mut line));
                        line = word.to_string();
                    }
                }
                lines.push(line);
            }
            lines
        }
    }

    impl TextRasterizer for BlockRasterizer {
        fn measure(&self, text: &str, font: FontSpec, max_width: i32) -> Result<TextExtent> {
            if text.is_empty() {
                return Ok(TextExtent::default());
            }
            let lines = Self::wrap(text, font, max_width);
            let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;
            Ok(TextExtent {
                width: widest * Self::advance(font),
                height: lines.len() as i32 * Self::line_height(font),
            })
        }

        fn draw(
            &self,
            target: &mut PixelBuffer,
            text: &str,
            font: FontSpec,
            layout: Rect,
            color: Argb,
            align: TextAlign,
        ) -> Result<()> {
            let advance = Self::advance(font);
            let line_height = Self::line_height(font);
            let lines = Self::wrap(text, font, layout.width);

            for (row, line) in lines.iter().enumerate() {
                let line_width = line.chars().count() as i32 * advance;
                let (x0, y0) = match align {
                    TextAlign::TopLeft => (layout.x, layout.y + row as i32 * line_height),
                    TextAlign::Center => (
                        layout.x + (layout.width - line_width) / 2,
                        layout.y + (layout.height - font.size_px) / 2,
                    ),
                };
                for (i, ch) in line.chars().enumerate() {
                    if ch.is_whitespace() {
                        continue;
                    }
                    let gx = x0 + i as i32 * advance;
                    for y in y0..y0 + font.size_px {
                        for x in gx..gx + (advance - 1).max(1) {
                            if y >= layout.y && y < layout.bottom() && x >= layout.x && x < layout.right() {
                                target.set(x, y, color);
                            }
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::BlockRasterizer;
    use super::*;

    #[test]
    fn test_font_scaling() {
        assert_eq!(FontSpec::ui(14.0, 1.0, false).size_px, 14);
        assert_eq!(FontSpec::ui(14.0, 1.5, true).size_px, 21);
        assert_eq!(FontSpec::ui(0.1, 1.0, false).size_px, 1);
    }

    #[test]
    fn test_block_wrap() {
        let font = FontSpec { size_px: 10, bold: false };
        let lines = BlockRasterizer::wrap("aaa bbb ccc", font, 35);
        assert_eq!(lines, vec!["aaa bbb".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn test_block_measure() {
        let font = FontSpec { size_px: 10, bold: false };
        let extent = BlockRasterizer.measure("ab\ncde", font, 0).unwrap();
        assert_eq!(extent, TextExtent { width: 15, height: 24 });
        assert!(BlockRasterizer.measure("", font, 100).unwrap().is_empty());
    }
}
