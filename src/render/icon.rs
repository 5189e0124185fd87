//! Taskbar icon renderer
//!
//! The icon surface must catch the pointer everywhere inside its bounds, so
//! no pixel is ever fully transparent. The glyph is rasterized white on
//! black and converted to a theme-colored alpha glyph afterwards, which works
//! around text APIs that cannot write alpha.

use crate::compositor::{present_or_log, SurfacePresenter};
use crate::error::Result;
use crate::logging::Diagnostics;
use crate::render::surface::{Argb, PixelBuffer};
use crate::render::text::{scale_dip, FontSpec, TextAlign, TextRasterizer};
use crate::theme::Palette;

/// Alpha of otherwise empty icon pixels; zero would make them click-through
pub const HIT_TEST_ALPHA: u8 = 1;

/// Coverage at or below this is treated as background
pub const GLYPH_COVERAGE_THRESHOLD: u8 = 24;

const HIGHLIGHT_INSET_DIP: f32 = 2.0;
const HIGHLIGHT_RADIUS_DIP: f32 = 4.0;
const GLYPH_SIZE_DIP: f32 = 12.0;

pub struct IconRenderer<R: TextRasterizer> {
    rasterizer: R,
    glyph: String,
    width: i32,
    height: i32,
    dpi_scale: f32,
    diagnostics: Diagnostics,
}

impl<R: TextRasterizer> IconRenderer<R> {
    pub fn new(
        rasterizer: R,
        glyph: impl Into<String>,
        width: i32,
        height: i32,
        dpi_scale: f32,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            rasterizer,
            glyph: glyph.into(),
            width,
            height,
            dpi_scale,
            diagnostics,
        }
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Update dimensions after a DPI or taskbar size change
    pub fn resize(&mut self, width: i32, height: i32, dpi_scale: f32) {
        self.width = width;
        self.height = height;
        self.dpi_scale = dpi_scale;
    }

    pub fn glyph_font(&self) -> FontSpec {
        FontSpec::ui(GLYPH_SIZE_DIP, self.dpi_scale, true)
    }

    /// Build the icon frame without presenting it
    pub fn compose(&self, hover: bool, dark: bool) -> Result<PixelBuffer> {
        let palette = Palette::for_theme(dark);
        let mut buffer = PixelBuffer::filled(self.width, self.height, Argb::new(HIT_TEST_ALPHA, 0, 0, 0));

        if hover {
            let inset = scale_dip(HIGHLIGHT_INSET_DIP, self.dpi_scale);
            let radius = scale_dip(HIGHLIGHT_RADIUS_DIP, self.dpi_scale);
            buffer.fill_rounded_rect(buffer.bounds().inset(inset), radius, palette.icon_highlight);
        }

        let mut scratch = PixelBuffer::filled(self.width, self.height, Argb::rgb(0x000000));
        let bounds = scratch.bounds();
        self.rasterizer.draw(
            &mut scratch,
            &self.glyph,
            self.glyph_font(),
            bounds,
            Argb::rgb(0xFFFFFF),
            TextAlign::Center,
        )?;

        apply_glyph_coverage(&mut buffer, &scratch, palette.icon_foreground);
        Ok(buffer)
    }

    /// Paint and present the icon. Failures leave the previous frame up.
    pub fn render(&self, hover: bool, dark: bool, presenter: &mut dyn SurfacePresenter) -> bool {
        match self.compose(hover, dark) {
            Ok(buffer) => present_or_log(presenter, &buffer, None, 255, &self.diagnostics),
            Err(e) => {
                self.diagnostics.emit(&format!("Icon render failed: {}", e));
                false
            }
        }
    }
}

/// Turn a white-on-black glyph render into alpha: the brightest channel is
/// the coverage, and covered pixels take `foreground` at that alpha.
/// Uncovered pixels keep whatever `buffer` already holds.
pub fn apply_glyph_coverage(buffer: &mut PixelBuffer, glyph: &PixelBuffer, foreground: Argb) {
    for (dst, src) in buffer.pixels_mut().iter_mut().zip(glyph.pixels()) {
        let coverage = Argb(*src).max_channel();
        if coverage > GLYPH_COVERAGE_THRESHOLD {
            *dst = foreground.with_alpha(coverage).0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::testing::RecordingPresenter;
    use crate::render::text::testing::BlockRasterizer;

    fn renderer(glyph: &str) -> IconRenderer<BlockRasterizer> {
        IconRenderer::new(BlockRasterizer, glyph, 40, 40, 1.0, Diagnostics::none())
    }

    #[test]
    fn test_no_pixel_is_fully_transparent() {
        for glyph in ["500", ""] {
            for hover in [false, true] {
                for dark in [false, true] {
                    let buffer = renderer(glyph).compose(hover, dark).unwrap();
                    assert!(
                        buffer.pixels().iter().all(|p| Argb(*p).a() > 0),
                        "zero alpha with glyph={glyph:?} hover={hover} dark={dark}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_idle_background_is_hit_test_alpha() {
        let buffer = renderer("").compose(false, true).unwrap();
        assert!(buffer.pixels().iter().all(|p| Argb(*p).a() == HIT_TEST_ALPHA));
    }

    #[test]
    fn test_glyph_takes_theme_foreground() {
        let r = renderer("500");
        let dark = r.compose(false, true).unwrap();
        let light = r.compose(false, false).unwrap();

        // Middle character block sits at the center of the surface
        let (cx, cy) = (20, 20);
        assert_eq!(dark.get(cx, cy), Argb::rgb(0xFFFFFF));
        assert_eq!(light.get(cx, cy), Argb::rgb(0x1A1A1A));
    }

    #[test]
    fn test_hover_paints_highlight_inside_inset() {
        let r = renderer("500");
        let plain = r.compose(false, true).unwrap();
        let hovered = r.compose(true, true).unwrap();

        assert_eq!(plain.get(20, 2).a(), HIT_TEST_ALPHA);
        assert_eq!(hovered.get(20, 2), Argb::new(20, 255, 255, 255));
        // Outside the inset margin nothing changes
        assert_eq!(hovered.get(20, 0).a(), HIT_TEST_ALPHA);
        assert_eq!(hovered.get(2, 2).a(), HIT_TEST_ALPHA);
    }

    #[test]
    fn test_coverage_threshold_is_exclusive() {
        let mut buffer = PixelBuffer::filled(3, 1, Argb::new(HIT_TEST_ALPHA, 0, 0, 0));
        let mut glyph = PixelBuffer::filled(3, 1, Argb::rgb(0x000000));
        glyph.set(0, 0, Argb::new(0, GLYPH_COVERAGE_THRESHOLD, 0, 0));
        glyph.set(1, 0, Argb::new(0, 0, GLYPH_COVERAGE_THRESHOLD + 1, 3));
        glyph.set(2, 0, Argb::new(0, 10, 200, 90));

        apply_glyph_coverage(&mut buffer, &glyph, Argb::rgb(0xFFFFFF));

        assert_eq!(buffer.get(0, 0), Argb::new(HIT_TEST_ALPHA, 0, 0, 0));
        assert_eq!(buffer.get(1, 0), Argb::new(GLYPH_COVERAGE_THRESHOLD + 1, 255, 255, 255));
        assert_eq!(buffer.get(2, 0), Argb::new(200, 255, 255, 255));
    }

    #[test]
    fn test_render_presents_at_full_alpha() {
        let mut presenter = RecordingPresenter::default();
        assert!(renderer("500").render(true, false, &mut presenter));
        assert_eq!(presenter.frames.len(), 1);
        assert_eq!(presenter.frames[0].alpha, 255);
        assert_eq!(presenter.frames[0].origin, None);
        assert_eq!(presenter.frames[0].buffer.width(), 40);
    }

    #[test]
    fn test_glyph_font_scales_with_dpi() {
        let mut r = renderer("500");
        assert_eq!(r.glyph_font().size_px, 12);
        r.resize(80, 80, 2.0);
        assert_eq!(r.glyph_font().size_px, 24);
        assert!(r.glyph_font().bold);
    }
}
