//! Tooltip panel renderer
//!
//! Produces a content-fitted rounded panel that is opaque inside its mask.
//! The fade alpha is applied by the presenter, so one render serves a whole
//! fade transition.

use crate::error::Result;
use crate::render::surface::{in_rounded_rect, Argb, PixelBuffer, Rect};
use crate::render::text::{scale_dip, FontSpec, TextAlign, TextExtent, TextRasterizer};
use crate::theme::Palette;

const PADDING_DIP: f32 = 12.0;
const CORNER_RADIUS_DIP: f32 = 8.0;
const TITLE_BODY_GAP_DIP: f32 = 6.0;
const ANCHOR_GAP_DIP: f32 = 8.0;
const MAX_CONTENT_WIDTH_DIP: f32 = 320.0;
const TITLE_FONT_DIP: f32 = 14.0;
const BODY_FONT_DIP: f32 = 12.0;

/// Title plus ordered body lines; an immutable snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TooltipContent {
    pub title: String,
    pub lines: Vec<String>,
}

impl TooltipContent {
    pub fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }

    pub fn body(&self) -> String {
        self.lines.join("\n")
    }

    /// Nothing to show; suppresses the tooltip
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.lines.iter().all(|l| l.trim().is_empty())
    }
}

/// DPI-scaled panel metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooltipMetrics {
    pub padding: i32,
    pub corner_radius: i32,
    pub title_body_gap: i32,
    pub anchor_gap: i32,
    pub max_content_width: i32,
    pub title_font: FontSpec,
    pub body_font: FontSpec,
}

impl TooltipMetrics {
    pub fn for_scale(dpi_scale: f32) -> Self {
        TooltipMetrics {
            padding: scale_dip(PADDING_DIP, dpi_scale),
            corner_radius: scale_dip(CORNER_RADIUS_DIP, dpi_scale),
            title_body_gap: scale_dip(TITLE_BODY_GAP_DIP, dpi_scale),
            anchor_gap: scale_dip(ANCHOR_GAP_DIP, dpi_scale),
            max_content_width: scale_dip(MAX_CONTENT_WIDTH_DIP, dpi_scale),
            title_font: FontSpec::ui(TITLE_FONT_DIP, dpi_scale, true),
            body_font: FontSpec::ui(BODY_FONT_DIP, dpi_scale, false),
        }
    }
}

/// Computed placement; `panel` is in screen coordinates, text rects are
/// panel-local
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooltipLayout {
    pub panel: Rect,
    pub title: Rect,
    pub body: Rect,
}

/// Rendered tooltip ready to be presented at any alpha
#[derive(Debug, Clone)]
pub struct TooltipFrame {
    pub buffer: PixelBuffer,
    pub rect: Rect,
}

pub struct TooltipRenderer<R: TextRasterizer> {
    rasterizer: R,
    metrics: TooltipMetrics,
}

impl<R: TextRasterizer> TooltipRenderer<R> {
    pub fn new(rasterizer: R, dpi_scale: f32) -> Self {
        Self {
            rasterizer,
            metrics: TooltipMetrics::for_scale(dpi_scale),
        }
    }

    pub fn metrics(&self) -> &TooltipMetrics {
        &self.metrics
    }

    pub fn set_dpi_scale(&mut self, dpi_scale: f32) {
        self.metrics = TooltipMetrics::for_scale(dpi_scale);
    }

    fn measure(&self, text: &str, font: FontSpec) -> Result<TextExtent> {
        if text.is_empty() {
            return Ok(TextExtent::default());
        }
        self.rasterizer.measure(text, font, self.metrics.max_content_width)
    }

    /// Measure and place the panel above `anchor`. `None` for empty content.
    pub fn layout(&self, content: &TooltipContent, anchor: Rect) -> Result<Option<TooltipLayout>> {
        if content.is_empty() {
            return Ok(None);
        }
        let m = &self.metrics;

        let title = self.measure(content.title.trim(), m.title_font)?;
        let body = self.measure(&content.body(), m.body_font)?;

        let gap = if !title.is_empty() && !body.is_empty() {
            m.title_body_gap
        } else {
            0
        };
        let content_width = title.width.max(body.width);
        let content_height = title.height + gap + body.height;

        let width = content_width + 2 * m.padding;
        let height = content_height + 2 * m.padding;
        let x = (anchor.x + anchor.width / 2 - width / 2).max(0);
        let y = (anchor.y - m.anchor_gap - height).max(0);

        Ok(Some(TooltipLayout {
            panel: Rect::new(x, y, width, height),
            title: Rect::new(m.padding, m.padding, content_width, title.height),
            body: Rect::new(m.padding, m.padding + title.height + gap, content_width, body.height),
        }))
    }

    /// Render the panel for `content` above `anchor`
    pub fn render(&self, content: &TooltipContent, dark: bool, anchor: Rect) -> Result<Option<TooltipFrame>> {
        let Some(layout) = self.layout(content, anchor)? else {
            return Ok(None);
        };
        let palette = Palette::for_theme(dark);
        let radius = self.metrics.corner_radius;

        let mut buffer = PixelBuffer::new(layout.panel.width, layout.panel.height);
        buffer.fill_rounded_rect(buffer.bounds(), radius, palette.tooltip_background);

        if !layout.title.is_empty() {
            self.rasterizer.draw(
                &mut buffer,
                content.title.trim(),
                self.metrics.title_font,
                layout.title,
                palette.tooltip_title,
                TextAlign::TopLeft,
            )?;
        }
        if !layout.body.is_empty() {
            self.rasterizer.draw(
                &mut buffer,
                &content.body(),
                self.metrics.body_font,
                layout.body,
                palette.tooltip_body,
                TextAlign::TopLeft,
            )?;
        }

        seal_panel(&mut buffer, radius, palette.tooltip_border);

        Ok(Some(TooltipFrame {
            buffer,
            rect: layout.panel,
        }))
    }
}

/// Force alpha: opaque inside the rounded mask, a 1px border ring just
/// inside its edge, fully transparent outside
pub fn seal_panel(buffer: &mut PixelBuffer, radius: i32, border: Argb) {
    let (w, h) = (buffer.width(), buffer.height());
    let inner_radius = (radius - 1).max(0);
    for y in 0..h {
        for x in 0..w {
            let color = if !in_rounded_rect(x, y, w, h, radius) {
                Argb::TRANSPARENT
            } else if !in_rounded_rect(x - 1, y - 1, w - 2, h - 2, inner_radius) {
                border
            } else {
                buffer.get(x, y).with_alpha(255)
            };
            buffer.set(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::testing::BlockRasterizer;

    const ANCHOR: Rect = Rect::new(400, 1040, 40, 40);

    fn content(title: &str, lines: &[&str]) -> TooltipContent {
        TooltipContent::new(title, lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_empty_content_renders_nothing() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        assert!(renderer.render(&TooltipContent::default(), true, ANCHOR).unwrap().is_none());
        assert!(renderer.render(&content(" ", &["", "  "]), true, ANCHOR).unwrap().is_none());
    }

    #[test]
    fn test_layout_fits_content() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let layout = renderer.layout(&content("Monday", &["Goulash"]), ANCHOR).unwrap().unwrap();
        let m = renderer.metrics();

        // Title: 6 chars * 7px; body: 7 chars * 6px
        assert_eq!(layout.title.width, 42);
        assert_eq!(layout.panel.width, 42 + 2 * m.padding);
        assert_eq!(layout.title.height, 17);
        assert_eq!(layout.body.height, 15);
        assert_eq!(layout.body.y, m.padding + 17 + m.title_body_gap);
        assert_eq!(layout.panel.height, 17 + m.title_body_gap + 15 + 2 * m.padding);
    }

    #[test]
    fn test_no_gap_without_title() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let layout = renderer.layout(&content("", &["network unreachable"]), ANCHOR).unwrap().unwrap();
        let m = renderer.metrics();
        assert!(layout.title.is_empty());
        assert_eq!(layout.body.y, m.padding);
        assert_eq!(layout.panel.height, 15 + 2 * m.padding);
    }

    #[test]
    fn test_panel_centered_above_anchor() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let layout = renderer.layout(&content("Monday", &["Goulash"]), ANCHOR).unwrap().unwrap();
        let panel = layout.panel;
        assert_eq!(panel.x + panel.width / 2, ANCHOR.x + ANCHOR.width / 2);
        assert_eq!(panel.bottom(), ANCHOR.y - renderer.metrics().anchor_gap);
    }

    #[test]
    fn test_panel_clamped_to_screen_origin() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let anchor = Rect::new(0, 10, 20, 20);
        let layout = renderer.layout(&content("Wednesday", &["Soup", "Main"]), anchor).unwrap().unwrap();
        assert_eq!((layout.panel.x, layout.panel.y), (0, 0));
    }

    #[test]
    fn test_long_body_wraps_at_max_width() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let long = "word ".repeat(100);
        let layout = renderer.layout(&content("", &[long.trim()]), ANCHOR).unwrap().unwrap();
        assert!(layout.body.width <= renderer.metrics().max_content_width);
        assert!(layout.body.height > BlockRasterizer::line_height(renderer.metrics().body_font));
    }

    #[test]
    fn test_metrics_double_with_dpi() {
        let one = TooltipMetrics::for_scale(1.0);
        let two = TooltipMetrics::for_scale(2.0);
        assert_eq!(two.padding, 2 * one.padding);
        assert_eq!(two.corner_radius, 2 * one.corner_radius);
        assert_eq!(two.title_font.size_px, 2 * one.title_font.size_px);
        assert_eq!(two.body_font.size_px, 2 * one.body_font.size_px);
        assert_eq!(two.max_content_width, 2 * one.max_content_width);
    }

    #[test]
    fn test_panel_size_scales_with_dpi() {
        let c = content("Monday", &["Goulash", "Dumplings with cabbage"]);
        let one = TooltipRenderer::new(BlockRasterizer, 1.0).layout(&c, ANCHOR).unwrap().unwrap();
        let two = TooltipRenderer::new(BlockRasterizer, 2.0).layout(&c, ANCHOR).unwrap().unwrap();
        assert_eq!(two.panel.width, 2 * one.panel.width);
        assert!((two.panel.height - 2 * one.panel.height).abs() <= 4);
    }

    #[test]
    fn test_rendered_alpha_mask() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let frame = renderer.render(&content("Monday", &["Goulash"]), true, ANCHOR).unwrap().unwrap();
        let buf = &frame.buffer;
        let palette = Palette::for_theme(true);
        let (w, h) = (buf.width(), buf.height());
        let r = renderer.metrics().corner_radius;

        assert_eq!(frame.rect.width, w);
        for y in 0..h {
            for x in 0..w {
                let inside = in_rounded_rect(x, y, w, h, r);
                assert_eq!(buf.get(x, y).a(), if inside { 255 } else { 0 }, "alpha at ({x}, {y})");
            }
        }
        assert_eq!(buf.get(0, 0), Argb::TRANSPARENT);
        assert_eq!(buf.get(w / 2, 0), palette.tooltip_border);
        assert_eq!(buf.get(0, h / 2), palette.tooltip_border);
        assert_eq!(buf.get(w / 2, h - 1), palette.tooltip_border);
        assert_eq!(buf.get(w / 2, 2), palette.tooltip_background);
    }

    #[test]
    fn test_text_uses_theme_colors() {
        let renderer = TooltipRenderer::new(BlockRasterizer, 1.0);
        let frame = renderer.render(&content("Monday", &["Goulash"]), false, ANCHOR).unwrap().unwrap();
        let palette = Palette::for_theme(false);
        let p = renderer.metrics().padding;
        let layout = renderer.layout(&content("Monday", &["Goulash"]), ANCHOR).unwrap().unwrap();

        assert_eq!(frame.buffer.get(p + 1, p + 1), palette.tooltip_title);
        assert_eq!(frame.buffer.get(p + 1, layout.body.y + 1), palette.tooltip_body);
    }
}
