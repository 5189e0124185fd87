//! GDI implementation of the text rasterizer

use windows::core::PCWSTR;
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateFontW, DeleteDC, DeleteObject, DrawTextW, SelectObject, SetBkMode,
    SetTextColor, CLEARTYPE_QUALITY, CLIP_DEFAULT_PRECIS, DEFAULT_CHARSET, DEFAULT_PITCH,
    DT_CALCRECT, DT_CENTER, DT_LEFT, DT_NOPREFIX, DT_SINGLELINE, DT_TOP, DT_VCENTER,
    DT_WORDBREAK, FF_DONTCARE, FW_BOLD, FW_NORMAL, HDC, HFONT, OUT_DEFAULT_PRECIS, TRANSPARENT,
};

use super::colorref_from_argb;
use super::layered::GdiSurface;
use super::wide;
use crate::error::{OverlayError, Result};
use crate::render::surface::{Argb, PixelBuffer, Rect};
use crate::render::text::{FontSpec, TextAlign, TextExtent, TextRasterizer, UI_FONT_FACE};

/// Owned GDI font handle
struct GdiFont(HFONT);

impl GdiFont {
    fn create(font: FontSpec) -> Result<Self> {
        let face = wide(UI_FONT_FACE);
        let weight = if font.bold { FW_BOLD.0 } else { FW_NORMAL.0 };
        let handle = unsafe {
            CreateFontW(
                -font.size_px,
                0,
                0,
                0,
                weight as i32,
                0,
                0,
                0,
                DEFAULT_CHARSET.0 as u32,
                OUT_DEFAULT_PRECIS.0 as u32,
                CLIP_DEFAULT_PRECIS.0 as u32,
                CLEARTYPE_QUALITY.0 as u32,
                (DEFAULT_PITCH.0 | FF_DONTCARE.0) as u32,
                PCWSTR(face.as_ptr()),
            )
        };
        if handle.is_invalid() {
            return Err(OverlayError::Text(format!("CreateFontW failed for {}px", font.size_px)));
        }
        Ok(Self(handle))
    }
}

impl Drop for GdiFont {
    fn drop(&mut self) {
        unsafe {
            DeleteObject(self.0);
        }
    }
}

/// Runs `f` with `font` selected into `dc`, restoring the previous font
unsafe fn with_font<T>(dc: HDC, font: &GdiFont, f: impl FnOnce() -> T) -> T {
    let previous = SelectObject(dc, font.0);
    let out = f();
    SelectObject(dc, previous);
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GdiTextRasterizer;

impl TextRasterizer for GdiTextRasterizer {
    fn measure(&self, text: &str, font: FontSpec, max_width: i32) -> Result<TextExtent> {
        if text.is_empty() {
            return Ok(TextExtent::default());
        }
        let gdi_font = GdiFont::create(font)?;
        let mut chars: Vec<u16> = text.encode_utf16().collect();
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: max_width.max(1),
            bottom: 0,
        };

        unsafe {
            let dc = CreateCompatibleDC(None);
            if dc.is_invalid() {
                return Err(OverlayError::Text("CreateCompatibleDC failed".to_string()));
            }
            let height = with_font(dc, &gdi_font, || {
                DrawTextW(dc, &mut chars, &mut rect, DT_CALCRECT | DT_WORDBREAK | DT_NOPREFIX | DT_LEFT)
            });
            DeleteDC(dc);

            if height == 0 {
                return Err(OverlayError::Text("DrawTextW could not measure text".to_string()));
            }
        }

        Ok(TextExtent {
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
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
        let clip = clip_to(layout, target.bounds());
        if text.is_empty() || clip.is_empty() {
            return Ok(());
        }

        let gdi_font = GdiFont::create(font)?;
        let mut surface = GdiSurface::new(clip.width, clip.height)?;

        // Seed the DIB with the real background so ClearType blends against it
        copy_region(target, clip, surface.pixels_mut(), false);

        let format = match align {
            TextAlign::TopLeft => DT_LEFT | DT_TOP | DT_WORDBREAK | DT_NOPREFIX,
            TextAlign::Center => DT_CENTER | DT_VCENTER | DT_SINGLELINE | DT_NOPREFIX,
        };
        let mut chars: Vec<u16> = text.encode_utf16().collect();
        // Text origin relative to the clipped region
        let mut rect = RECT {
            left: layout.x - clip.x,
            top: layout.y - clip.y,
            right: layout.x - clip.x + layout.width,
            bottom: layout.y - clip.y + layout.height,
        };

        let drawn = unsafe {
            let dc = surface.dc();
            SetBkMode(dc, TRANSPARENT);
            SetTextColor(dc, colorref_from_argb(color));
            with_font(dc, &gdi_font, || DrawTextW(dc, &mut chars, &mut rect, format))
        };
        if drawn == 0 {
            return Err(OverlayError::Text("DrawTextW failed".to_string()));
        }

        copy_region(target, clip, surface.pixels_mut(), true);
        Ok(())
    }
}

fn clip_to(rect: Rect, bounds: Rect) -> Rect {
    let left = rect.x.max(bounds.x);
    let top = rect.y.max(bounds.y);
    let right = rect.right().min(bounds.right());
    let bottom = rect.bottom().min(bounds.bottom());
    Rect::new(left, top, (right - left).max(0), (bottom - top).max(0))
}

/// Copy `region` of `target` into `dib`, or back when `to_target` is set.
/// Writing back keeps the target's alpha since GDI leaves alpha undefined.
fn copy_region(target: &mut PixelBuffer, region: Rect, dib: &mut [u32], to_target: bool) {
    for row in 0..region.height {
        for col in 0..region.width {
            let (x, y) = (region.x + col, region.y + row);
            let index = (row * region.width + col) as usize;
            if to_target {
                let alpha = target.get(x, y).a();
                target.set(x, y, Argb(dib[index]).with_alpha(alpha));
            } else {
                dib[index] = target.get(x, y).0;
            }
        }
    }
}
