//! Layered-window presenter
//!
//! Frames are copied into a 32-bpp top-down DIB section, premultiplied, and
//! pushed with a single `UpdateLayeredWindow` call.

use std::ffi::c_void;
use std::mem;
use std::ptr::null_mut;

use windows::Win32::Foundation::{COLORREF, HWND, POINT, SIZE};
use windows::Win32::Graphics::Gdi::{
    CreateCompatibleDC, CreateDIBSection, DeleteDC, DeleteObject, GetDC, ReleaseDC, SelectObject,
    AC_SRC_ALPHA, AC_SRC_OVER, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, BLENDFUNCTION, DIB_RGB_COLORS,
    HBITMAP, HDC, HGDIOBJ, RGBQUAD,
};
use windows::Win32::UI::WindowsAndMessaging::{UpdateLayeredWindow, ULW_ALPHA};

use crate::compositor::{Origin, SurfacePresenter};
use crate::error::{OverlayError, Result};
use crate::render::surface::PixelBuffer;

/// Screen DC, memory DC and a DIB selected into it.
///
/// Released in reverse: bitmap selected out, memory DC deleted, bitmap
/// deleted, screen DC released.
pub struct GdiSurface {
    screen_dc: HDC,
    mem_dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    bits: *mut u32,
    width: i32,
    height: i32,
}

impl GdiSurface {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(OverlayError::Surface(format!("invalid size {}x{}", width, height)));
        }

        unsafe {
            let screen_dc = GetDC(None);
            if screen_dc.is_invalid() {
                return Err(OverlayError::Surface("GetDC failed".to_string()));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            if mem_dc.is_invalid() {
                ReleaseDC(None, screen_dc);
                return Err(OverlayError::Surface("CreateCompatibleDC failed".to_string()));
            }

            let bmi = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    biHeight: -height, // Top-down
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0 as u32,
                    biSizeImage: 0,
                    biXPelsPerMeter: 0,
                    biYPelsPerMeter: 0,
                    biClrUsed: 0,
                    biClrImportant: 0,
                },
                bmiColors: [RGBQUAD::default()],
            };

            let mut bits: *mut c_void = null_mut();
            let bitmap = match CreateDIBSection(mem_dc, &bmi, DIB_RGB_COLORS, &mut bits, None, 0) {
                Ok(bitmap) if !bits.is_null() => bitmap,
                Ok(bitmap) => {
                    DeleteObject(bitmap);
                    DeleteDC(mem_dc);
                    ReleaseDC(None, screen_dc);
                    return Err(OverlayError::Surface("DIB section has no bits".to_string()));
                }
                Err(e) => {
                    DeleteDC(mem_dc);
                    ReleaseDC(None, screen_dc);
                    return Err(OverlayError::Surface(e.to_string()));
                }
            };

            let previous = SelectObject(mem_dc, bitmap);

            Ok(Self {
                screen_dc,
                mem_dc,
                bitmap,
                previous,
                bits: bits as *mut u32,
                width,
                height,
            })
        }
    }

    pub fn dc(&self) -> HDC {
        self.mem_dc
    }

    pub fn screen_dc(&self) -> HDC {
        self.screen_dc
    }

    pub fn size(&self) -> SIZE {
        SIZE {
            cx: self.width,
            cy: self.height,
        }
    }

    /// Raw BGRA pixels, row-major top-down
    pub fn pixels(&self) -> &[u32] {
        unsafe { std::slice::from_raw_parts(self.bits, (self.width * self.height) as usize) }
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        unsafe { std::slice::from_raw_parts_mut(self.bits, (self.width * self.height) as usize) }
    }
}

impl Drop for GdiSurface {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.mem_dc, self.previous);
            DeleteDC(self.mem_dc);
            DeleteObject(self.bitmap);
            ReleaseDC(None, self.screen_dc);
        }
    }
}

/// Presents frames onto one layered window
#[derive(Debug, Clone, Copy)]
pub struct LayeredPresenter {
    hwnd: HWND,
}

impl LayeredPresenter {
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }
}

impl SurfacePresenter for LayeredPresenter {
    fn present(&mut self, buffer: &PixelBuffer, origin: Option<Origin>, alpha: u8) -> Result<()> {
        let mut surface = GdiSurface::new(buffer.width(), buffer.height())?;
        buffer.write_premultiplied(surface.pixels_mut());

        let size = surface.size();
        let src_pos = POINT { x: 0, y: 0 };
        let dst_pos = origin.map(|o| POINT { x: o.x, y: o.y });
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: alpha,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };

        unsafe {
            UpdateLayeredWindow(
                self.hwnd,
                surface.screen_dc(),
                dst_pos.as_ref().map(|p| p as *const POINT),
                Some(&size),
                surface.dc(),
                Some(&src_pos),
                COLORREF(0),
                Some(&blend),
                ULW_ALPHA,
            )
        }
        .map_err(|e| OverlayError::Surface(format!("UpdateLayeredWindow failed: {}", e)))
    }
}
