//! Surface presenter seam
//!
//! A presenter takes a finished ARGB buffer and pushes it to the desktop in
//! one atomic per-pixel-alpha update. The Win32 implementation is
//! `host::layered::LayeredPresenter`.

use crate::error::Result;
use crate::logging::Diagnostics;
use crate::render::surface::PixelBuffer;

/// Screen position of a presented surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub x: i32,
    pub y: i32,
}

pub trait SurfacePresenter {
    /// Composite `buffer` at `origin` (or the window's current position when
    /// `None`) with `alpha` applied on top of the per-pixel alpha.
    fn present(&mut self, buffer: &PixelBuffer, origin: Option<Origin>, alpha: u8) -> Result<()>;
}

/// Present and swallow failures. The previous frame stays on screen.
pub fn present_or_log(
    presenter: &mut dyn SurfacePresenter,
    buffer: &PixelBuffer,
    origin: Option<Origin>,
    alpha: u8,
    diagnostics: &Diagnostics,
) -> bool {
    match presenter.present(buffer, origin, alpha) {
        Ok(()) => true,
        Err(e) => {
            diagnostics.emit(&format!("Frame skipped: {}", e));
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::OverlayError;

    #[derive(Debug, Clone)]
    pub struct PresentedFrame {
        pub buffer: PixelBuffer,
        pub origin: Option<Origin>,
        pub alpha: u8,
    }

    /// Keeps every frame it is handed; can be told to fail
    #[derive(Debug, Default)]
    pub struct RecordingPresenter {
        pub frames: Vec<PresentedFrame>,
        pub fail: bool,
    }

    impl SurfacePresenter for RecordingPresenter {
        fn present(&mut self, buffer: &PixelBuffer, origin: Option<Origin>, alpha: u8) -> Result<()> {
            if self.fail {
                return Err(OverlayError::Surface("CreateDIBSection failed".to_string()));
            }
            self.frames.push(PresentedFrame {
                buffer: buffer.clone(),
                origin,
                alpha,
            });
            Ok(())
        }
    }
}
