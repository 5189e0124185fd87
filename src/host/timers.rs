//! `SetTimer`-backed timer backend

use std::time::Duration;

use windows::Win32::Foundation::HWND;
use windows::Win32::UI::WindowsAndMessaging::{KillTimer, SetTimer};

use crate::interaction::{TimerBackend, TimerKind};

/// Window timers delivered as `WM_TIMER` with `TimerKind::id()` in wparam
#[derive(Debug, Clone, Copy)]
pub struct Win32Timers {
    hwnd: HWND,
}

impl Win32Timers {
    pub fn new(hwnd: HWND) -> Self {
        Self { hwnd }
    }
}

impl TimerBackend for Win32Timers {
    fn start(&mut self, kind: TimerKind, interval: Duration) {
        let millis = interval.as_millis().clamp(1, u32::MAX as u128) as u32;
        let id = unsafe { SetTimer(self.hwnd, kind.id(), millis, None) };
        if id == 0 {
            tracing::warn!("SetTimer failed for {:?}", kind);
        }
    }

    fn stop(&mut self, kind: TimerKind) {
        unsafe {
            let _ = KillTimer(self.hwnd, kind.id());
        }
    }
}
