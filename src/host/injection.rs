//! Taskbar injection helper
//!
//! Creates the icon's layered popup, sizes it from the taskbar and the display
//! scale, and parks it in the first free slot after the taskbar's children,
//! short of the notification area.

use windows::core::PCWSTR;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DestroyWindow, SetWindowPos, ShowWindow, HMENU, HWND_TOPMOST, SWP_NOACTIVATE,
    SW_SHOWNOACTIVATE, WNDPROC, WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST,
    WS_POPUP,
};

use super::tray::{child_spans, find_taskbar, window_rect};
use super::{dpi_scale, register_class, wide};
use crate::config::OverlayConfig;
use crate::error::{OverlayError, Result};
use crate::render::text::scale_dip;
use crate::slot::{find_slot_within, slot_before, Slot};

#[derive(Debug, Clone, PartialEq)]
pub struct InjectionConfig {
    pub class_name: String,
    pub window_title: String,
    pub width_dip: i32,
    pub margin_dip: i32,
    /// Leave positioning to an explicit `inject()`
    pub defer_injection: bool,
}

impl InjectionConfig {
    pub fn from_config(config: &OverlayConfig) -> Self {
        InjectionConfig {
            class_name: "Menu500TrackerTaskbarWidget".to_string(),
            window_title: "Menu500Tracker".to_string(),
            width_dip: config.icon_width_dip,
            margin_dip: config.slot_margin_dip,
            defer_injection: true,
        }
    }
}

/// A created, not necessarily positioned, overlay window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Injected {
    pub window: HWND,
    pub taskbar: HWND,
    pub width: i32,
    pub height: i32,
    pub dpi_scale: f32,
}

impl Injected {
    /// Make the window visible without activating it
    pub fn show(&self) {
        unsafe {
            ShowWindow(self.window, SW_SHOWNOACTIVATE);
        }
    }
}

pub struct InjectionHelper {
    config: InjectionConfig,
    injected: Option<Injected>,
}

impl InjectionHelper {
    pub fn new(config: InjectionConfig) -> Self {
        Self {
            config,
            injected: None,
        }
    }

    pub fn injected(&self) -> Option<&Injected> {
        self.injected.as_ref()
    }

    /// Create the overlay window with `wndproc` as its window procedure
    pub fn initialize(&mut self, wndproc: WNDPROC) -> Result<Injected> {
        if let Some(injected) = self.injected {
            return Ok(injected);
        }

        let taskbar = find_taskbar().ok_or(OverlayError::TaskbarNotFound)?;
        let taskbar_rect = window_rect(taskbar).ok_or(OverlayError::TaskbarNotFound)?;

        let scale = dpi_scale(taskbar);
        let width = scale_dip(self.config.width_dip as f32, scale).max(1);
        let height = taskbar_rect.height.max(1);

        register_class(&self.config.class_name, wndproc)?;

        let class = wide(&self.config.class_name);
        let title = wide(&self.config.window_title);
        let window = unsafe {
            let hinstance = GetModuleHandleW(None).map_err(|e| OverlayError::WindowCreation(e.to_string()))?;
            CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE,
                PCWSTR(class.as_ptr()),
                PCWSTR(title.as_ptr()),
                WS_POPUP,
                taskbar_rect.x,
                taskbar_rect.y,
                width,
                height,
                HWND::default(),
                HMENU::default(),
                hinstance,
                None,
            )
        };

        if window == HWND::default() {
            return Err(OverlayError::WindowCreation("CreateWindowExW returned null".to_string()));
        }

        tracing::info!(width, height, scale, "Overlay window created");

        let injected = Injected {
            window,
            taskbar,
            width,
            height,
            dpi_scale: scale,
        };
        self.injected = Some(injected);

        if !self.config.defer_injection {
            self.inject()?;
        }
        Ok(injected)
    }

    /// Recompute the slot and move the window into it
    pub fn inject(&mut self) -> Result<Slot> {
        let injected = self.injected.as_mut().ok_or(OverlayError::TaskbarNotFound)?;
        let taskbar_rect = window_rect(injected.taskbar).ok_or(OverlayError::TaskbarNotFound)?;
        injected.height = taskbar_rect.height.max(1);

        let margin = scale_dip(self.config.margin_dip as f32, injected.dpi_scale);
        let children = child_spans(injected.taskbar, injected.window);
        let limit = children.notify_left.unwrap_or(taskbar_rect.width);
        let slot = match find_slot_within(&children.spans, injected.width, margin, limit) {
            Some(slot) => slot,
            None => {
                let y = children.spans.iter().map(|c| c.top).min().unwrap_or(0);
                tracing::warn!(limit, "No free taskbar slot; anchoring left of the notification area");
                slot_before(limit, y, injected.width, margin)
            }
        };
        let (left, top) = (taskbar_rect.x + slot.x, taskbar_rect.y + slot.y);

        unsafe {
            SetWindowPos(
                injected.window,
                HWND_TOPMOST,
                left,
                top,
                injected.width,
                injected.height,
                SWP_NOACTIVATE,
            )
        }
        .map_err(|e| OverlayError::WindowCreation(format!("SetWindowPos failed: {}", e)))?;

        tracing::info!(x = left, y = top, slot_x = slot.x, "Overlay injected");
        Ok(slot)
    }

    /// Rescale after a DPI change. Re-injects with the new width.
    pub fn rescale(&mut self, dpi_scale: f32) -> Result<Slot> {
        if let Some(injected) = self.injected.as_mut() {
            injected.dpi_scale = dpi_scale;
            injected.width = scale_dip(self.config.width_dip as f32, dpi_scale).max(1);
        }
        self.inject()
    }

    /// Forget the window without destroying it; used while it is being
    /// destroyed already
    pub fn release(&mut self) -> Option<Injected> {
        self.injected.take()
    }

    /// Destroy the window. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(injected) = self.injected.take() {
            unsafe {
                let _ = DestroyWindow(injected.window);
            }
        }
    }
}

impl Drop for InjectionHelper {
    fn drop(&mut self) {
        self.dispose();
    }
}
