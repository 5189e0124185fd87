//! Registry and system-color backed appearance source

use std::ffi::c_void;

use windows::core::PCWSTR;
use windows::Win32::Foundation::COLORREF;
use windows::Win32::Graphics::Gdi::{GetSysColor, COLOR_WINDOWTEXT};
use windows::Win32::System::Registry::{RegGetValueW, HKEY_CURRENT_USER, RRF_RT_REG_DWORD};

use super::{argb_from_colorref, wide};
use crate::render::surface::Argb;
use crate::theme::AppearanceSource;

const PERSONALIZE_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize";
const LIGHT_THEME_VALUE: &str = "SystemUsesLightTheme";

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAppearance;

impl AppearanceSource for SystemAppearance {
    fn shell_prefers_dark(&self) -> Option<bool> {
        let key = wide(PERSONALIZE_KEY);
        let value = wide(LIGHT_THEME_VALUE);
        let mut data: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;

        let status = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                PCWSTR(key.as_ptr()),
                PCWSTR(value.as_ptr()),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut data as *mut u32 as *mut c_void),
                Some(&mut size),
            )
        };

        if status.is_err() {
            tracing::debug!("{} unavailable: {:?}", LIGHT_THEME_VALUE, status);
            return None;
        }
        Some(data == 0)
    }

    fn foreground_color(&self) -> Option<Argb> {
        let color = unsafe { GetSysColor(COLOR_WINDOWTEXT) };
        Some(argb_from_colorref(COLORREF(color)))
    }
}
