//! Light/dark appearance detection
//!
//! The primary query reads the host's personalization setting. When that is
//! unavailable the foreground text color is sampled and its luminance tested
//! against the midpoint. If both fail the overlay renders dark.

use crate::render::surface::Argb;

/// Luminance midpoint separating dark from light foreground colors
pub const LUMINANCE_MIDPOINT: u32 = 128;

/// Where appearance information comes from
pub trait AppearanceSource {
    /// `Some(true)` when the shell uses the dark theme
    fn shell_prefers_dark(&self) -> Option<bool>;

    /// Representative foreground (text) color
    fn foreground_color(&self) -> Option<Argb>;
}

/// Rec. 601 luma of a color, 0..=255
pub fn luminance(color: Argb) -> u32 {
    (299 * color.r() as u32 + 587 * color.g() as u32 + 114 * color.b() as u32) / 1000
}

/// Light text implies a dark background
pub fn dark_from_foreground(color: Argb) -> bool {
    luminance(color) >= LUMINANCE_MIDPOINT
}

pub fn is_dark_mode_with(source: &dyn AppearanceSource) -> bool {
    if let Some(dark) = source.shell_prefers_dark() {
        return dark;
    }
    if let Some(fg) = source.foreground_color() {
        tracing::debug!("Theme query unavailable, using foreground luminance");
        return dark_from_foreground(fg);
    }
    true
}

/// Query the current host appearance. Never fails.
pub fn is_dark_mode() -> bool {
    #[cfg(windows)]
    {
        is_dark_mode_with(&crate::host::appearance::SystemAppearance)
    }
    #[cfg(not(windows))]
    {
        is_dark_mode_with(&NoAppearance)
    }
}

/// Source that knows nothing; yields the dark default
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAppearance;

impl AppearanceSource for NoAppearance {
    fn shell_prefers_dark(&self) -> Option<bool> {
        None
    }

    fn foreground_color(&self) -> Option<Argb> {
        None
    }
}

/// Colors used by both renderers for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub icon_foreground: Argb,
    pub icon_highlight: Argb,
    pub tooltip_background: Argb,
    pub tooltip_border: Argb,
    pub tooltip_title: Argb,
    pub tooltip_body: Argb,
}

impl Palette {
    pub fn for_theme(dark: bool) -> Self {
        if dark {
            Palette {
                icon_foreground: Argb::rgb(0xFFFFFF),
                icon_highlight: Argb::new(20, 255, 255, 255),
                tooltip_background: Argb::rgb(0x2B2B2B),
                tooltip_border: Argb::rgb(0x454545),
                tooltip_title: Argb::rgb(0xFFFFFF),
                tooltip_body: Argb::rgb(0xD0D0D0),
            }
        } else {
            Palette {
                icon_foreground: Argb::rgb(0x1A1A1A),
                icon_highlight: Argb::new(20, 0, 0, 0),
                tooltip_background: Argb::rgb(0xF9F9F9),
                tooltip_border: Argb::rgb(0xD0D0D0),
                tooltip_title: Argb::rgb(0x1A1A1A),
                tooltip_body: Argb::rgb(0x404040),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Option<bool>, Option<Argb>);

    impl AppearanceSource for Fixed {
        fn shell_prefers_dark(&self) -> Option<bool> {
            self.0
        }

        fn foreground_color(&self) -> Option<Argb> {
            self.1
        }
    }

    #[test]
    fn test_primary_query_wins() {
        assert!(!is_dark_mode_with(&Fixed(Some(false), Some(Argb::rgb(0xFFFFFF)))));
        assert!(is_dark_mode_with(&Fixed(Some(true), Some(Argb::rgb(0x000000)))));
    }

    #[test]
    fn test_luminance_fallback() {
        assert!(is_dark_mode_with(&Fixed(None, Some(Argb::rgb(0xF0F0F0)))));
        assert!(!is_dark_mode_with(&Fixed(None, Some(Argb::rgb(0x101010)))));
    }

    #[test]
    fn test_default_is_dark() {
        assert!(is_dark_mode_with(&NoAppearance));
    }

    #[test]
    fn test_luminance_midpoint() {
        assert_eq!(luminance(Argb::rgb(0xFFFFFF)), 255);
        assert_eq!(luminance(Argb::rgb(0x000000)), 0);
        assert!(dark_from_foreground(Argb::rgb(0x808080)));
        assert!(!dark_from_foreground(Argb::rgb(0x7F7F7F)));
    }
}
