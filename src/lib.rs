//! Menu500 Tracker library
//!
//! Taskbar overlay showing today's lunch menu: slot search, icon and tooltip
//! rendering, hover/fade interaction, the menu fetcher, and the Win32 glue
//! that ties them to the desktop.

pub mod compositor;
pub mod config;
pub mod error;
pub mod fetch;
#[cfg(windows)]
pub mod host;
pub mod interaction;
pub mod logging;
pub mod menu;
pub mod render;
pub mod slot;
pub mod startup;
pub mod theme;

pub use error::{OverlayError, Result};
