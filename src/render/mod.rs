//! Pixel rendering for the icon and tooltip surfaces

pub mod icon;
pub mod surface;
pub mod text;
pub mod tooltip;

pub use icon::IconRenderer;
pub use surface::{in_rounded_rect, Argb, PixelBuffer, Rect};
pub use text::{FontSpec, TextAlign, TextExtent, TextRasterizer};
pub use tooltip::{TooltipContent, TooltipFrame, TooltipRenderer};
