//! Off-screen ARGB pixel buffers and the rounded-rectangle mask

/// Straight (non-premultiplied) color, packed as `0xAARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argb(pub u32);

impl Argb {
    pub const TRANSPARENT: Argb = Argb(0);

    pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Argb(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Opaque color from `0xRRGGBB`
    pub const fn rgb(hex: u32) -> Self {
        Argb(0xFF00_0000 | (hex & 0x00FF_FFFF))
    }

    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Argb((self.0 & 0x00FF_FFFF) | ((a as u32) << 24))
    }

    /// Brightest color channel, used as glyph coverage
    pub fn max_channel(self) -> u8 {
        self.r().max(self.g()).max(self.b())
    }

    /// Premultiplied form expected by per-pixel alpha window updates
    pub fn premultiplied(self) -> u32 {
        let a = self.a() as u32;
        match a {
            0 => 0,
            255 => self.0,
            _ => {
                let r = self.r() as u32 * a / 255;
                let g = self.g() as u32 * a / 255;
                let b = self.b() as u32 * a / 255;
                (a << 24) | (r << 16) | (g << 8) | b
            }
        }
    }
}

/// Screen or surface rectangle, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Shrink on all sides, never below zero size
    pub fn inset(&self, by: i32) -> Rect {
        Rect {
            x: self.x + by,
            y: self.y + by,
            width: (self.width - 2 * by).max(0),
            height: (self.height - 2 * by).max(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Rounded-rectangle membership for pixel `(x, y)` within a `width` x
/// `height` box anchored at the origin.
///
/// Pixels are sampled at their centers. Inside the straight-edge bands only
/// the axis bounds matter; in a corner square the pixel center must lie
/// within `radius` of the corner circle's center. Computed on doubled
/// coordinates so it stays in integers.
pub fn in_rounded_rect(x: i32, y: i32, width: i32, height: i32, radius: i32) -> bool {
    if x < 0 || y < 0 || x >= width || y >= height {
        return false;
    }
    let radius = radius.clamp(0, width.min(height) / 2);
    if radius == 0 {
        return true;
    }

    let in_left = x < radius;
    let in_right = x >= width - radius;
    let in_top = y < radius;
    let in_bottom = y >= height - radius;
    if !((in_left || in_right) && (in_top || in_bottom)) {
        return true;
    }

    let cx2 = if in_left { 2 * radius } else { 2 * (width - radius) };
    let cy2 = if in_top { 2 * radius } else { 2 * (height - radius) };
    let dx = (2 * x + 1 - cx2) as i64;
    let dy = (2 * y + 1 - cy2) as i64;
    let r2 = (2 * radius) as i64;
    dx * dx + dy * dy <= r2 * r2
}

/// Same predicate for a rectangle placed anywhere on the surface
pub fn in_rounded_rect_at(x: i32, y: i32, rect: Rect, radius: i32) -> bool {
    in_rounded_rect(x - rect.x, y - rect.y, rect.width, rect.height, radius)
}

/// Owned ARGB pixel buffer, row-major, top-down
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, Argb::TRANSPARENT)
    }

    pub fn filled(width: i32, height: i32, color: Argb) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        PixelBuffer {
            width,
            height,
            pixels: vec![color.0; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            None
        } else {
            Some((y * self.width + x) as usize)
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Argb {
        self.index(x, y)
            .map(|i| Argb(self.pixels[i]))
            .unwrap_or(Argb::TRANSPARENT)
    }

    pub fn set(&mut self, x: i32, y: i32, color: Argb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.0;
        }
    }

    pub fn fill(&mut self, color: Argb) {
        self.pixels.fill(color.0);
    }

    /// Fill every pixel inside the rounded mask of `rect`
    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: i32, color: Argb) {
        for y in rect.y.max(0)..rect.bottom().min(self.height) {
            for x in rect.x.max(0)..rect.right().min(self.width) {
                if in_rounded_rect_at(x, y, rect, radius) {
                    self.set(x, y, color);
                }
            }
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Copy into a premultiplied destination (BGRA in memory on little-endian)
    pub fn write_premultiplied(&self, dst: &mut [u32]) {
        for (d, s) in dst.iter_mut().zip(self.pixels.iter()) {
            *d = Argb(*s).premultiplied();
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force(x: i32, y: i32, w: i32, h: i32, r: i32) -> bool {
        if x < 0 || y < 0 || x >= w || y >= h {
            return false;
        }
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;
        let r = r as f64;
        let cx = px.clamp(r, w as f64 - r);
        let cy = py.clamp(r, h as f64 - r);
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy <= r * r + 1e-9
    }

    #[test]
    fn test_rounded_rect_matches_brute_force() {
        for &(w, h, r) in &[(40, 30, 6), (17, 17, 8), (64, 20, 10), (9, 5, 2), (12, 12, 1)] {
            for y in -1..=h {
                for x in -1..=w {
                    assert_eq!(
                        in_rounded_rect(x, y, w, h, r),
                        brute_force(x, y, w, h, r),
                        "mismatch at ({x}, {y}) in {w}x{h} r={r}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_rounded_rect_corners() {
        assert!(!in_rounded_rect(0, 0, 20, 20, 6));
        assert!(!in_rounded_rect(19, 19, 20, 20, 6));
        assert!(in_rounded_rect(6, 0, 20, 20, 6));
        assert!(in_rounded_rect(0, 10, 20, 20, 6));
        assert!(in_rounded_rect(3, 3, 20, 20, 6));
    }

    #[test]
    fn test_zero_radius_is_plain_rect() {
        assert!(in_rounded_rect(0, 0, 5, 5, 0));
        assert!(in_rounded_rect(4, 4, 5, 5, 0));
        assert!(!in_rounded_rect(5, 4, 5, 5, 0));
    }

    #[test]
    fn test_premultiply() {
        assert_eq!(Argb::new(0, 255, 255, 255).premultiplied(), 0);
        assert_eq!(Argb::rgb(0x123456).premultiplied(), 0xFF12_3456);
        assert_eq!(Argb::new(128, 255, 0, 100).premultiplied(), Argb::new(128, 128, 0, 50).0);
    }

    #[test]
    fn test_fill_rounded_rect_leaves_corners() {
        let mut buf = PixelBuffer::new(10, 10);
        buf.fill_rounded_rect(Rect::new(0, 0, 10, 10), 4, Argb::rgb(0xFFFFFF));
        assert_eq!(buf.get(0, 0), Argb::TRANSPARENT);
        assert_eq!(buf.get(5, 5), Argb::rgb(0xFFFFFF));
        assert_eq!(buf.get(42, 5), Argb::TRANSPARENT);
    }
}
