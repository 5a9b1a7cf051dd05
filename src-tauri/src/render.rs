//! Procedural tray icon rendering.
//!
//! Pure functions from a percentage to RGBA pixel data. No I/O and no state,
//! so the same input always yields byte-identical output.

use serde::{Deserialize, Serialize};

/// Raster sizes rendered for every icon update
pub const ICON_SIZES: [u32; 3] = [16, 32, 48];

/// Below this percentage the gauge is green
const YELLOW_THRESHOLD: f64 = 50.0;

/// Below this percentage (and at or above YELLOW_THRESHOLD) the gauge is yellow
const RED_THRESHOLD: f64 = 80.0;

pub type Rgba = [u8; 4];

const TRANSPARENT: Rgba = [0, 0, 0, 0];
const FRAME: Rgba = [0x4b, 0x55, 0x63, 0xff];
const TRACK: Rgba = [0x9c, 0xa3, 0xaf, 0x60];
const ERROR_GRAY: Rgba = [0x9c, 0xa3, 0xaf, 0xff];
const GLYPH: Rgba = [0xff, 0xff, 0xff, 0xff];

/// Threshold color for a usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageColor {
    Green,
    Yellow,
    Red,
}

impl UsageColor {
    /// NaN is treated as 0.
    pub fn for_percent(percent: f64) -> Self {
        let percent = if percent.is_nan() { 0.0 } else { percent };
        if percent < YELLOW_THRESHOLD {
            UsageColor::Green
        } else if percent < RED_THRESHOLD {
            UsageColor::Yellow
        } else {
            UsageColor::Red
        }
    }

    pub fn rgba(self) -> Rgba {
        match self {
            UsageColor::Green => [0x22, 0xc5, 0x5e, 0xff],
            UsageColor::Yellow => [0xea, 0xb3, 0x08, 0xff],
            UsageColor::Red => [0xef, 0x44, 0x44, 0xff],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageColor::Green => "green",
            UsageColor::Yellow => "yellow",
            UsageColor::Red => "red",
        }
    }
}

/// Gauge shape drawn in the tray.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconStyle {
    /// Framed horizontal fill bar
    #[default]
    Bar,
    /// Circular progress arc, clockwise from 12 o'clock
    Arc,
}

/// Square RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    size: u32,
    rgba: Vec<u8>,
}

impl Bitmap {
    fn new(size: u32) -> Self {
        Self {
            size,
            rgba: vec![0; (size * size * 4) as usize],
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = self.index(x, y);
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y * self.size + x) * 4) as usize
    }

    fn put(&mut self, x: u32, y: u32, color: Rgba) {
        if x >= self.size || y >= self.size {
            return;
        }
        let i = self.index(x, y);
        self.rgba[i..i + 4].copy_from_slice(&color);
    }

    /// Fill `[x0, x1) x [y0, y1)`.
    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba) {
        for y in y0..y1.min(self.size) {
            for x in x0..x1.min(self.size) {
                self.put(x, y, color);
            }
        }
    }

    /// Visit every pixel with its center offset from the image center.
    fn for_each_centered(&mut self, mut f: impl FnMut(f64, f64) -> Option<Rgba>) {
        let c = self.size as f64 / 2.0;
        for y in 0..self.size {
            for x in 0..self.size {
                let dx = x as f64 + 0.5 - c;
                let dy = y as f64 + 0.5 - c;
                if let Some(color) = f(dx, dy) {
                    self.put(x, y, color);
                }
            }
        }
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Render the usage gauge for `percent` at `size` x `size` pixels.
pub fn render_usage_icon(percent: f64, size: u32, style: IconStyle) -> Bitmap {
    let color = UsageColor::for_percent(percent).rgba();
    let percent = clamp_percent(percent);
    match style {
        IconStyle::Bar => render_bar(percent, size, color),
        IconStyle::Arc => render_arc(percent, size, color),
    }
}

fn render_bar(percent: f64, size: u32, color: Rgba) -> Bitmap {
    let mut bmp = Bitmap::new(size);

    let margin = (size / 8).max(1);
    let stroke = (size / 16).max(1);
    let bar_height = size / 2;
    let top = (size - bar_height) / 2;
    let bottom = top + bar_height;
    let left = margin;
    let right = size.saturating_sub(margin);

    // Frame, then hollow it out
    bmp.fill_rect(left, top, right, bottom, FRAME);
    let inner_right = right.saturating_sub(stroke);
    let inner_bottom = bottom.saturating_sub(stroke);
    bmp.fill_rect(left + stroke, top + stroke, inner_right, inner_bottom, TRANSPARENT);
    for (x, y) in [
        (left, top),
        (right.saturating_sub(1), top),
        (left, bottom.saturating_sub(1)),
        (right.saturating_sub(1), bottom.saturating_sub(1)),
    ] {
        bmp.put(x, y, TRANSPARENT);
    }

    let inner_left = left + stroke;
    let inner_width = inner_right.saturating_sub(inner_left);
    let fill_width = ((inner_width as f64) * percent / 100.0).round() as u32;
    bmp.fill_rect(
        inner_left,
        top + stroke,
        inner_left + fill_width.min(inner_width),
        inner_bottom,
        color,
    );

    bmp
}

fn render_arc(percent: f64, size: u32, color: Rgba) -> Bitmap {
    let mut bmp = Bitmap::new(size);

    let outer = size as f64 / 2.0 - 0.5;
    let thickness = (size / 5).max(2) as f64;
    let inner = outer - thickness;
    let filled = percent / 100.0;

    bmp.for_each_centered(|dx, dy| {
        let d = dx.hypot(dy);
        if d > outer || d < inner {
            return None;
        }
        // 0 at 12 o'clock, increasing clockwise (y grows downward)
        let mut angle = dx.atan2(-dy);
        if angle < 0.0 {
            angle += std::f64::consts::TAU;
        }
        if angle / std::f64::consts::TAU < filled {
            Some(color)
        } else {
            Some(TRACK)
        }
    });

    bmp
}

/// Render the fixed gray exclamation glyph shown when usage is unavailable.
pub fn render_error_icon(size: u32) -> Bitmap {
    let mut bmp = Bitmap::new(size);

    let radius = size as f64 / 2.0 - 0.5;
    bmp.for_each_centered(|dx, dy| (dx.hypot(dy) <= radius).then_some(ERROR_GRAY));

    let width = (size / 8).max(2);
    let x0 = size.saturating_sub(width) / 2;
    bmp.fill_rect(x0, size * 3 / 16, x0 + width, size * 10 / 16, GLYPH);
    let dot_top = size * 12 / 16;
    bmp.fill_rect(x0, dot_top, x0 + width, dot_top + width, GLYPH);

    bmp
}

/// The same icon rendered at every size in `ICON_SIZES`, smallest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSet {
    bitmaps: Vec<Bitmap>,
}

impl IconSet {
    pub fn usage(percent: f64, style: IconStyle) -> Self {
        Self {
            bitmaps: ICON_SIZES
                .iter()
                .map(|&size| render_usage_icon(percent, size, style))
                .collect(),
        }
    }

    pub fn error() -> Self {
        Self {
            bitmaps: ICON_SIZES.iter().map(|&size| render_error_icon(size)).collect(),
        }
    }

    pub fn bitmaps(&self) -> &[Bitmap] {
        &self.bitmaps
    }

    /// Smallest bitmap at least `size` wide, else the largest available.
    pub fn best_for(&self, size: u32) -> Option<&Bitmap> {
        self.bitmaps
            .iter()
            .find(|b| b.size() >= size)
            .or_else(|| self.bitmaps.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_thresholds() {
        assert_eq!(UsageColor::for_percent(0.0), UsageColor::Green);
        assert_eq!(UsageColor::for_percent(49.9), UsageColor::Green);
        assert_eq!(UsageColor::for_percent(50.0), UsageColor::Yellow);
        assert_eq!(UsageColor::for_percent(79.99), UsageColor::Yellow);
        assert_eq!(UsageColor::for_percent(80.0), UsageColor::Red);
        assert_eq!(UsageColor::for_percent(100.0), UsageColor::Red);
        assert_eq!(UsageColor::for_percent(140.0), UsageColor::Red);
        assert_eq!(UsageColor::for_percent(-5.0), UsageColor::Green);
        assert_eq!(UsageColor::for_percent(f64::NAN), UsageColor::Green);
    }

    #[test]
    fn bitmap_has_rgba_for_every_pixel() {
        for &size in &ICON_SIZES {
            let bmp = render_usage_icon(42.0, size, IconStyle::Bar);
            assert_eq!(bmp.size(), size);
            assert_eq!(bmp.rgba().len(), (size * size * 4) as usize);
        }
    }

    #[test]
    fn tiny_sizes_render_without_panicking() {
        for size in 0..8 {
            for style in [IconStyle::Bar, IconStyle::Arc] {
                for percent in [0.0, 50.0, 100.0] {
                    let bmp = render_usage_icon(percent, size, style);
                    assert_eq!(bmp.rgba().len(), (size * size * 4) as usize);
                }
            }
            assert_eq!(render_error_icon(size).size(), size);
        }
        assert!(render_usage_icon(50.0, 0, IconStyle::Bar).rgba().is_empty());
        assert!(render_error_icon(0).rgba().is_empty());
        assert_eq!(render_usage_icon(50.0, 1, IconStyle::Bar).rgba().len(), 4);
        assert_eq!(render_error_icon(1).rgba().len(), 4);
    }

    #[test]
    fn rendering_is_deterministic() {
        for style in [IconStyle::Bar, IconStyle::Arc] {
            for percent in [0.0, 33.3, 50.0, 87.5, 100.0] {
                let a = IconSet::usage(percent, style);
                let b = IconSet::usage(percent, style);
                assert_eq!(a, b);
            }
        }
        assert_eq!(render_error_icon(32).rgba(), render_error_icon(32).rgba());
    }

    #[test]
    fn bar_fill_is_proportional() {
        // size 32: frame x 4..28, y 8..24, stroke 2 -> inner x 6..26
        let bmp = render_usage_icon(50.0, 32, IconStyle::Bar);
        let yellow = UsageColor::Yellow.rgba();
        assert_eq!(bmp.pixel(6, 16), yellow);
        assert_eq!(bmp.pixel(15, 16), yellow);
        assert_eq!(bmp.pixel(16, 16), TRANSPARENT);
        assert_eq!(bmp.pixel(25, 16), TRANSPARENT);
        assert_eq!(bmp.pixel(4, 16), FRAME);
        assert_eq!(bmp.pixel(4, 8), TRANSPARENT);
        assert_eq!(bmp.pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn bar_empty_and_full() {
        let empty = render_usage_icon(0.0, 32, IconStyle::Bar);
        assert_eq!(empty.pixel(6, 16), TRANSPARENT);

        let full = render_usage_icon(100.0, 32, IconStyle::Bar);
        let red = UsageColor::Red.rgba();
        assert_eq!(full.pixel(6, 16), red);
        assert_eq!(full.pixel(25, 16), red);
        assert_eq!(full.pixel(26, 16), FRAME);
    }

    #[test]
    fn over_hundred_is_clamped() {
        assert_eq!(
            render_usage_icon(250.0, 16, IconStyle::Bar),
            render_usage_icon(100.0, 16, IconStyle::Bar)
        );
        assert_eq!(
            render_usage_icon(-10.0, 16, IconStyle::Arc),
            render_usage_icon(0.0, 16, IconStyle::Arc)
        );
    }

    #[test]
    fn arc_sweeps_clockwise_from_top() {
        // Pixel at 3 o'clock is ~25% around, 9 o'clock is ~75% around
        let three = (28, 16);
        let nine = (3, 16);

        let bmp = render_usage_icon(30.0, 32, IconStyle::Arc);
        assert_eq!(bmp.pixel(three.0, three.1), UsageColor::Green.rgba());
        assert_eq!(bmp.pixel(nine.0, nine.1), TRACK);

        let bmp = render_usage_icon(20.0, 32, IconStyle::Arc);
        assert_eq!(bmp.pixel(three.0, three.1), TRACK);

        let bmp = render_usage_icon(80.0, 32, IconStyle::Arc);
        assert_eq!(bmp.pixel(nine.0, nine.1), UsageColor::Red.rgba());

        // Hole in the middle and outside the ring stay transparent
        assert_eq!(bmp.pixel(16, 16), TRANSPARENT);
        assert_eq!(bmp.pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn error_icon_is_gray_disc_with_glyph() {
        let bmp = render_error_icon(16);
        assert_eq!(bmp.pixel(3, 8), ERROR_GRAY);
        assert_eq!(bmp.pixel(8, 5), GLYPH);
        assert_eq!(bmp.pixel(8, 12), GLYPH);
        assert_eq!(bmp.pixel(8, 11), ERROR_GRAY);
        assert_eq!(bmp.pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn icon_set_picks_best_size() {
        let set = IconSet::usage(10.0, IconStyle::Bar);
        assert_eq!(set.bitmaps().len(), ICON_SIZES.len());
        assert_eq!(set.best_for(16).map(Bitmap::size), Some(16));
        assert_eq!(set.best_for(22).map(Bitmap::size), Some(32));
        assert_eq!(set.best_for(32).map(Bitmap::size), Some(32));
        assert_eq!(set.best_for(128).map(Bitmap::size), Some(48));
    }

    #[test]
    fn icon_style_serde_names() {
        assert_eq!(serde_json::to_string(&IconStyle::Arc).unwrap(), "\"arc\"");
        let style: IconStyle = serde_json::from_str("\"bar\"").unwrap();
        assert_eq!(style, IconStyle::Bar);
    }
}
