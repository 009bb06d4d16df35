//! Software drawing on u32 pixel surfaces.
//!
//! Everything here writes a single u32 per covered pixel: opaque ARGB ink on
//! canvas layers, 0x00RRGGBB on the window buffer, or 0 to erase a layer.
//! Thick strokes are built by stamping filled discs along the path, which
//! gives round caps and joins for free.

use crate::types::{FrameBuffer, Point};

/// Anything with a row-major u32 pixel grid.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn pixels_mut(&mut self) -> &mut [u32];
}

impl Surface for FrameBuffer {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }
}

/// On/off lengths of a dash pattern, in pixels along the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    pub on: f32,
    pub off: f32,
}

/// The shape preview pattern.
pub const PREVIEW_DASH: Dash = Dash { on: 5.0, off: 5.0 };

/// Put a pixel on the surface if (x,y) is inside bounds.
#[inline]
pub fn put_pixel<S: Surface + ?Sized>(s: &mut S, x: i32, y: i32, value: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    let (w, h) = (s.width(), s.height());
    if x >= w || y >= h {
        return;
    }
    s.pixels_mut()[y * w + x] = value;
}

/// Thin 1-pixel line between (x0,y0) and (x1,y1) using Bresenham.
pub fn draw_line<S: Surface + ?Sized>(s: &mut S, x0: i32, y0: i32, x1: i32, y1: i32, value: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(s, x0, y0, value);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Solid filled disc. A radius below one pixel still covers the center pixel.
pub fn fill_disc<S: Surface + ?Sized>(s: &mut S, center: Point, radius: f32, value: u32) {
    let r = radius.max(0.5);
    let r2 = r * r;
    let x_min = (center.x - r).floor() as i32;
    let x_max = (center.x + r).ceil() as i32;
    let y_min = (center.y - r).floor() as i32;
    let y_max = (center.y + r).ceil() as i32;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f32 - center.x;
            let dy = y as f32 - center.y;
            if dx * dx + dy * dy <= r2 {
                put_pixel(s, x, y, value);
            }
        }
    }
}

/// Axis-aligned filled rectangle; corners may come in any order.
pub fn fill_rect<S: Surface + ?Sized>(s: &mut S, a: Point, b: Point, value: u32) {
    let x0 = a.x.min(b.x).round() as i32;
    let x1 = a.x.max(b.x).round() as i32;
    let y0 = a.y.min(b.y).round() as i32;
    let y1 = a.y.max(b.y).round() as i32;
    for y in y0..=y1 {
        for x in x0..=x1 {
            put_pixel(s, x, y, value);
        }
    }
}

/// Thick segment. Solid strokes are round-capped. With a dash pattern the
/// dashes are butt-capped and `phase` is how far into the pattern the segment
/// starts; the returned value is the phase at its end so a polyline keeps its
/// rhythm across corners.
pub fn stroke_segment<S: Surface + ?Sized>(
    s: &mut S,
    a: Point,
    b: Point,
    width: f32,
    value: u32,
    dash: Option<Dash>,
    phase: f32,
) -> f32 {
    let radius = width * 0.5;
    let len = a.distance(b);
    match dash {
        Some(d) if d.on + d.off > 0.0 && len > 0.0 => {
            // sweep a bar across the stroke every half pixel of the "on" runs
            let (nx, ny) = (-(b.y - a.y) / len * radius, (b.x - a.x) / len * radius);
            let steps = (len * 2.0).ceil() as i32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                if (phase + len * t).rem_euclid(d.on + d.off) >= d.on {
                    continue;
                }
                let p = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                draw_line(
                    s,
                    (p.x - nx).round() as i32,
                    (p.y - ny).round() as i32,
                    (p.x + nx).round() as i32,
                    (p.y + ny).round() as i32,
                    value,
                );
            }
        }
        _ => {
            // stamp every ~1 px (at least once, so a zero-length segment is a dot)
            let steps = len.ceil().max(1.0) as i32;
            for i in 0..=steps {
                let t = i as f32 / steps as f32;
                let p = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
                fill_disc(s, p, radius, value);
            }
        }
    }
    phase + len
}

/// Outline of the rectangle spanned by two opposite corners.
pub fn stroke_rect<S: Surface + ?Sized>(
    s: &mut S,
    a: Point,
    b: Point,
    width: f32,
    value: u32,
    dash: Option<Dash>,
) {
    let corners = [a, Point::new(b.x, a.y), b, Point::new(a.x, b.y), a];
    let mut phase = 0.0;
    for pair in corners.windows(2) {
        phase = stroke_segment(s, pair[0], pair[1], width, value, dash, phase);
    }
}

/// Circle outline around `center`.
pub fn stroke_circle<S: Surface + ?Sized>(
    s: &mut S,
    center: Point,
    radius: f32,
    width: f32,
    value: u32,
    dash: Option<Dash>,
) {
    let circumference = std::f32::consts::TAU * radius;
    let steps = circumference.ceil().max(8.0) as i32;
    let mut prev = Point::new(center.x + radius, center.y);
    let mut phase = 0.0;
    for i in 1..=steps {
        let theta = std::f32::consts::TAU * i as f32 / steps as f32;
        let p = Point::new(center.x + radius * theta.cos(), center.y + radius * theta.sin());
        phase = stroke_segment(s, prev, p, width, value, dash, phase);
        prev = p;
    }
}

/// Ring of the given thickness, used for hand cursors.
pub fn draw_ring<S: Surface + ?Sized>(s: &mut S, center: Point, radius: f32, thickness: f32, value: u32) {
    let outer = radius + thickness * 0.5;
    let inner = (radius - thickness * 0.5).max(0.0);
    let (o2, i2) = (outer * outer, inner * inner);
    let r = outer.ceil() as i32;
    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
    for y in (cy - r)..=(cy + r) {
        for x in (cx - r)..=(cx + r) {
            let dx = x as f32 - center.x;
            let dy = y as f32 - center.y;
            let d2 = dx * dx + dy * dy;
            if d2 <= o2 && d2 >= i2 {
                put_pixel(s, x, y, value);
            }
        }
    }
}

/* ---------- 5x7 bitmap font ---------- */

pub const GLYPH_W: i32 = 5;
pub const GLYPH_H: i32 = 7;

/// Return a 5x7 glyph bitmap. Lowercase letters use the uppercase shapes.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00100,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '\'' => g!(0b00100,0b00100,0b01000,0b00000,0b00000,0b00000,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '#' => g!(0b01010,0b01010,0b11111,0b01010,0b11111,0b01010,0b01010),

        _ => None,
    }
}

/// Draw one glyph with its top-left at (x,y), each font pixel `scale` wide.
fn draw_char<S: Surface + ?Sized>(s: &mut S, x: i32, y: i32, ch: char, scale: i32, value: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..GLYPH_W {
            if (rowbits & (1 << (4 - rx))) == 0 {
                continue;
            }
            let px = x + rx * scale;
            let py = y + ry as i32 * scale;
            for oy in 0..scale {
                for ox in 0..scale {
                    put_pixel(s, px + ox, py + oy, value);
                }
            }
        }
    }
}

/// Draw a text string; glyphs advance by 6 font pixels (5 + 1 spacing).
pub fn draw_text<S: Surface + ?Sized>(s: &mut S, x: i32, y: i32, text: &str, scale: i32, value: u32) {
    let scale = scale.max(1);
    let mut cx = x;
    for ch in text.chars() {
        draw_char(s, cx, y, ch, scale, value);
        cx += (GLYPH_W + 1) * scale;
    }
}

/// Text with a 1-pixel black shadow for contrast over busy backgrounds.
pub fn draw_text_shadowed<S: Surface + ?Sized>(s: &mut S, x: i32, y: i32, text: &str, scale: i32, value: u32) {
    draw_text(s, x + 1, y + 1, text, scale, 0x00000000);
    draw_text(s, x, y, text, scale, value);
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { n * (GLYPH_W + 1) * scale.max(1) - scale.max(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(fb: &FrameBuffer, x: usize, y: usize) -> u32 {
        fb.pixels[y * fb.width + x]
    }

    #[test]
    fn out_of_bounds_pixels_are_ignored() {
        let mut fb = FrameBuffer::new(4, 4);
        put_pixel(&mut fb, -1, 0, 7);
        put_pixel(&mut fb, 4, 0, 7);
        put_pixel(&mut fb, 0, 4, 7);
        assert!(fb.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn bresenham_covers_both_endpoints() {
        let mut fb = FrameBuffer::new(10, 10);
        draw_line(&mut fb, 1, 1, 8, 5, 9);
        assert_eq!(at(&fb, 1, 1), 9);
        assert_eq!(at(&fb, 8, 5), 9);
    }

    #[test]
    fn thick_segment_has_round_width() {
        let mut fb = FrameBuffer::new(40, 40);
        stroke_segment(&mut fb, Point::new(10.0, 20.0), Point::new(30.0, 20.0), 6.0, 1, None, 0.0);
        assert_eq!(at(&fb, 20, 20), 1);
        assert_eq!(at(&fb, 20, 17), 1);
        assert_eq!(at(&fb, 20, 23), 1);
        assert_eq!(at(&fb, 20, 25), 0);
        // round cap reaches past the endpoint
        assert_eq!(at(&fb, 8, 20), 1);
    }

    #[test]
    fn dashes_leave_gaps() {
        let mut fb = FrameBuffer::new(60, 5);
        stroke_segment(&mut fb, Point::new(0.0, 2.0), Point::new(59.0, 2.0), 1.0, 1, Some(PREVIEW_DASH), 0.0);
        assert_eq!(at(&fb, 2, 2), 1);
        assert_eq!(at(&fb, 7, 2), 0);
        assert_eq!(at(&fb, 12, 2), 1);
    }

    #[test]
    fn thick_dashes_keep_their_gaps() {
        let mut fb = FrameBuffer::new(60, 20);
        stroke_segment(&mut fb, Point::new(0.0, 10.0), Point::new(59.0, 10.0), 10.0, 1, Some(PREVIEW_DASH), 0.0);
        assert_eq!(at(&fb, 2, 10), 1);
        assert_eq!(at(&fb, 2, 6), 1);
        assert_eq!(at(&fb, 7, 10), 0);
        assert_eq!(at(&fb, 7, 6), 0);
    }

    #[test]
    fn rect_outline_leaves_interior_empty() {
        let mut fb = FrameBuffer::new(50, 50);
        stroke_rect(&mut fb, Point::new(5.0, 5.0), Point::new(40.0, 30.0), 2.0, 3, None);
        assert_eq!(at(&fb, 5, 5), 3);
        assert_eq!(at(&fb, 40, 30), 3);
        assert_eq!(at(&fb, 20, 5), 3);
        assert_eq!(at(&fb, 40, 15), 3);
        assert_eq!(at(&fb, 20, 15), 0);
    }

    #[test]
    fn circle_outline_passes_through_radius() {
        let mut fb = FrameBuffer::new(60, 60);
        stroke_circle(&mut fb, Point::new(30.0, 30.0), 20.0, 2.0, 5, None);
        assert_eq!(at(&fb, 50, 30), 5);
        assert_eq!(at(&fb, 30, 10), 5);
        assert_eq!(at(&fb, 30, 30), 0);
    }

    #[test]
    fn text_is_scaled() {
        let mut fb = FrameBuffer::new(40, 20);
        draw_text(&mut fb, 0, 0, "I", 2, 4);
        // top bar of 'I' spans font columns 1..=3 -> pixels 2..=7
        assert_eq!(at(&fb, 2, 0), 4);
        assert_eq!(at(&fb, 7, 1), 4);
        assert_eq!(at(&fb, 0, 0), 0);
        assert_eq!(text_width("II", 2), 22);
    }
}
