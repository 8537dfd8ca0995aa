//! Raster painting of annotation objects onto page bitmaps.
//!
//! All drawing is plain src-over pixel blending on `RgbaImage`, at one pixel
//! per page point. Painting is fail-soft: out-of-bounds geometry clips and
//! an undecodable embedded image skips with a warning, so one bad object
//! never aborts a flatten.

use crate::annotation::AnnotationKind;
use crate::geometry::{Color, Point, Rect};
use crate::glyphs;
use image::{imageops, Rgba, RgbaImage};

/// Paint one annotation onto the target bitmap. The match is exhaustive so
/// a new variant cannot silently ship without a flatten path.
pub fn paint_annotation(target: &mut RgbaImage, kind: &AnnotationKind) {
    match kind {
        AnnotationKind::Text { position, content, font_size, color } => {
            draw_text(target, *position, content, *font_size, *color);
        }
        AnnotationKind::Shape { rect, stroke_color, stroke_width, fill_color } => {
            if let Some(fill) = fill_color {
                fill_rect(target, *rect, *fill);
            }
            stroke_rect(target, *rect, *stroke_color, *stroke_width);
        }
        AnnotationKind::Circle { center, radius, stroke_color, stroke_width } => {
            draw_circle(target, *center, *radius, *stroke_color, *stroke_width);
        }
        AnnotationKind::Line { from, to, stroke_color, stroke_width } => {
            draw_segment(target, *from, *to, *stroke_color, *stroke_width);
        }
        AnnotationKind::Freehand { points, stroke_color, stroke_width } => {
            for pair in points.windows(2) {
                draw_segment(target, pair[0], pair[1], *stroke_color, *stroke_width);
            }
        }
        AnnotationKind::Highlight { rect, fill_color, opacity } => {
            let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
            fill_rect(target, *rect, fill_color.with_alpha(alpha));
        }
        AnnotationKind::Redaction { rect } => {
            fill_rect(target, *rect, Color::BLACK);
        }
        AnnotationKind::Image { rect, data } => {
            blit_image(target, *rect, data);
        }
    }
}

/// Src-over blend of a straight-alpha color onto one pixel.
fn blend_pixel(target: &mut RgbaImage, x: i64, y: i64, color: Color) {
    if x < 0 || y < 0 || x >= target.width() as i64 || y >= target.height() as i64 {
        return;
    }
    let pixel = target.get_pixel_mut(x as u32, y as u32);
    let alpha = color.a as f32 / 255.0;
    let inv = 1.0 - alpha;
    let Rgba([r, g, b, a]) = *pixel;
    *pixel = Rgba([
        (color.r as f32 * alpha + r as f32 * inv) as u8,
        (color.g as f32 * alpha + g as f32 * inv) as u8,
        (color.b as f32 * alpha + b as f32 * inv) as u8,
        (255.0 * alpha + a as f32 * inv) as u8,
    ]);
}

fn fill_rect(target: &mut RgbaImage, rect: Rect, color: Color) {
    if rect.is_empty() {
        return;
    }
    let x0 = rect.x.floor() as i64;
    let y0 = rect.y.floor() as i64;
    let x1 = (rect.x + rect.width).ceil() as i64;
    let y1 = (rect.y + rect.height).ceil() as i64;
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(target, x, y, color);
        }
    }
}

fn stroke_rect(target: &mut RgbaImage, rect: Rect, color: Color, width: f32) {
    let w = width.max(1.0);
    // Four edge bands, drawn inward from the rect boundary.
    fill_rect(target, Rect::new(rect.x, rect.y, rect.width, w), color);
    fill_rect(target, Rect::new(rect.x, rect.y + rect.height - w, rect.width, w), color);
    fill_rect(target, Rect::new(rect.x, rect.y, w, rect.height), color);
    fill_rect(target, Rect::new(rect.x + rect.width - w, rect.y, w, rect.height), color);
}

/// Stamp a filled disc. Used as the pen tip for thick segments.
fn draw_disc(target: &mut RgbaImage, center: Point, radius: f32, color: Color) {
    let r = radius.max(0.5);
    let x0 = (center.x - r).floor() as i64;
    let y0 = (center.y - r).floor() as i64;
    let x1 = (center.x + r).ceil() as i64;
    let y1 = (center.y + r).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= r * r {
                blend_pixel(target, x, y, color);
            }
        }
    }
}

fn draw_segment(target: &mut RgbaImage, from: Point, to: Point, color: Color, width: f32) {
    let length = from.distance_to(&to);
    let steps = length.ceil().max(1.0) as u32;
    let radius = (width / 2.0).max(0.5);
    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        draw_disc(target, point, radius, color);
    }
}

/// Annulus scan over the circle's bounding box.
fn draw_circle(target: &mut RgbaImage, center: Point, radius: f32, color: Color, width: f32) {
    if radius <= 0.0 {
        return;
    }
    let half = (width / 2.0).max(0.5);
    let outer = radius + half;
    let x0 = (center.x - outer).floor() as i64;
    let y0 = (center.y - outer).floor() as i64;
    let x1 = (center.x + outer).ceil() as i64;
    let y1 = (center.y + outer).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if (dist - radius).abs() <= half {
                blend_pixel(target, x, y, color);
            }
        }
    }
}

fn blit_image(target: &mut RgbaImage, rect: Rect, data: &[u8]) {
    if rect.is_empty() || data.is_empty() {
        return;
    }
    let decoded = match image::load_from_memory(data) {
        Ok(decoded) => decoded.to_rgba8(),
        Err(err) => {
            tracing::warn!(%err, "skipping undecodable embedded image");
            return;
        }
    };
    let resized = imageops::resize(
        &decoded,
        (rect.width.round() as u32).max(1),
        (rect.height.round() as u32).max(1),
        imageops::FilterType::Triangle,
    );
    imageops::overlay(target, &resized, rect.x.round() as i64, rect.y.round() as i64);
}

/// Render text with the built-in bitmap face, glyph height scaled to
/// `font_size`. Multi-line content advances by one glyph height plus leading.
pub fn draw_text(target: &mut RgbaImage, position: Point, content: &str, font_size: f32, color: Color) {
    let scale = (font_size / glyphs::GLYPH_HEIGHT as f32).max(0.1);
    let line_height = font_size * 1.2;

    for (line_index, line) in content.lines().enumerate() {
        let baseline_y = position.y + line_index as f32 * line_height;
        for (char_index, c) in line.chars().enumerate() {
            let Some(rows) = glyphs::rows(c) else { continue };
            let glyph_x = position.x + char_index as f32 * glyphs::GLYPH_ADVANCE as f32 * scale;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..glyphs::GLYPH_WIDTH {
                    if bits & (1 << (glyphs::GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    fill_rect(
                        target,
                        Rect::new(
                            glyph_x + col as f32 * scale,
                            baseline_y + row as f32 * scale,
                            scale,
                            scale,
                        ),
                        color,
                    );
                }
            }
        }
    }
}
