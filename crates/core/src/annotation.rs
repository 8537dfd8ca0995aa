//! Annotation object model.
//!
//! A closed sum type matched exhaustively at hit-test, paint, and serialize
//! time, so the compiler flags any missing variant handling when a new
//! annotation type is added. Coordinates are page-space throughout.

use crate::geometry::{Color, Point, Rect};
use serde::{Deserialize, Serialize};

pub type ObjectId = uuid::Uuid;

/// Role marker distinguishing the page background from user annotations.
///
/// The background is an image object like any user-stamped image, so the
/// reserved marker (not the variant) identifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectRole {
    Background,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnnotationKind {
    Text {
        position: Point,
        content: String,
        font_size: f32,
        color: Color,
    },
    /// Stroked (optionally filled) rectangle.
    Shape {
        rect: Rect,
        stroke_color: Color,
        stroke_width: f32,
        fill_color: Option<Color>,
    },
    Circle {
        center: Point,
        radius: f32,
        stroke_color: Color,
        stroke_width: f32,
    },
    Line {
        from: Point,
        to: Point,
        stroke_color: Color,
        stroke_width: f32,
    },
    Freehand {
        points: Vec<Point>,
        stroke_color: Color,
        stroke_width: f32,
    },
    /// Semi-transparent fill, no stroke.
    Highlight {
        rect: Rect,
        fill_color: Color,
        opacity: f32,
    },
    /// Solid opaque fill; locked once placed.
    Redaction {
        rect: Rect,
    },
    Image {
        rect: Rect,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
}

impl AnnotationKind {
    /// Bounding box as (min_x, min_y, max_x, max_y) in page coordinates.
    pub fn bounding_box(&self) -> (f32, f32, f32, f32) {
        match self {
            AnnotationKind::Text { position, content, font_size, .. } => {
                let line_count = content.lines().count().max(1) as f32;
                // Conservative estimate; exact bounds depend on glyph widths.
                let width = content
                    .lines()
                    .map(|line| line.chars().count())
                    .max()
                    .unwrap_or(0) as f32
                    * font_size
                    * 0.6;
                (position.x, position.y, position.x + width, position.y + font_size * line_count)
            }
            AnnotationKind::Shape { rect, .. }
            | AnnotationKind::Highlight { rect, .. }
            | AnnotationKind::Redaction { rect }
            | AnnotationKind::Image { rect, .. } => {
                (rect.x, rect.y, rect.x + rect.width, rect.y + rect.height)
            }
            AnnotationKind::Circle { center, radius, .. } => (
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            AnnotationKind::Line { from, to, .. } => (
                from.x.min(to.x),
                from.y.min(to.y),
                from.x.max(to.x),
                from.y.max(to.y),
            ),
            AnnotationKind::Freehand { points, .. } => {
                if points.is_empty() {
                    return (0.0, 0.0, 0.0, 0.0);
                }
                let mut min_x = points[0].x;
                let mut max_x = points[0].x;
                let mut min_y = points[0].y;
                let mut max_y = points[0].y;
                for point in points.iter().skip(1) {
                    min_x = min_x.min(point.x);
                    max_x = max_x.max(point.x);
                    min_y = min_y.min(point.y);
                    max_y = max_y.max(point.y);
                }
                (min_x, min_y, max_x, max_y)
            }
        }
    }

    /// Same annotation shifted by a page-space delta.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let shift = |p: &Point| Point::new(p.x + dx, p.y + dy);
        match self {
            AnnotationKind::Text { position, content, font_size, color } => AnnotationKind::Text {
                position: shift(position),
                content: content.clone(),
                font_size: *font_size,
                color: *color,
            },
            AnnotationKind::Shape { rect, stroke_color, stroke_width, fill_color } => {
                AnnotationKind::Shape {
                    rect: Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height),
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                    fill_color: *fill_color,
                }
            }
            AnnotationKind::Circle { center, radius, stroke_color, stroke_width } => {
                AnnotationKind::Circle {
                    center: shift(center),
                    radius: *radius,
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                }
            }
            AnnotationKind::Line { from, to, stroke_color, stroke_width } => AnnotationKind::Line {
                from: shift(from),
                to: shift(to),
                stroke_color: *stroke_color,
                stroke_width: *stroke_width,
            },
            AnnotationKind::Freehand { points, stroke_color, stroke_width } => {
                AnnotationKind::Freehand {
                    points: points.iter().map(shift).collect(),
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                }
            }
            AnnotationKind::Highlight { rect, fill_color, opacity } => AnnotationKind::Highlight {
                rect: Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height),
                fill_color: *fill_color,
                opacity: *opacity,
            },
            AnnotationKind::Redaction { rect } => AnnotationKind::Redaction {
                rect: Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height),
            },
            AnnotationKind::Image { rect, data } => AnnotationKind::Image {
                rect: Rect::new(rect.x + dx, rect.y + dy, rect.width, rect.height),
                data: data.clone(),
            },
        }
    }

    /// Same annotation with its bottom-right extent dragged to `corner`.
    ///
    /// Rect-family shapes keep their top-left corner, circles keep their
    /// center, lines keep their start point, freehand strokes scale about
    /// their bounding-box origin, and text scales its font size from the new
    /// height. Sizes clamp to a minimum so a resize can never collapse an
    /// object into something unselectable.
    pub fn resized_to(&self, corner: Point) -> Self {
        const MIN_EXTENT: f32 = 1.0;

        let resize_rect = |rect: &Rect| {
            Rect::new(
                rect.x,
                rect.y,
                (corner.x - rect.x).max(MIN_EXTENT),
                (corner.y - rect.y).max(MIN_EXTENT),
            )
        };

        match self {
            AnnotationKind::Text { position, content, font_size: _, color } => {
                let line_count = content.lines().count().max(1) as f32;
                AnnotationKind::Text {
                    position: *position,
                    content: content.clone(),
                    font_size: ((corner.y - position.y) / line_count).clamp(4.0, 144.0),
                    color: *color,
                }
            }
            AnnotationKind::Shape { rect, stroke_color, stroke_width, fill_color } => {
                AnnotationKind::Shape {
                    rect: resize_rect(rect),
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                    fill_color: *fill_color,
                }
            }
            AnnotationKind::Circle { center, radius: _, stroke_color, stroke_width } => {
                AnnotationKind::Circle {
                    center: *center,
                    radius: center.distance_to(&corner).max(MIN_EXTENT),
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                }
            }
            AnnotationKind::Line { from, to: _, stroke_color, stroke_width } => {
                AnnotationKind::Line {
                    from: *from,
                    to: corner,
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                }
            }
            AnnotationKind::Freehand { points, stroke_color, stroke_width } => {
                let (min_x, min_y, max_x, max_y) = self.bounding_box();
                let span_x = (max_x - min_x).max(MIN_EXTENT);
                let span_y = (max_y - min_y).max(MIN_EXTENT);
                let sx = ((corner.x - min_x) / span_x).max(0.01);
                let sy = ((corner.y - min_y) / span_y).max(0.01);
                AnnotationKind::Freehand {
                    points: points
                        .iter()
                        .map(|p| Point::new(min_x + (p.x - min_x) * sx, min_y + (p.y - min_y) * sy))
                        .collect(),
                    stroke_color: *stroke_color,
                    stroke_width: *stroke_width,
                }
            }
            AnnotationKind::Highlight { rect, fill_color, opacity } => AnnotationKind::Highlight {
                rect: resize_rect(rect),
                fill_color: *fill_color,
                opacity: *opacity,
            },
            AnnotationKind::Redaction { rect } => {
                AnnotationKind::Redaction { rect: resize_rect(rect) }
            }
            AnnotationKind::Image { rect, data } => {
                AnnotationKind::Image { rect: resize_rect(rect), data: data.clone() }
            }
        }
    }

    /// Check whether a point is on or near this annotation (within
    /// tolerance). Used for hit testing during erase/select.
    pub fn contains_point(&self, point: &Point, tolerance: f32) -> bool {
        match self {
            AnnotationKind::Line { from, to, .. } => {
                point_near_segment(point, from, to, tolerance)
            }
            AnnotationKind::Freehand { points, .. } => {
                for i in 0..points.len().saturating_sub(1) {
                    if point_near_segment(point, &points[i], &points[i + 1], tolerance) {
                        return true;
                    }
                }
                false
            }
            AnnotationKind::Circle { center, radius, .. } => {
                let dist = point.distance_to(center);
                (dist - radius).abs() <= tolerance
            }
            AnnotationKind::Text { .. }
            | AnnotationKind::Shape { .. }
            | AnnotationKind::Highlight { .. }
            | AnnotationKind::Redaction { .. }
            | AnnotationKind::Image { .. } => {
                let (min_x, min_y, max_x, max_y) = self.bounding_box();
                point.x >= min_x - tolerance
                    && point.x <= max_x + tolerance
                    && point.y >= min_y - tolerance
                    && point.y <= max_y + tolerance
            }
        }
    }
}

fn point_near_segment(point: &Point, start: &Point, end: &Point, tolerance: f32) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(start) <= tolerance;
    }

    let t = ((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq;
    let t = t.clamp(0.0, 1.0);

    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}

/// One object in a scene: identity, role marker, interactivity, payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub role: ObjectRole,
    /// Locked objects are not selectable, movable, or erasable.
    pub locked: bool,
    pub kind: AnnotationKind,
}

impl SceneObject {
    /// New user annotation. Redactions come out locked: once placed they are
    /// no longer selectable or editable.
    pub fn annotation(kind: AnnotationKind) -> Self {
        let locked = matches!(kind, AnnotationKind::Redaction { .. });
        Self { id: ObjectId::new_v4(), role: ObjectRole::Annotation, locked, kind }
    }

    /// The page background: an image object carrying the reserved role
    /// marker, always locked.
    pub fn background(data: Vec<u8>, width: f32, height: f32) -> Self {
        Self {
            id: ObjectId::new_v4(),
            role: ObjectRole::Background,
            locked: true,
            kind: AnnotationKind::Image { rect: Rect::new(0.0, 0.0, width, height), data },
        }
    }

    pub fn is_background(&self) -> bool {
        self.role == ObjectRole::Background
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
