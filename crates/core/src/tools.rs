//! Tool state machine and pointer-gesture interpretation.
//!
//! Holds the single active tool plus per-tool parameters and interprets
//! pointer-down/move/up sequences into scene mutations. In-progress shapes
//! live in an explicit `Idle -> Drafting -> Idle` machine, so gesture
//! interruption (pointer leaving the canvas mid-drag) is a defined
//! transition, not a dangling nullable reference.

use crate::annotation::{AnnotationKind, ObjectId, SceneObject};
use crate::geometry::{Color, Point, Rect};
use crate::scene::Scene;

/// Hit radius for erase clicks, in page units.
const ERASE_TOLERANCE: f32 = 4.0;

/// Hit radius for select clicks, in page units.
const SELECT_TOLERANCE: f32 = 4.0;

/// Hit radius of the resize handle at an object's bottom-right extent.
const HANDLE_TOLERANCE: f32 = 8.0;

/// Default placement size for stamped images, in page units.
const IMAGE_STAMP_SIZE: f32 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Highlight,
    Text,
    Rectangle,
    Circle,
    Line,
    Freehand,
    Image,
    Redact,
    Erase,
    Crop,
}

/// Per-tool ephemeral parameters. Survive tool switches so a user can stamp
/// several shapes with the same style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolSettings {
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub highlight_color: Color,
    pub highlight_opacity: f32,
    pub text_color: Color,
    pub font_size: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            stroke_color: Color::RED,
            stroke_width: 2.0,
            highlight_color: Color::YELLOW,
            highlight_opacity: 0.4,
            text_color: Color::BLACK,
            font_size: 16.0,
        }
    }
}

/// Which rectangle-family tool owns the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RectTool {
    Highlight,
    Rectangle,
    Redact,
    Crop,
}

/// What a select-tool drag does to the grabbed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdjustMode {
    Move,
    Resize,
}

#[derive(Debug, Clone, PartialEq)]
enum Draft {
    Rect { tool: RectTool, anchor: Point, current: Point },
    Circle { anchor: Point, current: Point },
    Line { anchor: Point, current: Point },
    Freehand { points: Vec<Point> },
    Adjust { id: ObjectId, original: AnnotationKind, mode: AdjustMode, anchor: Point, current: Point },
}

#[derive(Debug, Clone, PartialEq, Default)]
enum Gesture {
    #[default]
    Idle,
    Drafting(Draft),
}

/// Out-of-band side effect requested by a tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEvent {
    None,
    /// The image tool needs a file picked before it can stamp anything.
    PickImage,
}

/// What a completed pointer interaction did to the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    None,
    Placed(ObjectId),
    /// A text object was placed and should enter edit mode immediately.
    TextPlaced(ObjectId),
    Erased(ObjectId),
    /// An existing object was dragged to a new position.
    Moved(ObjectId),
    /// An existing object was resized via its corner handle.
    Resized(ObjectId),
    /// The crop tool committed a rectangle for the current page.
    CropCommitted(Rect),
}

#[derive(Debug, Default)]
pub struct ToolMachine {
    tool: Tool,
    settings: ToolSettings,
    gesture: Gesture,
}

impl Default for Tool {
    fn default() -> Self {
        Tool::Select
    }
}

impl ToolMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    /// Switch the active tool. The tool stays active after each gesture, so
    /// the only way out is another explicit selection. A pending draft is
    /// discarded.
    pub fn select_tool(&mut self, tool: Tool) -> ToolEvent {
        self.gesture = Gesture::Idle;
        self.tool = tool;

        if tool == Tool::Image {
            ToolEvent::PickImage
        } else {
            ToolEvent::None
        }
    }

    /// Stamp a picked image at a default position and size, then fall back
    /// to passive select behavior.
    pub fn place_image(&mut self, scene: &mut Scene, data: Vec<u8>) -> GestureOutcome {
        let id = scene.add(SceneObject::annotation(AnnotationKind::Image {
            rect: Rect::new(40.0, 40.0, IMAGE_STAMP_SIZE, IMAGE_STAMP_SIZE),
            data,
        }));
        self.tool = Tool::Select;
        GestureOutcome::Placed(id)
    }

    pub fn pointer_down(&mut self, point: Point, scene: &mut Scene) -> GestureOutcome {
        // Starting a new gesture discards any pending draft.
        self.gesture = Gesture::Idle;

        match self.tool {
            Tool::Select => self.start_adjust(point, scene),
            Tool::Image => GestureOutcome::None,
            Tool::Text => {
                let id = scene.add(SceneObject::annotation(AnnotationKind::Text {
                    position: point,
                    content: String::new(),
                    font_size: self.settings.font_size,
                    color: self.settings.text_color,
                }));
                GestureOutcome::TextPlaced(id)
            }
            Tool::Erase => match scene.hit_test(&point, ERASE_TOLERANCE) {
                Some(id) => match scene.remove(id) {
                    Some(_) => GestureOutcome::Erased(id),
                    None => GestureOutcome::None,
                },
                None => GestureOutcome::None,
            },
            Tool::Highlight => self.start_rect(RectTool::Highlight, point),
            Tool::Rectangle => self.start_rect(RectTool::Rectangle, point),
            Tool::Redact => self.start_rect(RectTool::Redact, point),
            Tool::Crop => self.start_rect(RectTool::Crop, point),
            Tool::Circle => {
                self.gesture = Gesture::Drafting(Draft::Circle { anchor: point, current: point });
                GestureOutcome::None
            }
            Tool::Line => {
                self.gesture = Gesture::Drafting(Draft::Line { anchor: point, current: point });
                GestureOutcome::None
            }
            Tool::Freehand => {
                self.gesture = Gesture::Drafting(Draft::Freehand { points: vec![point] });
                GestureOutcome::None
            }
        }
    }

    pub fn pointer_move(&mut self, point: Point) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Drafting(Draft::Rect { current, .. })
            | Gesture::Drafting(Draft::Circle { current, .. })
            | Gesture::Drafting(Draft::Line { current, .. })
            | Gesture::Drafting(Draft::Adjust { current, .. }) => *current = point,
            Gesture::Drafting(Draft::Freehand { points }) => points.push(point),
        }
    }

    pub fn pointer_up(&mut self, point: Point, scene: &mut Scene) -> GestureOutcome {
        self.pointer_move(point);

        let draft = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => return GestureOutcome::None,
            Gesture::Drafting(draft) => draft,
        };

        match draft {
            Draft::Rect { tool, anchor, current } => {
                let rect = Rect::from_drag(anchor, current);
                if rect.is_empty() {
                    return GestureOutcome::None;
                }
                match tool {
                    RectTool::Highlight => {
                        let id = scene.add(SceneObject::annotation(AnnotationKind::Highlight {
                            rect,
                            fill_color: self.settings.highlight_color,
                            opacity: self.settings.highlight_opacity,
                        }));
                        GestureOutcome::Placed(id)
                    }
                    RectTool::Rectangle => {
                        let id = scene.add(SceneObject::annotation(AnnotationKind::Shape {
                            rect,
                            stroke_color: self.settings.stroke_color,
                            stroke_width: self.settings.stroke_width,
                            fill_color: None,
                        }));
                        GestureOutcome::Placed(id)
                    }
                    RectTool::Redact => {
                        let id = scene
                            .add(SceneObject::annotation(AnnotationKind::Redaction { rect }));
                        GestureOutcome::Placed(id)
                    }
                    RectTool::Crop => GestureOutcome::CropCommitted(rect),
                }
            }
            Draft::Circle { anchor, current } => {
                let radius = anchor.distance_to(&current) / 2.0;
                if radius <= 0.0 {
                    return GestureOutcome::None;
                }
                let id = scene.add(SceneObject::annotation(AnnotationKind::Circle {
                    center: anchor,
                    radius,
                    stroke_color: self.settings.stroke_color,
                    stroke_width: self.settings.stroke_width,
                }));
                GestureOutcome::Placed(id)
            }
            Draft::Line { anchor, current } => {
                if anchor == current {
                    return GestureOutcome::None;
                }
                let id = scene.add(SceneObject::annotation(AnnotationKind::Line {
                    from: anchor,
                    to: current,
                    stroke_color: self.settings.stroke_color,
                    stroke_width: self.settings.stroke_width,
                }));
                GestureOutcome::Placed(id)
            }
            Draft::Freehand { points } => {
                if points.len() < 2 {
                    return GestureOutcome::None;
                }
                let id = scene.add(SceneObject::annotation(AnnotationKind::Freehand {
                    points,
                    stroke_color: self.settings.stroke_color,
                    stroke_width: self.settings.stroke_width,
                }));
                GestureOutcome::Placed(id)
            }
            Draft::Adjust { id, original, mode, anchor, current } => {
                let new_kind = match mode {
                    AdjustMode::Move => {
                        original.translated(current.x - anchor.x, current.y - anchor.y)
                    }
                    AdjustMode::Resize => original.resized_to(current),
                };
                if new_kind == original || !scene.update_kind(id, new_kind) {
                    return GestureOutcome::None;
                }
                match mode {
                    AdjustMode::Move => GestureOutcome::Moved(id),
                    AdjustMode::Resize => GestureOutcome::Resized(id),
                }
            }
        }
    }

    /// Defined transition for the pointer leaving the canvas mid-drag: the
    /// pending draft is discarded.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Preview of the in-progress shape for the live render surface.
    pub fn draft_preview(&self) -> Option<AnnotationKind> {
        let Gesture::Drafting(draft) = &self.gesture else {
            return None;
        };

        Some(match draft {
            Draft::Rect { tool, anchor, current } => {
                let rect = Rect::from_drag(*anchor, *current);
                match tool {
                    RectTool::Highlight => AnnotationKind::Highlight {
                        rect,
                        fill_color: self.settings.highlight_color,
                        opacity: self.settings.highlight_opacity,
                    },
                    RectTool::Redact => AnnotationKind::Redaction { rect },
                    RectTool::Rectangle | RectTool::Crop => AnnotationKind::Shape {
                        rect,
                        stroke_color: self.settings.stroke_color,
                        stroke_width: self.settings.stroke_width,
                        fill_color: None,
                    },
                }
            }
            Draft::Circle { anchor, current } => AnnotationKind::Circle {
                center: *anchor,
                radius: anchor.distance_to(current) / 2.0,
                stroke_color: self.settings.stroke_color,
                stroke_width: self.settings.stroke_width,
            },
            Draft::Line { anchor, current } => AnnotationKind::Line {
                from: *anchor,
                to: *current,
                stroke_color: self.settings.stroke_color,
                stroke_width: self.settings.stroke_width,
            },
            Draft::Freehand { points } => AnnotationKind::Freehand {
                points: points.clone(),
                stroke_color: self.settings.stroke_color,
                stroke_width: self.settings.stroke_width,
            },
            Draft::Adjust { original, mode, anchor, current, .. } => match mode {
                AdjustMode::Move => {
                    original.translated(current.x - anchor.x, current.y - anchor.y)
                }
                AdjustMode::Resize => original.resized_to(*current),
            },
        })
    }

    fn start_rect(&mut self, tool: RectTool, anchor: Point) -> GestureOutcome {
        self.gesture = Gesture::Drafting(Draft::Rect { tool, anchor, current: anchor });
        GestureOutcome::None
    }

    /// Grab the topmost unlocked object under the pointer for a move, or
    /// its bottom-right handle for a resize. The drag applies on pointer-up;
    /// until then the scene keeps the original geometry.
    fn start_adjust(&mut self, point: Point, scene: &Scene) -> GestureOutcome {
        for object in scene.objects().iter().rev() {
            if object.locked {
                continue;
            }
            let (_, _, max_x, max_y) = object.kind.bounding_box();
            let handle = Point::new(max_x, max_y);
            let mode = if point.distance_to(&handle) <= HANDLE_TOLERANCE {
                AdjustMode::Resize
            } else if object.kind.contains_point(&point, SELECT_TOLERANCE) {
                AdjustMode::Move
            } else {
                continue;
            };

            self.gesture = Gesture::Drafting(Draft::Adjust {
                id: object.id,
                original: object.kind.clone(),
                mode,
                anchor: point,
                current: point,
            });
            return GestureOutcome::None;
        }
        GestureOutcome::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_background() -> Scene {
        Scene::with_background(vec![0], 612.0, 792.0)
    }

    #[test]
    fn rectangle_drag_normalizes_any_direction() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);

        machine.pointer_down(Point::new(100.0, 100.0), &mut scene);
        machine.pointer_move(Point::new(70.0, 60.0));
        let outcome = machine.pointer_up(Point::new(40.0, 40.0), &mut scene);

        let GestureOutcome::Placed(id) = outcome else { panic!("expected placement") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Shape { rect, .. } => {
                assert_eq!(*rect, Rect::new(40.0, 40.0, 60.0, 60.0));
            }
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn tool_stays_active_for_stamping() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);

        for i in 0..3 {
            let offset = i as f32 * 30.0;
            machine.pointer_down(Point::new(offset, offset), &mut scene);
            machine.pointer_up(Point::new(offset + 20.0, offset + 20.0), &mut scene);
        }

        assert_eq!(machine.tool(), Tool::Rectangle);
        assert_eq!(scene.user_object_count(), 3);
    }

    #[test]
    fn zero_area_rectangle_commit_is_a_no_op() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Highlight);

        machine.pointer_down(Point::new(50.0, 50.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(50.0, 90.0), &mut scene);

        assert_eq!(outcome, GestureOutcome::None);
        assert_eq!(scene.user_object_count(), 0);
    }

    #[test]
    fn circle_radius_is_half_the_drag_distance() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Circle);

        machine.pointer_down(Point::new(100.0, 100.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(160.0, 180.0), &mut scene);

        let GestureOutcome::Placed(id) = outcome else { panic!("expected placement") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Circle { center, radius, .. } => {
                assert_eq!(*center, Point::new(100.0, 100.0));
                assert!((radius - 50.0).abs() < 0.001);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn freehand_collects_every_sampled_point() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Freehand);

        machine.pointer_down(Point::new(0.0, 0.0), &mut scene);
        machine.pointer_move(Point::new(5.0, 5.0));
        machine.pointer_move(Point::new(10.0, 3.0));
        let outcome = machine.pointer_up(Point::new(15.0, 8.0), &mut scene);

        let GestureOutcome::Placed(id) = outcome else { panic!("expected placement") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Freehand { points, .. } => assert_eq!(points.len(), 4),
            other => panic!("expected freehand, got {other:?}"),
        }
    }

    #[test]
    fn text_placement_enters_edit_mode_without_a_drag_phase() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Text);

        let outcome = machine.pointer_down(Point::new(33.0, 44.0), &mut scene);
        let GestureOutcome::TextPlaced(id) = outcome else { panic!("expected text placement") };

        assert!(scene.set_text_content(id, "draft note"));
        // No drag phase: pointer_up with no draft does nothing further.
        assert_eq!(machine.pointer_up(Point::new(90.0, 90.0), &mut scene), GestureOutcome::None);
        assert_eq!(scene.user_object_count(), 1);
    }

    #[test]
    fn select_drag_moves_an_existing_annotation() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        machine.pointer_up(Point::new(50.0, 50.0), &mut scene);

        machine.select_tool(Tool::Select);
        machine.pointer_down(Point::new(30.0, 30.0), &mut scene);
        machine.pointer_move(Point::new(60.0, 45.0));
        let outcome = machine.pointer_up(Point::new(90.0, 80.0), &mut scene);

        let GestureOutcome::Moved(id) = outcome else { panic!("expected move, got {outcome:?}") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Shape { rect, .. } => {
                assert_eq!(*rect, Rect::new(70.0, 60.0, 40.0, 40.0));
            }
            other => panic!("expected shape, got {other:?}"),
        }
        // Moved, not duplicated.
        assert_eq!(scene.user_object_count(), 1);
    }

    #[test]
    fn corner_handle_drag_resizes_an_existing_annotation() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        machine.pointer_up(Point::new(50.0, 50.0), &mut scene);

        machine.select_tool(Tool::Select);
        // Grab just inside the bottom-right handle radius.
        machine.pointer_down(Point::new(52.0, 48.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(110.0, 90.0), &mut scene);

        let GestureOutcome::Resized(id) = outcome else { panic!("expected resize, got {outcome:?}") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Shape { rect, .. } => {
                assert_eq!(*rect, Rect::new(10.0, 10.0, 100.0, 80.0));
            }
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn select_never_moves_locked_objects() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Redact);
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        machine.pointer_up(Point::new(60.0, 40.0), &mut scene);

        machine.select_tool(Tool::Select);
        machine.pointer_down(Point::new(30.0, 20.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(120.0, 120.0), &mut scene);

        assert_eq!(outcome, GestureOutcome::None);
        let redaction = scene.objects().iter().find(|object| !object.is_background()).expect("placed");
        match &redaction.kind {
            AnnotationKind::Redaction { rect } => {
                assert_eq!(*rect, Rect::new(10.0, 10.0, 50.0, 30.0));
            }
            other => panic!("expected redaction, got {other:?}"),
        }
        // Empty space (and the bare background) is also a no-op.
        machine.pointer_down(Point::new(300.0, 500.0), &mut scene);
        assert_eq!(machine.pointer_up(Point::new(320.0, 520.0), &mut scene), GestureOutcome::None);
    }

    #[test]
    fn erase_removes_topmost_hit_but_never_the_background() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        machine.pointer_up(Point::new(60.0, 60.0), &mut scene);

        machine.select_tool(Tool::Erase);
        let outcome = machine.pointer_down(Point::new(30.0, 30.0), &mut scene);
        assert!(matches!(outcome, GestureOutcome::Erased(_)));
        assert_eq!(scene.user_object_count(), 0);

        // Clicking the bare background (or empty space) is a no-op.
        let outcome = machine.pointer_down(Point::new(300.0, 400.0), &mut scene);
        assert_eq!(outcome, GestureOutcome::None);
        assert_eq!(scene.objects().len(), 1);
        assert!(scene.objects()[0].is_background());
    }

    #[test]
    fn placed_redactions_cannot_be_erased() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Redact);
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        machine.pointer_up(Point::new(80.0, 40.0), &mut scene);

        machine.select_tool(Tool::Erase);
        let outcome = machine.pointer_down(Point::new(40.0, 20.0), &mut scene);
        assert_eq!(outcome, GestureOutcome::None);
        assert_eq!(scene.user_object_count(), 1);
    }

    #[test]
    fn crop_commits_a_rect_without_adding_a_scene_object() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Crop);

        machine.pointer_down(Point::new(250.0, 150.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(50.0, 50.0), &mut scene);

        assert_eq!(outcome, GestureOutcome::CropCommitted(Rect::new(50.0, 50.0, 200.0, 100.0)));
        assert_eq!(scene.user_object_count(), 0);
    }

    #[test]
    fn cancel_discards_the_pending_draft() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Line);

        machine.pointer_down(Point::new(0.0, 0.0), &mut scene);
        machine.pointer_move(Point::new(50.0, 50.0));
        assert!(machine.draft_preview().is_some());

        machine.cancel();
        assert!(machine.draft_preview().is_none());
        assert_eq!(machine.pointer_up(Point::new(80.0, 80.0), &mut scene), GestureOutcome::None);
        assert_eq!(scene.user_object_count(), 0);
    }

    #[test]
    fn new_pointer_down_discards_a_stale_draft() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();
        machine.select_tool(Tool::Rectangle);

        // First gesture never finished (no pointer_up).
        machine.pointer_down(Point::new(0.0, 0.0), &mut scene);
        machine.pointer_move(Point::new(500.0, 500.0));

        // Second gesture starts cleanly.
        machine.pointer_down(Point::new(10.0, 10.0), &mut scene);
        let outcome = machine.pointer_up(Point::new(30.0, 30.0), &mut scene);

        let GestureOutcome::Placed(id) = outcome else { panic!("expected placement") };
        match &scene.get(id).expect("object exists").kind {
            AnnotationKind::Shape { rect, .. } => {
                assert_eq!(*rect, Rect::new(10.0, 10.0, 20.0, 20.0));
            }
            other => panic!("expected shape, got {other:?}"),
        }
        assert_eq!(scene.user_object_count(), 1);
    }

    #[test]
    fn image_tool_requests_a_pick_then_stamps_and_reverts() {
        let mut machine = ToolMachine::new();
        let mut scene = scene_with_background();

        assert_eq!(machine.select_tool(Tool::Image), ToolEvent::PickImage);
        let outcome = machine.place_image(&mut scene, vec![1, 2, 3]);

        assert!(matches!(outcome, GestureOutcome::Placed(_)));
        assert_eq!(machine.tool(), Tool::Select);
        assert_eq!(scene.user_object_count(), 1);
    }
}
