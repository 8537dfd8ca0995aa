//! Ordered annotation scene for one page.
//!
//! Array order is paint order: the locked background image sits at index 0
//! and every later object paints over it. Serialization wraps the object
//! list in a versioned envelope; deserialization fails soft so one corrupt
//! page snapshot never blocks editing of the rest of the document.

use crate::annotation::{AnnotationKind, ObjectId, SceneObject};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

const SCENE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SceneEnvelope {
    version: u32,
    objects: Vec<SceneObject>,
}

/// The ordered collection of annotation objects belonging to one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh scene containing only a locked background image.
    pub fn with_background(data: Vec<u8>, width: f32, height: f32) -> Self {
        Self { objects: vec![SceneObject::background(data, width, height)] }
    }

    /// Append an object at the top of the paint order.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Remove an object by id. The background is never removable, whatever
    /// id is passed.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self
            .objects
            .iter()
            .position(|object| object.id == id && !object.is_background())?;
        Some(self.objects.remove(index))
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Replace an object's geometry after a move or resize. Locked objects
    /// (including the background) are refused.
    pub fn update_kind(&mut self, id: ObjectId, kind: AnnotationKind) -> bool {
        for object in &mut self.objects {
            if object.id == id {
                if object.locked {
                    return false;
                }
                object.kind = kind;
                return true;
            }
        }
        false
    }

    /// Replace the content of a text annotation, e.g. after inline editing.
    pub fn set_text_content(&mut self, id: ObjectId, new_content: impl Into<String>) -> bool {
        for object in &mut self.objects {
            if object.id == id {
                if let AnnotationKind::Text { content, .. } = &mut object.kind {
                    *content = new_content.into();
                    return true;
                }
            }
        }
        false
    }

    /// Object count excluding the background, which is never part of the
    /// user-visible count.
    pub fn user_object_count(&self) -> usize {
        self.objects.iter().filter(|object| !object.is_background()).count()
    }

    /// Topmost unlocked object at the point, or None. The locked background
    /// and placed redactions are transparent to hit testing.
    pub fn hit_test(&self, point: &Point, tolerance: f32) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|object| !object.locked && object.kind.contains_point(point, tolerance))
            .map(|object| object.id)
    }

    /// Re-lock the background object and restore it to index 0.
    ///
    /// Generic deserialization restores all objects as interactive and in
    /// stored order; this must run after every deserialize or the
    /// background becomes erasable and can paint over user annotations.
    pub fn lock_background(&mut self) {
        let Some(position) = self.objects.iter().position(|object| object.is_background()) else {
            return;
        };

        self.objects[position].locked = true;
        if position > 0 {
            let background = self.objects.remove(position);
            self.objects.insert(0, background);
        }
    }

    /// Lossless snapshot of the scene, versioned. Array order is preserved
    /// and equals paint order.
    pub fn serialize(&self) -> Result<String, SceneError> {
        let envelope = SceneEnvelope { version: SCENE_VERSION, objects: self.objects.clone() };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Restore a scene from a snapshot.
    ///
    /// Fails soft: an empty, corrupt, or version-incompatible snapshot
    /// yields an empty scene rather than an error, so one bad page never
    /// blocks the rest of the document.
    pub fn deserialize(snapshot: &str) -> Self {
        if snapshot.is_empty() {
            return Self::new();
        }

        let envelope: SceneEnvelope = match serde_json::from_str(snapshot) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%err, "discarding corrupt scene snapshot");
                return Self::new();
            }
        };

        if envelope.version != SCENE_VERSION {
            tracing::warn!(version = envelope.version, "discarding incompatible scene snapshot");
            return Self::new();
        }

        let mut scene = Self { objects: envelope.objects };
        scene.lock_background();
        scene
    }
}
