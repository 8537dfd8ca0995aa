//! Page store and the page-switch lifecycle.
//!
//! Pages live in an explicit arena indexed by position; exactly one page is
//! active at a time and owns the live `Scene`. Inactive pages hold their
//! annotations as serialized snapshots, so memory stays proportional to one
//! live scene plus the page bitmaps.

use crate::geometry::Rect;
use crate::scene::{Scene, SceneError};
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("page index {index} out of range (page count {page_count})")]
    PageOutOfRange { index: usize, page_count: usize },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// One page of the open document. `scene_json` is the serialized annotation
/// scene; the empty string means the page has never been annotated.
#[derive(Debug, Clone)]
pub struct PageState {
    pub background: RgbaImage,
    /// Logical page size in points, the coordinate space annotations live in.
    pub width: f32,
    pub height: f32,
    pub scene_json: String,
    pub crop_rect: Option<Rect>,
}

impl PageState {
    pub fn new(background: RgbaImage, width: f32, height: f32) -> Self {
        Self { background, width, height, scene_json: String::new(), crop_rect: None }
    }

    /// White page of the given logical size, rasterized 1:1.
    pub fn blank(width: f32, height: f32) -> Self {
        let background = RgbaImage::from_pixel(
            width.max(1.0) as u32,
            height.max(1.0) as u32,
            image::Rgba([255, 255, 255, 255]),
        );
        Self::new(background, width, height)
    }

    /// Rehydrate this page's scene. Fails soft: a corrupt snapshot (or the
    /// never-annotated empty string) yields a background-only scene, and the
    /// background comes back locked at index 0 either way.
    pub fn rehydrate(&self) -> Scene {
        let mut scene = Scene::deserialize(&self.scene_json);
        if !scene.objects().iter().any(|object| object.is_background()) {
            scene = Scene::with_background(Vec::new(), self.width, self.height);
        }
        scene
    }
}

/// Arena of pages plus the index of the active one, which owns the live
/// scene. Every other page is dormant: bitmap + snapshot string.
#[derive(Debug)]
pub struct PageStore {
    pages: Vec<PageState>,
    current: usize,
    active: Scene,
}

impl PageStore {
    /// Build a store from rasterized pages. Page 0 becomes active.
    pub fn from_pages(pages: Vec<PageState>) -> Option<Self> {
        let first = pages.first()?;
        let active = first.rehydrate();
        Some(Self { pages, current: 0, active })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn pages(&self) -> &[PageState] {
        &self.pages
    }

    pub fn current_page(&self) -> &PageState {
        &self.pages[self.current]
    }

    pub fn scene(&self) -> &Scene {
        &self.active
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.active
    }

    /// Switch the active page.
    ///
    /// Lifecycle order is load-bearing: (1) serialize the outgoing scene into
    /// its page slot, (2) move the index, (3) rehydrate the incoming scene,
    /// (4) re-lock its background. Skipping step 1 silently drops every
    /// annotation made since the page was last active.
    pub fn switch_to(&mut self, index: usize) -> Result<(), StoreError> {
        if index >= self.pages.len() {
            return Err(StoreError::PageOutOfRange { index, page_count: self.pages.len() });
        }

        self.pages[self.current].scene_json = self.active.serialize()?;
        self.current = index;
        self.active = self.pages[index].rehydrate();
        tracing::debug!(page = index, "switched active page");
        Ok(())
    }

    /// Flush the active scene into its page slot without switching. Bulk
    /// operations and export read from the snapshots, so pending edits on
    /// the active page must be written back first.
    pub fn sync_active(&mut self) -> Result<(), StoreError> {
        self.pages[self.current].scene_json = self.active.serialize()?;
        Ok(())
    }

    /// Append a blank white page sized like the current page. Returns the
    /// new page's index; existing indices are untouched.
    pub fn insert_blank(&mut self) -> usize {
        let (width, height) = {
            let page = self.current_page();
            (page.width, page.height)
        };
        self.pages.push(PageState::blank(width, height));
        self.pages.len() - 1
    }

    /// Append externally rasterized pages in order. Existing pages keep
    /// their indices and annotations.
    pub fn insert_from(&mut self, pages: Vec<PageState>) {
        self.pages.extend(pages);
    }

    /// Set the crop region of the current page. Zero-area rects are ignored.
    pub fn set_crop(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        self.pages[self.current].crop_rect = Some(rect);
    }

    pub fn clear_crop(&mut self) {
        self.pages[self.current].crop_rect = None;
    }

    /// Replace the full page vector, e.g. after a bulk operation produced an
    /// updated copy. The current page is rehydrated from the adopted data so
    /// the live scene reflects it.
    pub fn adopt_pages(&mut self, pages: Vec<PageState>) {
        debug_assert_eq!(pages.len(), self.pages.len());
        self.pages = pages;
        self.active = self.pages[self.current].rehydrate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationKind, SceneObject};
    use crate::geometry::{Color, Point};

    fn two_page_store() -> PageStore {
        let pages = vec![PageState::blank(612.0, 792.0), PageState::blank(612.0, 792.0)];
        PageStore::from_pages(pages).expect("non-empty")
    }

    fn note(text: &str) -> SceneObject {
        SceneObject::annotation(AnnotationKind::Text {
            position: Point::new(10.0, 10.0),
            content: text.to_owned(),
            font_size: 12.0,
            color: Color::BLACK,
        })
    }

    #[test]
    fn switch_round_trip_preserves_annotations() {
        let mut store = two_page_store();
        store.scene_mut().add(note("page one"));

        store.switch_to(1).expect("in range");
        assert_eq!(store.scene().user_object_count(), 0);
        store.scene_mut().add(note("page two"));

        store.switch_to(0).expect("in range");
        assert_eq!(store.scene().user_object_count(), 1);

        store.switch_to(1).expect("in range");
        assert_eq!(store.scene().user_object_count(), 1);
    }

    #[test]
    fn switch_round_trip_preserves_background_only_pages() {
        let mut store = two_page_store();

        store.switch_to(1).expect("in range");
        store.switch_to(0).expect("in range");

        assert_eq!(store.scene().user_object_count(), 0);
        assert!(store.scene().objects()[0].is_background());
        assert!(store.scene().objects()[0].locked);
    }

    #[test]
    fn switch_out_of_range_is_an_error() {
        let mut store = two_page_store();
        assert!(matches!(
            store.switch_to(5),
            Err(StoreError::PageOutOfRange { index: 5, page_count: 2 })
        ));
        // Store untouched.
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn insert_blank_matches_current_page_size() {
        let pages = vec![PageState::blank(400.0, 500.0)];
        let mut store = PageStore::from_pages(pages).expect("non-empty");

        let index = store.insert_blank();
        assert_eq!(index, 1);
        assert_eq!(store.pages()[1].width, 400.0);
        assert_eq!(store.pages()[1].height, 500.0);
        assert!(store.pages()[1].scene_json.is_empty());
    }

    #[test]
    fn insert_from_appends_without_touching_existing_pages() {
        let mut store = two_page_store();
        store.scene_mut().add(note("keep me"));
        store.sync_active().expect("serialize");

        store.insert_from(vec![PageState::blank(300.0, 300.0)]);

        assert_eq!(store.page_count(), 3);
        assert_eq!(store.current_index(), 0);
        assert_eq!(store.pages()[0].rehydrate().user_object_count(), 1);
    }

    #[test]
    fn crop_is_set_and_removable() {
        let mut store = two_page_store();

        store.set_crop(Rect::new(50.0, 50.0, 200.0, 100.0));
        assert_eq!(store.current_page().crop_rect, Some(Rect::new(50.0, 50.0, 200.0, 100.0)));

        store.clear_crop();
        assert_eq!(store.current_page().crop_rect, None);
    }

    #[test]
    fn zero_area_crop_is_ignored() {
        let mut store = two_page_store();
        store.set_crop(Rect::new(10.0, 10.0, 0.0, 40.0));
        assert_eq!(store.current_page().crop_rect, None);
    }

    #[test]
    fn corrupt_snapshot_rehydrates_to_background_only() {
        let mut page = PageState::blank(612.0, 792.0);
        page.scene_json = "{broken".to_owned();

        let scene = page.rehydrate();
        assert_eq!(scene.user_object_count(), 0);
        assert!(scene.objects()[0].is_background());
    }
}
