//! Bulk page operations: one generated annotation per page, atomically.
//!
//! The operation builds a fully updated copy of the page vector before the
//! store adopts anything, so a failure on page 7 of 10 leaves all ten pages
//! exactly as they were.

use crate::annotation::{AnnotationKind, SceneObject};
use crate::geometry::{Color, Point};
use crate::store::{PageState, PageStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BulkError<E> {
    #[error("bulk generator failed on page {page}")]
    Generator { page: usize, cause: E },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Apply one generated annotation to every page.
///
/// Each page's scene is rehydrated off-screen with its background re-locked,
/// the generated object appended on top, and the result serialized into a
/// new page vector. The store adopts the new vector only after every page
/// succeeded, then reloads the current page so the live scene reflects it.
pub fn apply_to_all<F, E>(store: &mut PageStore, mut generator: F) -> Result<(), BulkError<E>>
where
    F: FnMut(usize, &PageState) -> Result<AnnotationKind, E>,
{
    store.sync_active().map_err(BulkError::Store)?;

    let mut updated = Vec::with_capacity(store.page_count());
    for (index, page) in store.pages().iter().enumerate() {
        let kind = generator(index, page)
            .map_err(|cause| BulkError::Generator { page: index, cause })?;

        let mut scene = page.rehydrate();
        scene.add(SceneObject::annotation(kind));

        let mut new_page = page.clone();
        new_page.scene_json = scene.serialize().map_err(StoreError::from)?;
        updated.push(new_page);
    }

    let pages = updated.len();
    store.adopt_pages(updated);
    tracing::info!(pages, "applied bulk annotation");
    Ok(())
}

/// Corner or edge slot for generated page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

const WATERMARK_FONT_SIZE: f32 = 48.0;
const NUMBER_FONT_SIZE: f32 = 12.0;
const NUMBER_MARGIN: f32 = 24.0;

/// Generator stamping a centered, semi-transparent watermark on each page.
pub fn watermark(
    text: impl Into<String>,
) -> impl FnMut(usize, &PageState) -> Result<AnnotationKind, std::convert::Infallible> {
    let text = text.into();
    move |_index, page| {
        let est_width = text.chars().count() as f32 * WATERMARK_FONT_SIZE * 0.6;
        Ok(AnnotationKind::Text {
            position: Point::new(
                ((page.width - est_width) / 2.0).max(0.0),
                (page.height - WATERMARK_FONT_SIZE) / 2.0,
            ),
            content: text.clone(),
            font_size: WATERMARK_FONT_SIZE,
            color: Color::rgb(128, 128, 128).with_alpha(96),
        })
    }
}

/// Generator stamping sequential page numbers starting at `start`.
pub fn page_numbers(
    start: u32,
    position: NumberPosition,
) -> impl FnMut(usize, &PageState) -> Result<AnnotationKind, std::convert::Infallible> {
    move |index, page| {
        let label = (start + index as u32).to_string();
        let est_width = label.chars().count() as f32 * NUMBER_FONT_SIZE * 0.6;

        let x = match position {
            NumberPosition::TopLeft | NumberPosition::BottomLeft => NUMBER_MARGIN,
            NumberPosition::TopCenter | NumberPosition::BottomCenter => {
                ((page.width - est_width) / 2.0).max(0.0)
            }
            NumberPosition::TopRight | NumberPosition::BottomRight => {
                (page.width - NUMBER_MARGIN - est_width).max(0.0)
            }
        };
        let y = match position {
            NumberPosition::TopLeft | NumberPosition::TopCenter | NumberPosition::TopRight => {
                NUMBER_MARGIN
            }
            _ => page.height - NUMBER_MARGIN - NUMBER_FONT_SIZE,
        };

        Ok(AnnotationKind::Text {
            position: Point::new(x, y),
            content: label,
            font_size: NUMBER_FONT_SIZE,
            color: Color::BLACK,
        })
    }
}
