//! Export compositor: flatten pages to rasters and write the output PDF.
//!
//! Quota is consumed before any flatten work; a denied quota aborts with
//! nothing computed. Export reads page snapshots only and never mutates the
//! store, so a failed attempt leaves the editing session intact.

use crate::raster::paint_annotation;
use crate::store::PageState;
use image::RgbaImage;
use pagemark_engine::{CropBoxPt, EngineError, OutputPdfBuilder, QuotaService};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export quota exhausted")]
    QuotaExceeded,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The finished export: derived download name plus the PDF bytes.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Flatten one page: background bitmap plus its rehydrated scene painted in
/// z-order. The background object itself is a marker; the pixels come from
/// the page bitmap.
pub fn flatten_page(page: &PageState) -> RgbaImage {
    let mut image = page.background.clone();
    let scene = page.rehydrate();
    for object in scene.objects() {
        if object.is_background() {
            continue;
        }
        paint_annotation(&mut image, &object.kind);
    }
    image
}

/// Export every page as a flattened raster PDF.
///
/// Crop rects are stored top-left page-space; PDF CropBox is bottom-left, so
/// the vertical coordinate flips by the page height.
pub fn export(
    pages: &[PageState],
    quota: &dyn QuotaService,
    doc_name: &str,
) -> Result<ExportArtifact, ExportError> {
    if !quota.check_and_consume() {
        tracing::warn!("export denied: quota exhausted");
        return Err(ExportError::QuotaExceeded);
    }

    let mut builder = OutputPdfBuilder::new();
    for page in pages {
        let image = flatten_page(page);
        let crop_box = page.crop_rect.map(|rect| -> CropBoxPt {
            let lly = page.height - rect.y - rect.height;
            [rect.x, lly, rect.x + rect.width, lly + rect.height]
        });
        builder.add_raster_page(&image, page.width, page.height, crop_box)?;
    }

    let bytes = builder.finish()?;
    let file_name = derive_file_name(doc_name);
    tracing::info!(pages = pages.len(), bytes = bytes.len(), %file_name, "export complete");
    Ok(ExportArtifact { file_name, bytes })
}

fn derive_file_name(doc_name: &str) -> String {
    let base = doc_name
        .strip_suffix(".pdf")
        .or_else(|| doc_name.strip_suffix(".PDF"))
        .unwrap_or(doc_name);
    let base = if base.is_empty() { "document" } else { base };
    format!("{base}-annotated.pdf")
}
