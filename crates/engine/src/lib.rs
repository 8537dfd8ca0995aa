//! External collaborator layer for the annotation editor.
//!
//! Hosts the PDF rasterization service (trait plus the default lopdf-backed
//! implementation), the quota service consumed before expensive operations,
//! the output PDF writer used by the export compositor, and the interface of
//! the batch manipulation service.

use image::{ImageBuffer, Rgba};

pub mod manipulation;
pub mod quota;
pub mod rasterize;
pub mod writer;

pub use manipulation::{Margins, PageSelector, PdfManipulationService, ServiceError};
pub use quota::{MeteredQuota, QuotaService};
pub use rasterize::{LopdfRasterizer, PageRasterizer};
pub use writer::{CropBoxPt, OutputPdfBuilder};

pub type RasterImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// Logical size of one PDF page in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSizePt {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSizePt {
    /// US Letter, the fallback when a page carries no usable MediaBox.
    pub const LETTER: PageSizePt = PageSizePt { width_pt: 612.0, height_pt: 792.0 };
}

/// One rasterized page: the bitmap plus the logical page size it was
/// rendered from.
#[derive(Debug, Clone)]
pub struct RasterPage {
    pub image: RasterImage,
    pub width_pt: f32,
    pub height_pt: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("page {page} out of range (page_count={page_count})")]
    PageOutOfRange { page: u32, page_count: u32 },
    #[error("encrypted PDFs are not supported")]
    EncryptedUnsupported,
    #[error("document has no pages")]
    EmptyDocument,
    #[error("backend error: {0}")]
    Backend(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
