//! Interface of the batch PDF manipulation service.
//!
//! Every operation is a single-shot, stateless transform: input file(s) plus
//! parameters in, one output file out. The transforms themselves are served
//! externally; only the seam is defined here so the shell can talk to any
//! backend.

use serde::{Deserialize, Serialize};

/// Structured error payload returned by the service, mirroring its
/// `{error: string}` wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{error}")]
pub struct ServiceError {
    pub error: String,
}

impl ServiceError {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelector {
    All,
    Single(u32),
    /// Inclusive zero-based range.
    Range(u32, u32),
}

/// Margins to cut from each page edge, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Placement rectangle for an embedded image, in page points with top-left
/// origin: `[x, y, width, height]`.
pub type PlacementRect = [f32; 4];

pub trait PdfManipulationService {
    fn merge(&self, files: &[Vec<u8>]) -> Result<Vec<u8>, ServiceError>;
    fn extract_pages(&self, file: &[u8], pages: PageSelector) -> Result<Vec<u8>, ServiceError>;
    fn rotate(&self, file: &[u8], angle: i32, pages: PageSelector) -> Result<Vec<u8>, ServiceError>;
    fn add_watermark(&self, file: &[u8], text: &str, opacity: f32) -> Result<Vec<u8>, ServiceError>;
    fn add_page_numbers(&self, file: &[u8], start: u32, position: &str)
        -> Result<Vec<u8>, ServiceError>;
    fn crop(&self, file: &[u8], margins: Margins) -> Result<Vec<u8>, ServiceError>;
    fn embed_image(
        &self,
        file: &[u8],
        image: &[u8],
        page: u32,
        rect: PlacementRect,
    ) -> Result<Vec<u8>, ServiceError>;
    fn convert(&self, file: &[u8], target_format: &str) -> Result<Vec<u8>, ServiceError>;
}
