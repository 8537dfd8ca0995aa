//! Editor shell: document session state and the operations the surface
//! calls into.
//!
//! Owns the page store and tool machine, routes viewport pointer events
//! through the coordinate mapper, and guards the heavyweight operations
//! (page switch, bulk annotate, export) with a mutual-exclusion flag so a
//! re-entrant trigger gets a `Busy` error instead of interleaved state.

use pagemark_core::{
    bulk, compose, to_page_space, AnnotationKind, BulkError, DisplayBounds, ExportArtifact,
    ExportError, GestureOutcome, NumberPosition, PageState, PageStore, Scene, StoreError, Tool,
    ToolEvent, ToolMachine,
};
use pagemark_engine::{EngineError, PageRasterizer, QuotaService};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no document is open")]
    NoDocument,
    #[error("uploaded file is not a PDF")]
    InvalidPdf,
    #[error("another operation is already in progress")]
    Busy,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<BulkError<std::convert::Infallible>> for EditorError {
    fn from(err: BulkError<std::convert::Infallible>) -> Self {
        match err {
            BulkError::Store(err) => EditorError::Store(err),
            BulkError::Generator { cause, .. } => match cause {},
        }
    }
}

/// One editing session: at most one open document at a time.
pub struct Editor {
    store: Option<PageStore>,
    tools: ToolMachine,
    rasterizer: Box<dyn PageRasterizer>,
    quota: Box<dyn QuotaService>,
    doc_name: String,
    op_in_flight: bool,
}

impl Editor {
    pub fn new(rasterizer: Box<dyn PageRasterizer>, quota: Box<dyn QuotaService>) -> Self {
        Self {
            store: None,
            tools: ToolMachine::new(),
            rasterizer,
            quota,
            doc_name: String::new(),
            op_in_flight: false,
        }
    }

    pub fn has_document(&self) -> bool {
        self.store.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.store.as_ref().map_or(0, PageStore::page_count)
    }

    pub fn current_page_index(&self) -> Option<usize> {
        self.store.as_ref().map(PageStore::current_index)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.store.as_ref().map(PageStore::scene)
    }

    pub fn tools(&self) -> &ToolMachine {
        &self.tools
    }

    pub fn select_tool(&mut self, tool: Tool) -> ToolEvent {
        self.tools.select_tool(tool)
    }

    /// Open an uploaded PDF, replacing any current document.
    ///
    /// Every page is rasterized before the session state changes, so a
    /// failure partway through leaves the previous document fully intact.
    pub fn open_pdf(&mut self, bytes: &[u8], name: &str) -> Result<(), EditorError> {
        if bytes.is_empty() || !bytes.starts_with(b"%PDF-") {
            return Err(EditorError::InvalidPdf);
        }

        let pages = self.rasterize_all(bytes)?;
        let store = PageStore::from_pages(pages).ok_or(EngineError::EmptyDocument)?;

        tracing::info!(pages = store.page_count(), name, "document opened");
        self.store = Some(store);
        self.doc_name = name.to_owned();
        self.tools = ToolMachine::new();
        Ok(())
    }

    fn rasterize_all(&self, bytes: &[u8]) -> Result<Vec<PageState>, EditorError> {
        let rasters = self.rasterizer.rasterize_all(bytes, 1.0)?;
        Ok(rasters
            .into_iter()
            .map(|raster| PageState::new(raster.image, raster.width_pt, raster.height_pt))
            .collect())
    }

    pub fn pointer_down(
        &mut self,
        pointer_x: f32,
        pointer_y: f32,
        bounds: DisplayBounds,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<GestureOutcome, EditorError> {
        let point = to_page_space(pointer_x, pointer_y, bounds, scale_x, scale_y);
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        let outcome = self.tools.pointer_down(point, store.scene_mut());
        Ok(Self::apply_outcome(store, outcome))
    }

    pub fn pointer_move(
        &mut self,
        pointer_x: f32,
        pointer_y: f32,
        bounds: DisplayBounds,
        scale_x: f32,
        scale_y: f32,
    ) {
        let point = to_page_space(pointer_x, pointer_y, bounds, scale_x, scale_y);
        self.tools.pointer_move(point);
    }

    pub fn pointer_up(
        &mut self,
        pointer_x: f32,
        pointer_y: f32,
        bounds: DisplayBounds,
        scale_x: f32,
        scale_y: f32,
    ) -> Result<GestureOutcome, EditorError> {
        let point = to_page_space(pointer_x, pointer_y, bounds, scale_x, scale_y);
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        let outcome = self.tools.pointer_up(point, store.scene_mut());
        Ok(Self::apply_outcome(store, outcome))
    }

    /// Pointer left the canvas mid-drag.
    pub fn pointer_cancel(&mut self) {
        self.tools.cancel();
    }

    pub fn place_image(&mut self, data: Vec<u8>) -> Result<GestureOutcome, EditorError> {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        Ok(self.tools.place_image(store.scene_mut(), data))
    }

    fn apply_outcome(store: &mut PageStore, outcome: GestureOutcome) -> GestureOutcome {
        if let GestureOutcome::CropCommitted(rect) = outcome {
            store.set_crop(rect);
        }
        outcome
    }

    pub fn go_to_page(&mut self, index: usize) -> Result<(), EditorError> {
        self.begin_op()?;
        let result = self.go_to_page_inner(index);
        self.op_in_flight = false;
        result
    }

    fn go_to_page_inner(&mut self, index: usize) -> Result<(), EditorError> {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        // A half-drawn draft does not follow to another page.
        self.tools.cancel();
        store.switch_to(index)?;
        Ok(())
    }

    /// Append a blank page sized like the current page. Returns its index.
    pub fn insert_blank_page(&mut self) -> Result<usize, EditorError> {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        Ok(store.insert_blank())
    }

    /// Rasterize another PDF and append its pages after the existing ones.
    pub fn insert_pdf(&mut self, bytes: &[u8]) -> Result<usize, EditorError> {
        if bytes.is_empty() || !bytes.starts_with(b"%PDF-") {
            return Err(EditorError::InvalidPdf);
        }
        if self.store.is_none() {
            return Err(EditorError::NoDocument);
        }

        let pages = self.rasterize_all(bytes)?;
        let added = pages.len();
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        store.insert_from(pages);
        tracing::info!(added, total = store.page_count(), "pages inserted");
        Ok(added)
    }

    pub fn clear_crop(&mut self) -> Result<(), EditorError> {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        store.clear_crop();
        Ok(())
    }

    pub fn watermark_all(&mut self, text: &str) -> Result<(), EditorError> {
        self.begin_op()?;
        let result = self.bulk_inner(bulk::watermark(text));
        self.op_in_flight = false;
        result
    }

    pub fn number_all(&mut self, start: u32, position: NumberPosition) -> Result<(), EditorError> {
        self.begin_op()?;
        let result = self.bulk_inner(bulk::page_numbers(start, position));
        self.op_in_flight = false;
        result
    }

    fn bulk_inner<F>(&mut self, generator: F) -> Result<(), EditorError>
    where
        F: FnMut(usize, &PageState) -> Result<AnnotationKind, std::convert::Infallible>,
    {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        bulk::apply_to_all(store, generator)?;
        Ok(())
    }

    /// Flatten and export the document. Quota is consumed before any
    /// compositing; the store itself is never modified by export.
    pub fn export(&mut self) -> Result<ExportArtifact, EditorError> {
        self.begin_op()?;
        let result = self.export_inner();
        self.op_in_flight = false;
        result
    }

    fn export_inner(&mut self) -> Result<ExportArtifact, EditorError> {
        let store = self.store.as_mut().ok_or(EditorError::NoDocument)?;
        store.sync_active()?;
        let artifact = compose::export(store.pages(), self.quota.as_ref(), &self.doc_name)?;
        Ok(artifact)
    }

    fn begin_op(&mut self) -> Result<(), EditorError> {
        if self.op_in_flight {
            return Err(EditorError::Busy);
        }
        self.op_in_flight = true;
        Ok(())
    }
}
