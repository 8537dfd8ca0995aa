//! PDF page rasterization service.
//!
//! The editor core never parses PDFs itself; it asks a `PageRasterizer` for
//! page counts, logical page sizes, and per-page bitmaps. Rasterization is
//! deterministic for a given (bytes, page index, scale) triple so page
//! backgrounds can be rebuilt identically at any time.

use crate::{EngineError, EngineResult, PageSizePt, RasterImage, RasterPage};
use image::Rgba;
use lopdf::Document;

pub trait PageRasterizer {
    fn page_count(&self, pdf: &[u8]) -> EngineResult<u32>;
    fn page_size(&self, pdf: &[u8], page_index: u32) -> EngineResult<PageSizePt>;
    fn rasterize_page(&self, pdf: &[u8], page_index: u32, scale: f32) -> EngineResult<RasterPage>;

    /// Rasterize every page in order. Backends that parse the document per
    /// call should override this so opening an n-page document costs one
    /// parse, not n.
    fn rasterize_all(&self, pdf: &[u8], scale: f32) -> EngineResult<Vec<RasterPage>> {
        (0..self.page_count(pdf)?)
            .map(|index| self.rasterize_page(pdf, index, scale))
            .collect()
    }
}

/// Default rasterizer backed by lopdf.
///
/// Parses the page tree for real page counts and MediaBox sizes, then
/// renders a placeholder bitmap (white fill, light grey border) at the
/// requested scale. Swapping in a full-fidelity backend only requires
/// another `PageRasterizer` implementation.
#[derive(Debug, Default, Clone)]
pub struct LopdfRasterizer;

impl LopdfRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn parse_sizes(pdf: &[u8]) -> EngineResult<Vec<PageSizePt>> {
        if pdf.windows("/Encrypt".len()).any(|window| window == b"/Encrypt") {
            return Err(EngineError::EncryptedUnsupported);
        }

        let doc = Document::load_mem(pdf)?;
        let pages = doc.get_pages();
        let mut sizes = Vec::with_capacity(pages.len());

        for (_, object_id) in pages {
            let dict = doc.get_dictionary(object_id)?;
            let size = dict
                .get(b"MediaBox")
                .ok()
                .and_then(|obj| obj.as_array().ok())
                .and_then(|array| {
                    if array.len() != 4 {
                        return None;
                    }
                    let x0 = array[0].as_float().ok()?;
                    let y0 = array[1].as_float().ok()?;
                    let x1 = array[2].as_float().ok()?;
                    let y1 = array[3].as_float().ok()?;
                    Some(PageSizePt { width_pt: (x1 - x0).abs(), height_pt: (y1 - y0).abs() })
                })
                .unwrap_or(PageSizePt::LETTER);

            sizes.push(size);
        }

        if sizes.is_empty() {
            return Err(EngineError::EmptyDocument);
        }

        Ok(sizes)
    }

    fn size_at(pdf: &[u8], page_index: u32) -> EngineResult<PageSizePt> {
        let sizes = Self::parse_sizes(pdf)?;
        sizes.get(page_index as usize).copied().ok_or(EngineError::PageOutOfRange {
            page: page_index,
            page_count: sizes.len() as u32,
        })
    }

    fn render(size: PageSizePt, scale: f32) -> RasterPage {
        let scale = if scale <= 0.0 { 1.0 } else { scale };
        let width = (size.width_pt * scale).round().max(1.0) as u32;
        let height = (size.height_pt * scale).round().max(1.0) as u32;

        let mut image = RasterImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        if width >= 4 && height >= 4 {
            for x in 0..width {
                image.put_pixel(x, 0, Rgba([220, 220, 220, 255]));
                image.put_pixel(x, height - 1, Rgba([220, 220, 220, 255]));
            }
            for y in 0..height {
                image.put_pixel(0, y, Rgba([220, 220, 220, 255]));
                image.put_pixel(width - 1, y, Rgba([220, 220, 220, 255]));
            }
        }

        RasterPage { image, width_pt: size.width_pt, height_pt: size.height_pt }
    }
}

impl PageRasterizer for LopdfRasterizer {
    fn page_count(&self, pdf: &[u8]) -> EngineResult<u32> {
        Ok(Self::parse_sizes(pdf)?.len() as u32)
    }

    fn page_size(&self, pdf: &[u8], page_index: u32) -> EngineResult<PageSizePt> {
        Self::size_at(pdf, page_index)
    }

    fn rasterize_page(&self, pdf: &[u8], page_index: u32, scale: f32) -> EngineResult<RasterPage> {
        let size = Self::size_at(pdf, page_index)?;
        tracing::debug!(page_index, "rasterizing page");
        Ok(Self::render(size, scale))
    }

    /// One document parse for the whole run, then a render per page.
    fn rasterize_all(&self, pdf: &[u8], scale: f32) -> EngineResult<Vec<RasterPage>> {
        let sizes = Self::parse_sizes(pdf)?;
        tracing::debug!(pages = sizes.len(), "rasterizing document");
        Ok(sizes.into_iter().map(|size| Self::render(size, scale)).collect())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_page_count_and_size() {
        let pdf = test_pdf::single_page(612, 792);
        let rasterizer = LopdfRasterizer::new();

        assert_eq!(rasterizer.page_count(&pdf).expect("count should succeed"), 1);

        let size = rasterizer.page_size(&pdf, 0).expect("size should succeed");
        assert_eq!(size.width_pt, 612.0);
        assert_eq!(size.height_pt, 792.0);
    }

    #[test]
    fn rasterizes_at_requested_scale() {
        let pdf = test_pdf::single_page(600, 800);
        let rasterizer = LopdfRasterizer::new();

        let page = rasterizer.rasterize_page(&pdf, 0, 2.0).expect("rasterize should succeed");
        assert_eq!(page.image.width(), 1200);
        assert_eq!(page.image.height(), 1600);
        assert_eq!(page.width_pt, 600.0);
        assert_eq!(page.height_pt, 800.0);
    }

    #[test]
    fn rasterization_is_deterministic() {
        let pdf = test_pdf::single_page(300, 400);
        let rasterizer = LopdfRasterizer::new();

        let a = rasterizer.rasterize_page(&pdf, 0, 1.0).expect("first render");
        let b = rasterizer.rasterize_page(&pdf, 0, 1.0).expect("second render");
        assert_eq!(a.image.as_raw(), b.image.as_raw());
    }

    #[test]
    fn rasterize_all_covers_every_page_in_order() {
        let pdf = test_pdf::with_pages(&[(612, 792), (300, 400), (200, 100)]);
        let rasterizer = LopdfRasterizer::new();

        let pages = rasterizer.rasterize_all(&pdf, 1.0).expect("rasterize should succeed");
        assert_eq!(pages.len(), 3);
        assert_eq!((pages[1].width_pt, pages[1].height_pt), (300.0, 400.0));
        assert_eq!((pages[2].image.width(), pages[2].image.height()), (200, 100));

        // Same pages as the one-at-a-time path.
        let single = rasterizer.rasterize_page(&pdf, 1, 1.0).expect("rasterize should succeed");
        assert_eq!(single.image.as_raw(), pages[1].image.as_raw());
    }

    #[test]
    fn nonpositive_scale_falls_back_to_one() {
        let pdf = test_pdf::single_page(100, 200);
        let rasterizer = LopdfRasterizer::new();

        let page = rasterizer.rasterize_page(&pdf, 0, 0.0).expect("rasterize should succeed");
        assert_eq!(page.image.width(), 100);
        assert_eq!(page.image.height(), 200);
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let pdf = test_pdf::single_page(612, 792);
        let rasterizer = LopdfRasterizer::new();

        let err = rasterizer.page_size(&pdf, 3).expect_err("page 3 should not exist");
        assert!(matches!(err, EngineError::PageOutOfRange { page: 3, page_count: 1 }));
    }

    #[test]
    fn encrypted_marker_is_rejected() {
        let mut pdf = test_pdf::single_page(612, 792);
        pdf.extend_from_slice(b"/Encrypt");

        let err = LopdfRasterizer::new().page_count(&pdf).expect_err("should refuse");
        assert!(matches!(err, EngineError::EncryptedUnsupported));
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let err = LopdfRasterizer::new()
            .page_count(b"not a pdf at all")
            .expect_err("garbage should fail");
        assert!(matches!(err, EngineError::Parse(_)));
    }
}
