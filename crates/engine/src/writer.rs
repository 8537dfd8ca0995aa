//! Output PDF writer for flattened exports.
//!
//! Each exported page is one raster image: the builder embeds it as a
//! DeviceRGB FlateDecode image XObject, scales it over the full page through
//! a four-operator content stream, and optionally applies a CropBox. The
//! export pipeline intentionally flattens to raster-per-page; no vector or
//! text content survives into the output.

use crate::{EngineResult, RasterImage};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

/// Crop box in PDF page coordinates (bottom-left origin), as
/// `[llx, lly, urx, ury]`.
pub type CropBoxPt = [f32; 4];

pub struct OutputPdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl OutputPdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self { doc, pages_id, kids: Vec::new() }
    }

    /// Append one output page. `width_pt`/`height_pt` are the logical page
    /// size; the raster is stretched to cover it exactly.
    pub fn add_raster_page(
        &mut self,
        image: &RasterImage,
        width_pt: f32,
        height_pt: f32,
        crop_box: Option<CropBoxPt>,
    ) -> EngineResult<()> {
        let (px_width, px_height) = image.dimensions();

        // Output rasters are fully opaque by construction; drop alpha.
        // Capacity math in usize: u32 arithmetic overflows past ~37M pixels.
        let mut rgb = Vec::with_capacity(px_width as usize * px_height as usize * 3);
        for pixel in image.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        let compressed = encoder.finish()?;

        let image_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => px_width as i64,
                "Height" => px_height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        };

        if let Some([llx, lly, urx, ury]) = crop_box {
            page_dict.set(
                "CropBox",
                vec![
                    Object::Real(llx),
                    Object::Real(lly),
                    Object::Real(urx),
                    Object::Real(ury),
                ],
            );
        }

        let page_id = self.doc.add_object(page_dict);
        self.kids.push(Object::Reference(page_id));

        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Finalize the page tree and serialize the document.
    pub fn finish(mut self) -> EngineResult<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc.save_to(&mut buf)?;

        tracing::debug!(pages = count, bytes = buf.len(), "output PDF serialized");
        Ok(buf)
    }
}

impl Default for OutputPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
