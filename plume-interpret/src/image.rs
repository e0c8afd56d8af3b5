//! The image handle produced by the image collaborator.

use plume_syntax::PdfObject;
use std::sync::Arc;

/// An image as the interpreter sees it: the (inline or XObject) stream
/// object with its dictionary and raw data. Filter decoding is the
/// downstream renderer's job.
#[derive(Clone, Debug)]
pub struct Image {
    object: Arc<PdfObject>,
}

impl Image {
    pub fn new(object: Arc<PdfObject>) -> Self {
        Self { object }
    }

    pub fn object(&self) -> &Arc<PdfObject> {
        &self.object
    }

    pub fn width(&self) -> Option<f64> {
        self.object.get("Width").and_then(|w| w.as_f64())
    }

    pub fn height(&self) -> Option<f64> {
        self.object.get("Height").and_then(|h| h.as_f64())
    }

    /// Whether the image is a stencil mask.
    pub fn is_mask(&self) -> bool {
        self.object
            .get("ImageMask")
            .and_then(|m| m.as_bool())
            .unwrap_or(false)
    }

    /// The raw (still encoded) image data.
    pub fn data(&self) -> Option<&[u8]> {
        self.object.stream_data()
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}
