//! The font handle produced by the font collaborator.

use plume_syntax::PdfObject;
use std::sync::Arc;

/// A font as the interpreter sees it: an opaque handle around the font
/// dictionary. Glyph mapping, outlines and advance widths live with the
/// downstream consumer of [`crate::text::TextRun`]s.
#[derive(Clone, Debug)]
pub struct Font {
    object: Arc<PdfObject>,
}

impl Font {
    pub fn new(object: Arc<PdfObject>) -> Self {
        Self { object }
    }

    /// The font dictionary this handle was built from.
    pub fn object(&self) -> &Arc<PdfObject> {
        &self.object
    }

    /// The `BaseFont` entry, if the dictionary carries one.
    pub fn base_name(&self) -> Option<&str> {
        self.object.get("BaseFont").and_then(|n| n.as_name())
    }
}

impl PartialEq for Font {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}
