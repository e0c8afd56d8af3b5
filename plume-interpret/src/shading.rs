//! The shading handle produced by the shader collaborator.

use crate::color::Paint;
use kurbo::Rect;

/// A shading ready to be painted over a region.
#[derive(Clone, Debug, PartialEq)]
pub struct Shading {
    paint: Paint,
    bbox: Option<Rect>,
}

impl Shading {
    pub fn new(paint: Paint, bbox: Option<Rect>) -> Self {
        Self { paint, bbox }
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// The shading's own bounding box, if it declares one.
    pub fn bbox(&self) -> Option<Rect> {
        self.bbox
    }
}
