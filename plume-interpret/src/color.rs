//! Color spaces and paints.
//!
//! Only the device spaces and the `Pattern` marker space are built in.
//! Everything else (ICC, Separation, Indexed, …) is the color-space
//! collaborator's business: it hands back a [`ColorSpace`] implementation
//! and the interpreter treats the handle as an immutable, shareable value.

use plume_syntax::PdfObject;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::sync::Arc;

/// The component buffer of a color.
pub type ColorComponents = SmallVec<[f32; 4]>;

/// A color space as seen by the interpreter.
pub trait ColorSpace: Debug + Send + Sync {
    /// The name of the space, e.g. `DeviceRGB`.
    fn name(&self) -> &str;

    /// The number of components a color in this space carries; this is the
    /// operand count of `SC`/`sc` while the space is current.
    fn num_components(&self) -> usize;

    /// Whether `SCN`/`scn` should treat this as a Pattern space.
    fn is_pattern(&self) -> bool {
        false
    }
}

/// A shared, immutable color-space handle.
pub type ColorSpaceHandle = Arc<dyn ColorSpace>;

#[derive(Debug)]
struct DeviceGray;

#[derive(Debug)]
struct DeviceRgb;

#[derive(Debug)]
struct DeviceCmyk;

#[derive(Debug)]
struct PatternSpace;

impl ColorSpace for DeviceGray {
    fn name(&self) -> &str {
        "DeviceGray"
    }

    fn num_components(&self) -> usize {
        1
    }
}

impl ColorSpace for DeviceRgb {
    fn name(&self) -> &str {
        "DeviceRGB"
    }

    fn num_components(&self) -> usize {
        3
    }
}

impl ColorSpace for DeviceCmyk {
    fn name(&self) -> &str {
        "DeviceCMYK"
    }

    fn num_components(&self) -> usize {
        4
    }
}

impl ColorSpace for PatternSpace {
    fn name(&self) -> &str {
        "Pattern"
    }

    fn num_components(&self) -> usize {
        1
    }

    fn is_pattern(&self) -> bool {
        true
    }
}

pub fn device_gray() -> ColorSpaceHandle {
    Arc::new(DeviceGray)
}

pub fn device_rgb() -> ColorSpaceHandle {
    Arc::new(DeviceRgb)
}

pub fn device_cmyk() -> ColorSpaceHandle {
    Arc::new(DeviceCmyk)
}

pub fn pattern() -> ColorSpaceHandle {
    Arc::new(PatternSpace)
}

/// Resolve a color-space name that needs no resource lookup.
pub(crate) fn named(name: &str) -> Option<ColorSpaceHandle> {
    match name {
        "DeviceGray" | "G" => Some(device_gray()),
        "DeviceRGB" | "RGB" => Some(device_rgb()),
        "DeviceCMYK" | "CMYK" => Some(device_cmyk()),
        "Pattern" => Some(pattern()),
        _ => None,
    }
}

/// A solid color: the space that produced it plus its raw components.
#[derive(Clone, Debug)]
pub struct Color {
    space: ColorSpaceHandle,
    components: ColorComponents,
}

impl Color {
    pub fn new(space: ColorSpaceHandle, components: &[f32]) -> Self {
        Self {
            space,
            components: ColorComponents::from_slice(components),
        }
    }

    pub fn space(&self) -> &ColorSpaceHandle {
        &self.space
    }

    pub fn components(&self) -> &[f32] {
        &self.components
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.space.name() == other.space.name() && self.components == other.components
    }
}

/// A paint produced by the pattern collaborator.
///
/// Carries the pattern object as resolved from the resources plus the
/// numeric components that preceded the pattern name on the stack.
#[derive(Clone, Debug)]
pub struct PatternPaint {
    pub object: Arc<PdfObject>,
    pub components: ColorComponents,
}

impl PartialEq for PatternPaint {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object) && self.components == other.components
    }
}

/// A paint handed to the sink with stroke and fill commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Color(Color),
    Pattern(PatternPaint),
}

impl Paint {
    /// A solid color in the given space.
    pub fn solid(space: ColorSpaceHandle, components: &[f32]) -> Self {
        Paint::Color(Color::new(space, components))
    }
}

#[cfg(test)]
mod tests {
    use super::{device_cmyk, device_gray, device_rgb, named, pattern, Paint};

    #[test]
    fn component_counts() {
        assert_eq!(device_gray().num_components(), 1);
        assert_eq!(device_rgb().num_components(), 3);
        assert_eq!(device_cmyk().num_components(), 4);
    }

    #[test]
    fn named_spaces() {
        assert_eq!(named("DeviceRGB").unwrap().name(), "DeviceRGB");
        assert_eq!(named("G").unwrap().name(), "DeviceGray");
        assert!(named("Pattern").unwrap().is_pattern());
        assert!(named("CalRGB").is_none());
    }

    #[test]
    fn paint_equality_is_by_space_name_and_components() {
        let a = Paint::solid(device_gray(), &[0.5]);
        let b = Paint::solid(device_gray(), &[0.5]);
        let c = Paint::solid(device_gray(), &[0.25]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
