//! The resource dictionary and name resolution.

use crate::error::{Error, Result};
use plume_syntax::{ObjectKind, PdfObject};
use std::collections::HashMap;
use std::sync::Arc;

/// The category sub-dictionaries a resource map is expected to carry.
pub mod category {
    pub const FONT: &str = "Font";
    pub const X_OBJECT: &str = "XObject";
    pub const COLOR_SPACE: &str = "ColorSpace";
    pub const PATTERN: &str = "Pattern";
    pub const SHADING: &str = "Shading";
    pub const EXT_G_STATE: &str = "ExtGState";
    pub const PROPERTIES: &str = "Properties";
}

/// The resources of a content stream: a mapping from category names to
/// category sub-dictionaries. Read-only during interpretation.
#[derive(Clone, Debug, Default)]
pub struct Resources {
    map: HashMap<String, Arc<PdfObject>>,
}

impl Resources {
    pub fn new(map: HashMap<String, Arc<PdfObject>>) -> Self {
        Self { map }
    }

    /// Build resources from the entries of a resource dictionary object.
    pub fn from_object(object: &PdfObject) -> Self {
        match object.kind() {
            ObjectKind::Dict(entries) => Self::new(entries.clone()),
            _ => Self::default(),
        }
    }

    /// Look up the object registered under `name` in the `category`
    /// sub-dictionary.
    pub fn find(&self, name: &str, category: &str) -> Result<Arc<PdfObject>> {
        let Some(sub) = self.map.get(category) else {
            return Err(Error::Resource(format!(
                "no dictionary called {category} in the resources"
            )));
        };

        if !matches!(sub.kind(), ObjectKind::Dict(_)) {
            return Err(Error::Resource(format!(
                "resource entry {category} is not a dictionary"
            )));
        }

        sub.get(name).cloned().ok_or_else(|| {
            Error::Resource(format!("resource {name} not found in {category}"))
        })
    }

    /// The caller's resources with `overrides` (a form's own `/Resources`
    /// dictionary) taking precedence by key.
    pub fn merged(&self, overrides: Option<&Arc<PdfObject>>) -> Resources {
        let mut map = self.map.clone();

        if let Some(object) = overrides {
            if let ObjectKind::Dict(entries) = object.kind() {
                for (key, value) in entries {
                    map.insert(key.clone(), value.clone());
                }
            }
        }

        Self { map }
    }
}

#[cfg(test)]
mod tests {
    use super::{category, Resources};
    use plume_syntax::PdfObject;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn resources_with_font() -> Resources {
        let mut fonts = HashMap::new();
        fonts.insert("F1".to_string(), Arc::new(PdfObject::name("Helvetica")));

        let mut map = HashMap::new();
        map.insert(
            category::FONT.to_string(),
            Arc::new(PdfObject::dict(fonts)),
        );
        Resources::new(map)
    }

    #[test]
    fn find_resolves_category_then_name() {
        let resources = resources_with_font();
        let font = resources.find("F1", category::FONT).unwrap();
        assert_eq!(font.as_name(), Some("Helvetica"));
    }

    #[test]
    fn find_reports_missing_category_and_name() {
        let resources = resources_with_font();
        assert!(resources.find("X0", category::X_OBJECT).is_err());
        assert!(resources.find("F2", category::FONT).is_err());
    }

    #[test]
    fn merged_overrides_by_key() {
        let base = resources_with_font();

        let mut fonts = HashMap::new();
        fonts.insert("F1".to_string(), Arc::new(PdfObject::name("Courier")));
        let mut entries = HashMap::new();
        entries.insert(
            category::FONT.to_string(),
            Arc::new(PdfObject::dict(fonts)),
        );
        let overrides = Arc::new(PdfObject::dict(entries));

        let merged = base.merged(Some(&overrides));
        let font = merged.find("F1", category::FONT).unwrap();
        assert_eq!(font.as_name(), Some("Courier"));
    }
}
