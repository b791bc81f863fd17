pub mod attributes;
pub mod housenumber;
pub mod tags;

pub use self::housenumber::{HouseNumberExpander, RangePolicy};

use crate::data::{Document, Element};
use crate::errors::Result;

/// Turns node and way elements into documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Shaper {
    house_numbers: HouseNumberExpander,
}

impl Shaper {
    pub fn new(range_policy: RangePolicy) -> Self {
        Shaper {
            house_numbers: HouseNumberExpander::new(range_policy),
        }
    }

    /// Builds the document for `element`, or `None` for anything other than a
    /// node or a way. Relations are not handled.
    ///
    /// Attributes are projected first and tags folded in afterwards, so a tag
    /// overwrites an attribute-derived field of the same name.
    pub fn shape(&self, element: &Element) -> Result<Option<Document>> {
        match element.name() {
            "node" | "way" => {
                let mut document = attributes::project(element)?;
                tags::fold_tags(element, &mut document, &self.house_numbers);
                Ok(Some(document))
            },
            _ => Ok(None),
        }
    }
}

pub fn shape_element(element: &Element) -> Result<Option<Document>> {
    Shaper::default().shape(element)
}
