use log::debug;
use serde_json::Value;

use crate::data::{Document, Element};
use crate::shape::housenumber::HouseNumberExpander;

pub const HOUSE_NUMBER_KEY: &str = "addr:housenumber";

/// Folds the direct `tag` children of `element` into `document`, in document
/// order. Later tags overwrite earlier fields of the same name.
pub fn fold_tags(element: &Element, document: &mut Document, house_numbers: &HouseNumberExpander) {
    for tag in element.children_named("tag") {
        let (Some(key), Some(value)) = (tag.attribute("k"), tag.attribute("v")) else {
            debug!(element = element.name(), id = element.attribute("id").unwrap_or(""); "Skipping tag without k/v");
            continue;
        };
        let field = if key == HOUSE_NUMBER_KEY {
            Value::from(house_numbers.expand(value))
        } else {
            Value::from(value)
        };
        document.insert(key, field);
    }
}
