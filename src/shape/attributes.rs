use serde_json::{json, Map, Value};

use crate::data::{Document, Element};
use crate::errors::{Error, Result};

pub const TOP_LEVEL_DATA: [&str; 2] = ["id", "visible"];
pub const CREATED: [&str; 5] = ["version", "changeset", "timestamp", "user", "uid"];
pub const POS: [&str; 2] = ["lat", "lon"];

/// Copies the listed attributes that are present, skipping absent ones.
fn data_map(element: &Element, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| {
            element
                .attribute(key)
                .map(|value| (key.to_string(), Value::from(value)))
        })
        .collect()
}

fn parse_coordinate(name: &str, raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::coordinate(format!("Attribute {} is not a number: {:?}", name, raw)))?;
    if !value.is_finite() {
        return Err(Error::coordinate(format!("Attribute {} is not finite: {:?}", name, raw)));
    }
    Ok(value)
}

/// `[lat, lon]`, only when both attributes are present.
fn position(element: &Element) -> Result<Option<[f64; 2]>> {
    let [lat_key, lon_key] = POS;
    match (element.attribute(lat_key), element.attribute(lon_key)) {
        (Some(lat), Some(lon)) => Ok(Some([
            parse_coordinate(lat_key, lat)?,
            parse_coordinate(lon_key, lon)?,
        ])),
        _ => Ok(None),
    }
}

/// Builds the attribute-derived part of a document: top-level fields, the
/// `created` provenance group, `pos` and `type`.
pub fn project(element: &Element) -> Result<Document> {
    let mut document = Document::from(data_map(element, &TOP_LEVEL_DATA));

    let created = data_map(element, &CREATED);
    if !created.is_empty() {
        document.insert("created", Value::Object(created));
    }

    if let Some([lat, lon]) = position(element)? {
        document.insert("pos", json!([lat, lon]));
    }

    document.insert("type", element.name());
    Ok(document)
}
