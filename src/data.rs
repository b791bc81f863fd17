pub mod document;
pub mod element;

pub use self::document::Document;
pub use self::element::{Element, SourceElement};
