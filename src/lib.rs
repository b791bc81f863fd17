pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod shape;
pub mod store;
pub mod stream;

pub use crate::config::UserConfig;
pub use crate::data::{Document, Element, SourceElement};
pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::etl::Etl;
pub use crate::shape::{shape_element, RangePolicy, Shaper};
pub use crate::store::{DocumentStore, JsonLinesStore, MemoryStore};
pub use crate::stream::{open_source, ElementStream};
