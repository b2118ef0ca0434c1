//! Pure JSON transforms applied to inbound bodies before they reach a vendor.

pub mod body;
pub mod catalog;
pub mod tools;

pub use body::{JsonObject, RawBody};
pub use catalog::{Catalog, DEFAULT_SYSTEM_MESSAGE, default_tools};
pub use tools::{is_flat_dialect, to_function_declarations, to_function_tools};
