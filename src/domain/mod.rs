//! Benchmark domain types: request descriptors, width ranges, and URL templates.
mod spec;
mod templates;


pub use spec::{RequestSpec, WidthRange};
pub use templates::{DEFAULT_DOMAIN, DEFAULT_FORMAT, TemplateSet};
