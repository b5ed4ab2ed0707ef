//! Findings and their sinks and renderings

pub mod json;
pub mod model;
pub mod reporter;
pub mod text;

pub use model::{Channel, Finding, Severity};
pub use reporter::{FindingSink, Reporter};
