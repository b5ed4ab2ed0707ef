//! Parameter extraction and payload placement

pub mod injector;
pub mod variations;

pub use injector::inject;
