//! Heuristic SQL Injection Module
//!
//! - dictionary: per-DBMS error signatures
//! - comparison: page similarity
//! - dynamic: dynamic content detection and masking
//! - prober: page refetch and dynamic parameter checks
//! - heuristic: boundary and boolean probes, detection channels
//! - session / engine: per-endpoint state and the scan entry point

pub mod comparison;
pub mod dictionary;
pub mod dynamic;
pub mod engine;
pub mod heuristic;
pub mod prober;
pub mod session;

pub use comparison::{similarity, Comparator};
pub use dictionary::{ErrorDictionary, ErrorMatch};
pub use dynamic::{find_dynamic_content, DynamicMarking};
pub use engine::HeuristicEngine;
pub use session::{SessionOutcome, SessionStatus, SkipReason};
