//! Accident investigation documents.
//!
//! Builds the placeholder bindings of an investigation report from host
//! records, merges them through a pluggable [`TemplateEngine`], and computes
//! the navigation tabs of an accident card.

pub mod assemble;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod model;
pub mod segment;
pub mod tabs;
pub mod template;

pub use assemble::{Assembler, Assembly, generate};
pub use config::Config;
pub use error::{BuildError, Result};
pub use fetch::{EntityStore, Snapshot};
pub use format::Locale;
pub use tabs::{Permissions, Tab, TabLabels, accident_tabs};
pub use template::{BuiltDocument, TemplateEngine, TemplateError};
