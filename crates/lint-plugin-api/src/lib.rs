//! lint-plugin-api: the host side of the lintforge plugin contract
//!
//! A custom lint executable is assembled from a base engine plus analyzer
//! plugins. This crate fixes the shape every plugin exposes to that engine:
//!
//! - enumerate analyzers ([`LinterPlugin::analyzers`])
//! - build analyzers ([`LinterPlugin::build_analyzers`])
//! - declare a load mode ([`LinterPlugin::load_mode`])
//!
//! It also carries the minimal syntax driver the engine uses to parse Rust
//! files into `syn` trees, run analyzers over them and collect positioned
//! [`Diagnostic`]s.

pub mod analyzer;
pub mod diagnostic;
pub mod driver;
mod error;
pub mod registry;

pub use analyzer::{Analyzer, AnalyzerDescriptor, LinterPlugin, LoadMode, Pass};
pub use diagnostic::{Diagnostic, LineIndex, Position};
pub use driver::{parse_source, Driver, FileReport, ParsedSource};
pub use error::PluginError;
pub use registry::{PluginConstructor, PluginRegistry};

/// Result type for plugin operations
pub type Result<T> = std::result::Result<T, PluginError>;
