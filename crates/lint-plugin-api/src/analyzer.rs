//! Analyzer and plugin traits.
//!
//! The engine owns when and how these are called. A plugin only describes
//! itself, hands out analyzers and states how much program information its
//! analyzers need.

use std::path::Path;
use std::sync::Arc;

use proc_macro2::Span;
use serde::{Deserialize, Serialize};

use crate::diagnostic::{Diagnostic, LineIndex};
use crate::Result;

/// How much the engine has to load before running a plugin's analyzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Parsed syntax trees only.
    SyntaxOnly,
    /// Syntax plus resolved type information.
    SemanticTypes,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadMode::SyntaxOnly => "syntax-only",
            LoadMode::SemanticTypes => "semantic-types",
        }
    }
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and one-line documentation of an analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalyzerDescriptor {
    pub name: &'static str,
    pub doc: &'static str,
}

/// A single pass over one syntax tree.
///
/// Implementations must not keep per-file state: the engine may run one
/// analyzer instance over many files from several threads.
pub trait Analyzer: Send + Sync {
    fn descriptor(&self) -> AnalyzerDescriptor;

    /// Whether the analyzer still runs on trees recovered from files that
    /// failed to parse.
    fn run_despite_errors(&self) -> bool {
        false
    }

    fn run(&self, pass: &mut Pass<'_>);
}

/// The capability surface a plugin exposes to the engine.
pub trait LinterPlugin: Send + Sync {
    /// Construct the analyzers this plugin provides.
    fn build_analyzers(&self) -> Result<Vec<Arc<dyn Analyzer>>>;

    /// Enumerate the analyzers, in registration order, without building them.
    fn analyzers(&self) -> Vec<AnalyzerDescriptor>;

    fn load_mode(&self) -> LoadMode;
}

/// What an analyzer sees while running over one file: the tree, a way to
/// resolve positions, and a sink for diagnostics.
pub struct Pass<'a> {
    path: &'a Path,
    file: &'a syn::File,
    lines: &'a LineIndex,
    analyzer: &'static str,
    damaged: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Pass<'a> {
    pub fn new(
        path: &'a Path,
        file: &'a syn::File,
        lines: &'a LineIndex,
        analyzer: &'static str,
        damaged: bool,
    ) -> Self {
        Pass {
            path,
            file,
            lines,
            analyzer,
            damaged,
            diagnostics: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    pub fn file(&self) -> &syn::File {
        self.file
    }

    pub fn lines(&self) -> &LineIndex {
        self.lines
    }

    /// True when the tree was recovered from a file with parse errors.
    pub fn is_damaged(&self) -> bool {
        self.damaged
    }

    /// Report a violation covering `span`.
    pub fn report(&mut self, span: Span, message: impl Into<String>) {
        let diagnostic = Diagnostic::at_span(self.analyzer, span, self.lines, message);
        self.diagnostics.push(diagnostic);
    }

    /// Report diagnostics built elsewhere.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
