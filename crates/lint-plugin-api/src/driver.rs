//! Syntax driver: parse, recover, run analyzers, order diagnostics.
//!
//! A file that fails to parse is not dropped. The driver salvages every
//! item it can still read, including function signatures whose bodies are
//! broken, and hands the partial tree to the analyzers that declare
//! [`Analyzer::run_despite_errors`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use proc_macro2::{Delimiter, TokenTree};
use syn::parse::discouraged::Speculative;
use syn::parse::{ParseStream, Parser};
use syn::{Attribute, Block, Item, ItemFn, Signature, Token, Visibility};
use tracing::{debug, warn};

use crate::analyzer::{Analyzer, LinterPlugin, LoadMode, Pass};
use crate::diagnostic::{Diagnostic, LineIndex};
use crate::error::PluginError;
use crate::Result;

/// A parsed (possibly recovered) source file.
pub struct ParsedSource {
    pub file: syn::File,
    pub lines: LineIndex,
    /// The parse error, when the tree was recovered.
    pub error: Option<String>,
}

impl ParsedSource {
    pub fn is_damaged(&self) -> bool {
        self.error.is_some()
    }
}

/// Parse Rust source, falling back to item-by-item recovery.
///
/// A leading byte-order mark is dropped; offsets are relative to the text
/// after it.
pub fn parse_source(source: &str) -> ParsedSource {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let lines = LineIndex::new(source);
    match syn::parse_file(source) {
        Ok(file) => ParsedSource {
            file,
            lines,
            error: None,
        },
        Err(err) => ParsedSource {
            file: recover_items(source),
            lines,
            error: Some(err.to_string()),
        },
    }
}

/// Keep every item that parses. Source that does not even lex yields an
/// empty file.
fn recover_items(source: &str) -> syn::File {
    let items = salvage_items.parse_str(source).unwrap_or_else(|err| {
        debug!(error = %err, "Source does not lex, nothing to recover");
        Vec::new()
    });
    syn::File {
        shebang: None,
        attrs: Vec::new(),
        items,
    }
}

/// Salvage items from a token sequence.
///
/// A position that is not a whole item is tried, in order, as a function
/// whose body is broken (kept with an empty body), then as an `impl`,
/// `trait`, `mod` or `extern` block whose contents are salvaged in turn and
/// flattened into the result. Anything else skips one token tree.
fn salvage_items(input: ParseStream<'_>) -> syn::Result<Vec<Item>> {
    let mut items = Vec::new();
    while !input.is_empty() {
        let whole = input.fork();
        match whole.parse::<Item>() {
            // bodiless fns, among others, only parse as verbatim tokens
            Ok(Item::Verbatim(tokens)) => {
                let fork = input.fork();
                if let Ok(item) = salvage_fn(&fork) {
                    input.advance_to(&fork);
                    items.push(item);
                } else {
                    input.advance_to(&whole);
                    items.push(Item::Verbatim(tokens));
                }
                continue;
            }
            Ok(item) => {
                input.advance_to(&whole);
                items.push(item);
                continue;
            }
            Err(_) => {}
        }

        let fork = input.fork();
        if let Ok(item) = salvage_fn(&fork) {
            input.advance_to(&fork);
            items.push(item);
            continue;
        }

        let fork = input.fork();
        if let Ok(inner) = salvage_block(&fork) {
            input.advance_to(&fork);
            items.extend(inner);
            continue;
        }

        input.parse::<TokenTree>()?;
    }
    Ok(items)
}

/// A readable signature followed by any brace group, or by `;`.
fn salvage_fn(input: ParseStream<'_>) -> syn::Result<Item> {
    let attrs = input.call(Attribute::parse_outer)?;
    let vis: Visibility = input.parse()?;
    let sig: Signature = input.parse()?;
    if input.peek(Token![;]) {
        input.parse::<Token![;]>()?;
    } else {
        match input.parse::<TokenTree>()? {
            TokenTree::Group(body) if body.delimiter() == Delimiter::Brace => {}
            _ => return Err(input.error("expected function body")),
        }
    }
    Ok(Item::Fn(ItemFn {
        attrs,
        vis,
        sig,
        block: Box::new(Block {
            brace_token: Default::default(),
            stmts: Vec::new(),
        }),
    }))
}

/// The items inside an `impl`/`trait`/`mod`/`extern` block whose header
/// reads up to its brace group.
fn salvage_block(input: ParseStream<'_>) -> syn::Result<Vec<Item>> {
    let mut is_container = false;
    loop {
        if input.is_empty() || input.peek(Token![;]) {
            return Err(input.error("expected block"));
        }
        match input.parse::<TokenTree>()? {
            TokenTree::Ident(ident)
                if ident == "impl" || ident == "trait" || ident == "mod" || ident == "extern" =>
            {
                is_container = true;
            }
            TokenTree::Group(body) if body.delimiter() == Delimiter::Brace => {
                if !is_container {
                    return Err(input.error("not an item block"));
                }
                return salvage_items.parse2(body.stream());
            }
            _ => {}
        }
    }
}

/// Result of analyzing one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// Diagnostics in ascending source order.
    pub diagnostics: Vec<Diagnostic>,
    pub parse_error: Option<String>,
    /// Analyzers that were not run because the tree was damaged.
    pub skipped: Vec<&'static str>,
}

impl FileReport {
    pub fn is_damaged(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Runs a fixed set of analyzers over source files.
pub struct Driver {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl Driver {
    /// Build the analyzers of every plugin. Plugins that need more than
    /// syntax are rejected.
    pub fn new(plugins: &[Box<dyn LinterPlugin>]) -> Result<Self> {
        let mut analyzers = Vec::new();
        for plugin in plugins {
            let built = plugin.build_analyzers()?;
            if plugin.load_mode() != LoadMode::SyntaxOnly {
                let name = built
                    .first()
                    .map(|a| a.descriptor().name)
                    .unwrap_or("<empty>");
                return Err(PluginError::UnsupportedLoadMode {
                    name: name.to_string(),
                    mode: plugin.load_mode(),
                });
            }
            analyzers.extend(built);
        }
        Ok(Self::from_analyzers(analyzers))
    }

    pub fn from_analyzers(analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        Driver { analyzers }
    }

    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.descriptor().name).collect()
    }

    pub fn analyze_source(&self, path: &Path, source: &str) -> FileReport {
        let parsed = parse_source(source);
        if let Some(err) = &parsed.error {
            warn!(path = %path.display(), error = %err, "Parse failed, analyzing recovered items");
        }

        let mut diagnostics = Vec::new();
        let mut skipped = Vec::new();
        for analyzer in &self.analyzers {
            let name = analyzer.descriptor().name;
            if parsed.is_damaged() && !analyzer.run_despite_errors() {
                skipped.push(name);
                continue;
            }
            let mut pass = Pass::new(path, &parsed.file, &parsed.lines, name, parsed.is_damaged());
            analyzer.run(&mut pass);
            diagnostics.extend(pass.into_diagnostics());
        }
        diagnostics.sort_by_key(Diagnostic::sort_key);

        debug!(
            path = %path.display(),
            diagnostics = diagnostics.len(),
            "Analyzed file"
        );
        FileReport {
            path: path.to_path_buf(),
            diagnostics,
            parse_error: parsed.error,
            skipped,
        }
    }

    /// Analyze every `.rs` file under `root` (or `root` itself), in path order.
    ///
    /// Span locations recorded on this thread are released after each file,
    /// so the caller must not hold `syn` trees of its own across this call.
    pub fn analyze_paths(&self, root: &Path) -> Result<Vec<FileReport>> {
        let mut paths = Vec::new();
        collect_rust_files(root, &mut paths)?;
        paths.sort();

        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path)?;
            let source = String::from_utf8_lossy(&bytes);
            reports.push(self.analyze_source(&path, &source));
            // the file's spans are all dropped; release their source map entry
            proc_macro2::extra::invalidate_current_thread_spans();
        }
        Ok(reports)
    }
}

/// Recursively collect `.rs` files, skipping `target` and hidden directories.
fn collect_rust_files(path: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if path.is_file() {
        if path.extension().and_then(|e| e.to_str()) == Some("rs") {
            out.push(path.to_path_buf());
        }
        return Ok(());
    }
    if !path.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let child = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if child.is_dir() && (name == "target" || name.starts_with('.')) {
            continue;
        }
        collect_rust_files(&child, out)?;
    }
    Ok(())
}
