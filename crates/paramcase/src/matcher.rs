//! The naming check itself.

use lint_plugin_api::{Analyzer, AnalyzerDescriptor, Diagnostic, LineIndex, Pass};
use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::visit::{self, Visit};
use syn::{ExprClosure, FnArg, Ident, Pat, Signature, TypeBareFn};

/// The parameter-naming analyzer. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamCase;

impl ParamCase {
    pub const DESCRIPTOR: AnalyzerDescriptor = AnalyzerDescriptor {
        name: "paramcase",
        doc: "checks that parameter names start with a lowercase letter",
    };
}

impl Analyzer for ParamCase {
    fn descriptor(&self) -> AnalyzerDescriptor {
        Self::DESCRIPTOR
    }

    fn run_despite_errors(&self) -> bool {
        true
    }

    fn run(&self, pass: &mut Pass<'_>) {
        let diagnostics = check_file(pass.file(), pass.lines());
        pass.extend(diagnostics);
    }
}

/// True when the first character of `name` is a lowercase letter.
///
/// Judged on the decoded character's Unicode `Lowercase` property, so `été`
/// and `ªx` pass and `İdent` does not.
/// Names starting with anything other than a lowercase letter (including
/// `_` and digits) fail.
pub fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

/// Check every parameter list in `file`. Diagnostics come back in
/// ascending source order.
pub fn check_file(file: &syn::File, lines: &LineIndex) -> Vec<Diagnostic> {
    let mut visitor = SignatureVisitor::default();
    visitor.visit_file(file);

    let mut diagnostics: Vec<Diagnostic> = visitor
        .violations
        .into_iter()
        .map(|(span, message)| Diagnostic::at_span(ParamCase::DESCRIPTOR.name, span, lines, message))
        .collect();
    diagnostics.sort_by_key(Diagnostic::sort_key);
    diagnostics
}

#[derive(Default)]
struct SignatureVisitor {
    violations: Vec<(Span, String)>,
}

impl SignatureVisitor {
    fn check(&mut self, ident: &Ident) {
        let name = ident.unraw().to_string();
        if name == "_" || starts_lowercase(&name) {
            return;
        }
        self.violations
            .push((ident.span(), format!("{name} should start with lowercase")));
    }

    /// Check every identifier a parameter pattern binds.
    fn bind(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(p) => {
                self.check(&p.ident);
                if let Some((_, sub)) = &p.subpat {
                    self.bind(sub);
                }
            }
            Pat::Tuple(p) => p.elems.iter().for_each(|e| self.bind(e)),
            Pat::TupleStruct(p) => p.elems.iter().for_each(|e| self.bind(e)),
            Pat::Struct(p) => p.fields.iter().for_each(|f| self.bind(&f.pat)),
            Pat::Slice(p) => p.elems.iter().for_each(|e| self.bind(e)),
            Pat::Reference(p) => self.bind(&p.pat),
            Pat::Type(p) => self.bind(&p.pat),
            Pat::Paren(p) => self.bind(&p.pat),
            // every case of an or-pattern binds the same names
            Pat::Or(p) => {
                if let Some(first) = p.cases.first() {
                    self.bind(first);
                }
            }
            _ => {}
        }
    }
}

impl<'ast> Visit<'ast> for SignatureVisitor {
    // covers free fns, impl and trait methods, and foreign fns
    fn visit_signature(&mut self, sig: &'ast Signature) {
        for input in &sig.inputs {
            if let FnArg::Typed(arg) = input {
                self.bind(&arg.pat);
            }
        }
        visit::visit_signature(self, sig);
    }

    fn visit_expr_closure(&mut self, closure: &'ast ExprClosure) {
        for input in &closure.inputs {
            self.bind(input);
        }
        visit::visit_expr_closure(self, closure);
    }

    fn visit_type_bare_fn(&mut self, ty: &'ast TypeBareFn) {
        for arg in &ty.inputs {
            if let Some((name, _)) = &arg.name {
                self.check(name);
            }
        }
        visit::visit_type_bare_fn(self, ty);
    }
}
