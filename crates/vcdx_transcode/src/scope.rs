//! Hierarchical scope/variable model built from a VCD header.
//!
//! A [`Scope`] owns its variables and its child scopes; the [`ScopeTree`]
//! owns the top-level scopes and an index from data-stream symbol to the
//! declaration it refers to. The tree is built once, before any value change
//! is processed, and is read-only afterwards.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::var_type::keyword_for;

/// A single `$var` declaration, keyed by declared name in its scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VarDecl {
    /// The identifier code used in the data section (e.g. `!`, `#`, `!A`).
    pub symbol: String,
    /// Numeric variable type code (see [`VarType`](crate::VarType)).
    pub type_code: u32,
    /// Declared bit width: 1 for scalars, more for vectors.
    pub width: u32,
}

impl VarDecl {
    /// Creates a declaration.
    pub fn new(symbol: impl Into<String>, type_code: u32, width: u32) -> Self {
        Self {
            symbol: symbol.into(),
            type_code,
            width,
        }
    }
}

/// One node of the declaration hierarchy (a module, task, function, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    kind: String,
    name: String,
    // Ordered by declared name; the serializer relies on this order.
    vars: BTreeMap<String, VarDecl>,
    children: Vec<Scope>,
}

impl Scope {
    /// Creates an empty scope, e.g. `Scope::new("module", "top")`.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            vars: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// The scope category keyword (`module`, `begin`, `task`, ...).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The scope's own name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a variable, returning the declaration it replaced, if any.
    pub fn add_var(&mut self, name: impl Into<String>, decl: VarDecl) -> Option<VarDecl> {
        self.vars.insert(name.into(), decl)
    }

    /// Appends a child scope.
    pub fn add_child(&mut self, child: Scope) {
        self.children.push(child);
    }

    /// Variables in ascending declared-name order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &VarDecl)> {
        self.vars.iter().map(|(name, decl)| (name.as_str(), decl))
    }

    /// Number of variables declared directly in this scope.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Looks up the declaration of a variable in this scope.
    pub fn var(&self, name: &str) -> Option<&VarDecl> {
        self.vars.get(name)
    }

    /// Symbol of a variable declared in this scope.
    pub fn symbol(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|d| d.symbol.as_str())
    }

    /// Type code of a variable declared in this scope.
    pub fn signal_type(&self, name: &str) -> Option<u32> {
        self.vars.get(name).map(|d| d.type_code)
    }

    /// Bit width of a variable declared in this scope.
    pub fn signal_width(&self, name: &str) -> Option<u32> {
        self.vars.get(name).map(|d| d.width)
    }

    /// Child scopes in declaration order.
    pub fn children(&self) -> &[Scope] {
        &self.children
    }

    /// Finds a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Scope> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Number of variables in this scope and all descendants.
    pub fn signal_count(&self) -> usize {
        self.vars.len() + self.children.iter().map(Scope::signal_count).sum::<usize>()
    }
}

/// Where a data-stream symbol was declared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolInfo {
    /// Dotted hierarchical name of the declaring variable (`top.cpu.clk`).
    pub path: String,
    /// Numeric variable type code.
    pub type_code: u32,
    /// Declared bit width.
    pub width: u32,
}

impl SymbolInfo {
    /// The `$var` keyword of the declaration, empty if the code is unknown.
    pub fn keyword(&self) -> &'static str {
        keyword_for(self.type_code)
    }
}

/// The complete declaration hierarchy of one VCD document.
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
    roots: Vec<Scope>,
    symbols: HashMap<String, SymbolInfo>,
    aliased: usize,
}

impl ScopeTree {
    /// Builds the tree from its top-level scopes and indexes every symbol.
    ///
    /// When several declarations share a symbol, the first one in pre-order
    /// is kept for lookups and the rest are counted as aliases. Variables of
    /// one scope are visited in name order, the order the header is written
    /// back in, so a re-read dump resolves aliases the same way.
    pub fn build(roots: Vec<Scope>) -> Self {
        let mut symbols = HashMap::new();
        let mut aliased = 0;
        for root in &roots {
            index_scope(root, "", &mut symbols, &mut aliased);
        }
        if aliased > 0 {
            debug!(aliased, "scope tree contains aliased symbols");
        }
        Self {
            roots,
            symbols,
            aliased,
        }
    }

    /// Top-level scopes in declaration order.
    pub fn roots(&self) -> &[Scope] {
        &self.roots
    }

    /// Returns `true` if no scopes were declared.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Resolves a data-stream symbol to its declaration.
    pub fn lookup(&self, symbol: &str) -> Option<&SymbolInfo> {
        self.symbols.get(symbol)
    }

    /// Number of distinct symbols declared.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of declarations that reuse an already-declared symbol.
    pub fn aliased_symbols(&self) -> usize {
        self.aliased
    }

    /// Total number of variable declarations, aliases included.
    pub fn signal_count(&self) -> usize {
        self.roots.iter().map(Scope::signal_count).sum()
    }

    /// Finds a scope by dotted path, e.g. `top.cpu`.
    pub fn find(&self, path: &str) -> Option<&Scope> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut scope = self.roots.iter().find(|s| s.name() == first)?;
        for part in parts {
            scope = scope.child(part)?;
        }
        Some(scope)
    }

    /// Visits every scope in pre-order with its dotted path.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&str, &'a Scope)) {
        fn go<'a>(scope: &'a Scope, prefix: &str, visit: &mut impl FnMut(&str, &'a Scope)) {
            let path = join_path(prefix, scope.name());
            visit(&path, scope);
            for child in scope.children() {
                go(child, &path, visit);
            }
        }
        for root in &self.roots {
            go(root, "", &mut visit);
        }
    }
}

fn index_scope(
    scope: &Scope,
    prefix: &str,
    symbols: &mut HashMap<String, SymbolInfo>,
    aliased: &mut usize,
) {
    let path = join_path(prefix, scope.name());
    for (name, decl) in scope.vars() {
        if symbols.contains_key(&decl.symbol) {
            *aliased += 1;
            continue;
        }
        symbols.insert(
            decl.symbol.clone(),
            SymbolInfo {
                path: join_path(&path, name),
                type_code: decl.type_code,
                width: decl.width,
            },
        );
    }
    for child in scope.children() {
        index_scope(child, &path, symbols, aliased);
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
