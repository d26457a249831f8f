//! Lexical scopes and scoped identifiers.
//!
//! The checker keys its variable tables by [`ScopedIdentifier`] — a name
//! qualified by the scope that declared it — so shadowed identifiers in
//! nested blocks and function bodies resolve independently.

use std::collections::HashMap;

/// Identity of one lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

/// A name paired with the scope that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedIdentifier {
    pub scope: ScopeId,
    pub name: String,
}

/// The stack of currently open scopes.
#[derive(Debug)]
pub struct ScopeStack {
    active: Vec<ScopeId>,
    next_id: u64,
}

impl ScopeStack {
    /// A stack with the root scope already entered.
    pub fn new() -> Self {
        let mut stack = Self {
            active: Vec::new(),
            next_id: 0,
        };
        stack.enter();
        stack
    }

    /// Open a nested scope and make it current.
    pub fn enter(&mut self) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        self.active.push(id);
        id
    }

    /// Close the current scope.
    pub fn exit(&mut self) {
        self.active.pop();
    }

    pub fn current(&self) -> ScopeId {
        *self.active.last().expect("the root scope is never exited")
    }

    /// The key for `name` declared in the current scope.
    pub fn key(&self, name: &str) -> ScopedIdentifier {
        ScopedIdentifier {
            scope: self.current(),
            name: name.to_string(),
        }
    }

    /// Look up `name` from the innermost open scope outward.
    pub fn resolve<'t, V>(
        &self,
        table: &'t HashMap<ScopedIdentifier, V>,
        name: &str,
    ) -> Option<(ScopedIdentifier, &'t V)> {
        for scope in self.active.iter().rev() {
            let key = ScopedIdentifier {
                scope: *scope,
                name: name.to_string(),
            };
            if let Some(value) = table.get(&key) {
                return Some((key, value));
            }
        }
        None
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
