//! Variable resolver.
//!
//! Merges the caller's variable mapping with an operation's declared
//! variables, enforcing required/optional semantics. The result is a plain
//! immutable [`Environment`] passed by value into lowering; nested frames
//! (query-call argument binding) extend it rather than mutate it in place.

use std::collections::HashMap;

use crate::ast::{Scalar, VariableDecl};
use crate::error::ResolutionError;

/// `name -> value` environment available during lowering.
///
/// Tolerant merge: undeclared entries of the caller's mapping are retained
/// and remain accessible rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Scalar>,
}

impl Environment {
    /// Builds an environment for an operation, failing if a variable marked
    /// `required` in its declarations is absent from `vars`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::MissingRequiredVariable`] if a required
    /// variable declaration has no matching entry in `vars`.
    pub fn build(
        vars: &HashMap<String, Scalar>,
        decls: &[VariableDecl],
    ) -> Result<Self, ResolutionError> {
        for decl in decls {
            if decl.required && !vars.contains_key(&decl.name) {
                return Err(ResolutionError::MissingRequiredVariable {
                    name: decl.name.clone(),
                });
            }
        }
        Ok(Self {
            values: vars.clone(),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// Extends this environment with a binding, shadowing any existing entry
    /// of the same name. Used to bind a query-call's positional arguments
    /// into the callee operation's own variable scope.
    #[must_use]
    pub fn bind(&self, name: String, value: Scalar) -> Self {
        let mut values = self.values.clone();
        values.insert(name, value);
        Self { values }
    }
}
