//! Lexical binding environment for macro parameters
//!
//! A singly-linked chain of `(name, sexp, defining_env)` bindings, used for
//! macro-parameter substitution with lexical (closure) semantics. Bindings
//! are immutable once created; new bindings prepend. `defining_env` records
//! the environment visible at macro-*definition* time, not call time, so
//! resolving a parameter switches the environment to `defining_env` — this
//! is what gives parameters call-by-name semantics with lexical capture.
//!
//! Because `defining_env` of one binding can point into a wholly different
//! chain than the one it was prepended onto, the overall structure is a DAG
//! rather than a tree; bindings are reference-counted so no chain needs to
//! outlive the others that share its tail.

use std::rc::Rc;

use crate::sexp::Sexp;

struct BindingNode {
    name: String,
    sexp: Sexp,
    defining_env: Environment,
    next: Environment,
}

/// The head of a (possibly empty) chain of bindings.
#[derive(Clone, Default)]
pub struct Environment(Option<Rc<BindingNode>>);

/// A single resolved binding: the bound s-expression and the environment in
/// which it should be translated.
pub struct Binding<'a> {
    /// The s-expression substituted for the parameter.
    pub sexp: &'a Sexp,
    /// The environment visible when the binding was created.
    pub defining_env: Environment,
}

impl Environment {
    /// The empty environment.
    #[must_use]
    pub fn empty() -> Self {
        Self(None)
    }

    /// Prepend a new binding, returning the extended environment. `env` is
    /// unchanged (environments are immutable); the caller receives a new
    /// head.
    #[must_use]
    pub fn bind(&self, name: impl Into<String>, sexp: Sexp, defining_env: Environment) -> Self {
        Self(Some(Rc::new(BindingNode {
            name: name.into(),
            sexp,
            defining_env,
            next: self.clone(),
        })))
    }

    /// Linear search from the head for the first binding named `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        let mut cur = &self.0;
        while let Some(node) = cur {
            if node.name == name {
                return Some(Binding {
                    sexp: &node.sexp,
                    defining_env: node.defining_env.clone(),
                });
            }
            cur = &node.next.0;
        }
        None
    }
}
