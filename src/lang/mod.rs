/*!
# Rust Language Module

This Rust module holds the language side of the runtime: the program tree
handed over by a front-end, the dialect switches, identifiers and errors.

*/

#[macro_use]
mod error;
mod dialect;
mod ident;

pub use dialect::Dialect;
pub use error::Error;
pub use error::ErrorCode;
pub use ident::Ident;

pub mod ast;

use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Line label. Numeric labels are kept in their canonical text form
/// so `GOTO 100` and a line labelled `100` meet in the same map.
pub type Label = Rc<str>;

/// Where a statement came from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default)]
    pub line: usize,
    #[serde(default, deserialize_with = "ast::label")]
    pub label: Option<Label>,
    #[serde(default)]
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(line: usize, label: Option<Label>, offset: usize) -> SourceLocation {
        SourceLocation {
            line,
            label,
            offset,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "LINE {}", self.line),
        }
    }
}
