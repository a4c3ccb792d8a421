/*!
## Rust Machine Module

This Rust module is a compiler and virtual machine for BASIC.

*/

use std::rc::Rc;

pub type Address = usize;

/// Compiled form of one statement.
pub type Code = Rc<[Opcode]>;

mod compile;
mod flow;
mod function;
mod opcode;
mod operation;
mod program;
mod rng;
mod runtime;
mod snapshot;
mod stack;
mod val;
mod var;

pub use compile::compile;
pub use flow::ForLoop;
pub use function::Builtin;
pub use function::Builtins;
pub use function::Function;
pub use opcode::Opcode;
pub use operation::Operation;
pub use program::Program;
pub use rng::Rng;
pub use runtime::Event;
pub use runtime::Host;
pub use runtime::Runtime;
pub use snapshot::Snapshot;
pub use stack::Stack;
pub use val::Val;
pub use var::UserFunction;
pub use var::Var;

#[cfg(test)]
mod tests;
