//! # BASIC
//!
//! Runs a parsed BASIC program in the terminal.
//!

mod term;

fn main() {
    term::main();
}
