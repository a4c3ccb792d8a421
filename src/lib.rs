//! # BASIC dialects
//!
//! A BASIC runtime that follows the rules of more than one historical
//! dialect. Programs arrive already parsed, as the JSON form of
//! [`lang::ast::Program`]. Each statement compiles to a short list of
//! [`mach::Opcode`] on first use and the [`mach::Runtime`] steps through
//! them one statement at a time.
//!
//! ```
//! use basic::lang::ast::Program;
//! use basic::mach::{Event, Runtime};
//!
//! let json = r#"{
//!     "opts": { "dialectName": "ALTAIR" },
//!     "lines": [
//!         { "label": 10, "stmts": [
//!             { "command": "PRINT", "args": [ { "value": "HELLO" } ] }
//!         ] }
//!     ]
//! }"#;
//! let program: Program = serde_json::from_str(json).unwrap();
//! let mut runtime = Runtime::default();
//! runtime.load(program).unwrap();
//! runtime.reset().unwrap();
//! let mut out = String::new();
//! while runtime.step(&mut out) == Event::Running {}
//! assert_eq!(out, "HELLO");
//! assert!(runtime.dialect().default_values);
//! ```
//!
//! Dialect switches live in [`lang::Dialect`]. Presets exist for
//! ECMA-55 Minimal BASIC, Altair (Microsoft) BASIC, HP Time-Shared BASIC
//! and a relaxed modern default.

pub mod lang;
pub mod mach;
