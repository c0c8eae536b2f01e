//! Translator from the stack VM language to Hack assembly.
//!
//! `syntax` turns source text into [`ast::Module`]s, `codegen` lowers them
//! to [`asm::Asm`] lines, and `api` ties the two together with input
//! discovery and output writing. `runtime` executes the result for tests
//! and the `run` command.

pub mod api;
pub mod asm;
pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod runtime;
pub mod syntax;

// Re-exports: `hackvm::span`, `hackvm::project`, `hackvm::parser`
pub use config::project;
pub use syntax::parser;
pub use syntax::span;

pub use api::*;
