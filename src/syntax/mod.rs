pub mod parser;
pub mod span;
