pub mod ast;
mod globber;
mod lexer;
mod parser;

pub use parser::{Parsed, Parser};
