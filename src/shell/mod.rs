mod context;
mod error;
mod executor;
mod parser;
mod readline;
mod shell;

pub use context::Context;
pub use error::ShellError;
pub use shell::Shell;
