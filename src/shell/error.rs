use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("ambiguous redirection")]
    AmbiguousRedirection,
    #[error("duplicate redirection")]
    DuplicateRedirection,
    #[error("pipe and > together")]
    PipeAndRedirect,
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("can't cd {0}")]
    Chdir(String),

    #[error("{0}: command not found")]
    NotFound(String),

    #[error("can't open {path}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("can't create {path}")]
    Create {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("can't run {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("can't create pipe: {0}")]
    Pipe(#[from] nix::Error),

    #[error("input: {0}")]
    Input(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Errors raised while reading input end the read loop; everything else
    /// only aborts the current line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::Input(_))
    }
}
