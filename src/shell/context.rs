use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use super::error::ShellError;
use crate::utils::path::resolve;

/// Interpreter state that outlives a single line: the working directory and
/// the directories searched for commands. Only the `cd` and `path` builtins
/// change it, always between two tree evaluations.
#[derive(Debug, Clone)]
pub struct Context {
    cwd: PathBuf,
    search_path: Vec<String>,
}

impl Context {
    pub fn new(cwd: impl Into<PathBuf>, search_path: Vec<String>) -> Self {
        Self {
            cwd: cwd.into(),
            search_path,
        }
    }

    pub fn from_process(search_path: Vec<String>) -> io::Result<Self> {
        Ok(Self::new(env::current_dir()?, search_path))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn search_path(&self) -> &[String] {
        &self.search_path
    }

    pub fn set_search_path(&mut self, search_path: Vec<String>) {
        debug!("search path now {:?}", search_path);
        self.search_path = search_path;
    }

    // cwd is untouched on failure
    pub fn change_dir(&mut self, dir: &str) -> Result<(), ShellError> {
        let expanded = shellexpand::tilde(dir);
        let target = resolve(&self.cwd, expanded.as_ref());
        match fs::canonicalize(&target) {
            Ok(path) if path.is_dir() => {
                debug!("cd {}", path.display());
                self.cwd = path;
                Ok(())
            }
            _ => Err(ShellError::Chdir(dir.to_string())),
        }
    }
}
