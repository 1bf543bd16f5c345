use std::io::{self, BufRead, Write};

use crate::shell::error::ShellError;
use crate::utils::config::Config;
use log::{debug, error, warn};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

/// Where input lines come from.
pub trait LineSource {
    /// The next line without its line terminator, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<String>, ShellError>;

    /// The next physical line of a line that ended in a backslash.
    fn next_continuation(&mut self) -> Result<Option<String>, ShellError> {
        self.next_line()
    }

    /// Called once when the read loop is done.
    fn finish(&mut self) {}
}

/// Interactive terminal input with line editing and persistent history.
pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: Editor<(), FileHistory>,
    prompt: String,
    continuation_prompt: String,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(
        config: &'a Config,
        prompt: &str,
        continuation_prompt: &str,
    ) -> Result<Self, ShellError> {
        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config).map_err(|err| {
            error!("can't initialise readline: {}", err);
            ShellError::Input(err.to_string())
        })?;
        let mut manager = Self {
            config,
            editor,
            prompt: prompt.to_string(),
            continuation_prompt: continuation_prompt.to_string(),
        };
        manager.load_history();
        Ok(manager)
    }

    fn load_history(&mut self) {
        if let Err(err) = self.editor.load_history(&self.config.history_file) {
            warn!(
                "can't load history {}: {}",
                self.config.history_file.display(),
                err
            );
        } else {
            debug!("history loaded");
        }
    }

    fn save_history(&mut self) {
        if let Err(err) = self.editor.save_history(&self.config.history_file) {
            error!("can't save history: {}", err);
        } else {
            debug!("history saved");
        }
    }

    fn read(&mut self, continuation: bool) -> Result<Option<String>, ShellError> {
        let prompt = if continuation {
            &self.continuation_prompt
        } else {
            &self.prompt
        };
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                        warn!("can't add history entry: {}", err);
                    }
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                debug!("interrupted, line discarded");
                Ok(Some(String::new()))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ShellError::Input(err.to_string())),
        }
    }
}

impl LineSource for ReadlineManager<'_> {
    fn next_line(&mut self) -> Result<Option<String>, ShellError> {
        self.read(false)
    }

    fn next_continuation(&mut self) -> Result<Option<String>, ShellError> {
        self.read(true)
    }

    fn finish(&mut self) {
        self.save_history();
    }
}

/// Plain line input: a script file, or standard input that is not a terminal.
pub struct LineReader<R> {
    reader: R,
    prompt: Option<String>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            prompt: None,
        }
    }

    /// Prints `prompt` on stdout before each line.
    pub fn with_prompt(reader: R, prompt: &str) -> Self {
        Self {
            reader,
            prompt: Some(prompt.to_string()),
        }
    }

    fn read(&mut self) -> Result<Option<String>, ShellError> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .map_err(|e| ShellError::Input(e.to_string()))?;
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl<R: BufRead> LineSource for LineReader<R> {
    fn next_line(&mut self) -> Result<Option<String>, ShellError> {
        if let Some(prompt) = &self.prompt {
            let mut stdout = io::stdout();
            stdout.write_all(prompt.as_bytes())?;
            stdout.flush()?;
        }
        self.read()
    }

    fn next_continuation(&mut self) -> Result<Option<String>, ShellError> {
        self.read()
    }
}
