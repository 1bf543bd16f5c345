use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::sync::Arc;

use log::{debug, error, info};

use crate::shell::context::Context;
use crate::shell::error::ShellError;
use crate::shell::executor::{Executor, Streams};
use crate::shell::parser::ast::Node;
use crate::shell::parser::{Parsed, Parser};
use crate::shell::readline::{LineReader, LineSource, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::path::{program_name, resolve};
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    config: &'a Config,
    theme: Arc<Theme>,
    ctx: Context,
    verbose: bool,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: Theme, ctx: Context, verbose: bool) -> Self {
        Self {
            config,
            theme: Arc::new(theme),
            ctx,
            verbose,
        }
    }

    /// Reads and runs lines from `script`, or from standard input when there
    /// is none, until input ends or `exit` runs. Returns the process status.
    pub fn run(&mut self, script: Option<&str>) -> i32 {
        info!("starting in {}", self.ctx.cwd().display());
        match script {
            Some(path) => match self.open_script(path) {
                Ok(mut reader) => self.run_loop(&mut reader),
                Err(err) => {
                    self.report(&err);
                    1
                }
            },
            None if io::stdin().is_terminal() => {
                let theme = Arc::clone(&self.theme);
                match ReadlineManager::new(self.config, &theme.prompt, &theme.continuation_prompt) {
                    Ok(mut readline) => self.run_loop(&mut readline),
                    Err(err) => {
                        self.report(&err);
                        1
                    }
                }
            }
            None => {
                let stdin = io::stdin();
                let mut reader = LineReader::with_prompt(stdin.lock(), &self.theme.prompt);
                self.run_loop(&mut reader)
            }
        }
    }

    fn open_script(&self, path: &str) -> Result<LineReader<BufReader<File>>, ShellError> {
        match File::open(resolve(self.ctx.cwd(), path)) {
            Ok(file) => Ok(LineReader::new(BufReader::new(file))),
            Err(source) => Err(ShellError::Open {
                path: path.to_string(),
                source,
            }),
        }
    }

    fn run_loop(&mut self, source: &mut dyn LineSource) -> i32 {
        let status = loop {
            let line = match source.next_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("end of input");
                    break 0;
                }
                Err(err) => {
                    self.report(&err);
                    if err.is_fatal() {
                        break 1;
                    }
                    continue;
                }
            };

            match Parser::new(&mut self.ctx).parse(&line, source) {
                Ok(Parsed::Nothing) => {}
                Ok(Parsed::Tree(node)) => self.execute(&node),
                Ok(Parsed::Exit(code)) => {
                    info!("exit {}", code);
                    break code;
                }
                Err(err) => {
                    self.report(&err);
                    if err.is_fatal() {
                        break 1;
                    }
                }
            }
        };
        source.finish();
        status
    }

    fn execute(&self, node: &Node) {
        if self.verbose {
            println!("{:?}", node);
        }
        let executor = Executor::new(self.ctx.clone(), Arc::clone(&self.theme));
        let result = Streams::inherit()
            .map_err(ShellError::from)
            .and_then(|streams| executor.run(Some(node), &streams));
        match result {
            Ok(code) => debug!("status {}", code),
            Err(err) => executor.report(&err),
        }
    }

    fn report(&self, err: &ShellError) {
        error!("{}", err);
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", self.theme.format_error(program_name(), err));
    }
}
