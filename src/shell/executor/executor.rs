use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::thread;

use log::{debug, error, warn};
use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use super::launcher::mkcmd;
use crate::shell::context::Context;
use crate::shell::error::ShellError;
use crate::shell::parser::ast::{FileSpec, Node, OpenMode};
use crate::utils::path::{program_name, resolve};
use crate::utils::theme::Theme;

/// Zero is success.
pub type ExitCode = i32;

/// Standard input, output and error for a subtree. Every descriptor is
/// close-on-exec; a child only sees the copies placed on 0, 1 and 2.
#[derive(Debug)]
pub struct Streams {
    pub stdin: OwnedFd,
    pub stdout: OwnedFd,
    pub stderr: OwnedFd,
}

impl Streams {
    /// The interpreter's own standard streams.
    pub fn inherit() -> io::Result<Self> {
        Ok(Self {
            stdin: io::stdin().as_fd().try_clone_to_owned()?,
            stdout: io::stdout().as_fd().try_clone_to_owned()?,
            stderr: io::stderr().as_fd().try_clone_to_owned()?,
        })
    }

    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            stdin: self.stdin.try_clone()?,
            stdout: self.stdout.try_clone()?,
            stderr: self.stderr.try_clone()?,
        })
    }

    pub fn with_stdin(mut self, stdin: impl Into<OwnedFd>) -> Self {
        self.stdin = stdin.into();
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<OwnedFd>) -> Self {
        self.stdout = stdout.into();
        self
    }
}

/// Walks a command tree and turns it into running processes.
#[derive(Clone)]
pub struct Executor {
    ctx: Context,
    theme: Arc<Theme>,
}

impl Executor {
    pub fn new(ctx: Context, theme: Arc<Theme>) -> Self {
        Self { ctx, theme }
    }

    /// Runs `node` and returns its exit code. An absent node is the empty
    /// command and succeeds. `Err` means something could not be run at all.
    pub fn run(&self, node: Option<&Node>, streams: &Streams) -> Result<ExitCode, ShellError> {
        let Some(node) = node else {
            return Ok(0);
        };
        match node {
            Node::Exec { args } => self.exec(args, streams),
            Node::Redir {
                inner,
                input,
                output,
            } => {
                let mut streams = streams.try_clone()?;
                if let Some(spec) = input {
                    streams = streams.with_stdin(self.open(spec)?);
                }
                if let Some(spec) = output {
                    streams = streams.with_stdout(self.open(spec)?);
                }
                self.run(inner.as_deref(), &streams)
            }
            Node::List { left, right } => {
                if let Err(err) = self.run(left.as_deref(), streams) {
                    self.report(&err);
                }
                self.run(right.as_deref(), streams)
            }
            Node::Pipe { left, right } => self.pipe(left.as_deref(), right.as_deref(), streams),
            Node::Conditional {
                left,
                right,
                success,
            } => {
                let succeeded = match self.run(left.as_deref(), streams) {
                    Ok(code) => code == 0,
                    Err(err) if *success => return Err(err),
                    Err(err) => {
                        self.report(&err);
                        false
                    }
                };
                if succeeded == *success {
                    self.run(right.as_deref(), streams)
                } else {
                    debug!("skipping right of {}", if *success { "&&" } else { "||" });
                    Ok(0)
                }
            }
            Node::Async { inner } => {
                let executor = self.clone();
                let inner = inner.clone();
                let streams = streams.try_clone()?;
                thread::Builder::new()
                    .name("rsh-async".to_string())
                    .spawn(move || {
                        match executor.run(inner.as_deref(), &streams) {
                            Ok(code) => debug!("background job exited with {}", code),
                            Err(err) => executor.report(&err),
                        }
                    })?;
                Ok(0)
            }
        }
    }

    /// Prints `err` on the interpreter's error stream with the program name.
    pub fn report(&self, err: &ShellError) {
        error!("{}", err);
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", self.theme.format_error(program_name(), err));
    }

    fn exec(&self, args: &[String], streams: &Streams) -> Result<ExitCode, ShellError> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(0);
        };
        let mut cmd = mkcmd(&self.ctx, name, rest, streams.try_clone()?).inspect_err(|err| {
            warn!("{}", err);
        })?;
        debug!("spawning {:?}", cmd);
        let child = cmd.spawn();
        // the parent's copies of the child's descriptors go away with the command
        drop(cmd);
        let mut child = child.map_err(|source| ShellError::Spawn {
            name: name.clone(),
            source,
        })?;
        let status = child.wait()?;
        debug!("{} exited with {}", name, status);
        Ok(exit_code(status))
    }

    fn pipe(
        &self,
        left: Option<&Node>,
        right: Option<&Node>,
        streams: &Streams,
    ) -> Result<ExitCode, ShellError> {
        let (reader, writer) = pipe2(OFlag::O_CLOEXEC)?;
        let left_streams = streams.try_clone()?.with_stdout(writer);
        let right_streams = streams.try_clone()?.with_stdin(reader);

        thread::scope(|scope| {
            let handle = scope.spawn(move || {
                let left_streams = left_streams;
                self.run(left, &left_streams)
            });
            let result = self.run(right, &right_streams);
            drop(right_streams);
            match handle.join() {
                Ok(Ok(code)) => debug!("left of pipe exited with {}", code),
                Ok(Err(err)) => self.report(&err),
                Err(_) => error!("left of pipe panicked"),
            }
            result
        })
    }

    fn open(&self, spec: &FileSpec) -> Result<File, ShellError> {
        let path = resolve(self.ctx.cwd(), &spec.path);
        let mut options = OpenOptions::new();
        match spec.mode {
            OpenMode::Read => options.read(true),
            OpenMode::Truncate => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        options.open(&path).map_err(|source| {
            let path = spec.path.clone();
            match spec.mode {
                OpenMode::Read => ShellError::Open { path, source },
                OpenMode::Truncate | OpenMode::Append => ShellError::Create { path, source },
            }
        })
    }
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 1,
    }
}
