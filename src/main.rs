use std::process;

use argh::FromArgs;
use log::{debug, error};

use crate::shell::{Context, Shell, ShellError};
use crate::utils::config::Config;
use crate::utils::log::init_logger;
use crate::utils::path::program_name;
use crate::utils::theme::Theme;

mod shell;
mod utils;

/// A small command interpreter: pipes, lists, conditionals, background jobs
/// and redirections over external programs.
#[derive(FromArgs)]
struct Args {
    /// print each parsed command tree before running it
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// script to run instead of reading standard input
    #[argh(positional)]
    script: Vec<String>,
}

impl Args {
    // at most one script; none means standard input
    fn script_path(&self) -> Result<Option<&str>, ShellError> {
        match self.script.as_slice() {
            [] => Ok(None),
            [path] => Ok(Some(path.as_str())),
            _ => Err(ShellError::Usage("rsh [-v] [script]")),
        }
    }
}

fn main() {
    let args: Args = argh::from_env();
    let script = match args.script_path() {
        Ok(script) => script,
        Err(err) => {
            eprintln!("{}: {}", program_name(), err);
            process::exit(1);
        }
    };

    let config = Config::new();
    init_logger(&config);
    debug!("config loaded from {}", config.config_dir.display());
    let theme = Theme::load_theme(&config.theme);

    let ctx = match Context::from_process(config.search_path.clone()) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!("can't read working directory: {}", err);
            eprintln!("{}", theme.format_error(program_name(), err));
            process::exit(1);
        }
    };

    let mut shell = Shell::new(&config, theme, ctx, args.verbose);
    let status = shell.run(script);
    process::exit(status);
}
