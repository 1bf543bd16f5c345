use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, trace};

use super::executor::Streams;
use crate::shell::context::Context;
use crate::shell::error::ShellError;
use crate::utils::path::{is_executable, resolve};

/// Finds the executable `name` would run. Names with a slash are taken as
/// paths; bare names are looked up in the search path, where `.` stands for
/// the current working directory.
pub fn which(ctx: &Context, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        let path = resolve(ctx.cwd(), name);
        return is_executable(&path).then_some(path);
    }
    for dir in ctx.search_path() {
        let candidate = if dir == "." {
            ctx.cwd().join(name)
        } else {
            resolve(ctx.cwd(), dir).join(name)
        };
        trace!("which {}: trying {}", name, candidate.display());
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Builds the process for `args` wired to `streams`, ready to spawn.
pub fn mkcmd(ctx: &Context, name: &str, args: &[String], streams: Streams) -> Result<Command, ShellError> {
    let Some(program) = which(ctx, name) else {
        return Err(ShellError::NotFound(name.to_string()));
    };
    debug!("{} resolved to {}", name, program.display());

    let mut cmd = Command::new(program);
    cmd.arg0(name)
        .args(args)
        .current_dir(ctx.cwd())
        .stdin(Stdio::from(streams.stdin))
        .stdout(Stdio::from(streams.stdout))
        .stderr(Stdio::from(streams.stderr));
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rsh_which_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let _ = fs::create_dir_all(&dir);
        dir
    }

    #[test]
    fn test_which_search_path_order() {
        let ctx = Context::new("/", vec!["/nonexistent".to_string(), "/bin".to_string()]);
        assert_eq!(which(&ctx, "sh"), Some(PathBuf::from("/bin/sh")));
        assert_eq!(which(&ctx, "no-such-command-rsh"), None);
        assert_eq!(which(&ctx, ""), None);
    }

    #[test]
    fn test_which_paths_with_slash() {
        let ctx = Context::new("/bin", Vec::new());
        assert_eq!(which(&ctx, "/bin/sh"), Some(PathBuf::from("/bin/sh")));
        assert_eq!(which(&ctx, "./sh"), Some(PathBuf::from("/bin/./sh")));
        assert_eq!(which(&ctx, "/bin/no-such-command-rsh"), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_which_dot_is_current_dir() {
        let dir = scratch("dot");
        let script = dir.join("hello");
        File::create(&script).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        File::create(dir.join("plain")).unwrap();

        let mut ctx = Context::new("/", vec![".".to_string()]);
        assert_eq!(which(&ctx, "hello"), None);
        ctx.change_dir(dir.to_str().unwrap()).unwrap();
        assert_eq!(which(&ctx, "hello"), Some(ctx.cwd().join("hello")));
        // no execute bit
        assert_eq!(which(&ctx, "plain"), None);

        let _ = fs::remove_dir_all(dir);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_mkcmd_not_found() {
        let ctx = Context::new("/", vec!["/bin".to_string()]);
        let streams = Streams::inherit().unwrap();
        let err = mkcmd(&ctx, "no-such-command-rsh", &[], streams).unwrap_err();
        assert_eq!(err.to_string(), "no-such-command-rsh: command not found");
        assert!(Path::new("/bin/sh").exists());
    }
}
