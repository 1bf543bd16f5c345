use log::debug;

use super::ast::{FileSpec, Node, OpenMode};
use super::lexer::{continues, fields, peek_first, peek_where, peekany, split_words};
use crate::shell::context::Context;
use crate::shell::error::ShellError;
use crate::shell::readline::LineSource;

/// What one input line turned into.
#[derive(Debug, PartialEq)]
pub enum Parsed {
    /// Blank line, comment, or a builtin that already ran.
    Nothing,
    Tree(Node),
    /// The `exit` builtin.
    Exit(i32),
}

/// Builds command trees from input lines. Builtins run here, against the
/// context, and never reach the executor.
pub struct Parser<'a> {
    ctx: &'a mut Context,
}

impl<'a> Parser<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Parser { ctx }
    }

    /// Parses `line`, pulling continuation lines from `source` while the line
    /// ends in an unescaped backslash.
    pub fn parse(&mut self, line: &str, source: &mut dyn LineSource) -> Result<Parsed, ShellError> {
        if line.trim().is_empty() {
            return Ok(Parsed::Nothing);
        }
        let mut line = line.to_string();
        while continues(&line) {
            match source.next_continuation()? {
                Some(next) => {
                    line.pop();
                    line.push_str(&next);
                }
                None => break,
            }
        }

        if let Some(parsed) = self.parse_builtin(&line)? {
            return Ok(parsed);
        }
        Ok(match self.parse_line(&line)? {
            Some(node) => {
                debug!("parsed: {}", node);
                Parsed::Tree(node)
            }
            None => Parsed::Nothing,
        })
    }

    fn parse_builtin(&mut self, line: &str) -> Result<Option<Parsed>, ShellError> {
        if line.trim_start().starts_with('#') {
            return Ok(Some(Parsed::Nothing));
        }
        match split_words(line).first() {
            Some(word) if matches!(word.text.as_str(), "cd" | "path" | "exit") => {}
            _ => return Ok(None),
        }
        let args = fields(line, self.ctx.cwd());
        let Some(name) = args.first() else {
            return Ok(None);
        };
        match name.as_str() {
            "cd" => {
                if args.len() != 2 {
                    return Err(ShellError::Usage("cd directory"));
                }
                self.ctx.change_dir(&args[1])?;
            }
            "path" => {
                if args.len() < 2 {
                    println!("path {}", self.ctx.search_path().join(" "));
                } else {
                    self.ctx.set_search_path(args[1..].to_vec());
                }
            }
            "exit" => {
                return match args.as_slice() {
                    [_] => Ok(Some(Parsed::Exit(0))),
                    [_, status] => status
                        .parse()
                        .map(|code| Some(Parsed::Exit(code)))
                        .map_err(|_| ShellError::Usage("exit [status]")),
                    _ => Err(ShellError::Usage("exit [status]")),
                };
            }
            _ => return Ok(None),
        }
        debug!("builtin {}", name);
        Ok(Some(Parsed::Nothing))
    }

    /// Parses a whole line that holds no builtin.
    pub fn parse_line(&self, line: &str) -> Result<Option<Node>, ShellError> {
        let mut ln = line;
        self.line(&mut ln)
    }

    // line := pipeline ( '&&' line | ';' line | '&' [line] )?
    fn line(&self, ln: &mut &str) -> Result<Option<Node>, ShellError> {
        let cmd = self.pipeline(ln)?;
        let rest = *ln;
        if let Some(after) = rest.strip_prefix('&') {
            if let Some(after) = after.strip_prefix('&') {
                *ln = after;
                let right = self.line(ln)?;
                return Ok(Some(Node::conditional(cmd, right, true)));
            }
            *ln = after;
            let cmd = Some(Node::background(cmd));
            if ln.trim().is_empty() {
                *ln = "";
                return Ok(cmd);
            }
            let right = self.line(ln)?;
            return Ok(Some(Node::list(cmd, right)));
        }
        if let Some(after) = rest.strip_prefix(';') {
            *ln = after;
            let right = self.line(ln)?;
            return Ok(Some(Node::list(cmd, right)));
        }
        Ok(cmd)
    }

    // pipeline := simple ( '|' pipeline | '||' line )
    fn pipeline(&self, ln: &mut &str) -> Result<Option<Node>, ShellError> {
        let cmd = self.simple(ln)?;
        let line = *ln;
        let Some(rest) = line.strip_prefix('|') else {
            return Ok(cmd);
        };
        if let Some(after) = rest.strip_prefix('|') {
            *ln = after;
            let right = self.line(ln)?;
            return Ok(Some(Node::conditional(cmd, right, false)));
        }
        if cmd.as_ref().is_some_and(Node::has_output_redirection) {
            return Err(ShellError::PipeAndRedirect);
        }
        *ln = rest;
        let right = self.pipeline(ln)?;
        Ok(Some(Node::pipe(cmd, right)))
    }

    // simple := WORDS ( redir-token WORD )*
    // Leaves `ln` at the operator that ended the command.
    fn simple(&self, ln: &mut &str) -> Result<Option<Node>, ShellError> {
        let line = *ln;
        let args = match peek_first(line, "|&;") {
            Some((i, _)) => {
                *ln = &line[i..];
                &line[..i]
            }
            None => {
                *ln = "";
                line
            }
        };
        if peekany(args, "<>").is_some() {
            return self.redirections(args);
        }
        Ok(Node::exec(fields(args, self.ctx.cwd())))
    }

    fn redirections(&self, args: &str) -> Result<Option<Node>, ShellError> {
        let mut args = args.to_string();
        let mut input: Option<FileSpec> = None;
        let mut output: Option<FileSpec> = None;

        while let Some((i, op)) = peekany(&args, "<>") {
            let mut start = i + 1;
            let mode = if op == '<' {
                OpenMode::Read
            } else if args[start..].starts_with('>') {
                start += 1;
                OpenMode::Append
            } else {
                OpenMode::Truncate
            };
            let tail = &args[start..];
            start += tail.len() - tail.trim_start().len();
            let end = match peek_where(&args[start..], |c| c.is_whitespace() || c == '<' || c == '>') {
                Some((n, _)) => start + n,
                None => args.len(),
            };

            let path = match split_words(&args[start..end]).as_slice() {
                [word] if !word.text.is_empty() => word.text.clone(),
                _ => return Err(ShellError::AmbiguousRedirection),
            };
            let slot = if op == '<' { &mut input } else { &mut output };
            if slot.is_some() {
                return Err(ShellError::DuplicateRedirection);
            }
            *slot = Some(FileSpec { path, mode });
            args.replace_range(i..end, " ");
        }

        Ok(Some(Node::Redir {
            inner: Node::exec(fields(&args, self.ctx.cwd())).map(Box::new),
            input,
            output,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::readline::LineReader;
    use std::io::Cursor;
    use std::path::Path;

    fn ctx() -> Context {
        Context::new("/", vec!["/bin".to_string(), "/usr/bin".to_string()])
    }

    fn exec(args: &[&str]) -> Option<Node> {
        Node::exec(args.iter().map(|a| a.to_string()).collect())
    }

    fn parse_with(ctx: &mut Context, line: &str, rest: &str) -> Result<Parsed, ShellError> {
        let mut source = LineReader::new(Cursor::new(rest.to_string()));
        Parser::new(ctx).parse(line, &mut source)
    }

    #[allow(clippy::unwrap_used)]
    fn tree(line: &str) -> Node {
        match parse_with(&mut ctx(), line, "").unwrap() {
            Parsed::Tree(node) => node,
            other => panic!("expected a tree for {:?}, got {:?}", line, other),
        }
    }

    fn file(path: &str, mode: OpenMode) -> Option<FileSpec> {
        Some(FileSpec {
            path: path.to_string(),
            mode,
        })
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(Some(tree("ls -l")), exec(&["ls", "-l"]));
        assert_eq!(Some(tree("  ls    -l ")), exec(&["ls", "-l"]));
    }

    #[test]
    fn test_pipeline() {
        assert_eq!(
            tree("echo a | echo b"),
            Node::pipe(exec(&["echo", "a"]), exec(&["echo", "b"]))
        );
        assert_eq!(
            tree("a | b | c"),
            Node::pipe(exec(&["a"]), Some(Node::pipe(exec(&["b"]), exec(&["c"]))))
        );
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(
            tree("false && echo x"),
            Node::conditional(exec(&["false"]), exec(&["echo", "x"]), true)
        );
        assert_eq!(
            tree("true || echo x"),
            Node::conditional(exec(&["true"]), exec(&["echo", "x"]), false)
        );
    }

    #[test]
    fn test_pipe_binds_tighter_than_and() {
        assert_eq!(
            tree("a && b | c"),
            Node::conditional(exec(&["a"]), Some(Node::pipe(exec(&["b"]), exec(&["c"]))), true)
        );
        assert_eq!(
            tree("a | b && c"),
            Node::conditional(Some(Node::pipe(exec(&["a"]), exec(&["b"]))), exec(&["c"]), true)
        );
    }

    #[test]
    fn test_list_is_right_associative() {
        assert_eq!(
            tree("a ; b ; c"),
            Node::list(exec(&["a"]), Some(Node::list(exec(&["b"]), exec(&["c"]))))
        );
        assert_eq!(
            tree("a && b ; c"),
            Node::conditional(exec(&["a"]), Some(Node::list(exec(&["b"]), exec(&["c"]))), true)
        );
    }

    #[test]
    fn test_async() {
        assert_eq!(tree("sleep 1 &"), Node::background(exec(&["sleep", "1"])));
        assert_eq!(
            tree("sleep 1 & echo hi"),
            Node::list(Some(Node::background(exec(&["sleep", "1"]))), exec(&["echo", "hi"]))
        );
    }

    #[test]
    fn test_quoted_operators_are_words() {
        assert_eq!(Some(tree("echo 'a | b; c'")), exec(&["echo", "a | b; c"]));
        assert_eq!(Some(tree("echo a\\;b")), exec(&["echo", "a;b"]));
    }

    #[test]
    fn test_redirections() {
        assert_eq!(
            tree("cmd > out.txt < in.txt"),
            Node::Redir {
                inner: exec(&["cmd"]).map(Box::new),
                input: file("in.txt", OpenMode::Read),
                output: file("out.txt", OpenMode::Truncate),
            }
        );
        assert_eq!(
            tree("sort -r <in.txt>>'my log' -u"),
            Node::Redir {
                inner: exec(&["sort", "-r", "-u"]).map(Box::new),
                input: file("in.txt", OpenMode::Read),
                output: file("my log", OpenMode::Append),
            }
        );
        assert_eq!(
            tree("> empty"),
            Node::Redir {
                inner: None,
                input: None,
                output: file("empty", OpenMode::Truncate),
            }
        );
    }

    #[test]
    fn test_redirection_errors() {
        assert!(matches!(
            parse_with(&mut ctx(), "cmd > a > b", ""),
            Err(ShellError::DuplicateRedirection)
        ));
        assert!(matches!(
            parse_with(&mut ctx(), "cmd < a < b", ""),
            Err(ShellError::DuplicateRedirection)
        ));
        assert!(matches!(
            parse_with(&mut ctx(), "cmd >", ""),
            Err(ShellError::AmbiguousRedirection)
        ));
        assert!(matches!(
            parse_with(&mut ctx(), "cmd > a | wc", ""),
            Err(ShellError::PipeAndRedirect)
        ));
    }

    #[test]
    fn test_redirected_pipeline_stages() {
        assert_eq!(
            tree("cat < in | wc > out"),
            Node::pipe(
                Some(Node::Redir {
                    inner: exec(&["cat"]).map(Box::new),
                    input: file("in", OpenMode::Read),
                    output: None,
                }),
                Some(Node::Redir {
                    inner: exec(&["wc"]).map(Box::new),
                    input: None,
                    output: file("out", OpenMode::Truncate),
                }),
            )
        );
    }

    #[test]
    fn test_whitespace_does_not_change_the_tree() {
        let a = tree("echo a|wc -l&&true;ls");
        let b = tree("  echo   a  |  wc  -l  &&  true  ;   ls  ");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_exec_only_line_round_trip() {
        let mut ctx = ctx();
        let parser = Parser::new(&mut ctx);
        let mut ln = "grep -n 'a b' c";
        let node = parser.line(&mut ln).unwrap();
        assert_eq!(node, exec(&["grep", "-n", "a b", "c"]));
        assert_eq!(ln, "");
        assert_eq!(parser.line(&mut ln).unwrap(), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_line_continuation() {
        let mut ctx = ctx();
        let parsed = parse_with(&mut ctx, "echo a \\", "b \\\nc\nnot read\n").unwrap();
        assert_eq!(parsed, Parsed::Tree(exec(&["echo", "a", "b", "c"]).unwrap()));

        let parsed = parse_with(&mut ctx, "echo a\\", "").unwrap();
        assert_eq!(parsed, Parsed::Tree(exec(&["echo", "a\\"]).unwrap()));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_blank_and_comment_lines() {
        let mut ctx = ctx();
        assert_eq!(parse_with(&mut ctx, "", "").unwrap(), Parsed::Nothing);
        assert_eq!(parse_with(&mut ctx, "   ", "").unwrap(), Parsed::Nothing);
        assert_eq!(parse_with(&mut ctx, "# ls | wc", "").unwrap(), Parsed::Nothing);
        assert_eq!(parse_with(&mut ctx, "#!/usr/bin/rsh", "").unwrap(), Parsed::Nothing);
        assert_eq!(parse_with(&mut ctx, ";", "").unwrap(), Parsed::Tree(Node::list(None, None)));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_cd_builtin() {
        let mut ctx = ctx();
        assert_eq!(parse_with(&mut ctx, "cd /bin", "").unwrap(), Parsed::Nothing);
        assert!(ctx.cwd().ends_with("bin"));

        let before = ctx.cwd().to_path_buf();
        assert!(matches!(
            parse_with(&mut ctx, "cd nonexistent-dir", ""),
            Err(ShellError::Chdir(_))
        ));
        assert_eq!(ctx.cwd(), before);
        assert!(matches!(
            parse_with(&mut ctx, "cd", ""),
            Err(ShellError::Usage("cd directory"))
        ));
        assert!(matches!(
            parse_with(&mut ctx, "cd / /", ""),
            Err(ShellError::Usage("cd directory"))
        ));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_path_builtin() {
        let mut ctx = ctx();
        assert_eq!(parse_with(&mut ctx, "path /opt/bin .", "").unwrap(), Parsed::Nothing);
        assert_eq!(ctx.search_path(), ["/opt/bin", "."]);
        assert_eq!(parse_with(&mut ctx, "path", "").unwrap(), Parsed::Nothing);
        assert_eq!(ctx.search_path(), ["/opt/bin", "."]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_exit_builtin() {
        let mut ctx = ctx();
        assert_eq!(parse_with(&mut ctx, "exit", "").unwrap(), Parsed::Exit(0));
        assert_eq!(parse_with(&mut ctx, "exit 3", "").unwrap(), Parsed::Exit(3));
        assert!(matches!(
            parse_with(&mut ctx, "exit 1 2", ""),
            Err(ShellError::Usage("exit [status]"))
        ));
        assert!(matches!(
            parse_with(&mut ctx, "exit soon", ""),
            Err(ShellError::Usage("exit [status]"))
        ));
    }

    #[test]
    fn test_builtin_names_only_match_first_word() {
        assert_eq!(Some(tree("echo cd exit")), exec(&["echo", "cd", "exit"]));
        assert_eq!(ctx().cwd(), Path::new("/"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_builtin_lookup_by_literal_first_word() {
        let mut ctx = ctx();
        let mut parser = Parser::new(&mut ctx);
        assert_eq!(parser.parse_builtin("ls *.none ?x").unwrap(), None);
        assert_eq!(parser.parse_builtin("exitcode 1").unwrap(), None);
        assert_eq!(parser.parse_builtin("   ").unwrap(), None);
        assert_eq!(parser.parse_builtin("'exit' 4").unwrap(), Some(Parsed::Exit(4)));
        assert_eq!(parser.parse_builtin("ex\\it").unwrap(), Some(Parsed::Exit(0)));
    }
}
