use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: String,
    pub mode: OpenMode,
}

/// Command tree for one input line. An absent child (`None`) is the empty
/// command, which does nothing and succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Exec {
        args: Vec<String>,
    },
    Pipe {
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    List {
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    /// `&&` when `success` is true, `||` when false.
    Conditional {
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
        success: bool,
    },
    Async {
        inner: Option<Box<Node>>,
    },
    Redir {
        inner: Option<Box<Node>>,
        input: Option<FileSpec>,
        output: Option<FileSpec>,
    },
}

impl Node {
    pub fn exec(args: Vec<String>) -> Option<Node> {
        if args.is_empty() {
            None
        } else {
            Some(Node::Exec { args })
        }
    }

    pub fn pipe(left: Option<Node>, right: Option<Node>) -> Node {
        Node::Pipe {
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn list(left: Option<Node>, right: Option<Node>) -> Node {
        Node::List {
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn conditional(left: Option<Node>, right: Option<Node>, success: bool) -> Node {
        Node::Conditional {
            left: left.map(Box::new),
            right: right.map(Box::new),
            success,
        }
    }

    pub fn background(inner: Option<Node>) -> Node {
        Node::Async {
            inner: inner.map(Box::new),
        }
    }

    pub fn has_output_redirection(&self) -> bool {
        matches!(self, Node::Redir { output: Some(_), .. })
    }
}

struct Child<'a>(&'a Option<Box<Node>>);

impl fmt::Display for Child<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(node) => write!(f, "{}", node),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Exec { args } => write!(f, "{}", shell_words::join(args)),
            Node::Pipe { left, right } => write!(f, "{} | {}", Child(left), Child(right)),
            Node::List { left, right } => write!(f, "{}; {}", Child(left), Child(right)),
            Node::Conditional {
                left,
                right,
                success,
            } => {
                let op = if *success { "&&" } else { "||" };
                write!(f, "{} {} {}", Child(left), op, Child(right))
            }
            Node::Async { inner } => write!(f, "{} &", Child(inner)),
            Node::Redir {
                inner,
                input,
                output,
            } => {
                write!(f, "{}", Child(inner))?;
                for spec in input.iter().chain(output.iter()) {
                    let op = match spec.mode {
                        OpenMode::Read => "<",
                        OpenMode::Truncate => ">",
                        OpenMode::Append => ">>",
                    };
                    write!(f, " {} {}", op, shell_words::quote(&spec.path))?;
                }
                Ok(())
            }
        }
    }
}
