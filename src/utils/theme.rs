use colored::Colorize;
use std::io::{self, IsTerminal};

pub struct Theme {
    pub prompt: String,
    pub continuation_prompt: String,
    pub error_style: Box<dyn Fn(String) -> String + Send + Sync>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: "% ".to_string(),
            continuation_prompt: String::new(),
            error_style: Box::new(|s| s.bright_red().to_string()),
        }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Theme {
            error_style: Box::new(|s| s),
            ..Theme::default()
        }
    }

    pub fn load_theme(theme_name: &str) -> Theme {
        if !io::stderr().is_terminal() {
            // escape codes in a redirected error stream are just noise
            colored::control::set_override(false);
        }
        match theme_name {
            "plain" => Theme::plain(),
            _ => Theme::default(),
        }
    }

    pub fn format_error(&self, program: &str, message: impl std::fmt::Display) -> String {
        (self.error_style)(format!("{}: {}", program, message))
    }
}
