use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SEARCH_PATH: [&str; 4] = [".", "/bin", "/usr/bin", "/usr/local/bin"];

pub struct Config {
    pub name: String,
    pub theme: String,
    pub config_dir: PathBuf,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub logger_stderr: bool,
    pub search_path: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = Config::get_config_dir();
        Config {
            name: env!("CARGO_PKG_NAME").to_string(),
            theme: String::from("default"),
            history_file: config_dir.join(".rsh_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("warn"),
            logger_dir: config_dir.join("logs"),
            logger_stderr: false,
            search_path: DEFAULT_SEARCH_PATH.iter().map(|p| p.to_string()).collect(),
            config_dir,
        }
    }
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/rsh")
        } else {
            env::temp_dir().join("rsh")
        }
    }

    pub fn new() -> Self {
        // .env first, so the variables below can come from it
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("RSH_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("RSH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("RSH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("RSH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("RSH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config.logger_stderr = env::var_os("RSH_LOG_STDERR").is_some();

        if let Ok(path) = env::var("RSH_PATH") {
            config.search_path = parse_search_path(&path);
        }

        if let Some(parent) = config.history_file.parent() {
            // a missing history directory only costs us history persistence
            let _ = fs::create_dir_all(parent);
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

fn parse_search_path(value: &str) -> Vec<String> {
    value
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(String::from)
        .collect()
}
