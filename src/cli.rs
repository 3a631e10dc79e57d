//! Command-line argument parsing for the questionnaire tool.

use clap::{Args, Parser, Subcommand, ValueEnum};
use db_questionnaire::config::{Config, DatabaseConfig};
use std::path::PathBuf;

/// Output format for run results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text tables.
    #[default]
    Text,
    /// One JSON document with every result.
    Json,
}

/// Define, store and run parameterized questions against a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "questionnaire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, value_name = "PATH", env = "QUESTIONNAIRE_DB")]
    pub db: Option<PathBuf>,

    /// Open the database read-only
    #[arg(long)]
    pub read_only: bool,

    /// Questionnaire JSON file to read and update
    #[arg(short = 'q', long, value_name = "PATH", conflicts_with = "state")]
    pub questionnaire: Option<PathBuf>,

    /// Application state file (database path plus questions) to read and update
    #[arg(short = 's', long, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,

    /// Log file path (default: the platform state directory)
    #[arg(long, value_name = "PATH", conflicts_with = "log_stderr")]
    pub log_file: Option<PathBuf>,

    /// Log debug details of resolution and execution
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List questions, grouped when groups exist
    List,

    /// Show a question's description, SQL and dynamic inputs
    Show {
        name: String,
    },

    /// Add a question, replacing any question with the same name
    Add(AddArgs),

    /// Remove a question
    Remove {
        name: String,
    },

    /// Put a question into a group, moving it out of any other group
    Group {
        group: String,
        name: String,
    },

    /// Take a question out of its group
    Ungroup {
        name: String,
    },

    /// Delete a group, leaving its questions ungrouped
    RemoveGroup {
        group: String,
    },

    /// Run questions and print their results
    Run(RunArgs),

    /// Write the current database path and questions to a state file
    SaveState {
        path: PathBuf,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AddArgs {
    /// Question name
    pub name: String,

    /// SELECT statement with {input} placeholders
    #[arg(long)]
    pub sql: String,

    /// Description shown with results
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Dynamic input as input_name|column_name (repeatable)
    #[arg(short = 'i', long = "input", value_name = "NAME|COLUMN")]
    pub inputs: Vec<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Questions to run, in order
    pub names: Vec<String>,

    /// Run every question
    #[arg(long, conflicts_with_all = ["names", "group"])]
    pub all: bool,

    /// Run every question in a group
    #[arg(short, long, conflicts_with = "names")]
    pub group: Option<String>,

    /// Value for a dynamic input, as name=value (repeatable). Inputs not given
    /// are asked for on the terminal.
    #[arg(short = 'i', long = "input", value_name = "NAME=VALUE")]
    pub inputs: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Save a single run back as a new question with its inputs filled in
    #[arg(long, value_name = "NAME", conflicts_with = "replace")]
    pub save_as: Option<String>,

    /// Replace the question with its run, inputs filled in
    #[arg(long)]
    pub replace: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Database options from the command line. Unset fields fall back to the
    /// config file when merged.
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.db.clone(),
            read_only: self.read_only,
        }
    }

    /// Questionnaire file to use: the flag, then the config file.
    pub fn questionnaire_path(&self, config: &Config) -> Option<PathBuf> {
        self.questionnaire
            .clone()
            .or_else(|| config.questionnaire.path.clone())
    }

    /// Returns true if the command changes the question store.
    pub fn modifies_questions(&self) -> bool {
        match &self.command {
            Command::Add(_)
            | Command::Remove { .. }
            | Command::Group { .. }
            | Command::Ungroup { .. }
            | Command::RemoveGroup { .. } => true,
            Command::Run(args) => args.save_as.is_some() || args.replace,
            Command::List | Command::Show { .. } | Command::SaveState { .. } => false,
        }
    }
}
