use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "wordbook",
    about = "Vocabulary notebook with fixed-interval spaced repetition",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database file holding the word records
    #[arg(long, env = "WORDBOOK_DB", default_value = "wordbook.db", global = true)]
    pub db: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "WORDBOOK_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "WORDBOOK_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// How many times to try opening the database before giving up
    #[arg(long, default_value_t = 3, global = true)]
    pub connect_attempts: u32,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a word with an example sentence, merging into an existing word
    Add {
        /// English word or phrase
        word: String,

        /// Example sentence
        sentence: String,

        /// Free-form remark
        #[arg(default_value = "")]
        remark: String,

        /// Skip the review pass that normally follows an add.
        /// Without a terminal the review is skipped with a notice.
        #[arg(short, long)]
        direct: bool,
    },

    /// Delete one word
    Del {
        /// English word or phrase
        word: String,
    },

    /// Show every stored word
    All,

    /// Show one word
    Show {
        /// English word or phrase
        word: String,
    },

    /// Delete every stored word
    Truncate {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Review the words due today
    Review,
}
