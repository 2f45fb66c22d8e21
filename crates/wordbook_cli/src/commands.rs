//! Command dispatch from parsed CLI input to core services.

use crate::cli::{Commands, GlobalArgs};
use crate::prompt::{Confirm, TerminalPrompt};
use crate::render::{render_records, Printer};
use chrono::Utc;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;
use wordbook_core::db::{open_db_with_retry, RetryPolicy};
use wordbook_core::{
    default_log_dir, default_log_level, init_logging, MergeError, MergeOutcome, PromptError,
    RepoError, ReviewError, ReviewPrompt, ReviewService, ReviewSummary, SqliteWordRepository,
    WordRepository, WordService,
};

const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Failure of one CLI command, mapped to a process exit status.
#[derive(Debug)]
pub enum CommandError {
    Merge(MergeError),
    Repo(RepoError),
    Review(ReviewError),
    Prompt(PromptError),
    /// Writing command output failed.
    Output(io::Error),
}

impl CommandError {
    /// `2` for rejected input, `1` for everything else.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Merge(MergeError::Validation(_)) => 2,
            _ => 1,
        }
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merge(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Review(err) => write!(f, "{err}"),
            Self::Prompt(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Merge(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Review(err) => Some(err),
            Self::Prompt(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<MergeError> for CommandError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

impl From<RepoError> for CommandError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ReviewError> for CommandError {
    fn from(value: ReviewError) -> Self {
        Self::Review(value)
    }
}

impl From<PromptError> for CommandError {
    fn from(value: PromptError) -> Self {
        Self::Prompt(value)
    }
}

impl From<io::Error> for CommandError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

/// Bootstraps logging and the store, then runs one command.
pub fn run(global: GlobalArgs, command: Commands) -> ExitCode {
    if let Err(err) = start_logging(&global) {
        eprintln!("warning: file logging disabled: {err}");
    }

    eprintln!("connecting to word store `{}`...", global.db.display());
    let policy = RetryPolicy {
        attempts: global.connect_attempts,
        delay: CONNECT_RETRY_DELAY,
    };
    let conn = match open_db_with_retry(&global.db, policy) {
        Ok(conn) => conn,
        Err(err) => {
            error!("event=cli_start module=cli status=error error_code=store_unavailable");
            report_failure(&err);
            return ExitCode::FAILURE;
        }
    };
    let repo = match SqliteWordRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            report_failure(&err);
            return ExitCode::FAILURE;
        }
    };

    let mut out = Printer::stdout();
    let mut prompt = TerminalPrompt::stdio();
    match dispatch(&repo, command, &mut out, &mut prompt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error exit_status={}",
                err.exit_status()
            );
            report_failure(&err);
            ExitCode::from(err.exit_status())
        }
    }
}

fn report_failure(err: &dyn Error) {
    // Nowhere left to report a broken stderr.
    let _ = Printer::stderr().failure(&format!("error: {err}"));
}

fn start_logging(global: &GlobalArgs) -> Result<(), String> {
    let level = global
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let dir = global.log_dir.clone().unwrap_or_else(default_log_dir);
    let dir = dir
        .to_str()
        .ok_or_else(|| format!("log dir `{}` is not valid UTF-8", dir.display()))?;
    init_logging(&level, dir)
}

fn dispatch<R, W, P>(
    repo: &R,
    command: Commands,
    out: &mut Printer<W>,
    prompt: &mut P,
) -> Result<(), CommandError>
where
    R: WordRepository,
    W: Write,
    P: ReviewPrompt + Confirm,
{
    let words = WordService::new(repo);
    match command {
        Commands::Add {
            word,
            sentence,
            remark,
            direct,
        } => {
            add(&words, &word, &sentence, &remark, out)?;
            if !direct {
                out.info("starting a review pass")?;
                review_after_add(repo, out, prompt)?;
            }
        }
        Commands::Del { word } => {
            if words.delete(&word)? {
                out.success(&format!("deleted `{}`", word.trim()))?;
            } else {
                out.info(&format!("no record for `{}`", word.trim()))?;
            }
        }
        Commands::All => {
            let records = words.list_all()?;
            if records.is_empty() {
                out.info("no words stored yet")?;
            } else {
                out.raw(&render_records(&records))?;
            }
        }
        Commands::Show { word } => match words.show(&word)? {
            Some(record) => out.raw(&render_records(&[record]))?,
            None => out.info(&format!("no record for `{}`", word.trim()))?,
        },
        Commands::Truncate { yes } => {
            if !yes && !prompt.ask("delete every stored word?", false)? {
                out.info("truncate cancelled")?;
                return Ok(());
            }
            let removed = words.truncate()?;
            out.success(&format!("deleted {removed} word(s)"))?;
        }
        Commands::Review => review(repo, out, prompt)?,
    }
    Ok(())
}

fn add<R: WordRepository, W: Write>(
    words: &WordService<R>,
    word: &str,
    sentence: &str,
    remark: &str,
    out: &mut Printer<W>,
) -> Result<(), CommandError> {
    match words.add_entry(word, sentence, remark)? {
        MergeOutcome::Created(record) => out.success(&format!("added `{}`", record.word))?,
        MergeOutcome::Merged(record) => out.success(&format!(
            "merged sentence into `{}` ({} examples)",
            record.word,
            record.examples.len()
        ))?,
        MergeOutcome::DuplicateRejected(record) => {
            out.failure(&format!(
                "this sentence is already stored for `{}`",
                record.word
            ))?;
            out.raw(&render_records(&[record]))?;
        }
    }
    Ok(())
}

/// The word is already stored at this point, so a prompt that cannot be
/// answered only skips the review.
fn review_after_add<R, W, P>(
    repo: &R,
    out: &mut Printer<W>,
    prompt: &mut P,
) -> Result<(), CommandError>
where
    R: WordRepository,
    W: Write,
    P: ReviewPrompt,
{
    match review(repo, out, prompt) {
        Err(CommandError::Review(ReviewError::Prompt(PromptError::Aborted))) => {
            info!("event=cli_review module=cli status=skipped reason=not_interactive");
            out.info("review skipped: no interactive input (pass --direct to skip it)")?;
            Ok(())
        }
        other => other,
    }
}

fn review<R, W, P>(repo: &R, out: &mut Printer<W>, prompt: &mut P) -> Result<(), CommandError>
where
    R: WordRepository,
    W: Write,
    P: ReviewPrompt,
{
    let mut service = ReviewService::new(repo, StdRng::from_entropy());
    let today = Utc::now().date_naive();

    match service.run_review_pass(today, prompt)? {
        ReviewSummary::NothingDue => out.info("== nothing to review today ==")?,
        ReviewSummary::Completed(stats) => {
            out.success(&format!(
                "reviewed {} word(s), {} sentence(s)",
                stats.records, stats.examples_presented
            ))?;
            if !stats.missing.is_empty() {
                out.info(&format!(
                    "{} word(s) were deleted during the review and kept no count",
                    stats.missing.len()
                ))?;
            }
            info!(
                "event=cli_review module=cli status=ok records={} updated={}",
                stats.records, stats.updated
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dispatch, CommandError};
    use crate::cli::Commands;
    use crate::prompt::Confirm;
    use crate::render::Printer;
    use std::collections::VecDeque;
    use wordbook_core::db::open_db_in_memory;
    use wordbook_core::{
        Example, MergeError, PromptError, RepoError, ReviewError, ReviewPrompt,
        SqliteWordRepository, WordRepository, WordValidationError,
    };

    /// Answers questions from a fixed list; an exhausted list aborts.
    struct ScriptedAnswers {
        answers: VecDeque<bool>,
        asked: usize,
    }

    impl ScriptedAnswers {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: 0,
            }
        }

        fn next(&mut self) -> Result<bool, PromptError> {
            self.asked += 1;
            self.answers.pop_front().ok_or(PromptError::Aborted)
        }
    }

    impl Confirm for ScriptedAnswers {
        fn ask(&mut self, _message: &str, _default: bool) -> Result<bool, PromptError> {
            self.next()
        }
    }

    impl ReviewPrompt for ScriptedAnswers {
        fn confirm(&mut self, _word: &str, _example: &Example) -> Result<bool, PromptError> {
            self.next()
        }
    }

    fn run_command(
        repo: &SqliteWordRepository<'_>,
        command: Commands,
        prompt: &mut ScriptedAnswers,
    ) -> (Result<(), CommandError>, String) {
        let mut out = Printer::new(Vec::new(), false);
        let result = dispatch(repo, command, &mut out, prompt);
        let written = String::from_utf8(out.into_inner()).unwrap();
        (result, written)
    }

    fn add(word: &str, sentence: &str, direct: bool) -> Commands {
        Commands::Add {
            word: word.to_string(),
            sentence: sentence.to_string(),
            remark: String::new(),
            direct,
        }
    }

    #[test]
    fn exit_status_separates_rejected_input_from_other_failures() {
        let rejected = CommandError::from(MergeError::Validation(WordValidationError::EmptyWord));
        assert_eq!(rejected.exit_status(), 2);

        let store = CommandError::from(RepoError::DuplicateWord("apple".to_string()));
        assert_eq!(store.exit_status(), 1);
        let merge_store =
            CommandError::from(MergeError::Repo(RepoError::DuplicateWord("apple".to_string())));
        assert_eq!(merge_store.exit_status(), 1);
        assert_eq!(CommandError::from(PromptError::Aborted).exit_status(), 1);
    }

    #[test]
    fn blank_word_is_rejected_with_validation_status() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);

        let (result, _) = run_command(&repo, add("   ", "I eat an apple", true), &mut prompt);

        assert_eq!(result.unwrap_err().exit_status(), 2);
        assert!(repo.find_all().unwrap().is_empty());
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn show_and_del_of_missing_word_succeed_with_notice() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);

        let (shown, output) = run_command(
            &repo,
            Commands::Show {
                word: " ghost ".to_string(),
            },
            &mut prompt,
        );
        shown.unwrap();
        assert_eq!(output, "no record for `ghost`\n");

        let (deleted, output) = run_command(
            &repo,
            Commands::Del {
                word: "ghost".to_string(),
            },
            &mut prompt,
        );
        deleted.unwrap();
        assert_eq!(output, "no record for `ghost`\n");
    }

    #[test]
    fn add_without_direct_runs_a_review_pass() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[true]);

        let (result, output) = run_command(&repo, add("apple", "I eat an apple", false), &mut prompt);

        result.unwrap();
        assert_eq!(prompt.asked, 1);
        assert!(output.contains("added `apple`"));
        assert!(output.contains("reviewed 1 word(s), 1 sentence(s)"));
        let stored = repo.find_by_word("apple").unwrap().unwrap();
        assert_eq!(stored.review_count, 1);
    }

    #[test]
    fn add_direct_skips_the_review_pass() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[true]);

        let (result, output) = run_command(&repo, add("apple", "I eat an apple", true), &mut prompt);

        result.unwrap();
        assert_eq!(prompt.asked, 0);
        assert_eq!(output, "added `apple`\n");
        let stored = repo.find_by_word("apple").unwrap().unwrap();
        assert_eq!(stored.review_count, 0);
    }

    #[test]
    fn unanswerable_review_after_add_keeps_word_and_succeeds() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);

        let (result, output) = run_command(&repo, add("apple", "I eat an apple", false), &mut prompt);

        result.unwrap();
        assert!(output.contains("review skipped"));
        let stored = repo.find_by_word("apple").unwrap().unwrap();
        assert_eq!(stored.review_count, 0);
    }

    #[test]
    fn standalone_review_without_answers_fails() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);
        run_command(&repo, add("apple", "I eat an apple", true), &mut prompt)
            .0
            .unwrap();

        let (result, _) = run_command(&repo, Commands::Review, &mut prompt);

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            CommandError::Review(ReviewError::Prompt(PromptError::Aborted))
        ));
        assert_eq!(err.exit_status(), 1);
    }

    #[test]
    fn duplicate_sentence_is_reported_with_the_stored_record() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);
        run_command(&repo, add("apple", "I eat an apple", true), &mut prompt)
            .0
            .unwrap();

        let (result, output) = run_command(&repo, add("apple", "I eat an apple", true), &mut prompt);

        result.unwrap();
        assert!(output.contains("this sentence is already stored for `apple`"));
        assert!(output.contains("| apple | I eat an apple |"));
    }

    #[test]
    fn truncate_stops_when_confirmation_is_declined() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[false]);
        run_command(&repo, add("apple", "I eat an apple", true), &mut prompt)
            .0
            .unwrap();

        let (result, output) = run_command(&repo, Commands::Truncate { yes: false }, &mut prompt);

        result.unwrap();
        assert_eq!(prompt.asked, 1);
        assert_eq!(output, "truncate cancelled\n");
        assert_eq!(repo.find_all().unwrap().len(), 1);
    }

    #[test]
    fn truncate_with_yes_deletes_without_asking() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteWordRepository::try_new(&conn).unwrap();
        let mut prompt = ScriptedAnswers::new(&[]);
        run_command(&repo, add("apple", "I eat an apple", true), &mut prompt)
            .0
            .unwrap();

        let (result, output) = run_command(&repo, Commands::Truncate { yes: true }, &mut prompt);

        result.unwrap();
        assert_eq!(prompt.asked, 0);
        assert_eq!(output, "deleted 1 word(s)\n");
        assert!(repo.find_all().unwrap().is_empty());
    }
}
