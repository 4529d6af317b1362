use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use crate::error::{Result, SyncError};
use crate::models::{
    LocalChangesChoice, RemoteMismatchChoice, StagedChangesChoice, WorkingCopyStatus,
};

/// Literal answer required before an irreversible action
pub const TYPED_CONFIRMATION: &str = "yes";

/// Questions the sync procedures ask the user.
///
/// Each call is answered once and the answer is not remembered.
pub trait Prompter {
    fn remote_mismatch(&mut self, current: &str, expected: &str) -> Result<RemoteMismatchChoice>;
    fn staged_changes(&mut self, status: &WorkingCopyStatus) -> Result<StagedChangesChoice>;
    fn local_changes(&mut self, status: &WorkingCopyStatus) -> Result<LocalChangesChoice>;
    /// Single-keystroke yes/no
    fn confirm(&mut self, question: &str) -> Result<bool>;
    /// Only the literal [`TYPED_CONFIRMATION`] counts as agreement
    fn confirm_typed(&mut self, warning: &str) -> Result<bool>;
    /// Account that owns the remote, when none is configured
    fn account(&mut self) -> Result<Option<String>>;
}

/// Line-oriented prompter. End of input answers "abort"/"no".
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

pub type TerminalPrompter = LinePrompter<io::StdinLock<'static>, io::Stdout>;

impl TerminalPrompter {
    #[must_use]
    pub fn terminal() -> Self {
        LinePrompter::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt_err(e: io::Error) -> SyncError {
        SyncError::io("Failed to read answer from terminal", e)
    }

    /// `None` at end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").map_err(Self::prompt_err)?;
        self.output.flush().map_err(Self::prompt_err)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(Self::prompt_err)?;
        if read == 0 {
            writeln!(self.output).map_err(Self::prompt_err)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}").map_err(Self::prompt_err)
    }

    fn list_paths(&mut self, label: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        self.say(&format!("  {label} ({}):", paths.len()))?;
        for path in paths.iter().take(10) {
            self.say(&format!("    {path}"))?;
        }
        if paths.len() > 10 {
            self.say(&format!("    ... and {} more", paths.len() - 10))?;
        }
        Ok(())
    }

    /// Keep asking until one of `options` (matched by first letter) is given
    fn choose<T: Copy>(&mut self, prompt: &str, options: &[(char, T)], on_eof: T) -> Result<T> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(on_eof);
            };
            let key = answer.chars().next().map(|c| c.to_ascii_lowercase());
            if let Some((_, choice)) = options.iter().find(|(k, _)| Some(*k) == key) {
                return Ok(*choice);
            }
            let keys: Vec<String> = options.iter().map(|(k, _)| k.to_string()).collect();
            self.say(&format!("Please enter one of: {}", keys.join(", ")))?;
        }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn remote_mismatch(&mut self, current: &str, expected: &str) -> Result<RemoteMismatchChoice> {
        self.say("⚠️  The 'origin' remote points somewhere else:")?;
        self.say(&format!("  current:  {current}"))?;
        self.say(&format!("  expected: {expected}"))?;
        self.say("  [f] Fresh start: delete local git history and re-initialise")?;
        self.say("  [u] Update the remote URL, keep history")?;
        self.say("  [a] Abort")?;
        self.choose(
            "Choice (f/u/a): ",
            &[
                ('f', RemoteMismatchChoice::FreshReinit),
                ('u', RemoteMismatchChoice::UpdateRemoteOnly),
                ('a', RemoteMismatchChoice::Abort),
            ],
            RemoteMismatchChoice::Abort,
        )
    }

    fn staged_changes(&mut self, status: &WorkingCopyStatus) -> Result<StagedChangesChoice> {
        self.say("⚠️  Changes are already staged:")?;
        self.list_paths("staged", &status.staged)?;
        self.say("  [c] Commit the staged changes first, then continue")?;
        self.say("  [r] Unstage everything and restage all changes")?;
        self.say("  [a] Abort")?;
        self.choose(
            "Choice (c/r/a): ",
            &[
                ('c', StagedChangesChoice::ProceedWithExisting),
                ('r', StagedChangesChoice::ResetAndRestage),
                ('a', StagedChangesChoice::Abort),
            ],
            StagedChangesChoice::Abort,
        )
    }

    fn local_changes(&mut self, status: &WorkingCopyStatus) -> Result<LocalChangesChoice> {
        self.say("⚠️  You have uncommitted local changes:")?;
        self.list_paths("staged", &status.staged)?;
        self.list_paths("modified", &status.unstaged)?;
        self.list_paths("untracked", &status.untracked)?;
        self.say("  [s] Stash them and continue")?;
        self.say("  [r] Discard them (hard reset) and continue")?;
        self.say("  [a] Abort")?;
        self.choose(
            "Choice (s/r/a): ",
            &[
                ('s', LocalChangesChoice::StashAndContinue),
                ('r', LocalChangesChoice::HardResetAndContinue),
                ('a', LocalChangesChoice::Abort),
            ],
            LocalChangesChoice::Abort,
        )
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.choose(&format!("{question} (y/n): "), &[('y', true), ('n', false)], false)
    }

    fn confirm_typed(&mut self, warning: &str) -> Result<bool> {
        self.say(&format!("⚠️  {warning}"))?;
        let answer = self.ask(&format!(
            "This cannot be undone. Type '{TYPED_CONFIRMATION}' to continue: "
        ))?;
        Ok(answer.as_deref() == Some(TYPED_CONFIRMATION))
    }

    fn account(&mut self) -> Result<Option<String>> {
        let answer = self.ask("Enter the GitHub account that owns the repository: ")?;
        Ok(answer.filter(|a| !a.is_empty()))
    }
}

/// One pre-recorded answer for [`ScriptedPrompter`]
#[doc(hidden)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    RemoteMismatch(RemoteMismatchChoice),
    StagedChanges(StagedChangesChoice),
    LocalChanges(LocalChangesChoice),
    Confirm(bool),
    Typed(String),
    Account(Option<String>),
}

/// Prompter that replays answers in order and records what was asked.
///
/// Asking a question whose answer is missing or of the wrong kind is a
/// scripting mistake and panics. Only meant for tests.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str) -> Answer {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted answer left for: {question}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn remote_mismatch(&mut self, _current: &str, _expected: &str) -> Result<RemoteMismatchChoice> {
        match self.next("remote_mismatch") {
            Answer::RemoteMismatch(choice) => Ok(choice),
            other => panic!("expected a remote mismatch answer, got {other:?}"),
        }
    }

    fn staged_changes(&mut self, _status: &WorkingCopyStatus) -> Result<StagedChangesChoice> {
        match self.next("staged_changes") {
            Answer::StagedChanges(choice) => Ok(choice),
            other => panic!("expected a staged changes answer, got {other:?}"),
        }
    }

    fn local_changes(&mut self, _status: &WorkingCopyStatus) -> Result<LocalChangesChoice> {
        match self.next("local_changes") {
            Answer::LocalChanges(choice) => Ok(choice),
            other => panic!("expected a local changes answer, got {other:?}"),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.next(question) {
            Answer::Confirm(yes) => Ok(yes),
            other => panic!("expected a yes/no answer to '{question}', got {other:?}"),
        }
    }

    fn confirm_typed(&mut self, warning: &str) -> Result<bool> {
        match self.next(warning) {
            Answer::Typed(text) => Ok(text == TYPED_CONFIRMATION),
            other => panic!("expected a typed answer to '{warning}', got {other:?}"),
        }
    }

    fn account(&mut self) -> Result<Option<String>> {
        match self.next("account") {
            Answer::Account(account) => Ok(account),
            other => panic!("expected an account answer, got {other:?}"),
        }
    }
}
