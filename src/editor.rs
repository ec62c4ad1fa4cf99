//! Line editor built on rustyline: prompt, filename completion, and the
//! in-memory history list behind the `history` builtin.

use std::fmt;
use std::io;
use std::path::Path;

use failure::{Fail, ResultExt};
use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    validate::Validator,
    CompletionType, Config, Helper,
};

use crate::errors::{ErrorKind, Result};

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> ::std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for EditorHelper {}

impl Validator for EditorHelper {}

impl Helper for EditorHelper {}

pub struct Editor {
    internal: rustyline::Editor<EditorHelper>,
    /// The total number of history items ever saved.
    history_count: usize,
}

impl Editor {
    pub fn with_capacity(history_capacity: usize) -> Editor {
        let config = Config::builder()
            .max_history_size(history_capacity)
            .history_ignore_space(true)
            .completion_type(CompletionType::Circular)
            .build();

        let mut internal = rustyline::Editor::with_config(config);
        internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));

        Editor {
            internal,
            history_count: 0,
        }
    }

    /// Reads one line. Returns `None` on end of input.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }

    pub fn load_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        match self.internal.load_history(path) {
            Ok(()) => {
                self.history_count = self.internal.history().len();
                Ok(())
            }
            Err(ReadlineError::Io(ref inner)) if inner.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.context(ErrorKind::Readline).into()),
        }
    }

    pub fn save_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        self.internal
            .save_history(path)
            .context(ErrorKind::Readline)?;
        Ok(())
    }

    pub fn add_history_entry(&mut self, line: &str) {
        if self.internal.add_history_entry(line) {
            self.history_count += 1;
        }
    }

    /// Returns retained history entries with their absolute positions
    /// (0-based; earlier entries may have been evicted by capacity).
    pub fn entries(&self) -> Vec<(usize, String)> {
        let history = self.internal.history();
        let start = self.history_count - history.len();
        history
            .iter()
            .enumerate()
            .map(|(i, entry)| (start + i, entry.clone()))
            .collect()
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "history count: {}", self.history_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_entries(capacity: usize, entries: usize) -> Editor {
        let mut editor = Editor::with_capacity(capacity);
        for i in 0..entries {
            editor.add_history_entry(&format!("cmd{}", i));
        }
        editor
    }

    #[test]
    fn entries_are_numbered_absolutely() {
        let editor = editor_with_entries(10, 3);
        let entries = editor.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (0, "cmd0".to_string()));
        assert_eq!(entries[2], (2, "cmd2".to_string()));
    }

    #[test]
    fn eviction_preserves_absolute_positions() {
        let editor = editor_with_entries(2, 5);
        let entries = editor.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (3, "cmd3".to_string()));
        assert_eq!(entries[1], (4, "cmd4".to_string()));
    }

    #[test]
    fn duplicates_are_not_recounted() {
        let mut editor = Editor::with_capacity(5);
        editor.add_history_entry("dup");
        editor.add_history_entry("dup");
        assert_eq!(editor.entries().len(), 1);
    }
}
