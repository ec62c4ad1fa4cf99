//! Gosh builtins.
//!
//! Builtins are a closed set dispatched over the `Builtin` enum; the
//! executor recognizes them by name and never spawns a process for them.
//! Each returns a boolean "continue the shell loop" signal through the
//! shared `BuiltinCommand` contract; only `exit` returns `false`.

use crate::errors::Result;
use crate::shell::Shell;

use self::dirs::{Cd, Pwd};
use self::env::Env;
use self::exit::Exit;
use self::help::Help;
use self::history::History;
use self::jobs::{Bg, Fg, Jobs};

mod dirs;
mod env;
mod exit;
mod help;
mod history;
mod jobs;

pub const CD_NAME: &str = "cd";
pub const PWD_NAME: &str = "pwd";
pub const EXIT_NAME: &str = "exit";
pub const HELP_NAME: &str = "help";
pub const ENV_NAME: &str = "env";
pub const HISTORY_NAME: &str = "history";
pub const JOBS_NAME: &str = "jobs";
pub const FG_NAME: &str = "fg";
pub const BG_NAME: &str = "bg";

/// Represents a gosh builtin command such as cd or jobs.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user.
    const HELP: &'static str;
    /// The usage string to display to the user.
    fn usage() -> String {
        Self::HELP.lines().next().unwrap().to_owned()
    }
    /// Runs the command with the given arguments in the `shell` environment.
    /// Returns `false` when the shell loop should end.
    fn run(shell: &mut Shell, args: &[String]) -> Result<bool>;
}

/// The closed set of builtin operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Builtin {
    Cd,
    Pwd,
    Exit,
    Help,
    Env,
    History,
    Jobs,
    Fg,
    Bg,
}

/// Resolves a program name to a builtin, if it names one.
pub fn lookup(program: &str) -> Option<Builtin> {
    match program {
        CD_NAME => Some(Builtin::Cd),
        PWD_NAME => Some(Builtin::Pwd),
        EXIT_NAME => Some(Builtin::Exit),
        HELP_NAME => Some(Builtin::Help),
        ENV_NAME => Some(Builtin::Env),
        HISTORY_NAME => Some(Builtin::History),
        JOBS_NAME => Some(Builtin::Jobs),
        FG_NAME => Some(Builtin::Fg),
        BG_NAME => Some(Builtin::Bg),
        _ => None,
    }
}

/// Runs a builtin. Failures are reported to stderr here and never stop the
/// shell loop.
pub fn run(shell: &mut Shell, builtin: Builtin, argv: &[String]) -> Result<bool> {
    let args = &argv[1..];
    let result = match builtin {
        Builtin::Cd => Cd::run(shell, args),
        Builtin::Pwd => Pwd::run(shell, args),
        Builtin::Exit => Exit::run(shell, args),
        Builtin::Help => Help::run(shell, args),
        Builtin::Env => Env::run(shell, args),
        Builtin::History => History::run(shell, args),
        Builtin::Jobs => Jobs::run(shell, args),
        Builtin::Fg => Fg::run(shell, args),
        Builtin::Bg => Bg::run(shell, args),
    };

    match result {
        Ok(continue_shell) => Ok(continue_shell),
        Err(e) => {
            eprintln!("gosh: {}", e);
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_recognizes_the_closed_set() {
        for name in &[
            CD_NAME,
            PWD_NAME,
            EXIT_NAME,
            HELP_NAME,
            ENV_NAME,
            HISTORY_NAME,
            JOBS_NAME,
            FG_NAME,
            BG_NAME,
        ] {
            assert!(lookup(name).is_some(), "{} should be a builtin", name);
        }
    }

    #[test]
    fn lookup_rejects_external_commands() {
        assert!(lookup("ls").is_none());
        assert!(lookup("echo").is_none());
        assert!(lookup("").is_none());
    }
}
