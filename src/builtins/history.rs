use crate::builtins::{self, BuiltinCommand};
use crate::errors::{Error, Result};
use crate::shell::Shell;

const DEFAULT_DISPLAY_COUNT: usize = 20;

pub struct History;

impl BuiltinCommand for History {
    const NAME: &'static str = builtins::HISTORY_NAME;

    const HELP: &'static str = "\
history: history [n]
    Show the last N commands entered, 20 by default.";

    fn run(shell: &mut Shell, args: &[String]) -> Result<bool> {
        let count = match args.first() {
            Some(arg) => arg
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    Error::builtin_command(format!("history: {}: invalid count", arg))
                })?,
            None => DEFAULT_DISPLAY_COUNT,
        };

        let entries = shell.history_entries();
        let start = entries.len().saturating_sub(count);
        for (position, entry) in &entries[start..] {
            println!("{:4}  {}", position + 1, entry);
        }

        Ok(true)
    }
}
