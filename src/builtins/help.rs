use crate::builtins::{self, BuiltinCommand};
use crate::builtins::dirs::{Cd, Pwd};
use crate::builtins::env::Env;
use crate::builtins::exit::Exit;
use crate::builtins::history::History;
use crate::builtins::jobs::{Bg, Fg, Jobs};
use crate::errors::{Error, Result};
use crate::shell::Shell;

pub struct Help;

impl BuiltinCommand for Help {
    const HELP: &'static str = "\
help: help [command ...]
    Display information about builtin commands. With COMMAND arguments,
    print detailed help for each matching builtin.";

    const NAME: &'static str = builtins::HELP_NAME;

    fn run(_shell: &mut Shell, args: &[String]) -> Result<bool> {
        if args.is_empty() {
            print_all_usage_strings();
            return Ok(true);
        }

        let mut all_invalid = true;
        for arg in args {
            let help = match arg.as_str() {
                builtins::CD_NAME => Some(Cd::HELP),
                builtins::PWD_NAME => Some(Pwd::HELP),
                builtins::EXIT_NAME => Some(Exit::HELP),
                builtins::HELP_NAME => Some(Help::HELP),
                builtins::ENV_NAME => Some(Env::HELP),
                builtins::HISTORY_NAME => Some(History::HELP),
                builtins::JOBS_NAME => Some(Jobs::HELP),
                builtins::FG_NAME => Some(Fg::HELP),
                builtins::BG_NAME => Some(Bg::HELP),
                _ => None,
            };
            if let Some(help) = help {
                println!("{}", help);
                all_invalid = false;
            }
        }

        if all_invalid {
            let last = args.last().expect("args is non-empty");
            return Err(Error::builtin_command(format!(
                "help: no help topics match {}",
                last
            )));
        }

        Ok(true)
    }
}

fn print_all_usage_strings() {
    println!("gosh - command shell");
    println!("Built-in commands:");
    println!("  {}", Cd::usage());
    println!("  {}", Pwd::usage());
    println!("  {}", Env::usage());
    println!("  {}", History::usage());
    println!("  {}", Jobs::usage());
    println!("  {}", Fg::usage());
    println!("  {}", Bg::usage());
    println!("  {}", Help::usage());
    println!("  {}", Exit::usage());
    println!();
    println!("Redirections (<, >, >>) apply to the first and last stage of a");
    println!("pipeline only; redirections on interior stages are ignored.");
}
