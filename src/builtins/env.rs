use std::env;

use crate::builtins::{self, BuiltinCommand};
use crate::errors::Result;
use crate::shell::Shell;

pub struct Env;

impl BuiltinCommand for Env {
    const NAME: &'static str = builtins::ENV_NAME;

    const HELP: &'static str = "\
env: env [VAR=value | VAR ...]
    Without arguments, print every environment variable, sorted. VAR=value
    arguments set variables; bare names print that variable when set.";

    fn run(_shell: &mut Shell, args: &[String]) -> Result<bool> {
        if args.is_empty() {
            let mut environ: Vec<String> = env::vars()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            environ.sort();
            for entry in environ {
                println!("{}", entry);
            }
            return Ok(true);
        }

        for arg in args {
            if let Some(index) = arg.find('=') {
                let (name, value) = arg.split_at(index);
                env::set_var(name, &value[1..]);
            } else if let Ok(value) = env::var(arg) {
                println!("{}={}", arg, value);
            }
        }

        Ok(true)
    }
}
