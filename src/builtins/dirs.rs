use std::env;
use std::path::PathBuf;

use crate::builtins::{self, BuiltinCommand};
use crate::errors::{Error, Result};
use crate::shell::Shell;

pub struct Cd;

impl BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: cd [dir]
    Change the current directory to DIR. Without DIR, change to the home
    directory.";

    fn run(_shell: &mut Shell, args: &[String]) -> Result<bool> {
        let dir = match args.first() {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .ok_or_else(|| Error::builtin_command("cd: HOME not set"))?,
        };

        env::set_current_dir(&dir)
            .map_err(|e| Error::builtin_command(format!("cd: {}: {}", dir.display(), e)))?;
        Ok(true)
    }
}

pub struct Pwd;

impl BuiltinCommand for Pwd {
    const NAME: &'static str = builtins::PWD_NAME;

    const HELP: &'static str = "\
pwd: pwd
    Print the current working directory.";

    fn run(_shell: &mut Shell, _args: &[String]) -> Result<bool> {
        let cwd = env::current_dir()
            .map_err(|e| Error::builtin_command(format!("pwd: {}", e)))?;
        println!("{}", cwd.display());
        Ok(true)
    }
}
