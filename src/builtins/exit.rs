use crate::builtins::{self, BuiltinCommand};
use crate::errors::Result;
use crate::shell::Shell;

pub struct Exit;

impl BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit
    Exit the shell.";

    fn run(shell: &mut Shell, _args: &[String]) -> Result<bool> {
        if shell.display_messages() {
            println!("Goodbye!");
        }
        Ok(false)
    }
}
