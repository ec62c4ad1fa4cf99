use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use log::debug;
use serde_derive::Deserialize;

use gosh::{Shell, ShellConfig};

const COMMAND_HISTORY_CAPACITY: usize = 500;
const LOG_FILE_NAME: &str = ".gosh_log";

const USAGE: &str = "
gosh.

Usage:
    gosh [options]
    gosh [options] -c <command>
    gosh [options] <file>
    gosh (-h | --help)
    gosh --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c              If the -c option is present, then commands are read from
                        the first non-option argument command_string.
    --log=<path>    File to write log to, defaults to ~/.gosh_log
";

/// Docopt input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_command: Option<String>,
    arg_file: Option<String>,
    flag_version: bool,
    flag_c: bool,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("gosh version {}", env!("CARGO_PKG_VERSION"));
    } else if args.flag_c || args.arg_file.is_some() {
        execute_from_command_string_or_file(&args);
    } else {
        execute_from_stdin();
    }
}

fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(path) => path,
        None => return,
    };

    let log_file = match fern::log_file(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("gosh: failed to open log file {}: {}", log_path.display(), e);
            return;
        }
    };

    let pid = process::id();
    let result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(log_file)
        .apply();
    if let Err(e) = result {
        eprintln!("gosh: failed to initialize logging: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn execute_from_command_string_or_file(args: &Args) -> ! {
    let mut shell =
        Shell::new(ShellConfig::noninteractive()).unwrap_or_else(|e| exit_with_error(&e));

    let result = if let Some(ref command) = args.arg_command {
        shell.execute_command_string(command).map(|_| ())
    } else if let Some(ref file_path) = args.arg_file {
        shell.execute_commands_from_file(file_path)
    } else {
        unreachable!();
    };

    if let Err(e) = result {
        eprintln!("gosh: {}", e);
        process::exit(1);
    }
    process::exit(0);
}

fn execute_from_stdin() -> ! {
    let mut shell = Shell::new(ShellConfig::interactive(COMMAND_HISTORY_CAPACITY))
        .unwrap_or_else(|e| exit_with_error(&e));
    shell.run_interactive();
    process::exit(0);
}

fn exit_with_error(error: &gosh::errors::Error) -> ! {
    eprintln!("gosh: {}", error);
    process::exit(1);
}
