//! Shell module.
//!
//! The `Shell` owns the line editor and the shared job table and drives the
//! read-eval loop: read a line, parse it, hand the pipeline to the executor,
//! and either block on foreground completion or carry on while the job
//! table tracks the background work.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use nix::sys::signal::{self, SigHandler, Signal};

use crate::editor::Editor;
use crate::errors::Result;
use crate::executor;
use crate::jobs::JobTable;
use crate::parse;
use crate::util;

const HISTORY_FILE_NAME: &str = ".gosh_history";
const PROMPT: &str = "gosh> ";

/// Gosh shell.
pub struct Shell {
    editor: Editor,
    history_file: Option<PathBuf>,
    jobs: Arc<JobTable>,
    config: ShellConfig,
    is_interactive: bool,
}

impl Shell {
    /// Constructs a new shell to manage running jobs and command history.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        let mut shell = Shell {
            editor: Editor::with_capacity(config.command_history_capacity),
            history_file: None,
            jobs: JobTable::new(),
            config,
            is_interactive: util::isatty(),
        };

        if shell.is_interactive && config.enable_job_control {
            // An interrupt should reach only the foreground child, never
            // the shell itself.
            if let Err(e) = ignore_interrupt_signal() {
                warn!("failed to ignore SIGINT: {}", e);
            }
        }

        if config.enable_command_history {
            shell.load_history()?;
        }

        info!("gosh started up");
        Ok(shell)
    }

    pub fn is_interactive(&self) -> bool {
        self.is_interactive
    }

    pub(crate) fn display_messages(&self) -> bool {
        self.config.display_messages
    }

    /// The job table shared with executor, builtins, and monitor threads.
    pub fn job_table(&self) -> &Arc<JobTable> {
        &self.jobs
    }

    /// Retained history entries with absolute positions, for the `history`
    /// builtin.
    pub fn history_entries(&self) -> Vec<(usize, String)> {
        self.editor.entries()
    }

    /// Parses and executes one command line. Returns `false` when the shell
    /// loop should end (the `exit` builtin).
    pub fn execute_command_string(&mut self, input: &str) -> Result<bool> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(true);
        }

        let pipeline = parse::parse_pipeline(input);
        executor::execute_pipeline(self, &pipeline)
    }

    /// Runs commands from a script file, reporting errors without stopping.
    pub fn execute_commands_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        use failure::ResultExt;
        let buffer =
            fs::read_to_string(path).context(crate::errors::ErrorKind::Io)?;

        for line in buffer.lines() {
            match self.execute_command_string(line) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("gosh: {}", e),
            }
        }

        Ok(())
    }

    /// Runs the interactive read-eval loop until end of input or `exit`.
    pub fn run_interactive(&mut self) {
        if self.config.display_messages {
            println!("Welcome to gosh");
        }

        loop {
            self.notify_done_jobs();

            let line = match self.editor.readline(PROMPT) {
                Ok(Some(line)) => line.trim().to_owned(),
                Ok(None) => {
                    println!();
                    break;
                }
                Err(e) => {
                    eprintln!("gosh: {}", e);
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            if self.config.enable_command_history {
                self.editor.add_history_entry(&line);
            }

            match self.execute_command_string(&line) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("gosh: {}", e),
            }
        }

        self.save_history();
        info!("gosh has shut down");
    }

    /// Reports and purges jobs that completed since the last loop
    /// iteration.
    fn notify_done_jobs(&mut self) {
        for job in self.jobs.cleanup_done_jobs() {
            println!("{}", job);
        }
    }

    fn load_history(&mut self) -> Result<()> {
        self.history_file = dirs::home_dir().map(|p| p.join(HISTORY_FILE_NAME));
        if let Some(ref history_file) = self.history_file {
            self.editor.load_history(history_file)?;
        } else {
            warn!("unable to get home directory");
        }

        Ok(())
    }

    fn save_history(&mut self) {
        if !self.config.enable_command_history {
            return;
        }
        if let Some(ref history_file) = self.history_file {
            if let Err(e) = self.editor.save_history(history_file) {
                error!("failed to save history during shutdown: {}", e);
            }
        }
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}\n{:?}", self.jobs, self.editor)
    }
}

fn ignore_interrupt_signal() -> nix::Result<SigHandler> {
    unsafe { signal::signal(Signal::SIGINT, SigHandler::SigIgn) }
}

/// Policy object to control a shell's behavior.
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Determines if new command entries will be added to the shell's
    /// command history.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history.
    command_history_capacity: usize,

    /// Determines if job control (fg and bg) signal setup is performed.
    enable_job_control: bool,

    /// Determines if some messages (e.g. the welcome banner) are displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell configuration: command history, job
    /// control, and messages are enabled.
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity,
            enable_job_control: true,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell configuration: no command history, no
    /// signal changes, fewer messages. Used for `-c` and script execution.
    pub fn noninteractive() -> Self {
        Default::default()
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_command_history: false,
            command_history_capacity: 0,
            enable_job_control: false,
            display_messages: false,
        }
    }
}
