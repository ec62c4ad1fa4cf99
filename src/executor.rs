//! Pipeline executor.
//!
//! Turns a parsed `Pipeline` into running processes: builtins are dispatched
//! synchronously, external commands are spawned with their redirections
//! applied, adjacent stages are connected by pipes, and background pipelines
//! are handed to the job table.
//!
//! Every pipeline runs in its own process group with the first stage as
//! leader, so job-control signals reach all stages rather than a single pid.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::FromRawFd;
use std::os::unix::process::CommandExt;
use std::process::{self, Child, Stdio};
use std::thread;

use failure::{Fail, ResultExt};
use log::debug;
use nix::fcntl::OFlag;
use nix::unistd::{self, Pid};

use crate::builtins;
use crate::errors::{Error, ErrorKind, Result};
use crate::parse::{Command, Pipeline};
use crate::shell::Shell;

/// Stdin binding for one stage.
#[derive(Debug)]
enum Input {
    Inherit,
    File(File),
}

/// Stdout binding for one stage. Stderr is always inherited.
#[derive(Debug)]
enum Output {
    Inherit,
    File(File),
}

impl Input {
    fn new(redirect: Option<&str>) -> Result<Self> {
        match redirect {
            Some(filename) => {
                let file =
                    File::open(filename).map_err(|e| Error::redirection(filename, &e))?;
                Ok(Input::File(file))
            }
            None => Ok(Input::Inherit),
        }
    }
}

impl Output {
    fn new(redirect: Option<&str>, append: bool) -> Result<Self> {
        let filename = match redirect {
            Some(filename) => filename,
            None => return Ok(Output::Inherit),
        };

        let file = if append {
            OpenOptions::new()
                .create(true)
                .write(true)
                .append(true)
                .open(filename)
        } else {
            File::create(filename)
        };

        Ok(Output::File(
            file.map_err(|e| Error::redirection(filename, &e))?,
        ))
    }
}

impl From<Input> for Stdio {
    fn from(input: Input) -> Self {
        match input {
            Input::Inherit => Stdio::inherit(),
            Input::File(file) => file.into(),
        }
    }
}

impl From<Output> for Stdio {
    fn from(output: Output) -> Self {
        match output {
            Output::Inherit => Stdio::inherit(),
            Output::File(file) => file.into(),
        }
    }
}

/// Executes a pipeline and returns whether the shell's read loop should
/// continue. Only the `exit` builtin yields `false`.
pub fn execute_pipeline(shell: &mut Shell, pipeline: &Pipeline) -> Result<bool> {
    let commands: Vec<&Command> = pipeline
        .commands
        .iter()
        .filter(|command| !command.args.is_empty())
        .collect();

    match commands.len() {
        0 => Ok(true),
        1 => {
            let command = commands[0];
            let background = pipeline.background || command.background;
            execute_command(shell, command, background, &pipeline.input)
        }
        _ => execute_piped(shell, &commands, pipeline),
    }
}

/// Runs a sole-stage pipeline: builtin dispatch or a single external
/// process with redirections.
fn execute_command(
    shell: &mut Shell,
    command: &Command,
    background: bool,
    input: &str,
) -> Result<bool> {
    let program = &command.args[0];

    // Builtins never go through process spawning; `&` on a builtin is not
    // honored.
    if let Some(builtin) = builtins::lookup(program) {
        return builtins::run(shell, builtin, &command.args);
    }

    let stdin = Input::new(command.input_file.as_deref())?;
    let stdout = Output::new(command.output_file.as_deref(), command.append_output)?;
    let (mut child, pgid) = spawn_stage(command, stdin, stdout, None)?;

    if background {
        let job = shell.job_table().add_job(child, pgid, input);
        println!("[{}] {}", job.id(), job.pid());
    } else {
        let status = child.wait().context(ErrorKind::Io)?;
        if !status.success() {
            eprintln!("gosh: {}: {}", program, status);
        }
    }

    Ok(true)
}

/// Runs a multi-stage pipeline. All stages are wired before any is started
/// so an early starter cannot deadlock writing into a pipe nobody reads.
fn execute_piped(shell: &mut Shell, commands: &[&Command], pipeline: &Pipeline) -> Result<bool> {
    for command in commands {
        if builtins::lookup(&command.args[0]).is_some() {
            return Err(Error::unpipeable_builtin(&command.args[0]));
        }
    }

    let n = commands.len();
    let mut inputs: Vec<Input> = Vec::with_capacity(n);
    let mut outputs: Vec<Output> = Vec::with_capacity(n);

    // Only the first stage honors input redirection and only the last stage
    // honors output redirection; interior redirection fields are ignored.
    inputs.push(Input::new(commands[0].input_file.as_deref())?);
    for _ in 0..n - 1 {
        let (read_end, write_end) = create_pipe()?;
        outputs.push(Output::File(write_end));
        inputs.push(Input::File(read_end));
    }
    let last = commands[n - 1];
    outputs.push(Output::new(last.output_file.as_deref(), last.append_output)?);

    let mut children: Vec<(String, Child)> = Vec::with_capacity(n);
    let mut pgid = None;
    let stages = commands.iter().zip(inputs.into_iter().zip(outputs));
    for (command, (stdin, stdout)) in stages {
        let (child, group) = spawn_stage(command, stdin, stdout, pgid)?;
        pgid = Some(group);
        children.push((command.args[0].clone(), child));
    }

    if pipeline.background {
        // The tail process carries the job; earlier stages run in the same
        // process group but are not individually tracked. Each still needs
        // a waiter, or it would linger as a zombie after exiting.
        let (_, tail) = children.pop().expect("pipeline has at least two stages");
        for (_, mut child) in children {
            thread::spawn(move || {
                let _ = child.wait();
            });
        }
        let pgid = pgid.expect("pipeline spawned at least one stage");
        let job = shell.job_table().add_job(tail, pgid, &pipeline.input);
        println!("[{}] {}", job.id(), job.pid());
        return Ok(true);
    }

    // Wait in stage order, reporting each failure without abandoning the
    // remaining stages.
    for (program, mut child) in children {
        match child.wait() {
            Ok(status) if !status.success() => eprintln!("gosh: {}: {}", program, status),
            Ok(_) => {}
            Err(e) => eprintln!("gosh: {}: {}", program, e),
        }
    }

    Ok(true)
}

/// Spawns one stage in the pipeline's process group. With `pgid` of `None`
/// the stage becomes the leader of a fresh group; the resulting group id is
/// returned for subsequent stages and for job registration.
fn spawn_stage(
    command: &Command,
    stdin: Input,
    stdout: Output,
    pgid: Option<i32>,
) -> Result<(Child, i32)> {
    let program = &command.args[0];
    let mut process = process::Command::new(program);
    process.args(&command.args[1..]);
    process.stdin(stdin);
    process.stdout(stdout);

    let group = pgid.unwrap_or(0);
    unsafe {
        process.pre_exec(move || {
            // setpgid(0, 0) makes the first stage its own group leader;
            // later stages join that group.
            unistd::setpgid(Pid::from_raw(0), Pid::from_raw(group))
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            Ok(())
        });
    }

    let child = process.spawn().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::command_not_found(program)
        } else {
            Error::from(e.context(ErrorKind::Io))
        }
    })?;

    // Also set the group from the parent to close the fork/exec race. The
    // child may have already exec'd, in which case this fails benignly.
    let pgid = pgid.unwrap_or(child.id() as i32);
    if let Err(e) = unistd::setpgid(Pid::from_raw(child.id() as i32), Pid::from_raw(pgid)) {
        debug!("failed to set pgid ({}) for pid ({}): {}", pgid, child.id(), e);
    }

    Ok((child, pgid))
}

/// Wraps `unistd::pipe2()` to return RAII structs instead of raw, owning
/// file descriptors. Returns (`read_end`, `write_end`).
fn create_pipe() -> Result<(File, File)> {
    // Both ends are CLOEXEC: a stage sees only the ends dup'd onto its own
    // stdin/stdout, never another stage's. Without this every child would
    // inherit the read end of its own stdout pipe, so a writer whose reader
    // exited would block instead of taking EPIPE. The raw fds are moved
    // into `File`s immediately so they cannot leak.
    let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).context(ErrorKind::Pipe)?;
    unsafe { Ok((File::from_raw_fd(read_end), File::from_raw_fd(write_end))) }
}
