//! Error module. See the [failure](https://crates.io/crates/failure) crate
//! for details.

use std::fmt;
use std::io;
use std::result;

use failure::{Backtrace, Context, Fail};

use crate::jobs::JobId;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    ctx: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.ctx.get_context()
    }

    pub(crate) fn command_not_found<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::CommandNotFound(command.as_ref().to_string()))
    }

    pub(crate) fn redirection<T: AsRef<str>>(file: T, cause: &io::Error) -> Error {
        Error::from(ErrorKind::Redirection(format!(
            "{}: {}",
            file.as_ref(),
            cause
        )))
    }

    pub(crate) fn unpipeable_builtin<T: AsRef<str>>(command: T) -> Error {
        Error::from(ErrorKind::UnpipeableBuiltin(command.as_ref().to_string()))
    }

    pub(crate) fn job_not_found(id: JobId) -> Error {
        Error::from(ErrorKind::JobNotFound(id))
    }

    pub(crate) fn job_already_done(id: JobId) -> Error {
        Error::from(ErrorKind::JobAlreadyDone(id))
    }

    pub(crate) fn job_not_running(id: JobId) -> Error {
        Error::from(ErrorKind::JobNotRunning(id))
    }

    pub(crate) fn signal_delivery(id: JobId, action: &'static str) -> Error {
        Error::from(ErrorKind::SignalDelivery { job: id, action })
    }

    pub(crate) fn builtin_command<T: AsRef<str>>(message: T) -> Error {
        Error::from(ErrorKind::Builtin(message.as_ref().to_string()))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.ctx.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.ctx.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.ctx.fmt(f)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// External program could not be found or executed.
    CommandNotFound(String),
    /// Opening or creating a redirection file failed.
    Redirection(String),
    /// Creating an inter-stage pipe failed.
    Pipe,
    /// A builtin appeared as a stage of a multi-command pipeline.
    UnpipeableBuiltin(String),
    /// A job-control operation referenced an unknown job id.
    JobNotFound(JobId),
    /// A job-control operation referenced a job that already completed.
    JobAlreadyDone(JobId),
    /// `stop` requires the job to be running.
    JobNotRunning(JobId),
    /// A stop/continue/terminate syscall failed.
    SignalDelivery { job: JobId, action: &'static str },
    /// A builtin command failed; the message carries the builtin's own prefix.
    Builtin(String),
    Io,
    Readline,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::CommandNotFound(ref command) => {
                write!(f, "{}: command not found", command)
            }
            ErrorKind::Redirection(ref message) => write!(f, "{}", message),
            ErrorKind::Pipe => write!(f, "failed to create pipe"),
            ErrorKind::UnpipeableBuiltin(ref command) => {
                write!(f, "cannot pipe builtin command: {}", command)
            }
            ErrorKind::JobNotFound(id) => write!(f, "job {} not found", id),
            ErrorKind::JobAlreadyDone(id) => write!(f, "job {} is already done", id),
            ErrorKind::JobNotRunning(id) => write!(f, "job {} is not running", id),
            ErrorKind::SignalDelivery { job, action } => {
                write!(f, "failed to {} job {}", action, job)
            }
            ErrorKind::Builtin(ref message) => write!(f, "{}", message),
            ErrorKind::Io => write!(f, "I/O error occurred"),
            ErrorKind::Readline => write!(f, "Readline error occurred"),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(ctx: Context<ErrorKind>) -> Error {
        Error { ctx }
    }
}
