//! Gosh - an interactive command shell.
//!
//! The crate is organized around three pieces: the command model and parser
//! (`parse`), the pipeline executor (`executor`), and the job table (`jobs`).
//! The `Shell` type ties them together with a read-eval loop and the builtin
//! command set.

pub mod builtins;
mod editor;
pub mod errors;
pub mod executor;
pub mod jobs;
pub mod parse;
mod shell;
mod util;

pub use crate::jobs::{Job, JobId, JobState, JobTable};
pub use crate::shell::{Shell, ShellConfig};
