use crate::builtins::{self, BuiltinCommand};
use crate::errors::{Error, Result};
use crate::jobs::JobId;
use crate::shell::Shell;

pub struct Jobs;

impl BuiltinCommand for Jobs {
    const NAME: &'static str = builtins::JOBS_NAME;

    const HELP: &'static str = "\
jobs: jobs
    List the active (running and stopped) background jobs.";

    fn run(shell: &mut Shell, _args: &[String]) -> Result<bool> {
        // Table iteration order is unspecified; sort for stable display.
        let mut jobs = shell.job_table().get_active_jobs();
        jobs.sort_by_key(|job| job.id().0);
        for job in jobs {
            println!("{}", job);
        }
        Ok(true)
    }
}

pub struct Fg;

impl BuiltinCommand for Fg {
    const NAME: &'static str = builtins::FG_NAME;

    const HELP: &'static str = "\
fg: fg <job_id>
    Bring a background job to the foreground, continuing it if stopped, and
    wait for it to finish.";

    fn run(shell: &mut Shell, args: &[String]) -> Result<bool> {
        let id = parse_job_id(Self::NAME, args)?;
        shell
            .job_table()
            .bring_to_foreground(id)
            .map_err(|e| Error::builtin_command(format!("fg: {}", e)))?;
        Ok(true)
    }
}

pub struct Bg;

impl BuiltinCommand for Bg {
    const NAME: &'static str = builtins::BG_NAME;

    const HELP: &'static str = "\
bg: bg <job_id>
    Resume a stopped job in the background.";

    fn run(shell: &mut Shell, args: &[String]) -> Result<bool> {
        let id = parse_job_id(Self::NAME, args)?;
        shell
            .job_table()
            .send_to_background(id)
            .map_err(|e| Error::builtin_command(format!("bg: {}", e)))?;
        Ok(true)
    }
}

fn parse_job_id(name: &str, args: &[String]) -> Result<JobId> {
    let arg = args
        .first()
        .ok_or_else(|| Error::builtin_command(format!("{}: usage: {} <job_id>", name, name)))?;
    arg.parse::<u32>()
        .map(JobId)
        .map_err(|_| Error::builtin_command(format!("{}: invalid job ID: {}", name, arg)))
}
