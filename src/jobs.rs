//! Background job table.
//!
//! Backgrounded pipelines are tracked here as `Job`s. Each job owns one
//! monitor thread that blocks on the child's natural exit; that thread is
//! the only OS-level waiter on the process, so an explicit
//! `bring_to_foreground` never races it. Foreground waits block on a
//! condition variable that the monitor (or `kill_job`) signals when the job
//! transitions to `Done`.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::SystemTime;

use log::{debug, warn};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::errors::{Error, Result};

/// Exit code recorded when a job is terminated by `kill_job` rather than
/// exiting on its own.
pub const KILLED_EXIT_CODE: i32 = -1;

/// Job identifier. Assigned in strictly increasing order and never reused,
/// even after the job is removed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            JobState::Running => write!(f, "Running"),
            JobState::Stopped => write!(f, "Stopped"),
            JobState::Done => write!(f, "Done"),
        }
    }
}

/// Snapshot of one tracked background job.
#[derive(Clone, Debug)]
pub struct Job {
    id: JobId,
    pid: u32,
    pgid: i32,
    command: String,
    state: JobState,
    exit_code: Option<i32>,
    start_time: SystemTime,
}

impl Job {
    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn pgid(&self) -> i32 {
        self.pgid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Meaningful only once `state() == JobState::Done`.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    fn is_active(&self) -> bool {
        self.state != JobState::Done
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}]  {}\t\t{}", self.id, self.state, self.command)
    }
}

#[derive(Default)]
struct JobTableInner {
    jobs: HashMap<JobId, Job>,
    job_count: u32,
}

impl JobTableInner {
    fn next_job_id(&mut self) -> JobId {
        self.job_count += 1;
        JobId(self.job_count)
    }
}

/// Concurrent registry of background jobs.
///
/// The map and id counter are guarded by one mutex; every operation takes a
/// single lock for its whole read or write. Monitor threads share the table
/// through an `Arc`.
#[derive(Default)]
pub struct JobTable {
    inner: Mutex<JobTableInner>,
    exited: Condvar,
}

impl JobTable {
    pub fn new() -> Arc<JobTable> {
        Arc::new(JobTable::default())
    }

    /// Registers `child` as a new background job and starts its monitor
    /// thread. The child's process group must already be `pgid`; signals are
    /// later sent to the whole group.
    pub fn add_job(self: &Arc<Self>, child: Child, pgid: i32, command: &str) -> Job {
        let job = {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.next_job_id();
            let job = Job {
                id,
                pid: child.id(),
                pgid,
                command: command.to_string(),
                state: JobState::Running,
                exit_code: None,
                start_time: SystemTime::now(),
            };
            inner.jobs.insert(id, job.clone());
            job
        };

        let table = Arc::clone(self);
        let id = job.id;
        thread::spawn(move || table.monitor_job(id, child));

        job
    }

    pub fn get_job(&self, id: JobId) -> Option<Job> {
        self.inner.lock().unwrap().jobs.get(&id).cloned()
    }

    pub fn get_jobs(&self) -> Vec<Job> {
        self.inner.lock().unwrap().jobs.values().cloned().collect()
    }

    /// Jobs that are running or stopped.
    pub fn get_active_jobs(&self) -> Vec<Job> {
        self.inner
            .lock()
            .unwrap()
            .jobs
            .values()
            .filter(|job| job.is_active())
            .cloned()
            .collect()
    }

    pub fn has_jobs(&self) -> bool {
        !self.inner.lock().unwrap().jobs.is_empty()
    }

    /// Moves a job to the foreground: continues it if stopped, then blocks
    /// until the monitor observes its exit. Returns the exit code.
    pub fn bring_to_foreground(&self, id: JobId) -> Result<i32> {
        let mut inner = self.inner.lock().unwrap();

        {
            let job = inner
                .jobs
                .get_mut(&id)
                .ok_or_else(|| Error::job_not_found(id))?;
            match job.state {
                JobState::Done => return Err(Error::job_already_done(id)),
                JobState::Stopped => {
                    signal_group(job.pgid, Signal::SIGCONT)
                        .map_err(|_| Error::signal_delivery(id, "continue"))?;
                    job.state = JobState::Running;
                }
                JobState::Running => {}
            }
        }

        // The monitor thread is the sole waiter on the process; block here
        // on the completion event it fulfills.
        loop {
            match inner.jobs.get(&id) {
                None => return Err(Error::job_not_found(id)),
                Some(job) if job.state == JobState::Done => {
                    return Ok(job.exit_code.unwrap_or(KILLED_EXIT_CODE));
                }
                Some(_) => {}
            }
            inner = self.exited.wait(inner).unwrap();
        }
    }

    /// Resumes a stopped job in the background. Running jobs are left alone.
    pub fn send_to_background(&self, id: JobId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::job_not_found(id))?;

        match job.state {
            JobState::Done => Err(Error::job_already_done(id)),
            JobState::Stopped => {
                signal_group(job.pgid, Signal::SIGCONT)
                    .map_err(|_| Error::signal_delivery(id, "continue"))?;
                job.state = JobState::Running;
                Ok(())
            }
            JobState::Running => Ok(()),
        }
    }

    /// Stops a running job with SIGSTOP.
    pub fn stop_job(&self, id: JobId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::job_not_found(id))?;

        if job.state != JobState::Running {
            return Err(Error::job_not_running(id));
        }

        signal_group(job.pgid, Signal::SIGSTOP)
            .map_err(|_| Error::signal_delivery(id, "stop"))?;
        job.state = JobState::Stopped;
        Ok(())
    }

    /// Terminates a job with SIGTERM and records the forced-termination
    /// sentinel exit code.
    pub fn kill_job(&self, id: JobId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let job = inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| Error::job_not_found(id))?;

        if job.state == JobState::Done {
            return Err(Error::job_already_done(id));
        }

        signal_group(job.pgid, Signal::SIGTERM)
            .map_err(|_| Error::signal_delivery(id, "kill"))?;
        job.state = JobState::Done;
        job.exit_code = Some(KILLED_EXIT_CODE);
        self.exited.notify_all();
        Ok(())
    }

    /// Removes every job currently in state `Done`. Removal is never
    /// automatic on completion; callers decide when to purge.
    pub fn cleanup_done_jobs(&self) -> Vec<Job> {
        let mut inner = self.inner.lock().unwrap();
        let done_ids: Vec<JobId> = inner
            .jobs
            .values()
            .filter(|job| !job.is_active())
            .map(|job| job.id)
            .collect();

        let mut removed: Vec<Job> = done_ids
            .iter()
            .filter_map(|id| inner.jobs.remove(id))
            .collect();
        removed.sort_by_key(|job| job.id.0);
        removed
    }

    /// Blocks on the child's natural exit, then marks the job done. One
    /// instance runs per job; it owns the `Child` handle exclusively.
    fn monitor_job(&self, id: JobId, mut child: Child) {
        self.finish_job(id, child.wait());
    }

    /// Records a job's completion and wakes foreground waiters. The
    /// completion event fires even when the wait itself failed; the job is
    /// unobservable past that point and must not stay active.
    fn finish_job(&self, id: JobId, status: io::Result<ExitStatus>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.get_mut(&id) {
            // `Done` is terminal; a kill that already marked the job keeps
            // its sentinel exit code.
            if job.state != JobState::Done {
                match status {
                    Ok(status) => {
                        job.state = JobState::Done;
                        job.exit_code = Some(crate::util::exit_status_code(status));
                        debug!("job {} exited with {:?}", id, job.exit_code);
                    }
                    Err(e) => {
                        warn!("failed to wait for job {}: {}", id, e);
                        job.state = JobState::Done;
                    }
                }
            }
        }
        self.exited.notify_all();
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        writeln!(f, "{} jobs\tjob_count: {}", inner.jobs.len(), inner.job_count)?;
        for job in inner.jobs.values() {
            writeln!(f, "{:?}", job)?;
        }
        Ok(())
    }
}

/// Signals every process in `pgid`'s group.
fn signal_group(pgid: i32, signal: Signal) -> nix::Result<()> {
    signal::kill(Pid::from_raw(-pgid), signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};
    use std::time::{Duration, Instant};

    /// Spawns a child in its own process group so group signals in these
    /// tests cannot reach the test runner.
    fn spawn_in_own_group(program: &str, args: &[&str]) -> Child {
        let mut command = Command::new(program);
        command.args(args).stdout(Stdio::null());
        unsafe {
            command.pre_exec(|| {
                nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0))
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                Ok(())
            });
        }
        command.spawn().expect("failed to spawn test child")
    }

    fn add_sleep_job(table: &Arc<JobTable>, seconds: &str) -> Job {
        let child = spawn_in_own_group("sleep", &[seconds]);
        let pgid = child.id() as i32;
        table.add_job(child, pgid, &format!("sleep {}", seconds))
    }

    fn wait_for_state(table: &Arc<JobTable>, id: JobId, state: JobState) -> Job {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let job = table.get_job(id).expect("job disappeared");
            if job.state() == state {
                return job;
            }
            assert!(Instant::now() < deadline, "timed out waiting for {}", state);
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn ids_strictly_increase_and_are_never_reused() {
        let table = JobTable::new();
        let first = add_sleep_job(&table, "30");
        let second = add_sleep_job(&table, "30");
        assert_eq!(first.id(), JobId(1));
        assert_eq!(second.id(), JobId(2));

        table.kill_job(first.id()).unwrap();
        table.kill_job(second.id()).unwrap();
        let removed = table.cleanup_done_jobs();
        assert_eq!(removed.len(), 2);
        assert!(!table.has_jobs());

        let third = add_sleep_job(&table, "30");
        assert_eq!(third.id(), JobId(3));
        table.kill_job(third.id()).unwrap();
    }

    #[test]
    fn monitor_marks_natural_exit_done() {
        let table = JobTable::new();
        let child = spawn_in_own_group("true", &[]);
        let pgid = child.id() as i32;
        let job = table.add_job(child, pgid, "true");

        let done = wait_for_state(&table, job.id(), JobState::Done);
        assert_eq!(done.exit_code(), Some(0));
    }

    #[test]
    fn bring_to_foreground_blocks_until_exit() {
        let table = JobTable::new();
        let job = add_sleep_job(&table, "0.2");

        let code = table.bring_to_foreground(job.id()).unwrap();
        assert_eq!(code, 0);
        let done = table.get_job(job.id()).unwrap();
        assert_eq!(done.state(), JobState::Done);
    }

    #[test]
    fn stop_resume_foreground_lifecycle() {
        let table = JobTable::new();
        let job = add_sleep_job(&table, "0.5");

        table.stop_job(job.id()).unwrap();
        assert_eq!(table.get_job(job.id()).unwrap().state(), JobState::Stopped);

        // Stopping a job that is not running fails.
        let err = table.stop_job(job.id()).unwrap_err();
        assert_eq!(
            *err.kind(),
            crate::errors::ErrorKind::JobNotRunning(job.id())
        );

        // Foreground continues the stopped job and waits for its exit.
        table.bring_to_foreground(job.id()).unwrap();
        assert_eq!(table.get_job(job.id()).unwrap().state(), JobState::Done);
    }

    #[test]
    fn send_to_background_resumes_stopped_job() {
        let table = JobTable::new();
        let job = add_sleep_job(&table, "30");

        table.stop_job(job.id()).unwrap();
        table.send_to_background(job.id()).unwrap();
        assert_eq!(table.get_job(job.id()).unwrap().state(), JobState::Running);

        // Backgrounding a running job is a no-op success.
        table.send_to_background(job.id()).unwrap();

        table.kill_job(job.id()).unwrap();
    }

    #[test]
    fn kill_succeeds_from_running_and_stopped() {
        let table = JobTable::new();

        let running = add_sleep_job(&table, "30");
        table.kill_job(running.id()).unwrap();
        let job = table.get_job(running.id()).unwrap();
        assert_eq!(job.state(), JobState::Done);
        assert_eq!(job.exit_code(), Some(KILLED_EXIT_CODE));

        let stopped = add_sleep_job(&table, "30");
        table.stop_job(stopped.id()).unwrap();
        table.kill_job(stopped.id()).unwrap();
        assert_eq!(
            table.get_job(stopped.id()).unwrap().state(),
            JobState::Done
        );
    }

    #[test]
    fn terminal_and_missing_jobs_are_rejected() {
        let table = JobTable::new();
        let job = add_sleep_job(&table, "30");
        table.kill_job(job.id()).unwrap();

        use crate::errors::ErrorKind;
        let id = job.id();
        assert_eq!(
            *table.kill_job(id).unwrap_err().kind(),
            ErrorKind::JobAlreadyDone(id)
        );
        assert_eq!(
            *table.bring_to_foreground(id).unwrap_err().kind(),
            ErrorKind::JobAlreadyDone(id)
        );
        assert_eq!(
            *table.send_to_background(id).unwrap_err().kind(),
            ErrorKind::JobAlreadyDone(id)
        );

        let missing = JobId(99);
        assert_eq!(
            *table.stop_job(missing).unwrap_err().kind(),
            ErrorKind::JobNotFound(missing)
        );
        assert_eq!(
            *table.bring_to_foreground(missing).unwrap_err().kind(),
            ErrorKind::JobNotFound(missing)
        );
    }

    #[test]
    fn wait_failure_still_fires_the_completion_event() {
        let table = JobTable::new();
        let job = add_sleep_job(&table, "30");

        let waiter = {
            let table = Arc::clone(&table);
            let id = job.id();
            thread::spawn(move || table.bring_to_foreground(id))
        };
        // Give the waiter time to block on the completion event.
        thread::sleep(Duration::from_millis(50));

        table.finish_job(
            job.id(),
            Err(io::Error::new(io::ErrorKind::Other, "wait failed")),
        );

        // A stranded waiter would never return from join.
        let code = waiter.join().unwrap().unwrap();
        assert_eq!(code, KILLED_EXIT_CODE);
        assert_eq!(table.get_job(job.id()).unwrap().state(), JobState::Done);

        signal_group(job.pgid(), Signal::SIGKILL).unwrap();
    }

    #[test]
    fn active_jobs_excludes_done() {
        let table = JobTable::new();
        let running = add_sleep_job(&table, "30");
        let finished = add_sleep_job(&table, "30");
        table.kill_job(finished.id()).unwrap();

        let active = table.get_active_jobs();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), running.id());
        assert_eq!(table.get_jobs().len(), 2);

        table.kill_job(running.id()).unwrap();
    }
}
