use std::io;
use std::os::unix::io::AsRawFd;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

/// Collapses an `ExitStatus` into a single code, mapping death-by-signal to
/// the conventional `128 + signal`.
pub fn exit_status_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

pub fn isatty() -> bool {
    nix::unistd::isatty(io::stdin().as_raw_fd()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_from_normal_exit() {
        assert_eq!(exit_status_code(ExitStatus::from_raw(0)), 0);
        // Wait status encodes the exit code in the high byte.
        assert_eq!(exit_status_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn code_from_signal() {
        // Terminated by SIGTERM (15).
        assert_eq!(exit_status_code(ExitStatus::from_raw(15)), 143);
    }
}
