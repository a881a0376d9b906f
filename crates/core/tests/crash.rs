//! Crash-class signals: the process logs one critical line and then dies by
//! the signal itself.
//!
//! Each scenario re-executes this test binary filtered to a single child test
//! that raises SIGABRT, and inspects how the child died.

use std::os::unix::process::ExitStatusExt;
use std::process::{Command, Output};

use nix::sys::signal::{self, Signal};
use rtsp_test_server::Lifecycle;
use rtsp_test_server::lifecycle;

const CHILD_ENV: &str = "RTSP_TEST_SERVER_CRASH_CHILD";

fn run_child(test: &str, mode: &str) -> Output {
    let exe = std::env::current_exe().expect("current test binary");
    Command::new(exe)
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, mode)
        .output()
        .expect("spawn child")
}

#[test]
fn crash_child() {
    let Some(mode) = std::env::var_os(CHILD_ENV) else {
        return;
    };
    if mode == "logged" {
        lifecycle::mark_logger_ready();
    }
    Lifecycle::process()
        .install_crash_handlers()
        .expect("install crash handlers");
    let _ = signal::raise(Signal::SIGABRT);
    panic!("returned from SIGABRT");
}

#[test]
fn crash_signal_is_logged_then_reraised() {
    let output = run_child("crash_child", "logged");
    assert_eq!(output.status.signal(), Some(Signal::SIGABRT as i32));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!(
        "Server crashed with signal {} (SIGABRT)",
        Signal::SIGABRT as i32
    );
    assert_eq!(stdout.matches(&expected).count(), 1, "stdout: {stdout}");
    let line = stdout
        .lines()
        .find(|l| l.contains(&expected))
        .expect("crash line");
    assert!(
        line.contains("Z ERROR rtsp_test_server::lifecycle: "),
        "line: {line}"
    );
    assert!(!stdout.contains("returned from SIGABRT"));
}

#[test]
fn crash_before_logger_ready_still_terminates() {
    let output = run_child("crash_child", "silent");
    assert_eq!(output.status.signal(), Some(Signal::SIGABRT as i32));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Server crashed"), "stdout: {stdout}");
}
