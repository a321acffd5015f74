use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn cargo_bin() -> Command { Command::cargo_bin("bfdb").unwrap() }

fn source_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

fn debug_session(source: &str, commands: &str) -> assert_cmd::assert::Assert {
    let tf = source_file(source);
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("debug").arg("--bare").arg(tf.path())
        .write_stdin(commands.to_string())
        .assert()
}

#[test]
fn breakpoint_suspends_each_loop_iteration() {
    debug_session("+++\n[\n-\n]\n", "b 3\nr\np\nc\np\nq\n")
        .success()
        .stdout(
            predicate::str::contains("Breakpoint added at line 3")
                .and(predicate::str::contains("Hit breakpoint at line 3"))
                .and(predicate::str::contains("[3]"))
                .and(predicate::str::contains("[2]")),
        );
}

#[test]
fn run_to_completion_reports_finish() {
    debug_session("++++>++[-]\n", "r\nt\n")
        .success()
        .stdout(
            predicate::str::contains("Running finished")
                .and(predicate::str::contains("Current memory pointer: 1"))
                .and(predicate::str::contains("4 [0] 0")),
        );
}

#[test]
fn watch_fires_once_per_dwell() {
    debug_session("+\n+\n", "w 0\nr\nc\nq\n")
        .success()
        .stdout(
            predicate::str::contains("Watching memory 0")
                .and(predicate::str::contains("Watch hit at address 0").count(1))
                .and(predicate::str::contains("Running finished")),
        );
}

#[test]
fn continue_before_run_is_refused() {
    debug_session("+\n", "c\nq\n")
        .success()
        .stdout(predicate::str::contains("Code is not running. Use 'run' command to start."));
}

#[test]
fn program_output_and_input_share_the_terminal() {
    // The `,` consumes the byte after the `r` command line.
    debug_session(",.\n", "r\nZ\nq\n")
        .success()
        .stdout(
            predicate::str::contains("Z")
                .and(predicate::str::contains("Running finished")),
        );
}

#[test]
fn until_stops_at_loop_exit() {
    debug_session("++\n[\n-\n]\n+\n", "s 3\nu\nn\nq\n")
        .success()
        .stdout(
            predicate::str::contains("Until finished")
                .and(predicate::str::contains("4        Increment")),
        );
}

#[test]
fn stop_point_is_reported_once() {
    debug_session("+\n+\n+\n", "stop 2\nr\nstop\nc\n")
        .success()
        .stdout(
            predicate::str::contains("Reached stop point at operator index 2")
                .and(predicate::str::contains("No stop point set now."))
                .and(predicate::str::contains("Running finished")),
        );
}

#[test]
fn code_listing_shows_loop_labels() {
    debug_session("+[\n>[-]<\n-]\n", "code\nq\n")
        .success()
        .stdout(
            predicate::str::contains("L1:")
                .and(predicate::str::contains("L2 End"))
                .and(predicate::str::contains("Line\tBegin")),
        );
}

#[test]
fn eof_ends_the_session_cleanly() {
    debug_session("+\n", "")
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn empty_loop_warning_goes_to_stderr() {
    debug_session("[]+\n", "q\n")
        .success()
        .stderr(predicate::str::contains("warning: empty loop at line 1"));
}

#[test]
fn env_selects_bare_mode() {
    let tf = source_file("+\n");
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .env("BFDB_SHELL_MODE", "bare")
        .arg("debug").arg(tf.path())
        .write_stdin("r\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Running finished"));
}

#[test]
fn forced_editor_on_non_tty_errors() {
    let tf = source_file("+\n");
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("debug").arg("--editor").arg(tf.path())
        .write_stdin("q\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a TTY"));
}

#[test]
fn missing_path_prints_usage() {
    cargo_bin()
        .arg("debug")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}
