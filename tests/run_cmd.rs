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

const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.";

#[test]
fn runs_positional_code() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("run").arg(HELLO)
        .assert()
        .success()
        .stdout("Hello World!\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn positional_parts_are_concatenated() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .args(["run", "++++++++[>++++++++<-]", ">+."])
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn runs_code_from_file_with_comments() {
    let tf = source_file("Print an A\n++++++++ [>++++++++<-]\n>+. done\n");
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("run").arg("--file").arg(tf.path())
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn input_reads_stdin_bytes() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .args(["run", ",.,."])
        .write_stdin("Zq")
        .assert()
        .success()
        .stdout("Zq\n");
}

#[test]
fn input_at_eof_reads_zero() {
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .args(["run", "+,."])
        .write_stdin("")
        .assert()
        .success()
        .stdout("\u{0}\n");
}

#[test]
fn tape_grows_to_the_left() {
    // Build an A two thousand cells left of the start
    let code = format!("{}{}.", "<".repeat(2000), "+".repeat(65));
    cargo_bin()
        .timeout(Duration::from_secs(5))
        .arg("run").arg(code)
        .assert()
        .success()
        .stdout("A\n");
}

#[test]
fn missing_code_prints_usage() {
    cargo_bin()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn help_exits_zero() {
    cargo_bin()
        .args(["run", "--help"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("--file"));
}

#[test]
fn file_and_positional_code_conflict() {
    let tf = source_file("+");
    cargo_bin()
        .arg("run").arg("--file").arg(tf.path()).arg("+")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot use positional code together with --file"));
}

#[test]
fn unreadable_file_fails() {
    cargo_bin()
        .args(["run", "--file", "/definitely/not/here.bf"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read code file"));
}

#[test]
fn no_subcommand_prints_top_usage() {
    cargo_bin()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("debug [--bare|--editor] <PATH>"));
}
