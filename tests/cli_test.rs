//! Process-level behaviour of the `calc` binary: streams and exit status.

use std::process::{Command, Output};

use flagparse::exitcode;
use rstest::rstest;

fn calc(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_calc"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("FLAGPARSE_HELP__WIDTH")
        .output()
        .expect("run calc")
}

#[test]
fn given_zero_divisor_when_dividing_then_process_exits_one() {
    let output = calc(&["div", "1", "0"]);

    assert_eq!(output.status.code(), Some(exitcode::FAILURE));
    assert_eq!(String::from_utf8_lossy(&output.stderr), "division by zero\n");
    assert!(output.stdout.is_empty());
}

#[rstest]
#[case::sum(&["sum", "3", "4", "5"], "12\n")]
#[case::nested_alias(&["stats", "avg", "1", "2"], "1.50\n")]
fn given_valid_invocation_when_run_then_process_exits_zero(
    #[case] args: &[&str],
    #[case] stdout: &str,
) {
    let output = calc(args);

    assert_eq!(output.status.code(), Some(exitcode::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), stdout);
}

#[test]
fn given_unknown_option_when_run_then_process_exits_with_usage_code() {
    let output = calc(&["sum", "--frobnicate"]);

    assert_eq!(output.status.code(), Some(exitcode::USAGE));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}
