//! Integration tests for the `funcworker` binary over real pipes.

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::{contains, is_empty};
use tempfile::NamedTempFile;

const STARTED: &str = "{\"type\":\"started\",\"data\":\"\"}\n";

#[test]
fn identity_function_round_trips_over_stdio() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"function id(x){ return x }\"}\n",
        "{\"type\":\"request\",\"data\":42}\n",
    ));
    command.assert().success().stdout(concat!(
        "{\"type\":\"started\",\"data\":\"\"}\n",
        "{\"type\":\"function_loaded\",\"data\":true}\n",
        "{\"type\":\"response\",\"data\":42}\n",
    ));
}

#[test]
fn empty_input_only_announces_and_exits_cleanly() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.write_stdin("");
    command.assert().success().stdout(STARTED);
}

#[test]
fn malformed_lines_never_reach_stdout() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.write_stdin("{not json\n\n{\"type\":\"request\"}\n");
    command.assert().success().stdout(STARTED);
}

#[test]
fn crash_policy_exits_with_failure() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"function f(x){ error('boom', 0) }\"}\n",
        "{\"type\":\"request\",\"data\":1}\n",
    ));
    command
        .assert()
        .failure()
        .code(1)
        .stderr(contains("boom"));
}

#[test]
fn report_policy_from_environment_keeps_serving() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.env("FUNCWORKER_ON_INVOKE_ERROR", "report");
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"function f(x){ if x < 0 then error('negative', 0) end return x }\"}\n",
        "{\"type\":\"request\",\"data\":-1}\n",
        "{\"type\":\"request\",\"data\":3}\n",
    ));
    command.assert().success().stdout(concat!(
        "{\"type\":\"started\",\"data\":\"\"}\n",
        "{\"type\":\"function_loaded\",\"data\":true}\n",
        "{\"type\":\"error\",\"data\":\"function raised: negative\"}\n",
        "{\"type\":\"response\",\"data\":3}\n",
    ));
}

#[test]
fn module_strategy_from_config_file() {
    let mut file = NamedTempFile::new().expect("create config file");
    writeln!(file, "strategy = \"module\"\nentry_point = \"main\"").expect("write config");

    let mut command = cargo_bin_cmd!("funcworker");
    command.env("FUNCWORKER_CONFIG_PATH", file.path());
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"return { main = function(x) return x * 3 end }\"}\n",
        "{\"type\":\"request\",\"data\":5}\n",
    ));
    command.assert().success().stdout(concat!(
        "{\"type\":\"started\",\"data\":\"\"}\n",
        "{\"type\":\"function_loaded\",\"data\":true}\n",
        "{\"type\":\"response\",\"data\":15}\n",
    ));
}

#[test]
fn invalid_configuration_fails_before_announcing() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.env("FUNCWORKER_STRATEGY", "telepathy");
    command.write_stdin("");
    command
        .assert()
        .failure()
        .stdout(is_empty())
        .stderr(contains("configuration"));
}

#[test]
fn printed_output_goes_to_stderr() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.env("FUNCWORKER_LOG_FORMAT", "compact");
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"function f(x){ print('side channel') return x }\"}\n",
        "{\"type\":\"request\",\"data\":true}\n",
    ));
    command
        .assert()
        .success()
        .stdout(concat!(
            "{\"type\":\"started\",\"data\":\"\"}\n",
            "{\"type\":\"function_loaded\",\"data\":true}\n",
            "{\"type\":\"response\",\"data\":true}\n",
        ))
        .stderr(contains("side channel"));
}

#[test]
fn written_output_stays_off_the_protocol_stream() {
    let mut command = cargo_bin_cmd!("funcworker");
    command.env("FUNCWORKER_LOG_FORMAT", "compact");
    command.write_stdin(concat!(
        "{\"type\":\"function\",\"data\":\"function f(x){ io.write('junk') io.stdout:write('more') return x }\"}\n",
        "{\"type\":\"request\",\"data\":1}\n",
    ));
    command
        .assert()
        .success()
        .stdout(concat!(
            "{\"type\":\"started\",\"data\":\"\"}\n",
            "{\"type\":\"function_loaded\",\"data\":true}\n",
            "{\"type\":\"response\",\"data\":1}\n",
        ))
        .stderr(contains("junk"));
}
