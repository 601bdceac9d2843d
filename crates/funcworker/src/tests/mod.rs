//! End-to-end tests of the worker with the real loaders.


use std::io::Cursor;

use funcworker_config::ConversionStrategy;
use funcworker_loader::loader_for;
use rstest::rstest;

use crate::{Worker, WorkerOptions, run_worker};

fn run(strategy: ConversionStrategy, input: &str) -> Vec<String> {
    let mut writer = Vec::new();
    run_worker(
        &mut Cursor::new(input.as_bytes().to_vec()),
        &mut writer,
        Worker::new(loader_for(strategy, "handler"), WorkerOptions::default()),
    )
    .expect("protocol completes");
    String::from_utf8(writer)
        .expect("utf8 output")
        .lines()
        .map(str::to_owned)
        .collect()
}

#[rstest]
#[case::signature(ConversionStrategy::Signature, "function id(x){ return x }")]
#[case::module(ConversionStrategy::Module, "exports.handler = function(x) return x end")]
fn identity_round_trip(#[case] strategy: ConversionStrategy, #[case] source: &str) {
    let function = serde_json::json!({"type": "function", "data": source}).to_string();
    let input = format!("{function}\n{{\"type\":\"request\",\"data\":42}}\n");

    let output = run(strategy, &input);

    assert_eq!(
        output,
        [
            r#"{"type":"started","data":""}"#,
            r#"{"type":"function_loaded","data":true}"#,
            r#"{"type":"response","data":42}"#,
        ]
    );
}

#[test]
fn unknown_types_are_silent_in_both_states() {
    let input = concat!(
        "{\"type\":\"ping\",\"data\":1}\n",
        "{\"type\":\"function\",\"data\":\"function id(x){ return x }\"}\n",
        "{\"type\":\"ping\",\"data\":2}\n",
        "{\"type\":\"request\",\"data\":[1,2]}\n",
    );

    let output = run(ConversionStrategy::Signature, input);

    assert_eq!(
        output,
        [
            r#"{"type":"started","data":""}"#,
            r#"{"type":"function_loaded","data":true}"#,
            r#"{"type":"response","data":[1,2]}"#,
        ]
    );
}

#[test]
fn extra_inbound_fields_are_ignored() {
    let input = concat!(
        "{\"type\":\"function\",\"data\":\"function id(x){ return x }\",\"id\":7}\n",
        "{\"type\":\"request\",\"data\":\"ok\",\"trace\":\"abc\"}\n",
    );

    let output = run(ConversionStrategy::Signature, input);

    assert_eq!(output.last().map(String::as_str), Some(r#"{"type":"response","data":"ok"}"#));
}
