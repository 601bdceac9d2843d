//! Unit and behavioural tests for loader selection.


use funcworker_config::ConversionStrategy;
use rstest::rstest;
use serde_json::json;

use crate::{FunctionLoader, loader_for};

#[rstest]
#[case::signature(ConversionStrategy::Signature, "function id(x){ return x }")]
#[case::module(ConversionStrategy::Module, "return { handler = function(x) return x end }")]
fn configured_strategy_selects_loader(#[case] strategy: ConversionStrategy, #[case] source: &str) {
    let loader = loader_for(strategy, "handler");
    let unit = loader.load(source).expect("source matches its strategy");
    assert_eq!(unit.invoke(&json!([1, "two"])).expect("invokes"), json!([1, "two"]));
}

#[rstest]
#[case::signature_rejects_modules(
    ConversionStrategy::Signature,
    "return { handler = function(x) return x end }"
)]
#[case::module_rejects_bare_declarations(
    ConversionStrategy::Module,
    "function id(x){ return x }"
)]
fn strategies_are_not_interchangeable(#[case] strategy: ConversionStrategy, #[case] source: &str) {
    assert!(loader_for(strategy, "handler").load(source).is_err());
}

#[test]
fn boxed_loaders_delegate() {
    let boxed: Box<dyn FunctionLoader> = loader_for(ConversionStrategy::Signature, "handler");
    let twice_boxed = Box::new(boxed);
    let unit = twice_boxed
        .load("function inc(x){ return x + 1 }")
        .expect("loads through the box");
    assert_eq!(unit.invoke(&json!(1)).expect("invokes"), json!(2));
}
