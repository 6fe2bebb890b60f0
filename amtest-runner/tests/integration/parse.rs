// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use amtest_runner::instrument::{
    FieldValue, NO_RESULT_MESSAGE, ParsedBlock, StatusBlockSplitter, TestCaseResult, TestIdentity,
    TestOutcome, parse_results,
};
use indoc::indoc;
use pretty_assertions::assert_eq;
use proptest::{collection::vec, prelude::*};
use std::fmt::Write;
use test_strategy::proptest;

fn parse_blocks(output: &str) -> Vec<ParsedBlock> {
    StatusBlockSplitter::new(output)
        .map(ParsedBlock::parse)
        .collect()
}

#[test]
fn transcripts_reduce_to_results() {
    let pass: Vec<_> = parse_results(PASS_TRANSCRIPT).collect();
    assert_eq!(
        pass,
        vec![TestCaseResult {
            identity: TestIdentity::new(Some("org.example.PassTest"), Some("testPass")),
            outcome: TestOutcome::Pass,
            stack: None,
            message: None,
        }]
    );

    let fail: Vec<_> = parse_results(FAIL_TRANSCRIPT).collect();
    assert_eq!(fail.len(), 1);
    assert_eq!(fail[0].outcome, TestOutcome::Fail);
    assert_eq!(
        fail[0].stack.as_deref(),
        Some(indoc! {"
            junit.framework.AssertionFailedError: expected:<1> but was:<2>
            at org.example.FailTest.testFail(FailTest.java:12)"}),
    );

    let crash: Vec<_> = parse_results(CRASH_TRANSCRIPT).collect();
    assert_eq!(
        crash,
        vec![TestCaseResult {
            identity: TestIdentity::new(Some("org.example.CrashTest"), Some("testCrash")),
            outcome: TestOutcome::Crash,
            stack: Some("Process crashed.".to_owned()),
            message: None,
        }]
    );
}

#[test]
fn performance_prefix_is_stripped_and_coerced() {
    let blocks = parse_blocks(indoc! {"
        INSTRUMENTATION_STATUS: class=org.example.PerfTest
        INSTRUMENTATION_STATUS: test=testSpeed
        INSTRUMENTATION_STATUS: performance.foo=1.5
        INSTRUMENTATION_STATUS_CODE: 0
        INSTRUMENTATION_RESULT: performance.cpu_time=42
        INSTRUMENTATION_RESULT: stream=done
        INSTRUMENTATION_CODE: -1
    "});
    assert_eq!(blocks.len(), 2);

    let ParsedBlock::Status(record) = &blocks[0] else {
        panic!("first block is a status record: {:?}", blocks[0]);
    };
    assert_eq!(record.field("foo"), Some(&FieldValue::Number(1.5)));
    assert_eq!(record.field("performance.foo"), None);

    let ParsedBlock::Finished(bundle) = &blocks[1] else {
        panic!("second block is the finished bundle: {:?}", blocks[1]);
    };
    assert!(bundle.is_ok());
    assert_eq!(bundle.field("cpu_time"), Some(&FieldValue::Number(42.0)));
    assert_eq!(
        bundle.field("stream"),
        Some(&FieldValue::Text("done".to_owned()))
    );
}

#[test]
fn bundle_without_code_recovers() {
    let blocks = parse_blocks(indoc! {"
        INSTRUMENTATION_RESULT: stream=partial output
    "});
    let [ParsedBlock::Unterminated(bundle)] = blocks.as_slice() else {
        panic!("expected a single unterminated bundle: {blocks:?}");
    };
    assert_eq!(bundle.code(), 0);
    assert!(!bundle.code_reported());
    assert_eq!(
        bundle.field("shortMsg"),
        Some(&FieldValue::Text(NO_RESULT_MESSAGE.to_owned()))
    );
}

#[test]
fn truncated_after_in_progress_crashes_once() {
    let results: Vec<_> = parse_results(indoc! {"
        INSTRUMENTATION_STATUS: class=org.example.FooTest
        INSTRUMENTATION_STATUS: test=testOne
        INSTRUMENTATION_STATUS_CODE: 0
        INSTRUMENTATION_STATUS: class=org.example.FooTest
        INSTRUMENTATION_STATUS: test=testTwo
        INSTRUMENTATION_STATUS_CODE: 1
    "})
    .collect();

    let outcomes: Vec<_> = results
        .iter()
        .map(|result| (result.identity.to_string(), result.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("org.example.FooTest#testOne".to_owned(), TestOutcome::Pass),
            ("org.example.FooTest#testTwo".to_owned(), TestOutcome::Crash),
        ]
    );
}

#[derive(Clone, Debug)]
struct GeneratedCase {
    class: String,
    method: String,
    code: i32,
}

fn arb_case() -> impl Strategy<Value = GeneratedCase> {
    (
        "org\\.example\\.[A-Z][a-zA-Z]{0,12}Test",
        "test[A-Z][a-zA-Z0-9]{0,12}",
        prop_oneof![Just(0), Just(-1), Just(-2)],
    )
        .prop_map(|(class, method, code)| GeneratedCase {
            class,
            method,
            code,
        })
}

fn transcript(cases: &[GeneratedCase]) -> String {
    let mut out = String::new();
    for case in cases {
        for code in [1, case.code] {
            writeln!(out, "INSTRUMENTATION_STATUS: class={}", case.class).unwrap();
            writeln!(out, "INSTRUMENTATION_STATUS: test={}", case.method).unwrap();
            if code < 0 {
                writeln!(out, "INSTRUMENTATION_STATUS: stack=java.lang.Exception").unwrap();
                writeln!(out, "at {}.{}({}.java:1)", case.class, case.method, case.method).unwrap();
            }
            writeln!(out, "INSTRUMENTATION_STATUS_CODE: {code}").unwrap();
        }
    }
    writeln!(out, "INSTRUMENTATION_RESULT: stream=").unwrap();
    writeln!(out, "Test results for InstrumentationTestRunner=.").unwrap();
    writeln!(out, "INSTRUMENTATION_CODE: -1").unwrap();
    out
}

#[proptest(cases = 64)]
fn well_formed_blocks_yield_one_result_each(
    #[strategy(vec(arb_case(), 0..8))] cases: Vec<GeneratedCase>,
) {
    let output = transcript(&cases);
    let results: Vec<_> = parse_results(&output).collect();

    assert_eq!(results.len(), cases.len());
    for (case, result) in cases.iter().zip(&results) {
        let expected = match case.code {
            0 => TestOutcome::Pass,
            -1 => TestOutcome::Error,
            -2 => TestOutcome::Fail,
            other => panic!("generated unexpected code {other}"),
        };
        assert_eq!(result.outcome, expected);
        assert_eq!(result.identity.class(), Some(case.class.as_str()));
        assert_eq!(result.identity.method(), Some(case.method.as_str()));
        assert_eq!(result.stack.is_some(), case.code < 0);
    }
}

#[proptest(cases = 64)]
fn parsing_is_idempotent(
    #[strategy(vec(arb_case(), 0..8))] cases: Vec<GeneratedCase>,
    #[strategy(0usize..64)] truncate_at: usize,
) {
    let mut output = transcript(&cases);
    // Cut at a line boundary to exercise the truncated paths too.
    let keep = output
        .match_indices('\n')
        .nth(truncate_at)
        .map_or(output.len(), |(idx, _)| idx + 1);
    output.truncate(keep);

    let first: Vec<_> = parse_results(&output).collect();
    let second: Vec<_> = parse_results(&output).collect();
    assert_eq!(first, second);
}
