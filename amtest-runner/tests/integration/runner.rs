// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use amtest_runner::{
    errors::InstallError,
    instrument::TestOutcome,
    manifest::{ManifestResolver, StaticManifest, TestDescriptor},
    reporter::TbplDisplayer,
    runner::{INSTRUMENTATION_SUBTEST, InstrumentationRunner, InvocationStatus, RunStats},
    transport::install_packages,
};
use color_eyre::eyre::Result;
use pretty_assertions::assert_eq;
use std::io;

fn instrument_command() -> Vec<String> {
    ["am", "instrument", "-w", "-r"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[test]
fn pass_fail_crash_suite() -> Result<()> {
    let tests = StaticManifest::new([
        descriptor("PassTest", "org.example.PassTest"),
        descriptor("FailTest", "org.example.FailTest"),
        descriptor("CrashTest", "org.example.CrashTest"),
    ])
    .resolve()?;
    let transport = FakeTransport::default()
        .with_output("org.example.PassTest", PASS_TRANSCRIPT)
        .with_output("org.example.FailTest", FAIL_TRANSCRIPT)
        .with_output("org.example.CrashTest", CRASH_TRANSCRIPT);
    let mut log = RecordingLog::default();

    let run = InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut log)?;

    let expected_stats = RunStats {
        passed: 1,
        failed: 2,
        skipped: 0,
    };
    assert_eq!(run.stats, expected_stats);
    assert!(!run.stats.is_success());
    let statuses: Vec<_> = run.invocations.iter().map(|inv| inv.status).collect();
    assert_eq!(
        statuses,
        vec![
            InvocationStatus::Ok,
            InvocationStatus::Fail,
            InvocationStatus::Crash,
        ]
    );

    let pass_id = "src/org/example/PassTest.java";
    let fail_id = "src/org/example/FailTest.java";
    let crash_id = "src/org/example/CrashTest.java";
    assert_eq!(
        log.test_events(),
        vec![
            Recorded::SuiteStart(vec![pass_id.into(), fail_id.into(), crash_id.into()]),
            Recorded::TestStart(pass_id.into()),
            Recorded::TestStatus {
                test: pass_id.into(),
                subtest: "org.example.PassTest#testPass".into(),
                status: TestOutcome::Pass,
                stack: None,
            },
            Recorded::TestEnd(pass_id.into(), InvocationStatus::Ok),
            Recorded::TestStart(fail_id.into()),
            Recorded::TestStatus {
                test: fail_id.into(),
                subtest: "org.example.FailTest#testFail".into(),
                status: TestOutcome::Fail,
                stack: Some(
                    "junit.framework.AssertionFailedError: expected:<1> but was:<2>\n\
                     at org.example.FailTest.testFail(FailTest.java:12)"
                        .into()
                ),
            },
            Recorded::TestEnd(fail_id.into(), InvocationStatus::Fail),
            Recorded::TestStart(crash_id.into()),
            Recorded::TestStatus {
                test: crash_id.into(),
                subtest: "org.example.CrashTest#testCrash".into(),
                status: TestOutcome::Crash,
                stack: Some("Process crashed.".into()),
            },
            Recorded::TestEnd(crash_id.into(), InvocationStatus::Crash),
            Recorded::SuiteEnd(expected_stats),
        ]
    );
    assert_eq!(
        log.events.last(),
        Some(&Recorded::Info("Failed: 2".to_owned()))
    );

    let executed = transport.executed();
    assert_eq!(executed.len(), 3);
    assert_eq!(
        executed[0],
        vec![
            "am",
            "instrument",
            "-w",
            "-r",
            "-e",
            "class",
            "org.example.PassTest",
            "org.example.tests/org.example.Runner",
        ]
    );
    Ok(())
}

#[test]
fn empty_manifest() -> Result<()> {
    let tests = StaticManifest::new(Vec::<TestDescriptor>::new()).resolve()?;
    let transport = FakeTransport::default();
    let mut log = RecordingLog::default();

    let run = InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut log)?;

    assert_eq!(run.stats, RunStats::default());
    assert!(run.stats.is_success());
    assert_eq!(
        log.test_events(),
        vec![
            Recorded::SuiteStart(Vec::new()),
            Recorded::SuiteEnd(RunStats::default()),
        ]
    );
    assert_eq!(
        log.events[2..].to_vec(),
        vec![
            Recorded::Info("Result summary:".to_owned()),
            Recorded::Info("Passed: 0".to_owned()),
            Recorded::Info("Failed: 0".to_owned()),
        ]
    );
    assert!(transport.executed().is_empty());
    Ok(())
}

#[test]
fn disabled_tests_are_skipped() -> Result<()> {
    let mut disabled = descriptor("FlakyTest", "org.example.FlakyTest");
    disabled.disabled = Some("bug 12345".to_owned());
    let tests = vec![descriptor("PassTest", "org.example.PassTest"), disabled];
    let transport = FakeTransport::default().with_output("org.example.PassTest", PASS_TRANSCRIPT);
    let mut log = RecordingLog::default();

    let run = InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut log)?;

    assert_eq!(
        run.stats,
        RunStats {
            passed: 1,
            failed: 0,
            skipped: 1,
        }
    );
    assert!(run.stats.is_success());
    assert_eq!(run.invocations[1].status, InvocationStatus::Skip);
    assert_eq!(transport.executed().len(), 1);
    assert!(log.events.contains(&Recorded::Info(
        "Skipping src/org/example/FlakyTest.java: bug 12345".to_owned()
    )));
    Ok(())
}

#[test]
fn transport_failure_continues_suite() -> Result<()> {
    let tests = vec![
        descriptor("OfflineTest", "org.example.OfflineTest"),
        descriptor("PassTest", "org.example.PassTest"),
    ];
    // No output registered for OfflineTest, so executing it fails.
    let transport = FakeTransport::default().with_output("org.example.PassTest", PASS_TRANSCRIPT);
    let mut log = RecordingLog::default();

    let run = InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut log)?;

    let statuses: Vec<_> = run.invocations.iter().map(|inv| inv.status).collect();
    assert_eq!(statuses, vec![InvocationStatus::Error, InvocationStatus::Ok]);
    assert_eq!(
        run.stats,
        RunStats {
            passed: 1,
            failed: 1,
            skipped: 0,
        }
    );
    let errors: Vec<_> = log
        .events
        .iter()
        .filter(|event| matches!(event, Recorded::Error(_)))
        .collect();
    assert_eq!(errors.len(), 1);
    Ok(())
}

#[test]
fn crash_without_test_uses_instrumentation_subtest() -> Result<()> {
    let tests = vec![descriptor("BootTest", "org.example.BootTest")];
    let transport = FakeTransport::default().with_output(
        "org.example.BootTest",
        "INSTRUMENTATION_RESULT: shortMsg=java.lang.ClassNotFoundException\nINSTRUMENTATION_CODE: 0\n",
    );
    let mut log = RecordingLog::default();

    let run = InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut log)?;

    assert_eq!(run.invocations[0].status, InvocationStatus::Crash);
    assert!(log.events.contains(&Recorded::TestStatus {
        test: "src/org/example/BootTest.java".to_owned(),
        subtest: INSTRUMENTATION_SUBTEST.to_owned(),
        status: TestOutcome::Crash,
        stack: Some("java.lang.ClassNotFoundException".to_owned()),
    }));
    Ok(())
}

#[test]
fn packages_installed_once_in_order() -> Result<()> {
    let mut tests = vec![
        descriptor("B", "org.example.B"),
        descriptor("A", "org.example.A"),
        descriptor("C", "org.example.C"),
        descriptor("D", "org.example.D"),
    ];
    tests[0].apk = Some("robocop.apk".into());
    tests[1].apk = Some("geckoview.apk".into());
    tests[2].apk = Some("robocop.apk".into());
    tests[3].apk = Some("disabled.apk".into());
    tests[3].disabled = Some("not ready".to_owned());
    let transport = FakeTransport::default();
    let mut log = RecordingLog::default();

    install_packages(&transport, &tests, &mut log)?;

    assert_eq!(transport.installed(), vec!["geckoview.apk", "robocop.apk"]);
    assert_eq!(
        log.events,
        vec![
            Recorded::Info("Installing geckoview.apk.".to_owned()),
            Recorded::Info("Installing robocop.apk.".to_owned()),
        ]
    );
    Ok(())
}

struct ClosedPipe;

impl io::Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn package_install_stops_when_log_fails() {
    let mut tests = vec![descriptor("A", "org.example.A")];
    tests[0].apk = Some("robocop.apk".into());
    let transport = FakeTransport::default();
    let mut log = TbplDisplayer::new(ClosedPipe);

    let err = install_packages(&transport, &tests, &mut log).expect_err("log write fails");

    assert!(
        matches!(err, InstallError::WriteEvent(_)),
        "unexpected error: {err:?}"
    );
    assert_eq!(transport.installed(), Vec::<String>::new());
}

#[test]
fn tbpl_output_for_suite() -> Result<()> {
    let tests = vec![
        descriptor("PassTest", "org.example.PassTest"),
        descriptor("FailTest", "org.example.FailTest"),
    ];
    let transport = FakeTransport::default()
        .with_output("org.example.PassTest", PASS_TRANSCRIPT)
        .with_output("org.example.FailTest", FAIL_TRANSCRIPT);
    let mut displayer = TbplDisplayer::new(Vec::new());

    InstrumentationRunner::new(&transport, instrument_command())
        .run_tests(&tests, &mut displayer)?;

    let output = String::from_utf8(displayer.into_inner())?;
    let lines: Vec<_> = output.lines().collect();
    assert_eq!(lines[0], "SUITE-START | Running 2 tests");
    assert_eq!(lines[1], "TEST-START | src/org/example/PassTest.java");
    assert_eq!(
        lines[2],
        "TEST-PASS | src/org/example/PassTest.java | org.example.PassTest#testPass"
    );
    assert!(
        lines[3].starts_with("TEST-OK | src/org/example/PassTest.java | took "),
        "unexpected line: {}",
        lines[3]
    );
    assert_eq!(
        lines[5],
        "TEST-UNEXPECTED-FAIL | src/org/example/FailTest.java | org.example.FailTest#testFail \
         - junit.framework.AssertionFailedError: expected:<1> but was:<2>"
    );
    assert_eq!(
        lines[lines.len() - 3..].to_vec(),
        vec!["INFO | Result summary:", "INFO | Passed: 1", "INFO | Failed: 1"]
    );
    Ok(())
}
