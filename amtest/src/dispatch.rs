// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    output::{OutputContext, OutputOpts, StderrStyles, help_styles},
};
use amtest_metadata::{AmtestExitCode, InvocationSummary};
use amtest_runner::{
    config::{LogFormat, RunnerConfig},
    errors::WriteEventError,
    instrument::parse_results,
    manifest::{ManifestResolver, TomlManifest},
    reporter::{JsonReporter, StructuredLog, TbplDisplayer},
    runner::InstrumentationRunner,
    transport::{DeviceAddress, install_packages},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::io::Write;
use tracing::{debug, info};

/// Runs Android instrumentation tests and reports their results.
#[derive(Debug, Parser)]
#[command(version, styles = help_styles())]
pub struct AmtestApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(subcommand)]
    command: Command,
}

impl AmtestApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing reports to `stdout` and returning the process exit code on
    /// success.
    pub fn exec(self, output: OutputContext, stdout: &mut dyn Write) -> Result<i32, ExpectedError> {
        let result = match self.command {
            Command::Run(opts) => opts.exec(output, stdout),
            Command::Parse(opts) => opts.exec(output, stdout),
        };
        stdout.flush().map_err(WriteEventError::Io)?;
        result
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tests listed in a manifest on a device
    ///
    /// Tests run one at a time, in manifest order. Packages named by the manifest are installed
    /// before the first test runs.
    Run(RunOpts),

    /// Reduce a captured `am instrument -r` transcript to test results
    ///
    /// Use --message-format json to get machine-readable output.
    Parse(ParseOpts),
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: .config/amtest.toml]
    #[arg(long = "config", value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self, root: &Utf8Path) -> Result<RunnerConfig, ExpectedError> {
        Ok(RunnerConfig::from_sources(root, self.config_file.as_deref())?)
    }
}

#[derive(Debug, Args)]
struct RunOpts {
    /// Path to the test manifest
    #[arg(value_name = "MANIFEST")]
    manifest: Utf8PathBuf,

    #[command(flatten)]
    config_opts: ConfigOpts,

    /// Connect to a SUT agent at HOST[:PORT] instead of using adb
    #[arg(long, value_name = "HOST[:PORT]", env = "AMTEST_DEVICE_IP")]
    device_ip: Option<DeviceAddress>,

    /// Serial number of the adb device to use
    #[arg(long, conflicts_with = "device_ip")]
    serial: Option<String>,

    /// Format for test events written to stdout
    #[arg(long, value_enum, value_name = "FMT")]
    format: Option<LogFormatOpt>,
}

impl RunOpts {
    fn exec(self, output: OutputContext, stdout: &mut dyn Write) -> Result<i32, ExpectedError> {
        let mut config = self.config_opts.make_config(Utf8Path::new("."))?;
        if let Some(address) = self.device_ip {
            config.set_device_address(address);
        }
        if let Some(serial) = self.serial {
            config.device.serial = Some(serial);
        }
        if let Some(format) = self.format {
            config.output.format = format.into();
        }

        let manifest = TomlManifest::new(self.manifest);
        debug!(path = %manifest.path(), "resolving test manifest");
        let tests = manifest.resolve()?;
        let transport = config.make_transport()?;
        info!("running {} tests on {}", tests.len(), transport.describe());

        let mut log: Box<dyn StructuredLog + '_> = match config.output.format {
            LogFormat::Tbpl => {
                let mut displayer = TbplDisplayer::new(&mut *stdout);
                if output.color.should_colorize(supports_color::Stream::Stdout) {
                    displayer.colorize();
                }
                Box::new(displayer)
            }
            LogFormat::Json => Box::new(JsonReporter::new(&mut *stdout)),
        };

        install_packages(&*transport, &tests, &mut *log)?;

        let runner = InstrumentationRunner::new(&*transport, config.run.instrument_command.clone());
        let run = runner.run_tests(&tests, &mut *log)?;
        debug!(
            start_time = %run.start_time,
            time_taken = ?run.time_taken,
            "suite finished"
        );

        if run.stats.is_success() {
            Ok(AmtestExitCode::OK)
        } else {
            Err(ExpectedError::TestRunFailed)
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogFormatOpt {
    Tbpl,
    Json,
}

impl From<LogFormatOpt> for LogFormat {
    fn from(opt: LogFormatOpt) -> Self {
        match opt {
            LogFormatOpt::Tbpl => LogFormat::Tbpl,
            LogFormatOpt::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
struct ParseOpts {
    /// Path to the transcript
    #[arg(value_name = "FILE")]
    file: Utf8PathBuf,

    /// Output format
    #[arg(short = 'T', long, value_enum, default_value_t, value_name = "FMT")]
    message_format: MessageFormatOpts,
}

impl ParseOpts {
    fn exec(self, output: OutputContext, stdout: &mut dyn Write) -> Result<i32, ExpectedError> {
        let contents = std::fs::read_to_string(&self.file).map_err(|err| {
            ExpectedError::TranscriptReadError {
                path: self.file.clone(),
                err,
            }
        })?;
        let summary = InvocationSummary {
            test_cases: parse_results(&contents)
                .map(|result| result.to_summary())
                .collect(),
        };

        match self.message_format {
            MessageFormatOpts::Human => {
                let styles = output.stderr_styles();
                write_human(&summary, &styles, &mut *stdout).map_err(WriteEventError::Io)?;
            }
            MessageFormatOpts::Json => {
                serde_json::to_writer_pretty(&mut *stdout, &summary)
                    .map_err(WriteEventError::Json)?;
                writeln!(stdout).map_err(WriteEventError::Io)?;
            }
        }

        if summary.is_success() {
            Ok(AmtestExitCode::OK)
        } else {
            Err(ExpectedError::TestRunFailed)
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    #[default]
    Human,
    Json,
}

fn write_human(
    summary: &InvocationSummary,
    styles: &StderrStyles,
    mut writer: impl Write,
) -> std::io::Result<()> {
    for case in &summary.test_cases {
        let style = if case.outcome.is_success() {
            styles.pass
        } else {
            styles.fail
        };
        let name = if case.name.is_empty() {
            "(instrumentation)"
        } else {
            &case.name
        };
        writeln!(writer, "{:>5} {}", case.outcome.style(style), name.style(styles.bold))?;
        for line in case.message.iter().chain(&case.stack).flat_map(|text| text.lines()) {
            writeln!(writer, "      {line}")?;
        }
    }
    Ok(())
}
