// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::{
    Args, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use owo_colors::{OwoColorize, Style};
use std::{fmt, sync::Once};
use tracing::{Event, Level, Subscriber, level_filters::LevelFilter};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// The environment variable holding the log filter, e.g. `amtest_runner=debug`.
const LOG_ENV: &str = "AMTEST_LOG";

pub(crate) const fn help_styles() -> Styles {
    let accent = AnsiColor::Green.on_default().effects(Effects::BOLD);
    Styles::styled()
        .header(accent)
        .usage(accent)
        .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
}

#[derive(Copy, Clone, Debug, Args)]
#[must_use]
pub(crate) struct OutputOpts {
    /// Produce color output: auto, always, never
    #[arg(
        long,
        value_enum,
        default_value_t,
        hide_possible_values = true,
        global = true,
        value_name = "WHEN",
        env = "AMTEST_COLOR"
    )]
    pub(crate) color: Color,
}

impl OutputOpts {
    pub(crate) fn init(self) -> OutputContext {
        init_logging(self.color.should_colorize(supports_color::Stream::Stderr));
        OutputContext { color: self.color }
    }
}

/// Output settings resolved from the command line.
#[derive(Copy, Clone, Debug)]
#[must_use]
pub struct OutputContext {
    pub(crate) color: Color,
}

impl OutputContext {
    /// Returns styles for text printed to stderr.
    pub fn stderr_styles(&self) -> StderrStyles {
        StderrStyles::new(self.color.should_colorize(supports_color::Stream::Stderr))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Color {
    #[default]
    Auto,
    Always,
    Never,
}

impl Color {
    pub(crate) fn should_colorize(self, stream: supports_color::Stream) -> bool {
        match self {
            Color::Auto => supports_color::on_cached(stream).is_some(),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

static INIT_LOGGING: Once = Once::new();

fn init_logging(colorize: bool) {
    INIT_LOGGING.call_once(|| {
        let filter = std::env::var(LOG_ENV).unwrap_or_default();
        let targets = match filter.parse::<Targets>() {
            Ok(targets) if !filter.is_empty() => targets,
            _ => Targets::new().with_default(LevelFilter::INFO),
        };

        let layer = tracing_subscriber::fmt::layer()
            .event_format(LevelPrefix { colorize })
            .with_writer(std::io::stderr)
            .with_filter(targets);
        tracing_subscriber::registry().with(layer).init();
    });
}

/// Formats events as `level: message key=value ...`.
struct LevelPrefix {
    colorize: bool,
}

impl LevelPrefix {
    fn style(&self, level: Level) -> Style {
        if !self.colorize {
            return Style::new();
        }
        match level {
            Level::ERROR => Style::new().red().bold(),
            Level::WARN => Style::new().yellow().bold(),
            Level::INFO | Level::DEBUG => Style::new().bold(),
            Level::TRACE => Style::new().dimmed(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for LevelPrefix
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        let heading = match level {
            Level::WARN => "warning",
            other => other.as_str(),
        };
        write!(
            writer,
            "{}: ",
            heading.to_ascii_lowercase().style(self.style(level))
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Styles for text printed to stderr.
#[derive(Debug, Default)]
pub struct StderrStyles {
    pub(crate) bold: Style,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
}

impl StderrStyles {
    fn new(colorize: bool) -> Self {
        if !colorize {
            return Self::default();
        }
        Self {
            bold: Style::new().bold(),
            pass: Style::new().green().bold(),
            fail: Style::new().red().bold(),
        }
    }
}
