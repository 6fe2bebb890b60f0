// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{RawBlock, StatusCode, TestIdentity};
use crate::errors::MalformedStatusBlock;
use indexmap::IndexMap;
use regex::Regex;
use std::{fmt, sync::LazyLock};
use tracing::debug;

/// Prefix stripped from performance metric keys.
const PERFORMANCE_PREFIX: &str = "performance.";

/// Message recorded in a finished bundle that had no `INSTRUMENTATION_CODE:` line.
pub const NO_RESULT_MESSAGE: &str = "No result returned from instrumentation";

const STATUS_LINE_START: &str = "INSTRUMENTATION_STATUS";
const STATUS_FIELD_PREFIX: &str = "INSTRUMENTATION_STATUS: ";
const ABORTED_MARKER: &str = "INSTRUMENTATION_ABORTED:";

/// Fields that carry names or free-form text and are never coerced to numbers.
const TEXT_FIELDS: &[&str] = &["class", "test", "stack", "stream", "shortMsg", "longMsg"];

static STATUS_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"INSTRUMENTATION_STATUS_CODE:\s*(-?\d+)\s*$").expect("status code regex is valid")
});
static RESULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^INSTRUMENTATION_RESULT: ([^=]+)=(.*)$").expect("result regex is valid")
});
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INSTRUMENTATION_CODE: (-?\d+)$").expect("code regex is valid"));

/// A value reported by the instrumentation harness.
///
/// Values that parse as numbers are stored as numbers, everything else as text.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// A numeric value, such as a performance metric.
    Number(f64),

    /// A text value.
    Text(String),
}

impl FieldValue {
    /// Coerces a raw value: numeric-looking text becomes a [`FieldValue::Number`].
    pub fn coerce(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Text(raw.to_owned()),
        }
    }

    fn for_key(key: &str, raw: String) -> Self {
        if TEXT_FIELDS.contains(&key) {
            Self::Text(raw)
        } else {
            Self::coerce(&raw)
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Parses the digits of an `INSTRUMENTATION_CODE:` line, saturating values that don't fit.
fn parse_result_code(digits: &str) -> i64 {
    digits.parse().unwrap_or_else(|_| {
        debug!(digits, "result code is out of range, saturating");
        if digits.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

fn normalize_key(key: &str) -> &str {
    key.strip_prefix(PERFORMANCE_PREFIX).unwrap_or(key)
}

fn is_status_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// A single per-test status report.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusRecord {
    code: StatusCode,
    fields: IndexMap<String, FieldValue>,
}

impl StatusRecord {
    /// Parses a status block.
    ///
    /// Every `INSTRUMENTATION_STATUS: key=value` line becomes a field. A value runs until the next
    /// line starting with `INSTRUMENTATION_STATUS`, so stack traces spanning several lines are
    /// kept whole.
    pub fn parse(block: &str) -> Result<Self, MalformedStatusBlock> {
        let code = block
            .lines()
            .find_map(|line| STATUS_CODE_RE.captures(line))
            .ok_or_else(|| MalformedStatusBlock::new("no status code found", block))?;
        let code = code[1].parse::<i32>().map_err(|_| {
            MalformedStatusBlock::new(format!("status code `{}` is out of range", &code[1]), block)
        })?;

        let mut fields = IndexMap::new();
        let mut current: Option<(String, String)> = None;
        for line in block.lines() {
            if line.starts_with(STATUS_LINE_START) {
                if let Some((key, value)) = current.take() {
                    insert_status_field(&mut fields, key, value);
                }
                if let Some(rest) = line.strip_prefix(STATUS_FIELD_PREFIX)
                    && let Some((key, value)) = rest.split_once('=')
                    && is_status_key(key)
                {
                    current = Some((key.to_owned(), value.to_owned()));
                }
            } else if let Some((_, value)) = &mut current {
                value.push('\n');
                value.push_str(line);
            }
        }
        if let Some((key, value)) = current {
            insert_status_field(&mut fields, key, value);
        }

        Ok(Self {
            code: StatusCode::new(code),
            fields,
        })
    }

    /// Returns the status code.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Returns the identity of the test this record reports on.
    ///
    /// Missing `class` or `test` fields are tolerated and show up as absent parts of the
    /// identity.
    pub fn identity(&self) -> TestIdentity {
        TestIdentity::new(self.text_field("class"), self.text_field("test"))
    }

    /// Returns the failure text for this record, if any.
    pub fn stack(&self) -> Option<&str> {
        self.text_field("stack")
    }

    /// Returns a field by key. Keys have any `performance.` prefix stripped.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns all fields in the order they were reported.
    pub fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    fn text_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(FieldValue::as_text)
    }
}

fn insert_status_field(fields: &mut IndexMap<String, FieldValue>, key: String, value: String) {
    let key = normalize_key(&key).to_owned();
    let value = FieldValue::for_key(&key, value.trim().to_owned());
    fields.insert(key, value);
}

/// The key/value payload reported once, when the instrumentation process finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedBundle {
    code: i64,
    aborted: bool,
    code_reported: bool,
    fields: IndexMap<String, FieldValue>,
}

impl FinishedBundle {
    /// The result code the harness reports when instrumentation completed normally.
    ///
    /// This is `Activity.RESULT_OK`.
    pub const RESULT_OK: i64 = -1;

    /// Parses a finished bundle.
    ///
    /// This never fails. A bundle without an `INSTRUMENTATION_CODE:` line gets a code of 0 and
    /// a `shortMsg` of [`NO_RESULT_MESSAGE`].
    pub fn parse(block: &str) -> Self {
        let mut raw: IndexMap<String, String> = IndexMap::new();
        let mut code = None;
        let mut aborted = false;
        // The key of the last RESULT line, for values continuing onto later lines.
        let mut continuing: Option<String> = None;

        for line in block.lines() {
            let line = line.trim();
            if let Some(caps) = RESULT_RE.captures(line) {
                let key = normalize_key(caps[1].trim()).to_owned();
                raw.insert(key.clone(), caps[2].trim().to_owned());
                continuing = Some(key);
            } else if let Some(caps) = CODE_RE.captures(line) {
                code = Some(parse_result_code(&caps[1]));
                continuing = None;
            } else if line.contains(ABORTED_MARKER) {
                aborted = true;
                continuing = None;
            } else if let Some(key) = &continuing
                && let Some(value) = raw.get_mut(key)
            {
                value.push('\n');
                value.push_str(line);
            }
        }

        let mut fields: IndexMap<_, _> = raw
            .into_iter()
            .map(|(key, value)| {
                let value = FieldValue::for_key(&key, value.trim_end().to_owned());
                (key, value)
            })
            .collect();

        let code_reported = code.is_some();
        if !code_reported {
            debug!("finished bundle has no result code, assuming 0");
            fields
                .entry("shortMsg".to_owned())
                .or_insert_with(|| FieldValue::Text(NO_RESULT_MESSAGE.to_owned()));
        }

        Self {
            code: code.unwrap_or(0),
            aborted,
            code_reported,
            fields,
        }
    }

    /// Returns the result code of the instrumentation process.
    pub fn code(&self) -> i64 {
        self.code
    }

    /// Returns true if the instrumentation process completed normally.
    pub fn is_ok(&self) -> bool {
        self.code == Self::RESULT_OK
    }

    /// Returns true if the harness printed `INSTRUMENTATION_ABORTED:`.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Returns false if the code was synthesized because no `INSTRUMENTATION_CODE:` line was
    /// present.
    pub fn code_reported(&self) -> bool {
        self.code_reported
    }

    /// Returns a field by key. Keys have any `performance.` prefix stripped.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns all fields in the order they were reported.
    pub fn fields(&self) -> &IndexMap<String, FieldValue> {
        &self.fields
    }

    /// Returns the most useful human-readable explanation in the bundle, if any.
    pub fn message(&self) -> Option<&str> {
        ["shortMsg", "longMsg", "stream"]
            .iter()
            .filter_map(|key| self.fields.get(*key).and_then(FieldValue::as_text))
            .find(|text| !text.is_empty())
    }
}

/// A [`RawBlock`] after parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedBlock {
    /// A per-test status record.
    Status(StatusRecord),

    /// A status block whose status code couldn't be read.
    Malformed(MalformedStatusBlock),

    /// The finished bundle.
    Finished(FinishedBundle),

    /// Trailing text that no marker line terminated, parsed as a finished bundle.
    ///
    /// Before a finished bundle this means the stream was cut off. After one it's usually
    /// device noise such as linker warnings.
    Unterminated(FinishedBundle),
}

impl ParsedBlock {
    /// Parses a raw block.
    ///
    /// Unterminated trailing text is parsed as a finished bundle, which yields the
    /// "no result returned" recovery bundle unless it happens to contain a result code.
    pub fn parse(raw: RawBlock<'_>) -> Self {
        match raw {
            RawBlock::Status(text) => match StatusRecord::parse(text) {
                Ok(record) => Self::Status(record),
                Err(err) => Self::Malformed(err),
            },
            RawBlock::Finished(text) => Self::Finished(FinishedBundle::parse(text)),
            RawBlock::Unterminated(text) => Self::Unterminated(FinishedBundle::parse(text)),
        }
    }
}
