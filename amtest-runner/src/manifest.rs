// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test descriptors and the manifests that list them.

use crate::errors::ManifestResolutionError;
use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use serde::Deserialize;

/// A single instrumentation test to run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TestDescriptor {
    /// A human-readable name.
    pub name: String,

    /// The path of the test relative to the manifest. Used as the test's ID.
    pub path: String,

    /// The package containing the instrumentation, e.g. `org.mozilla.gecko.tests`.
    pub package: String,

    /// The instrumentation runner class, e.g. `android.test.InstrumentationTestRunner`.
    pub runner: String,

    /// The test class to restrict the run to. If unset, every test in the package runs.
    #[serde(default)]
    pub class: Option<String>,

    /// The instrumentation package to install before running.
    #[serde(default)]
    pub apk: Option<Utf8PathBuf>,

    /// If set, the test is disabled and this is the reason.
    #[serde(default)]
    pub disabled: Option<String>,
}

impl TestDescriptor {
    /// Returns the ID of this test within a run.
    pub fn id(&self) -> &str {
        &self.path
    }

    /// Returns true if this test is disabled.
    pub fn is_disabled(&self) -> bool {
        self.disabled.is_some()
    }
}

/// A source of test descriptors.
pub trait ManifestResolver {
    /// Resolves the ordered list of tests to run.
    fn resolve(&self) -> Result<Vec<TestDescriptor>, ManifestResolutionError>;
}

/// A manifest held in memory.
#[derive(Clone, Debug, Default)]
pub struct StaticManifest {
    tests: Vec<TestDescriptor>,
}

impl StaticManifest {
    /// Creates a new manifest from the given tests.
    pub fn new(tests: impl IntoIterator<Item = TestDescriptor>) -> Self {
        Self {
            tests: tests.into_iter().collect(),
        }
    }
}

impl ManifestResolver for StaticManifest {
    fn resolve(&self) -> Result<Vec<TestDescriptor>, ManifestResolutionError> {
        check_unique_paths(&self.tests)?;
        Ok(self.tests.clone())
    }
}

/// A manifest stored as a TOML file with one `[[test]]` table per test.
///
/// ```toml
/// [[test]]
/// name = "Sanity"
/// path = "src/org/mozilla/gecko/tests/TestSanity.java"
/// package = "org.mozilla.gecko.tests"
/// runner = "android.test.InstrumentationTestRunner"
/// class = "org.mozilla.gecko.tests.TestSanity"
/// apk = "instrumentation.apk"
/// ```
///
/// Relative `apk` paths are resolved against the manifest's directory.
#[derive(Clone, Debug)]
pub struct TomlManifest {
    path: Utf8PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default, rename = "test")]
    tests: Vec<TestDescriptor>,
}

impl TomlManifest {
    /// Creates a new manifest reading from the given path.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the manifest.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn parse(&self, contents: &str) -> Result<Vec<TestDescriptor>, ManifestResolutionError> {
        let file: ManifestFile =
            toml::from_str(contents).map_err(|err| ManifestResolutionError::Parse {
                path: self.path.clone(),
                err,
            })?;
        let base = self.path.parent().unwrap_or(Utf8Path::new(""));
        let tests = file
            .tests
            .into_iter()
            .map(|mut test| {
                if let Some(apk) = &mut test.apk
                    && apk.is_relative()
                {
                    *apk = base.join(&*apk);
                }
                test
            })
            .collect::<Vec<_>>();
        check_unique_paths(&tests)?;
        Ok(tests)
    }
}

impl ManifestResolver for TomlManifest {
    fn resolve(&self) -> Result<Vec<TestDescriptor>, ManifestResolutionError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|err| {
            ManifestResolutionError::Read {
                path: self.path.clone(),
                err,
            }
        })?;
        self.parse(&contents)
    }
}

fn check_unique_paths(tests: &[TestDescriptor]) -> Result<(), ManifestResolutionError> {
    match tests.iter().map(|test| test.id()).duplicates().next() {
        Some(path) => Err(ManifestResolutionError::DuplicatePath {
            path: path.to_owned(),
        }),
        None => Ok(()),
    }
}
