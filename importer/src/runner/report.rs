use crate::runner::RunOutput;
use std::{collections::BTreeMap, iter};
use time::OffsetDateTime;

/// The phase of processing
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Ord, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Reading the index
    Index,
    /// Retrieving the document
    Retrieval,
    /// Extracting the record from the retrieved document
    Decode,
    /// Writing the collection
    Output,
}

#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Ord, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Start of the import run
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    /// End of the import run
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,

    /// Number of entries found in the index
    #[serde(default)]
    pub number_of_entries: usize,
    /// Number of collected documents
    #[serde(default)]
    pub number_of_items: usize,
    /// Messages emitted during processing, by phase and identifier
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<Phase, BTreeMap<String, Vec<Message>>>,
}

impl Report {
    /// Number of index entries that did not end up in the collection
    pub fn number_of_skipped(&self) -> usize {
        self.number_of_entries.saturating_sub(self.number_of_items)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Message {
    ///  The severity of the message
    pub severity: Severity,
    /// The message
    pub message: String,
}

impl Message {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            report: Report {
                start_date: OffsetDateTime::now_utc(),
                end_date: OffsetDateTime::now_utc(),
                number_of_entries: 0,
                number_of_items: 0,
                messages: Default::default(),
            },
        }
    }

    pub fn entries(&mut self, entries: usize) {
        self.report.number_of_entries = entries;
    }

    pub fn tick(&mut self) {
        self.report.number_of_items += 1;
    }

    /// Add a single error
    pub fn add_error(&mut self, phase: Phase, file: impl Into<String>, message: impl Into<String>) {
        self.extend_messages(phase, file, [Message::error(message)])
    }

    /// Add a single warning
    pub fn add_warning(
        &mut self,
        phase: Phase,
        file: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.extend_messages(phase, file, [Message::warning(message)])
    }

    pub fn extend_messages(
        &mut self,
        phase: Phase,
        file: impl Into<String>,
        messages: impl IntoIterator<Item = Message>,
    ) {
        let file = file.into();
        let mut messages = messages.into_iter();

        // don't create an empty phase or file entry

        let Some(first) = messages.next() else {
            return;
        };

        self.report
            .messages
            .entry(phase)
            .or_default()
            .entry(file)
            .or_default()
            .extend(iter::once(first).chain(messages));
    }

    pub fn build(mut self) -> Report {
        self.report.end_date = OffsetDateTime::now_utc();
        self.report
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail an import run.
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// A critical error occurred, we don't even have a report.
    #[error(transparent)]
    Critical(#[from] anyhow::Error),
    /// A normal error occurred, we did capture some information in the report.
    #[error("{err}")]
    Normal {
        #[source]
        err: anyhow::Error,
        output: RunOutput,
    },
}

pub trait SplitScannerError {
    /// Split a [`ScannerError`] into a result and an output, unless it was critical.
    fn split(self) -> anyhow::Result<(RunOutput, anyhow::Result<()>)>;
}

impl SplitScannerError for Result<RunOutput, ScannerError> {
    fn split(self) -> anyhow::Result<(RunOutput, anyhow::Result<()>)> {
        match self {
            Ok(output) => Ok((output, Ok(()))),
            Err(ScannerError::Normal { err, output }) => Ok((output, Err(err))),
            Err(ScannerError::Critical(err)) => Err(err),
        }
    }
}
