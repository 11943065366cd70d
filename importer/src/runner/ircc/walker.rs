use crate::model::{DocumentCollection, DocumentRecord, IndexEntry, IrccImporter};
use crate::runner::common::{Error, FetchError};
use crate::runner::context::RunContext;
use crate::runner::progress::{Progress, ProgressInstance};
use crate::runner::report::{Phase, ReportBuilder};
use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use tracing::instrument;
use url::Url;

/// Walks the index, and fetches the detail record of every entry, one after the other.
pub struct IrccWalker<C: RunContext> {
    importer: IrccImporter,
    client: reqwest::Client,
    context: C,
}

impl<C: RunContext> IrccWalker<C> {
    pub fn new(importer: IrccImporter, client: reqwest::Client, context: C) -> Result<Self, Error> {
        if importer.document_url.cannot_be_a_base() {
            return Err(Error::BaseUrl(importer.document_url.to_string()));
        }

        Ok(Self {
            importer,
            client,
            context,
        })
    }

    /// Run the walker
    ///
    /// Failing to fetch the index fails the run. Failing to fetch a single document only
    /// gets recorded in the report.
    #[instrument(skip_all, fields(index = %self.importer.index_url), err)]
    pub async fn run(&self, report: &mut ReportBuilder) -> Result<DocumentCollection, Error> {
        let progress = self.context.progress(format!(
            "Import documents from: {}",
            self.importer.document_url
        ));
        progress
            .message(format!("Fetching index from {}", self.importer.index_url))
            .await;

        let entries = match self.interruptible(self.index(report)).await? {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("Error getting the index: {err}");
                report.add_error(Phase::Index, self.importer.index_url.as_str(), err.to_string());
                return Err(Error::Index(err));
            }
        };

        log::info!("Index returned {} entries", entries.len());

        let mut progress = progress.start(entries.len());
        let mut documents = DocumentCollection::new();

        for entry in entries {
            let url = self.importer.document_url(&entry.identifier)?;
            match self.interruptible(self.document(url)).await? {
                Ok(record) => {
                    documents.push(record);
                    report.tick();
                }
                Err(err) => skip(report, &entry, err),
            }

            progress.tick().await;
            self.context.check_canceled(|| Error::Canceled).await?;
        }

        progress.finish().await;

        Ok(documents)
    }

    /// Drive a request, unless the run gets canceled first.
    async fn interruptible<T>(&self, request: impl Future<Output = T>) -> Result<T, Error> {
        tokio::select! {
            biased;
            () = self.context.canceled() => {
                log::info!("Canceled while waiting for a response");
                Err(Error::Canceled)
            }
            result = request => Ok(result),
        }
    }

    /// Fetch the index.
    ///
    /// Records which can't be used as an entry are reported and skipped.
    pub async fn index(&self, report: &mut ReportBuilder) -> Result<Vec<IndexEntry>, FetchError> {
        log::debug!("Fetching index: {}", self.importer.index_url);

        let response = self
            .client
            .get(self.importer.index_url.clone())
            .query(&self.importer.index_query())
            .header(header::ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .header("Charset", "UTF-8")
            .send()
            .await?;

        let body = success(response)?.bytes().await?;
        let index: IndexResponse = serde_json::from_slice(&body)?;
        let records = index.response.docs.unwrap_or_default();

        report.entries(records.len());

        Ok(records
            .into_iter()
            .enumerate()
            .filter_map(
                |(n, record)| match serde_json::from_value::<IndexEntry>(record) {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log::warn!("Skipping index record #{n}: {err}");
                        report.add_warning(Phase::Index, format!("#{n}"), err.to_string());
                        None
                    }
                },
            )
            .collect())
    }

    /// Fetch the detail record of a single document.
    pub async fn document(&self, url: Url) -> Result<DocumentRecord, FetchError> {
        log::debug!("Fetching document: {url}");

        let response = self.client.get(url).send().await?;
        let body = success(response)?.bytes().await?;
        let document: DocumentResponse = serde_json::from_slice(&body)?;

        document.body.ok_or(FetchError::MissingField("body"))
    }
}

fn success(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    match status.is_success() {
        true => Ok(response),
        false => Err(FetchError::Status(status)),
    }
}

fn skip(report: &mut ReportBuilder, entry: &IndexEntry, err: FetchError) {
    log::warn!("Error getting the document {}: {err}", entry.identifier);

    let phase = match err.is_decode() {
        true => Phase::Decode,
        false => Phase::Retrieval,
    };
    report.add_error(phase, &entry.identifier, err.to_string());
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    response: IndexResult,
}

#[derive(Debug, Deserialize)]
struct IndexResult {
    /// Missing and `null` both mean "nothing found"
    docs: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    body: Option<Value>,
}
