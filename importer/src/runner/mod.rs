pub mod common;
pub mod context;
pub mod ircc;
pub mod progress;
pub mod report;
pub mod writer;

use crate::{
    model::{DocumentCollection, IrccImporter},
    runner::{
        context::RunContext,
        ircc::IrccWalker,
        report::{Phase, Report, ReportBuilder, ScannerError},
    },
};
use std::path::PathBuf;
use tracing::instrument;

/// The outcome of a run
#[derive(Clone, Debug)]
pub struct RunOutput {
    pub report: Report,
    /// The collected documents, only filled on success
    pub documents: DocumentCollection,
}

impl From<Report> for RunOutput {
    fn from(report: Report) -> Self {
        Self {
            report,
            documents: Default::default(),
        }
    }
}

pub struct ImportRunner {
    pub client: reqwest::Client,
    /// The file receiving the collection
    pub output: PathBuf,
}

impl ImportRunner {
    /// Walk the index, and write all retrieved documents to the output file.
    ///
    /// The output file is only written if the walk completed.
    #[instrument(skip_all, fields(output = %self.output.display()), err)]
    pub async fn run_once(
        &self,
        context: impl RunContext,
        importer: IrccImporter,
    ) -> Result<RunOutput, ScannerError> {
        log::info!("Starting import run: {}", context.name());
        let mut report = ReportBuilder::new();

        let walker = IrccWalker::new(importer, self.client.clone(), context)
            .map_err(|err| ScannerError::Critical(err.into()))?;

        let documents = match walker.run(&mut report).await {
            Ok(documents) => documents,
            Err(err) => {
                return Err(ScannerError::Normal {
                    err: err.into(),
                    output: report.build().into(),
                })
            }
        };

        if let Err(err) = writer::write_collection(&self.output, &documents).await {
            report.add_error(
                Phase::Output,
                self.output.display().to_string(),
                err.to_string(),
            );
            return Err(ScannerError::Normal {
                err: err.into(),
                output: report.build().into(),
            });
        }

        log::info!(
            "Wrote {} documents to {}",
            documents.len(),
            self.output.display()
        );

        Ok(RunOutput {
            report: report.build(),
            documents,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::runner::report::SplitScannerError;
    use crate::test::MockApiBuilder;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_log::test;

    fn runner(output: PathBuf) -> ImportRunner {
        ImportRunner {
            client: Default::default(),
            output,
        }
    }

    #[test(actix_web::test)]
    async fn writes_collection() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index(200, json!([{"identifier_s": "A", "government_s": "ZA"}]))
            .document("A", 200, json!({"body": {"id": "A", "title": "Permit"}}))
            .start();

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("all_ircc.json");

        let (out, result) = runner(output.clone())
            .run_once((), api.importer())
            .await
            .split()?;
        result?;

        assert_eq!(out.documents.len(), 1);
        assert_eq!(out.report.number_of_items, 1);

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
        assert_eq!(written, json!([{"id": "A", "title": "Permit"}]));

        Ok(())
    }

    #[test(actix_web::test)]
    async fn skips_failed_document() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index(
                200,
                json!([
                    {"identifier_s": "A", "government_s": "ZA"},
                    {"identifier_s": "B", "government_s": "ZA"},
                ]),
            )
            .document("A", 200, json!({"body": {"id": "A", "title": "Permit"}}))
            .document("B", 404, json!({"statusCode": 404}))
            .start();

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("all_ircc.json");

        let out = runner(output.clone())
            .run_once((), api.importer())
            .await?;

        assert_eq!(out.report.number_of_entries, 2);
        assert_eq!(out.report.number_of_items, 1);

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
        assert_eq!(written, json!([{"id": "A", "title": "Permit"}]));

        Ok(())
    }

    #[test(actix_web::test)]
    async fn index_failure_writes_nothing() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index_response(500, json!({"error": "boom"}))
            .document("A", 200, json!({"body": {"id": "A"}}))
            .start();

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("all_ircc.json");

        let (out, result) = runner(output.clone())
            .run_once((), api.importer())
            .await
            .split()?;

        assert!(result.is_err());
        assert!(out.documents.is_empty());
        assert!(out.report.messages.contains_key(&Phase::Index));
        assert!(api.document_requests().is_empty());
        assert!(!output.exists());

        Ok(())
    }

    #[test(actix_web::test)]
    async fn index_failure_keeps_previous_output() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index_response(503, json!({}))
            .start();

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("all_ircc.json");
        std::fs::write(&output, "[]")?;

        let result = runner(output.clone()).run_once((), api.importer()).await;

        assert!(matches!(result, Err(ScannerError::Normal { .. })));
        assert_eq!(std::fs::read_to_string(&output)?, "[]");

        Ok(())
    }

    #[test(actix_web::test)]
    async fn idempotent() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index(
                200,
                json!([
                    {"identifier_s": "B", "government_s": "ZA"},
                    {"identifier_s": "A", "government_s": "KE"},
                ]),
            )
            .document("A", 200, json!({"body": {"id": "A", "zeta": 1, "alpha": [1, 2]}}))
            .document("B", 200, json!({"body": {"id": "B", "title": "Permit"}}))
            .start();

        let dir = tempfile::tempdir()?;
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        runner(first.clone()).run_once((), api.importer()).await?;
        runner(second.clone()).run_once((), api.importer()).await?;

        assert_eq!(std::fs::read(&first)?, std::fs::read(&second)?);

        Ok(())
    }

    #[test(actix_web::test)]
    async fn failed_write_is_reported() -> anyhow::Result<()> {
        let api = MockApiBuilder::new()
            .index(200, json!([{"identifier_s": "A"}]))
            .document("A", 200, json!({"body": {"id": "A"}}))
            .start();

        let dir = tempfile::tempdir()?;
        let output = dir.path().join("missing").join("all_ircc.json");

        let (out, result) = runner(output).run_once((), api.importer()).await.split()?;

        assert!(result.is_err());
        assert_eq!(out.report.number_of_items, 1);
        assert!(out.report.messages.contains_key(&Phase::Output));

        Ok(())
    }
}
