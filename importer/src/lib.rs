use crate::{
    model::IrccImporter,
    runner::{
        context::{CancelableContext, RunContext},
        report::{ScannerError, SplitScannerError},
        writer, ImportRunner, RunOutput,
    },
};
use ircc_common::config::HttpClientConfig;
use std::{path::PathBuf, process::ExitCode};

pub mod model;
pub mod runner;


/// Import IRCC documents into a single JSON file
#[derive(clap::Args, Debug, Clone)]
#[command(rename_all_env = "SCREAMING_SNAKE_CASE")]
pub struct ImportCommand {
    #[command(flatten)]
    pub importer: IrccImporter,

    #[command(flatten)]
    pub http: HttpClientConfig,

    /// The file receiving the collected documents
    #[arg(short, long, env = "IRCC_OUTPUT", default_value = "./all_ircc.json")]
    pub output: PathBuf,

    /// Also write the import report to this file
    #[arg(long, env = "IRCC_REPORT")]
    pub report: Option<PathBuf>,

    /// Minimum time between two progress updates
    #[arg(long, env = "IRCC_PROGRESS_PERIOD", default_value = "10s")]
    pub progress_period: humantime::Duration,
}

impl ImportCommand {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        log::info!("Importing IRCC documents from {}", self.importer.index_url);

        let context = CancelableContext::new("ircc", self.progress_period.into());
        context.cancel_on_ctrl_c();

        let (output, result) = self.run_once(context).await.split()?;

        log::info!("Import report: {:#?}", output.report);

        if let Some(path) = &self.report {
            writer::write_json(path, &output.report).await?;
            log::info!("Wrote report to {}", path.display());
        }

        result.map(|()| ExitCode::SUCCESS)
    }

    pub async fn run_once(&self, context: impl RunContext) -> Result<RunOutput, ScannerError> {
        let client = self
            .http
            .build_client()
            .map_err(|err| ScannerError::Critical(err.into()))?;

        let runner = ImportRunner {
            client,
            output: self.output.clone(),
        };

        runner.run_once(context, self.importer.clone()).await
    }
}
