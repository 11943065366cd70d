use clap::Parser;
use ircc_importer::ImportCommand;
use std::process::{ExitCode, Termination};

#[derive(clap::Parser, Debug)]
#[command(
    name = "ircc-import",
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "Import the IRCC documents of the ABS Clearing-House",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    import: ImportCommand,
}

impl Cli {
    async fn run(self) -> ExitCode {
        match self.import.run().await {
            Ok(code) => code,
            Err(err) => {
                log::error!("Error: {err}");
                for (n, err) in err.chain().skip(1).enumerate() {
                    if n == 0 {
                        log::error!("Caused by:");
                    }
                    log::error!("\t{err}");
                }

                ExitCode::FAILURE
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> impl Termination {
    ircc_common::tracing::init_tracing();
    Cli::parse().run().await
}
