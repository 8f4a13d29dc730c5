use clap::Parser;
use scorecard::app::App;
use scorecard::cli::Args;
use scorecard::config::Config;
use scorecard::logging::setup_logging;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logging depends on config, so config errors can only go to stderr
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:?}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        kinds = ?args.kinds(),
        "starting scorecard"
    );

    let result = async {
        let app = App::new(config).await?;
        app.run(args.kinds()).await
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = format!("{e:#}"), "scorecard failed");
            ExitCode::FAILURE
        }
    }
}
