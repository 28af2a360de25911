use std::time::Instant;

use tokio::io::AsyncReadExt;

use forcecli::parsers::deploy::DeployResultParser;
use forcecli::response::DeployReport;

/// Exit code when the captured output could not be parsed at all.
const EXIT_PARSE_FAILURE: i32 = 3;

/// Reads the captured output of `sfdx force:source:deploy --json` (or push)
/// on stdin and prints a classified report on stdout.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before the subscriber, so RUST_LOG may come from .env.
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("forcecli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let start = Instant::now();
    let mut captured = String::new();
    tokio::io::stdin().read_to_string(&mut captured).await?;

    let parser = match DeployResultParser::new(&captured) {
        Ok(parser) => parser,
        Err(e) => {
            tracing::error!("could not classify CLI output: {e}");
            eprintln!("{}", e.user_message());
            std::process::exit(EXIT_PARSE_FAILURE);
        }
    };

    let report = DeployReport::from_outcome(&parser.outcome(), start.elapsed().as_secs_f64());
    println!("{}", serde_json::to_string_pretty(&report)?);

    let code = report.exit_code();
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
