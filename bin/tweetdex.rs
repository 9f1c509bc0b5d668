use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tweetdex::{IndexMetrics, IndexSettings, Session};

#[derive(Parser)]
#[command(name = "tweetdex")]
#[command(about = "In-memory tweet index driven by a line protocol on stdin", long_about = None)]
struct Args {
    /// JSON file with index settings; missing fields keep their defaults
    #[arg(long, env = "TWEETDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Longest accepted message in bytes
    #[arg(long, env = "TWEETDEX_MAX_MESSAGE_LENGTH")]
    max_message_length: Option<usize>,

    /// Print Prometheus metrics to stderr when the session ends
    #[arg(long, env = "TWEETDEX_METRICS")]
    metrics: bool,
}

fn main() -> Result<ExitCode> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => IndexSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => IndexSettings::default(),
    };
    if let Some(max) = args.max_message_length {
        settings = settings.with_max_message_length(max);
    }
    settings.validate()?;

    info!("Starting tweetdex v{}", tweetdex::VERSION);

    let metrics = args.metrics.then(IndexMetrics::new).transpose()?;
    let mut session = Session::new(settings)?;
    if let Some(metrics) = &metrics {
        session = session.with_metrics(metrics.clone());
    }

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    let outcome = session.run(stdin, stdout);

    if let Some(metrics) = &metrics {
        eprint!("{}", metrics.render()?);
    }

    match outcome {
        Ok(stats) => {
            info!(
                commands = stats.commands,
                rejected = stats.rejected,
                tweets = session.index().len(),
                "session finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_fatal() => {
            error!(error = %e, "session aborted");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
