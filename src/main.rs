mod arn;
mod consts;
mod identity;
mod notifications;
mod restorer;
mod s3;
mod status;
use crate::arn::SnsArn;
use crate::identity::lookup_caller_identity;
use crate::restorer::Restorer;
use crate::s3::S3Client;
use anyhow::Context;
use clap::Parser;
use std::io::{stderr, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{filter::Targets, fmt::time::OffsetTime, prelude::*};

/// Restore an object from the S3 Intelligent-Tiering archive tiers
///
/// Probes the object, and if it sits in the Archive Access or Deep Archive
/// Access tier with no restore in flight, subscribes the bucket's restore
/// events to the given SNS topic and issues the restore request.
#[derive(Clone, Debug, Parser)]
#[command(version)]
struct Arguments {
    /// Append log records to the given file
    #[arg(long, value_name = "FILE", default_value = consts::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Set logging level
    #[arg(
        short,
        long,
        default_value = "DEBUG",
        value_name = "ERROR|WARN|INFO|DEBUG|TRACE"
    )]
    log_level: Level,

    /// The bucket containing the archived object
    bucket: String,

    /// The key of the archived object
    key: String,

    /// The ARN of the SNS topic to publish restore progress to, of the form
    /// `arn:aws:sns:<region>:<account>:<name>`
    topic_arn: SnsArn,
}

fn main() -> ExitCode {
    let args = match Arguments::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here as well; only genuine usage
            // errors exit nonzero
            let failed = e.use_stderr();
            let _ = e.print();
            return if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    if let Err(e) = init_logging(&args) {
        eprintln!("s3intrestore: {e:#}");
        return ExitCode::FAILURE;
    }
    if let Err(e) = run(args) {
        tracing::error!("{e:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

// `OffsetTime::local_rfc_3339()` must be called before the Tokio runtime
// starts, hence the split between this, `main()`, and `#[tokio::main] run()`;
// see
// <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/time/struct.OffsetTime.html#method.local_rfc_3339>
fn init_logging(args: &Arguments) -> anyhow::Result<()> {
    let timer =
        OffsetTime::local_rfc_3339().context("failed to determine local timezone offset")?;
    let (logfile, _) = fs_err::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&args.log_file)?
        .into_parts();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(timer.clone())
                .with_ansi(stderr().is_terminal())
                .with_writer(stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(timer)
                .with_ansi(false)
                .with_writer(Arc::new(logfile)),
        )
        .with(
            Targets::new()
                .with_target(env!("CARGO_CRATE_NAME"), args.log_level)
                .with_target("aws_config", Level::DEBUG.min(args.log_level))
                .with_default(Level::INFO.min(args.log_level)),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn run(args: Arguments) -> anyhow::Result<()> {
    tracing::info!("Loading AWS configuration ...");
    let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .load()
        .await;
    let identity = lookup_caller_identity(&config).await?;
    tracing::info!(account = %identity.account_id, "Resolved caller account");
    let client = S3Client::new(&config, identity.account_id);
    let restorer = Restorer::new(client, args.bucket, args.key, args.topic_arn);
    restorer.run().await
}
