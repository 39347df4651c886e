// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cloudfront_logs::{
    aws::{AwsClients, CloudWatchLogsAppender, CloudWatchLogsDirectory, S3ObjectSource},
    config::ForwarderConfig,
    destination::ObjectSource,
    event::{handle_event, S3Event},
    local::LocalObjectSource,
    processor::{record_count, FileProcessor},
};

#[derive(Parser)]
#[command(
    name = "cloudfront-logs-forwarder",
    about = "Forwards CloudFront access logs from S3 to CloudWatch Logs"
)]
struct Cli {
    /// Read objects from <DIR>/<bucket>/<key> instead of S3
    #[arg(long, global = true, value_name = "DIR", env = "CF_LOGS_LOCAL_ROOT")]
    local_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward a single log object
    Process { bucket: String, key: String },
    /// Forward every object named in an S3 event notification
    Event {
        /// Notification JSON file, or - for stdin
        path: String,
    },
}

#[tokio::main]
pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = ForwarderConfig::from_env();
    let log_level = config
        .as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,aws_smithy_runtime=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let clients = AwsClients::from_config(&config).await;
    let source: Arc<dyn ObjectSource> = match &cli.local_root {
        Some(root) => {
            info!("Reading log objects from {}", root.display());
            Arc::new(LocalObjectSource::new(root.clone()))
        }
        None => Arc::new(S3ObjectSource::new(clients.s3.clone())),
    };
    let processor = FileProcessor::new(
        &config,
        source,
        Arc::new(CloudWatchLogsDirectory::new(clients.logs.clone())),
        Arc::new(CloudWatchLogsAppender::new(clients.logs)),
    );

    match cli.command {
        Commands::Process { bucket, key } => {
            let result = processor.process_file(&bucket, &key).await;
            if let Err(e) = &result {
                error!("Failed to forward s3://{}/{}: {}", bucket, key, e);
            }
            println!("{}", record_count(&result));
            exit_code(result.is_ok())
        }
        Commands::Event { path } => {
            let event = match read_event(&path) {
                Ok(event) => event,
                Err(e) => {
                    error!("Failed to read S3 event from {}: {}", path, e);
                    return ExitCode::FAILURE;
                }
            };
            let outcomes = handle_event(&processor, &event).await;
            for outcome in &outcomes {
                println!("{}", outcome.record_count());
            }
            exit_code(outcomes.iter().all(|outcome| outcome.result.is_ok()))
        }
    }
}

fn read_event(path: &str) -> Result<S3Event, Box<dyn std::error::Error>> {
    let contents = if path == "-" {
        let mut contents = String::new();
        std::io::stdin().read_to_string(&mut contents)?;
        contents
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
