//! Segmentasi - Main Entry Point
//!
//! Command-line front end for the student segmentation pipeline.

use clap::Parser;
use segmentasi::cli::{cmd_cluster, cmd_info, cmd_predict, cmd_report, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segmentasi=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
        Commands::Cluster { data, clusters, json } => {
            cmd_cluster(&data, clusters, json)?;
        }
        Commands::Predict {
            data,
            clusters,
            score,
            attendance,
            computer_club,
            agriculture_club,
            sewing_club,
            scouts,
        } => {
            cmd_predict(
                &data,
                clusters,
                score,
                attendance,
                [computer_club, agriculture_club, sewing_club, scouts],
            )?;
        }
        Commands::Report { data, clusters, name } => {
            cmd_report(&data, clusters, &name)?;
        }
    }

    Ok(())
}
