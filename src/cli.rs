//! Command-line interface
//!
//! Thin consumer of the library: loads a dataset into a [`Session`], runs the
//! pipeline and prints the read-only views. Charting and document rendering
//! stay with external consumers.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::schema::{NewStudent, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use crate::session::Session;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "segmentasi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Role-free student segmentation over mixed-type features")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show dataset information
    Info {
        /// Input data file (CSV or XLSX)
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Preprocess and cluster the dataset
    Cluster {
        /// Input data file (CSV or XLSX)
        #[arg(short, long)]
        data: PathBuf,

        /// Number of clusters (2-6)
        #[arg(short = 'k', long, default_value = "3")]
        clusters: usize,

        /// Print the cluster profiles as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Classify one new student against a fitted model
    Predict {
        /// Input data file the model is fitted on
        #[arg(short, long)]
        data: PathBuf,

        /// Number of clusters (2-6)
        #[arg(short = 'k', long, default_value = "3")]
        clusters: usize,

        /// Academic average score (0-100)
        #[arg(long)]
        score: f64,

        /// Attendance ratio (0-1)
        #[arg(long)]
        attendance: f64,

        /// Participation flags
        #[arg(long)]
        computer_club: bool,
        #[arg(long)]
        agriculture_club: bool,
        #[arg(long)]
        sewing_club: bool,
        #[arg(long)]
        scouts: bool,
    },

    /// Print one student's report
    Report {
        /// Input data file (CSV or XLSX)
        #[arg(short, long)]
        data: PathBuf,

        /// Number of clusters (2-6)
        #[arg(short = 'k', long, default_value = "3")]
        clusters: usize,

        /// Student name (first matching row)
        #[arg(short, long)]
        name: String,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Info");

    step_run("Loading data");
    let start = Instant::now();
    let df = crate::dataset::load_table(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    println!();
    for column in df.get_columns() {
        let nulls = column.null_count();
        let detail = if nulls > 0 {
            format!("{} ({} missing)", column.dtype(), nulls)
        } else {
            column.dtype().to_string()
        };
        println!("  {:<28} {}", muted(column.name()), detail.white());
    }

    let expected: Vec<&str> = NUMERIC_COLUMNS
        .iter()
        .chain(CATEGORICAL_COLUMNS.iter())
        .copied()
        .collect();
    let absent: Vec<&str> = expected
        .into_iter()
        .filter(|name| df.column(name).is_err())
        .collect();
    println!();
    if absent.is_empty() {
        println!("  {} {}", ok("✓"), "all required columns present".white());
    } else {
        println!(
            "  {} missing required columns: {}",
            "!".yellow(),
            absent.join(", ").yellow()
        );
    }
    println!();
    Ok(())
}

fn fitted_session(data_path: &PathBuf, k: usize) -> anyhow::Result<Session> {
    let mut session = Session::new();

    step_run("Loading data");
    let start = Instant::now();
    session.load_file(data_path)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Clustering into {} groups", k.to_string().cyan()));
    let start = Instant::now();
    session.run_clustering(k)?;
    step_done(&format!("{:?}", start.elapsed()));

    for notice in session.fill_notices() {
        println!(
            "  {} {}",
            "!".yellow(),
            format!(
                "'{}': {} missing value(s) filled with the mean {:.2}",
                notice.column, notice.filled, notice.mean
            )
            .yellow()
        );
    }
    Ok(session)
}

pub fn cmd_cluster(data_path: &PathBuf, k: usize, json: bool) -> anyhow::Result<()> {
    section("Cluster");
    let session = fitted_session(data_path, k)?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.profiles()?)?);
        return Ok(());
    }

    println!();
    for (cluster, size) in session.cluster_sizes()? {
        println!(
            "  {:<16} {}",
            muted(&format!("Cluster {cluster}")),
            format!("{size} students").white()
        );
    }

    for profile in session.profiles()?.values() {
        section(&format!("Cluster {}", profile.cluster));
        println!("  {}", profile.description.white());
    }
    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_predict(
    data_path: &PathBuf,
    k: usize,
    score: f64,
    attendance: f64,
    flags: [bool; 4],
) -> anyhow::Result<()> {
    section("Predict");
    let session = fitted_session(data_path, k)?;

    let student = NewStudent::new(score, attendance, flags);
    let prediction = session.predict(&student)?;

    println!();
    println!(
        "  {:<16} {}",
        muted("Cluster"),
        prediction.cluster.to_string().white().bold()
    );
    let clubs = student.active_clubs();
    let clubs = if clubs.is_empty() {
        "none".to_string()
    } else {
        clubs.join(", ")
    };
    println!("  {:<16} {}", muted("Activities"), clubs.white());
    println!();
    println!("  {}", prediction.description.white());
    println!();
    Ok(())
}

pub fn cmd_report(data_path: &PathBuf, k: usize, name: &str) -> anyhow::Result<()> {
    section("Report");
    let session = fitted_session(data_path, k)?;

    let report = session.student_report(name)?;
    println!();
    for line in report.render_text().lines() {
        println!("  {}", line.white());
    }
    println!();
    Ok(())
}
