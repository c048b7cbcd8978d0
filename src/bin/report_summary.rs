//! Summarize a recorded migration run
//!
//! Usage: report-summary <report.sqlite3> [--run <id>]

use anyhow::{bail, Context, Result};
use clap::Parser;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;

use ytm2tidal::report::{latest_run_id, status_counts, STATUS_ERROR};

#[derive(Parser)]
#[command(name = "report-summary")]
#[command(about = "Print the outcome tally of a ytm2tidal run and the tracks it could not migrate")]
struct Args {
    report: PathBuf,

    /// Run to summarize (defaults to the latest)
    #[arg(long)]
    run: Option<i64>,
}

struct Unmigrated {
    position: i64,
    title: String,
    artists: String,
    status: String,
    error: Option<String>,
}

fn unmigrated_tracks(conn: &Connection, run_id: i64) -> Result<Vec<Unmigrated>> {
    let mut stmt = conn.prepare(
        "SELECT position, title, artists, status, error FROM track_outcomes
         WHERE run_id = ?1 AND status IN ('not_found', ?2)
         ORDER BY position",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![run_id, STATUS_ERROR], |row| {
            Ok(Unmigrated {
                position: row.get(0)?,
                title: row.get(1)?,
                artists: row.get(2)?,
                status: row.get(3)?,
                error: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let conn = Connection::open_with_flags(&args.report, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open report: {:?}", args.report))?;

    let run_id = match args.run {
        Some(id) => id,
        None => match latest_run_id(&conn)? {
            Some(id) => id,
            None => bail!("No runs recorded in {:?}", args.report),
        },
    };

    let (track_limit, started_at, finished_at): (i64, i64, Option<i64>) = conn
        .query_row(
            "SELECT track_limit, started_at, finished_at FROM runs WHERE id = ?1",
            [run_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .with_context(|| format!("Run {} not found", run_id))?;

    println!("{:=<60}", "");
    println!("Run {} (limit {})", run_id, track_limit);
    match finished_at {
        Some(end) => println!("  Duration: {}s", end - started_at),
        None => println!("  Run did not finish"),
    }

    let counts = status_counts(&conn, run_id)?;
    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    println!("  Tracks recorded: {}", total);
    for (status, count) in &counts {
        let pct = if total > 0 {
            100.0 * *count as f64 / total as f64
        } else {
            0.0
        };
        println!("    {:<16} {:>6} ({:.1}%)", status, count, pct);
    }
    println!("{:=<60}", "");

    let unmigrated = unmigrated_tracks(&conn, run_id)?;
    if unmigrated.is_empty() {
        println!("Every track was migrated.");
        return Ok(());
    }

    println!("\nNot migrated ({}):", unmigrated.len());
    for track in &unmigrated {
        match &track.error {
            Some(error) => println!(
                "  #{:<4} '{}' by '{}' [{}: {}]",
                track.position + 1,
                track.title,
                track.artists,
                track.status,
                error
            ),
            None => println!(
                "  #{:<4} '{}' by '{}' [{}]",
                track.position + 1,
                track.title,
                track.artists,
                track.status
            ),
        }
    }

    Ok(())
}
