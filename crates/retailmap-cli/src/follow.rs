//! `follow` command: a line-driven stand-in for map movement.
//!
//! Each stdin line is `zoom west south east north`, or just `zoom` when the
//! map has no bounds yet. Snapshots are printed as the loader publishes them.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use retailmap_core::{AppConfig, BoundingBox};
use retailmap_supabase::SupabaseClient;
use retailmap_viewport::{LoaderConfig, LoaderSnapshot, ViewportLoader};

/// Parses one observation line. Blank lines and `#` comments yield `None`.
pub(crate) fn parse_observation(line: &str) -> Result<Option<(f64, Option<BoundingBox>)>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let numbers = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            Ok(_) => Err(format!("'{part}' is not a finite number")),
            Err(_) => Err(format!("'{part}' is not a number")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    match numbers.as_slice() {
        [zoom] => Ok(Some((*zoom, None))),
        [zoom, west, south, east, north] => {
            let bounds =
                BoundingBox::new(*west, *south, *east, *north).map_err(|e| e.to_string())?;
            Ok(Some((*zoom, Some(bounds))))
        }
        _ => Err(format!(
            "expected 'zoom' or 'zoom west south east north', got {} values",
            numbers.len()
        )),
    }
}

fn print_snapshot(snapshot: &LoaderSnapshot) {
    let features = snapshot.data.as_ref().map_or(0, |c| c.len());
    match &snapshot.error {
        Some(error) => println!(
            "[{}] {:?} features={features} error={error}",
            snapshot.generation, snapshot.phase
        ),
        None => println!(
            "[{}] {:?} features={features}",
            snapshot.generation, snapshot.phase
        ),
    }
}

async fn print_snapshots(mut rx: watch::Receiver<LoaderSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        print_snapshot(&snapshot);
    }
}

/// Runs the viewport loader against the live backend until stdin closes,
/// then lets the last query finish.
///
/// # Errors
///
/// Returns an error if the client cannot be built or stdin cannot be read.
pub(crate) async fn run_follow(config: &AppConfig) -> anyhow::Result<()> {
    let client = SupabaseClient::from_app_config(config)?;
    let loader_config = LoaderConfig::from_app_config(config);
    let (handle, rx) = ViewportLoader::spawn(client, loader_config);
    let mut settle_rx = rx.clone();
    let printer = tokio::spawn(print_snapshots(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_observation(&line) {
            Ok(Some((zoom, bounds))) => handle.observe(zoom, bounds)?,
            Ok(None) => {}
            Err(err) => eprintln!("skipping line: {err}"),
        }
    }

    // Give the last observation time to pass the debounce, then wait for
    // its query to land before shutting the loader down.
    tokio::time::sleep(loader_config.debounce + Duration::from_millis(50)).await;
    settle_rx.wait_for(|s| !s.is_loading()).await?;
    drop(handle);
    printer.await?;
    Ok(())
}
