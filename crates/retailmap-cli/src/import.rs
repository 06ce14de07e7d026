use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use retailmap_core::AppConfig;
use retailmap_supabase::import::{DEFAULT_BATCH_SIZE, DEFAULT_INTER_BATCH_DELAY_MS};
use retailmap_supabase::{parse_boundary_file, SupabaseClient};

#[derive(Debug, Args)]
pub(crate) struct ImportArgs {
    /// GeoJSON feature collection of pincode boundaries
    pub path: PathBuf,
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Pause between batches to stay under backend rate limits
    #[arg(long, default_value_t = DEFAULT_INTER_BATCH_DELAY_MS)]
    pub delay_ms: u64,
    /// Parse and summarize the file without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Imports boundary polygons with the service key.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the service key is
/// missing, or the client cannot be built. Per-batch failures are counted in
/// the printed report, not returned.
pub(crate) async fn run_import(config: &AppConfig, args: &ImportArgs) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&args.path)
        .await
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let rows = parse_boundary_file(&content)?;
    println!("loaded {} pincode features from {}", rows.len(), args.path.display());

    if args.dry_run {
        let unknown = rows
            .iter()
            .filter(|r| r.pincode == retailmap_supabase::import::UNKNOWN_PINCODE)
            .count();
        println!(
            "[dry-run] would import {} rows in {} batches ({unknown} without a pincode)",
            rows.len(),
            rows.len().div_ceil(args.batch_size.max(1))
        );
        return Ok(());
    }

    let service_key = config.supabase_service_key.as_deref().ok_or_else(|| {
        anyhow::anyhow!("SUPABASE_SERVICE_KEY is required to import pincode boundaries")
    })?;
    let client = SupabaseClient::from_app_config(config)?.with_api_key(service_key);
    let report = client
        .import_pincode_boundaries(&rows, args.batch_size, args.delay_ms)
        .await?;

    println!("import summary:");
    println!("  imported: {}", report.imported);
    println!("  failed:   {}", report.failed);
    println!("  total:    {}", report.total());
    if report.imported > 0 {
        println!("next steps:");
        println!("  1. verify rows in the pincode_boundaries table");
        println!(
            "  2. run `retailmap pincodes` at zoom {} or above",
            config.pincode_min_zoom
        );
    }
    Ok(())
}
