use clap::Args;

use retailmap_core::pincodes::find_pincode;
use retailmap_core::{AppConfig, BoundingBox, PincodeFeature};
use retailmap_supabase::SupabaseClient;

use crate::OutputFormat;

#[derive(Debug, Args)]
pub(crate) struct PincodeArgs {
    #[arg(long)]
    pub zoom: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,
    /// Only show this pincode, if it falls in the viewport
    #[arg(long)]
    pub pincode: Option<String>,
    #[arg(long, value_enum, default_value = "summary")]
    pub format: OutputFormat,
}

/// One-shot viewport query. Honors the configured zoom threshold the same
/// way the live loader does.
///
/// # Errors
///
/// Returns an error for invalid bounds, a client build failure, a failed
/// query, or a serialization failure.
pub(crate) async fn run_pincodes(config: &AppConfig, args: &PincodeArgs) -> anyhow::Result<()> {
    let bounds = BoundingBox::new(args.west, args.south, args.east, args.north)?;
    let qualifies = args.zoom.is_finite() && args.zoom >= config.pincode_min_zoom;
    if !qualifies {
        println!(
            "zoom {} is below the pincode threshold {}; zoom in to see boundaries",
            args.zoom, config.pincode_min_zoom
        );
        return Ok(());
    }

    let client = SupabaseClient::from_app_config(config)?;
    let collection = client.pincodes_in_viewport(bounds, args.zoom).await?;

    if let Some(pincode) = &args.pincode {
        let Some(feature) = find_pincode(&collection, pincode) else {
            println!("pincode {pincode} is not in this viewport");
            return Ok(());
        };
        match args.format {
            OutputFormat::Json | OutputFormat::Geojson => {
                println!("{}", serde_json::to_string_pretty(feature)?);
            }
            OutputFormat::Summary => {
                print_header();
                print_row(feature);
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Json | OutputFormat::Geojson => {
            println!("{}", serde_json::to_string_pretty(&collection)?);
        }
        OutputFormat::Summary => {
            println!("{} pincode boundaries", collection.len());
            print_header();
            for feature in &collection.features {
                print_row(feature);
            }
        }
    }
    Ok(())
}

fn print_header() {
    println!("{:<10}{:<30}{:<20}STATE", "PINCODE", "OFFICE", "DISTRICT");
}

fn print_row(feature: &PincodeFeature) {
    let p = &feature.properties;
    println!(
        "{:<10}{:<30}{:<20}{}",
        p.pincode,
        crate::retailers::truncate(p.office_name.as_deref().unwrap_or("-"), 28),
        crate::retailers::truncate(p.district.as_deref().unwrap_or("-"), 18),
        p.state.as_deref().unwrap_or("-")
    );
}
