use clap::Parser;

use retailmap_core::Position;

use super::*;
use crate::follow::parse_observation;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args.iter().copied()).expect("expected valid cli args")
}

#[test]
fn parses_retailer_filters() {
    let cli = parse(&[
        "retailmap",
        "retailers",
        "--status",
        "Active",
        "--status",
        "idle",
        "--hide-hidden",
        "--next-visit-from",
        "2024-06-01",
        "--search",
        "kirana",
        "--format",
        "geojson",
    ]);
    let Commands::Retailers(args) = cli.command else {
        panic!("expected retailers command");
    };
    assert_eq!(args.format, OutputFormat::Geojson);
    let filter = args.filter();
    assert_eq!(filter.statuses, vec!["Active", "idle"]);
    assert!(filter.show_visible);
    assert!(!filter.show_hidden);
    assert!(filter.next_visit.from.is_some());
    assert_eq!(filter.search, "kirana");
}

#[test]
fn rejects_unparseable_date() {
    assert!(Cli::try_parse_from(["retailmap", "retailers", "--last-visit-to", "last tuesday"]).is_err());
}

#[test]
fn explicit_override_flags_beat_link() {
    let cli = parse(&[
        "retailmap",
        "retailers",
        "--link",
        "darkstore=BLR-01&sk_id=SK1",
        "--sk-id",
        "SK9",
    ]);
    let Commands::Retailers(args) = cli.command else {
        panic!("expected retailers command");
    };
    let overrides = args.overrides();
    assert_eq!(overrides.darkstore.as_deref(), Some("BLR-01"));
    assert_eq!(overrides.sk_id.as_deref(), Some("SK9"));
    assert!(overrides.buying_category.is_none());
}

#[test]
fn lat_requires_lng() {
    assert!(Cli::try_parse_from(["retailmap", "retailers", "--lat", "12.9"]).is_err());
    let cli = parse(&["retailmap", "retailers", "--lat", "12.9", "--lng", "77.6"]);
    let Commands::Retailers(args) = cli.command else {
        panic!("expected retailers command");
    };
    assert_eq!(
        args.position(),
        Some(Position {
            latitude: 12.9,
            longitude: 77.6
        })
    );
}

#[test]
fn pincodes_accepts_negative_longitudes() {
    let cli = parse(&[
        "retailmap", "pincodes", "--zoom", "13", "--west", "-0.2", "--south", "51.4", "--east",
        "0.1", "--north", "51.6",
    ]);
    let Commands::Pincodes(args) = cli.command else {
        panic!("expected pincodes command");
    };
    assert!((args.west + 0.2).abs() < f64::EPSILON);
    assert_eq!(args.format, OutputFormat::Summary);
}

#[test]
fn pincodes_can_focus_on_one_pincode() {
    let cli = parse(&[
        "retailmap", "pincodes", "--zoom", "13", "--west", "77.5", "--south", "12.9", "--east",
        "77.7", "--north", "13.1", "--pincode", "560001",
    ]);
    let Commands::Pincodes(args) = cli.command else {
        panic!("expected pincodes command");
    };
    assert_eq!(args.pincode.as_deref(), Some("560001"));
}

#[test]
fn import_defaults_to_batches_of_fifty() {
    let cli = parse(&["retailmap", "import-pincodes", "india.geojson"]);
    let Commands::ImportPincodes(args) = cli.command else {
        panic!("expected import-pincodes command");
    };
    assert_eq!(args.batch_size, 50);
    assert_eq!(args.delay_ms, 200);
    assert!(!args.dry_run);
}

#[test]
fn observation_lines() {
    assert_eq!(parse_observation("  ").unwrap(), None);
    assert_eq!(parse_observation("# comment").unwrap(), None);
    assert_eq!(parse_observation("11").unwrap(), Some((11.0, None)));

    let (zoom, bounds) = parse_observation("13 77.5 12.9 77.7 13.1").unwrap().unwrap();
    assert!((zoom - 13.0).abs() < f64::EPSILON);
    let bounds = bounds.unwrap();
    assert!((bounds.north - 13.1).abs() < f64::EPSILON);

    assert!(parse_observation("13,77.5,12.9,77.7,13.1").unwrap().is_some());
    assert!(parse_observation("13 77.5 12.9").is_err());
    assert!(parse_observation("13 abc 12.9 77.7 13.1").is_err());
    assert!(parse_observation("13 77.5 13.1 77.7 12.9").is_err());
}

#[test]
fn observation_lines_reject_non_finite_values() {
    assert_eq!(
        parse_observation("NaN 77.5 12.9 77.7 13.1").unwrap_err(),
        "'NaN' is not a finite number"
    );
    assert!(parse_observation("inf").is_err());
    assert!(parse_observation("13 77.5 12.9 -inf 13.1").is_err());
}

#[test]
fn truncates_long_names() {
    assert_eq!(retailers::truncate("Short", 10), "Short");
    assert_eq!(retailers::truncate("A very long retailer name", 10), "A very ...");
}
