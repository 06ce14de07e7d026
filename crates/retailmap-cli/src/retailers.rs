//! `retailers` command: load, filter and render the retailer list the way the
//! dashboard would.

use chrono::{DateTime, Utc};
use clap::Args;

use retailmap_core::dashboard::{retailer_count_label, RetailerDetail};
use retailmap_core::filters::{distinct_buying_categories, distinct_statuses};
use retailmap_core::geo::{fit_bounds, format_distance, haversine_km};
use retailmap_core::markers::{marker_color, retailer_features};
use retailmap_core::retailers::parse_date_arg;
use retailmap_core::{
    AppConfig, Dashboard, DashboardEvent, DashboardView, FilterState, GeolocationError,
    MapSettings, Position, Retailer, StatusPalette, UrlOverrides,
};
use retailmap_supabase::SupabaseClient;

use crate::OutputFormat;

/// Map size assumed when reporting the camera that fits every shown marker.
const FIT_MAP_SIZE: (u32, u32) = (1280, 800);

#[derive(Debug, Args)]
pub(crate) struct RetailerArgs {
    /// Only show these statuses (repeatable, case-insensitive)
    #[arg(long = "status")]
    pub statuses: Vec<String>,
    /// Only show these buying categories (repeatable, case-insensitive)
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// Exclude retailers marked visible
    #[arg(long)]
    pub hide_visible: bool,
    /// Exclude retailers marked hidden
    #[arg(long)]
    pub hide_hidden: bool,
    #[arg(long, value_parser = parse_date_arg)]
    pub last_visit_from: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_date_arg)]
    pub last_visit_to: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_date_arg)]
    pub next_visit_from: Option<DateTime<Utc>>,
    #[arg(long, value_parser = parse_date_arg)]
    pub next_visit_to: Option<DateTime<Utc>>,
    /// Free-text search across name, address, trader, location and darkstore
    #[arg(long)]
    pub search: Option<String>,
    /// Deep-link query string, e.g. "darkstore=BLR-01&sk_id=SK42"
    #[arg(long)]
    pub link: Option<String>,
    #[arg(long)]
    pub darkstore: Option<String>,
    #[arg(long)]
    pub sk_id: Option<String>,
    #[arg(long)]
    pub buying_category: Option<String>,
    /// Show the detail panel for this retailer id
    #[arg(long)]
    pub id: Option<String>,
    /// Your latitude, for distances
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Your longitude, for distances
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// List the status and category values present in the data
    #[arg(long)]
    pub options: bool,
    #[arg(long, value_enum, default_value = "summary")]
    pub format: OutputFormat,
}

impl RetailerArgs {
    /// Deep-link overrides from `--link`, with explicit flags taking precedence.
    pub(crate) fn overrides(&self) -> UrlOverrides {
        let mut overrides = self
            .link
            .as_deref()
            .map(UrlOverrides::from_query)
            .unwrap_or_default();
        let explicit = [
            (&mut overrides.darkstore, &self.darkstore),
            (&mut overrides.sk_id, &self.sk_id),
            (&mut overrides.buying_category, &self.buying_category),
        ];
        for (slot, value) in explicit {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                *slot = Some(value.to_string());
            }
        }
        overrides
    }

    pub(crate) fn filter(&self) -> FilterState {
        let mut filter = FilterState::default()
            .with_statuses(self.statuses.clone())
            .with_buying_categories(self.categories.clone())
            .with_visibility(!self.hide_visible, !self.hide_hidden)
            .with_last_visit_range(self.last_visit_from, self.last_visit_to)
            .with_next_visit_range(self.next_visit_from, self.next_visit_to)
            .with_overrides(self.overrides());
        if let Some(search) = &self.search {
            filter = filter.with_search(search);
        }
        filter
    }

    pub(crate) fn position(&self) -> Option<Position> {
        Some(Position {
            latitude: self.lat?,
            longitude: self.lng?,
        })
    }
}

/// Loads retailers and prints what the dashboard would show.
///
/// Category colors are optional: when the category table cannot be read the
/// built-in palette is used.
///
/// # Errors
///
/// Returns an error when map settings are invalid, the client cannot be
/// built, the retailer load fails, or output cannot be serialized.
pub(crate) async fn run_retailers(config: &AppConfig, args: &RetailerArgs) -> anyhow::Result<()> {
    let settings = crate::map_settings(config)?;
    let client = SupabaseClient::from_app_config(config)?;
    let filter = args.filter();

    let palette = match client.fetch_retailer_categories().await {
        Ok(categories) => settings.palette().apply_categories(&categories),
        Err(err) => {
            tracing::warn!(error = %err, "retailer categories unavailable, using default colors");
            settings.palette()
        }
    };

    let mut dashboard = Dashboard::new(settings.initial_view.zoom, settings.max_zoom, filter);
    dashboard = match client.fetch_all_retailers(&dashboard.filter.overrides).await {
        Ok(retailers) => dashboard.update(DashboardEvent::RetailersLoaded(retailers)),
        Err(err) => dashboard.update(DashboardEvent::RetailersFailed(err.to_string())),
    };
    // Without --lat/--lng there is no device to ask for a position.
    let located = match args.position() {
        Some(position) => Ok(position),
        None => Err(GeolocationError::Unsupported),
    };
    dashboard = dashboard.update(DashboardEvent::GeolocationUpdated(located));
    if let Some(id) = &args.id {
        dashboard = dashboard.update(DashboardEvent::MarkerClicked(vec![id.clone()]));
    }

    let now = Utc::now();
    match dashboard.view() {
        DashboardView::Loading => println!("loading retailers..."),
        DashboardView::LoadFailed {
            message,
            troubleshooting,
        } => {
            eprintln!("failed to load retailers: {message}");
            for line in troubleshooting {
                eprintln!("  - {line}");
            }
            anyhow::bail!("retailer load failed");
        }
        DashboardView::Empty { next_steps } => {
            println!("no retailers found. next steps:");
            for (i, step) in next_steps.iter().enumerate() {
                println!("  {}. {step}", i + 1);
            }
        }
        DashboardView::Ready {
            visible,
            active_filters,
        } => {
            if args.options {
                print_options(&dashboard.retailers);
            }
            let shown = dashboard.visible_retailers();
            match args.format {
                OutputFormat::Summary => {
                    print_summary(
                        &dashboard,
                        &shown,
                        &settings,
                        &palette,
                        now,
                        visible,
                        active_filters,
                    );
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
                OutputFormat::Geojson => println!(
                    "{}",
                    serde_json::to_string_pretty(&retailer_features(&shown, &palette, now))?
                ),
            }
            if let Some(detail) = dashboard.selected_detail(now) {
                print_detail(&detail, dashboard.geolocation_message.as_deref());
            } else if let Some(id) = &args.id {
                println!("no retailer with id '{id}'");
            }
        }
    }

    Ok(())
}

fn print_options(retailers: &[Retailer]) {
    println!("statuses:   {}", distinct_statuses(retailers).join(", "));
    println!("categories: {}", distinct_buying_categories(retailers).join(", "));
    println!();
}

fn print_summary(
    dashboard: &Dashboard,
    shown: &[Retailer],
    settings: &MapSettings,
    palette: &StatusPalette,
    now: DateTime<Utc>,
    visible: usize,
    active_filters: usize,
) {
    println!(
        "{} shown of {} ({active_filters} filters active)",
        retailer_count_label(visible),
        dashboard.retailers.len()
    );
    if let Some(bounds) = fit_bounds(shown) {
        println!(
            "bounds: west {:.4} south {:.4} east {:.4} north {:.4}",
            bounds.west, bounds.south, bounds.east, bounds.north
        );
        let (width, height) = FIT_MAP_SIZE;
        let view = settings.fit_view(&bounds, width, height);
        println!(
            "fit: center ({:.4}, {:.4}) zoom {:.2} on a {width}x{height} map",
            view.latitude, view.longitude, view.zoom
        );
    }
    println!();
    println!(
        "{:<28}{:<10}{:<16}{:<12}{:<10}COLOR",
        "NAME", "STATUS", "CITY", "NEXT VISIT", "DISTANCE"
    );
    for retailer in shown {
        let next_visit = retailer
            .next_scheduled_visit
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let distance = dashboard
            .user_position
            .zip(retailer.position())
            .map_or_else(|| "-".to_string(), |(from, to)| format_distance(haversine_km(from, to)));
        println!(
            "{:<28}{:<10}{:<16}{:<12}{:<10}{}",
            truncate(&retailer.name, 26),
            retailer.retailer_status.as_deref().unwrap_or("-"),
            truncate(retailer.city.as_deref().unwrap_or("-"), 14),
            next_visit,
            distance,
            marker_color(retailer, palette, now)
        );
    }
}

fn print_detail(detail: &RetailerDetail, geolocation_message: Option<&str>) {
    println!();
    println!("{} [{}]", detail.title, detail.visibility);
    if let Some(status) = &detail.status {
        println!("  Status: {status}");
    }
    if !detail.address.is_empty() {
        println!("  Address: {}", detail.address);
    }
    if let Some(phone) = &detail.phone {
        println!("  Phone: {phone}");
    }
    match (&detail.distance, geolocation_message) {
        (Some(distance), _) => println!("  Distance: {distance}"),
        (None, Some(message)) => println!("  Distance: unknown ({message})"),
        (None, None) => {}
    }
    for (label, value) in &detail.facts {
        println!("  {label}: {value}");
    }
    if detail.visit_due_soon {
        println!("  Visit due soon");
    }
    if let Some(url) = &detail.maps_url {
        println!("  Map: {url}");
    }
    if let Some(url) = &detail.directions_url {
        println!("  Directions: {url}");
    }
}

pub(crate) fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        value.to_string()
    }
}
