//! Dashboard state driven by explicit events.
//!
//! All map and panel interactions arrive as [`DashboardEvent`]s and are folded
//! into an immutable [`Dashboard`] by [`Dashboard::update`]. Nothing else
//! mutates dashboard state.

use chrono::{DateTime, Utc};

use crate::filters::{active_filter_count, apply_filters, FilterState};
use crate::geo::{format_distance, google_maps_url, haversine_km, BoundingBox, MapsLinkMode, Position};
use crate::geolocation::GeolocationError;
use crate::markers::cluster_zoom;
use crate::retailers::Retailer;

pub const LOAD_TROUBLESHOOTING: &[&str] = &[
    "Check that SUPABASE_URL and SUPABASE_ANON_KEY are set in .env",
    "Verify the database schema has been created",
    "Ensure the retailers table exists in Supabase",
];

pub const EMPTY_NEXT_STEPS: &[&str] = &[
    "Open the Supabase dashboard",
    "Run the schema migration for the retailers table",
    "Add retailer data",
    "Reload",
];

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f64,
    pub bounds: Option<BoundingBox>,
}

/// Camera move requested by the dashboard, consumed by the map layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyTo {
    pub center: Position,
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    RetailersLoaded(Vec<Retailer>),
    RetailersFailed(String),
    FilterChanged(FilterState),
    FiltersReset,
    /// Ids of every marker under the click point.
    MarkerClicked(Vec<String>),
    OverlapChosen(String),
    OverlapDismissed,
    DetailClosed,
    ClusterClicked {
        center: Position,
        expansion_zoom: Option<f64>,
    },
    ViewportChanged {
        zoom: f64,
        bounds: Option<BoundingBox>,
    },
    GeolocationUpdated(Result<Position, GeolocationError>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub load: LoadState,
    pub retailers: Vec<Retailer>,
    pub filter: FilterState,
    pub selected: Option<Retailer>,
    /// Co-located retailers awaiting a choice.
    pub overlap: Vec<Retailer>,
    pub viewport: Viewport,
    pub max_zoom: f64,
    pub user_position: Option<Position>,
    pub geolocation_message: Option<String>,
    pub fly_to: Option<FlyTo>,
}

/// What the shell should render.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Loading,
    LoadFailed {
        message: String,
        troubleshooting: &'static [&'static str],
    },
    Empty {
        next_steps: &'static [&'static str],
    },
    Ready {
        visible: usize,
        active_filters: usize,
    },
}

impl Dashboard {
    #[must_use]
    pub fn new(initial_zoom: f64, max_zoom: f64, filter: FilterState) -> Self {
        Self {
            load: LoadState::Loading,
            retailers: Vec::new(),
            filter,
            selected: None,
            overlap: Vec::new(),
            viewport: Viewport {
                zoom: initial_zoom,
                bounds: None,
            },
            max_zoom,
            user_position: None,
            geolocation_message: None,
            fly_to: None,
        }
    }

    #[must_use]
    pub fn update(mut self, event: DashboardEvent) -> Self {
        match event {
            DashboardEvent::RetailersLoaded(retailers) => {
                tracing::info!(count = retailers.len(), "retailers loaded");
                self.retailers = retailers;
                self.load = LoadState::Loaded;
            }
            DashboardEvent::RetailersFailed(message) => {
                tracing::warn!(error = %message, "retailer load failed");
                self.load = LoadState::Failed(message);
            }
            DashboardEvent::FilterChanged(filter) => self.filter = filter,
            DashboardEvent::FiltersReset => {
                // Deep-link overrides survive a reset; they came from the URL.
                let overrides = self.filter.overrides.clone();
                self.filter = FilterState::default().with_overrides(overrides);
            }
            DashboardEvent::MarkerClicked(ids) => {
                let hits: Vec<Retailer> = ids
                    .iter()
                    .filter_map(|id| self.retailers.iter().find(|r| &r.id == id).cloned())
                    .collect();
                match hits.len() {
                    0 => {}
                    1 => {
                        self.selected = hits.into_iter().next();
                        self.overlap.clear();
                    }
                    _ => self.overlap = hits,
                }
            }
            DashboardEvent::OverlapChosen(id) => {
                if let Some(choice) = self.overlap.iter().find(|r| r.id == id).cloned() {
                    self.selected = Some(choice);
                }
                self.overlap.clear();
            }
            DashboardEvent::OverlapDismissed => self.overlap.clear(),
            DashboardEvent::DetailClosed => self.selected = None,
            DashboardEvent::ClusterClicked {
                center,
                expansion_zoom,
            } => {
                let zoom = cluster_zoom(expansion_zoom, self.viewport.zoom, self.max_zoom);
                self.fly_to = Some(FlyTo { center, zoom });
            }
            DashboardEvent::ViewportChanged { zoom, bounds } => {
                self.viewport = Viewport { zoom, bounds };
                self.fly_to = None;
            }
            DashboardEvent::GeolocationUpdated(Ok(position)) => {
                self.user_position = Some(position);
                self.geolocation_message = None;
            }
            DashboardEvent::GeolocationUpdated(Err(err)) => {
                // Keep the last known position; stale beats blank.
                tracing::debug!(error = %err, "geolocation unavailable");
                self.geolocation_message = Some(err.to_string());
            }
        }
        self
    }

    #[must_use]
    pub fn visible_retailers(&self) -> Vec<Retailer> {
        apply_filters(&self.retailers, &self.filter)
    }

    #[must_use]
    pub fn view(&self) -> DashboardView {
        match &self.load {
            LoadState::Loading => DashboardView::Loading,
            LoadState::Failed(message) => DashboardView::LoadFailed {
                message: message.clone(),
                troubleshooting: LOAD_TROUBLESHOOTING,
            },
            LoadState::Loaded if self.retailers.is_empty() => DashboardView::Empty {
                next_steps: EMPTY_NEXT_STEPS,
            },
            LoadState::Loaded => DashboardView::Ready {
                visible: self.visible_retailers().len(),
                active_filters: active_filter_count(&self.filter),
            },
        }
    }

    #[must_use]
    pub fn selected_detail(&self, now: DateTime<Utc>) -> Option<RetailerDetail> {
        self.selected
            .as_ref()
            .map(|r| RetailerDetail::build(r, self.user_position, now))
    }
}

/// `"1 retailer"` / `"12 retailers"`.
#[must_use]
pub fn retailer_count_label(count: usize) -> String {
    if count == 1 {
        "1 retailer".to_string()
    } else {
        format!("{count} retailers")
    }
}

/// Display-ready summary of one retailer.
#[derive(Debug, Clone, PartialEq)]
pub struct RetailerDetail {
    pub title: String,
    pub status: Option<String>,
    pub visibility: &'static str,
    pub address: String,
    pub phone: Option<String>,
    pub distance: Option<String>,
    pub maps_url: Option<String>,
    pub directions_url: Option<String>,
    /// `(label, value)` rows; absent fields are omitted.
    pub facts: Vec<(&'static str, String)>,
    pub visit_due_soon: bool,
}

impl RetailerDetail {
    #[must_use]
    pub fn build(retailer: &Retailer, user: Option<Position>, now: DateTime<Utc>) -> Self {
        let position = retailer.position();
        let distance = user
            .zip(position)
            .map(|(from, to)| format_distance(haversine_km(from, to)));

        let mut facts = Vec::new();
        let mut push = |label: &'static str, value: Option<&String>| {
            if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
                facts.push((label, v.clone()));
            }
        };
        push("Trader", retailer.trader_name.as_ref());
        push("SK ID", retailer.sk_id.as_ref());
        push("Buying category", retailer.buying_category.as_ref());
        push("Darkstore", retailer.darkstore.as_ref());
        push("Team lead", retailer.teamlead_name.as_ref());
        push("City", retailer.city.as_ref());
        push("State", retailer.state.as_ref());
        push("Pincode", retailer.pincode.as_ref());
        let dates = [
            ("Last order", retailer.last_order_date),
            ("Last visit", retailer.last_visit_date),
            ("Next visit", retailer.next_scheduled_visit),
        ];
        for (label, date) in dates {
            if let Some(date) = date {
                facts.push((label, date.format("%B %-d, %Y").to_string()));
            }
        }
        if let Some(notes) = retailer.notes.as_ref().filter(|n| !n.trim().is_empty()) {
            facts.push(("Notes", notes.clone()));
        }

        Self {
            title: retailer.name.clone(),
            status: retailer.retailer_status.clone(),
            visibility: if retailer.is_active { "Visible" } else { "Hidden" },
            address: retailer.address.clone(),
            phone: retailer.phone.clone(),
            distance,
            maps_url: position.map(|p| google_maps_url(p, MapsLinkMode::Search)),
            directions_url: position.map(|p| google_maps_url(p, MapsLinkMode::Directions)),
            facts,
            visit_due_soon: crate::markers::visit_due_soon(retailer, now),
        }
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
