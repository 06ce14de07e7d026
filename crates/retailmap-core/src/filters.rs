//! In-memory retailer filtering.
//!
//! [`FilterState`] is plain data. Update methods consume the state and return
//! the next one, so a view holding the previous value never observes a
//! half-applied change. [`apply_filters`] is a stable filter: the output keeps
//! the input's relative order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::retailers::Retailer;

/// Inclusive date window; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    #[must_use]
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// A missing date is never excluded: absence of data is not a mismatch.
    #[must_use]
    pub fn admits(&self, date: Option<DateTime<Utc>>) -> bool {
        let Some(date) = date else {
            return true;
        };
        if self.from.is_some_and(|from| date < from) {
            return false;
        }
        if self.to.is_some_and(|to| date > to) {
            return false;
        }
        true
    }
}

/// Exact-match overrides supplied through deep-link parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOverrides {
    pub darkstore: Option<String>,
    pub sk_id: Option<String>,
    pub buying_category: Option<String>,
}

impl UrlOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.darkstore.is_none() && self.sk_id.is_none() && self.buying_category.is_none()
    }

    #[must_use]
    pub fn matches(&self, retailer: &Retailer) -> bool {
        exact_match(self.darkstore.as_deref(), retailer.darkstore.as_deref())
            && exact_match(self.sk_id.as_deref(), retailer.sk_id.as_deref())
            && exact_match(
                self.buying_category.as_deref(),
                retailer.buying_category.as_deref(),
            )
    }
}

fn exact_match(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(wanted), Some(actual)) => wanted.to_lowercase() == actual.to_lowercase(),
    }
}

/// Every filter the dashboard can apply. `Default` is the reset state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Status allow-list; empty means no status filtering.
    pub statuses: Vec<String>,
    /// Buying-category allow-list; empty means no category filtering.
    pub buying_categories: Vec<String>,
    pub show_visible: bool,
    pub show_hidden: bool,
    pub last_visit: DateRange,
    pub next_visit: DateRange,
    pub search: String,
    pub overrides: UrlOverrides,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            statuses: Vec::new(),
            buying_categories: Vec::new(),
            show_visible: true,
            show_hidden: true,
            last_visit: DateRange::default(),
            next_visit: DateRange::default(),
            search: String::new(),
            overrides: UrlOverrides::default(),
        }
    }
}

impl FilterState {
    /// Returns `true` when `retailer` passes every active predicate.
    #[must_use]
    pub fn matches(&self, retailer: &Retailer) -> bool {
        if !in_allow_list(&self.statuses, retailer.retailer_status.as_deref()) {
            return false;
        }
        if !in_allow_list(&self.buying_categories, retailer.buying_category.as_deref()) {
            return false;
        }

        if !self.show_visible && retailer.is_active {
            return false;
        }
        if !self.show_hidden && !retailer.is_active {
            return false;
        }

        if !self.last_visit.admits(retailer.last_visit_date) {
            return false;
        }
        if !self.next_visit.admits(retailer.next_scheduled_visit) {
            return false;
        }

        if !self.search.is_empty() {
            let query = self.search.to_lowercase();
            if !searchable_text(retailer).contains(&query) {
                return false;
            }
        }

        self.overrides.matches(retailer)
    }

    #[must_use]
    pub fn with_statuses(mut self, statuses: Vec<String>) -> Self {
        self.statuses = statuses;
        self
    }

    /// Adds `status` if absent, removes it if present.
    #[must_use]
    pub fn toggle_status(mut self, status: &str) -> Self {
        toggle(&mut self.statuses, status);
        self
    }

    #[must_use]
    pub fn with_buying_categories(mut self, categories: Vec<String>) -> Self {
        self.buying_categories = categories;
        self
    }

    #[must_use]
    pub fn toggle_buying_category(mut self, category: &str) -> Self {
        toggle(&mut self.buying_categories, category);
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, show_visible: bool, show_hidden: bool) -> Self {
        self.show_visible = show_visible;
        self.show_hidden = show_hidden;
        self
    }

    #[must_use]
    pub fn with_last_visit_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.last_visit = DateRange::new(from, to);
        self
    }

    #[must_use]
    pub fn with_next_visit_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.next_visit = DateRange::new(from, to);
        self
    }

    #[must_use]
    pub fn with_search(mut self, query: &str) -> Self {
        self.search = query.to_string();
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: UrlOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

fn in_allow_list(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    let value = value.to_lowercase();
    allowed.iter().any(|entry| entry.to_lowercase() == value)
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(idx) = list.iter().position(|v| v == value) {
        list.remove(idx);
    } else {
        list.push(value.to_string());
    }
}

/// Lowercased haystack for free-text search. Missing fields contribute "".
fn searchable_text(retailer: &Retailer) -> String {
    let optional = |field: &Option<String>| field.as_deref().unwrap_or("").to_string();
    [
        retailer.name.clone(),
        retailer.address.clone(),
        optional(&retailer.trader_name),
        optional(&retailer.state),
        optional(&retailer.city),
        optional(&retailer.buying_category),
        optional(&retailer.teamlead_name),
        optional(&retailer.darkstore),
    ]
    .join(" ")
    .to_lowercase()
}

/// Returns the retailers passing every active predicate, in input order.
#[must_use]
pub fn apply_filters(retailers: &[Retailer], filter: &FilterState) -> Vec<Retailer> {
    retailers
        .iter()
        .filter(|r| filter.matches(r))
        .cloned()
        .collect()
}

/// Number of predicate groups in a non-default state.
///
/// Counts groups, not values: three selected statuses count once.
#[must_use]
pub fn active_filter_count(filter: &FilterState) -> usize {
    [
        !filter.statuses.is_empty(),
        !filter.buying_categories.is_empty(),
        !filter.show_visible || !filter.show_hidden,
        filter.last_visit.is_active(),
        filter.next_visit.is_active(),
        !filter.search.is_empty(),
        !filter.overrides.is_empty(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
}

/// Distinct status labels, deduplicated case-insensitively and sorted.
#[must_use]
pub fn distinct_statuses(retailers: &[Retailer]) -> Vec<String> {
    distinct(retailers.iter().map(|r| r.retailer_status.as_deref()))
}

/// Distinct buying categories, deduplicated case-insensitively and sorted.
#[must_use]
pub fn distinct_buying_categories(retailers: &[Retailer]) -> Vec<String> {
    distinct(retailers.iter().map(|r| r.buying_category.as_deref()))
}

// First spelling seen wins.
fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for value in values.flatten() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        seen.entry(trimmed.to_lowercase())
            .or_insert_with(|| trimmed.to_string());
    }
    seen.into_values().collect()
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;
