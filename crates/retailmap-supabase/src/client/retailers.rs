//! Retailer table reads.

use retailmap_core::{Retailer, RetailerCategory, UrlOverrides};

use crate::error::SupabaseError;
use crate::postgrest::ilike_exact;

use super::{SupabaseClient, MAX_PAGES};

impl SupabaseClient {
    /// Fetches one page of retailers ordered by name.
    ///
    /// Overrides that are set become case-insensitive equality filters on
    /// the corresponding column.
    ///
    /// # Errors
    ///
    /// Propagates [`SupabaseError`] from the request after retries.
    pub async fn fetch_retailers_page(
        &self,
        overrides: &UrlOverrides,
        offset: usize,
        limit: u32,
    ) -> Result<Vec<Retailer>, SupabaseError> {
        let mut url = self.rest_url("retailers")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("order", "name.asc")
                .append_pair("offset", &offset.to_string())
                .append_pair("limit", &limit.to_string());
            let filters = [
                ("darkstore", overrides.darkstore.as_deref()),
                ("sk_id", overrides.sk_id.as_deref()),
                ("buying_category", overrides.buying_category.as_deref()),
            ];
            for (column, value) in filters {
                if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
                    query.append_pair(column, &ilike_exact(value));
                }
            }
        }

        let context = format!("retailers page at offset {offset}");
        self.execute(&context, |client| client.get(url.clone())).await
    }

    /// Fetches every retailer, page by page, until a short or empty page.
    ///
    /// All-or-nothing: if any page fails the rows already fetched are
    /// discarded and the error is returned, so callers never render a
    /// partial list as if it were complete.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_retailers_page`].
    /// Returns [`SupabaseError::PaginationLimit`] after [`MAX_PAGES`] full pages.
    pub async fn fetch_all_retailers(
        &self,
        overrides: &UrlOverrides,
    ) -> Result<Vec<Retailer>, SupabaseError> {
        let limit = self.page_size;
        let mut all: Vec<Retailer> = Vec::new();
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(SupabaseError::PaginationLimit {
                    table: "retailers".to_string(),
                    max_pages: MAX_PAGES,
                });
            }

            let page = self
                .fetch_retailers_page(overrides, all.len(), limit)
                .await?;
            let page_len = page.len();
            tracing::debug!(page = page_count, rows = page_len, "fetched retailers page");
            all.extend(page);

            if page_len < limit as usize {
                break;
            }
        }

        tracing::info!(
            count = all.len(),
            pages = page_count,
            filtered = !overrides.is_empty(),
            "retailers fetched"
        );
        Ok(all)
    }

    /// Fetches the status category rows used to override marker colors.
    ///
    /// # Errors
    ///
    /// Propagates [`SupabaseError`] from the request after retries.
    pub async fn fetch_retailer_categories(&self) -> Result<Vec<RetailerCategory>, SupabaseError> {
        let mut url = self.rest_url("retailer_categories")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "name.asc");
        let categories: Vec<RetailerCategory> = self
            .execute("retailer categories", |client| client.get(url.clone()))
            .await?;
        tracing::debug!(count = categories.len(), "retailer categories fetched");
        Ok(categories)
    }
}
