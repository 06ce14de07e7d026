use std::future::Future;

use retailmap_core::{BoundingBox, PincodeCollection};
use retailmap_supabase::SupabaseClient;

use crate::error::SourceError;

/// Anything that can answer "which boundaries intersect this box at this zoom".
pub trait BoundarySource: Send + Sync + 'static {
    fn fetch(
        &self,
        bounds: BoundingBox,
        zoom: f64,
    ) -> impl Future<Output = Result<PincodeCollection, SourceError>> + Send;
}

impl BoundarySource for SupabaseClient {
    async fn fetch(&self, bounds: BoundingBox, zoom: f64) -> Result<PincodeCollection, SourceError> {
        Ok(self.pincodes_in_viewport(bounds, zoom).await?)
    }
}
