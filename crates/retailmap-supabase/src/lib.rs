//! Client for the hosted Supabase backend: the retailer record store, the
//! `PostGIS` pincode viewport RPC and the boundary import RPC.

pub mod client;
pub mod error;
pub mod import;
pub mod postgrest;
mod retry;

pub use client::SupabaseClient;
pub use error::SupabaseError;
pub use import::{parse_boundary_file, BoundaryRow, ImportReport};
