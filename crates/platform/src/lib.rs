pub mod client;
pub mod error;

pub use client::{AdPlatformClient, AttributionProvider, EntityScope, MetricsProvider, RevenueRow};
pub use error::PlatformError;
