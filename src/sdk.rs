//! Shared AWS SDK configuration loading.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

use crate::account::DEFAULT_REGION;

/// Loads SDK configuration for the source identity.
///
/// Region priority: explicit `region` → profile/env → [`DEFAULT_REGION`].
/// `endpoint` overrides every service endpoint (LocalStack).
pub async fn load_config(
    profile: Option<&str>,
    region: Option<&str>,
    endpoint: Option<&str>,
) -> SdkConfig {
    let loader = || {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        loader
    };

    if let Some(region) = region.filter(|r| !r.is_empty()) {
        return loader().region(Region::new(region.to_string())).load().await;
    }

    let loaded = loader().load().await;
    match loaded.region() {
        Some(region) => {
            info!("Using region: {}", region);
            loaded
        }
        None => {
            info!("No region configured, using default {}", DEFAULT_REGION);
            loader().region(Region::new(DEFAULT_REGION)).load().await
        }
    }
}
