//! Run configuration for the harvest binary.

use harvest_engine::{ChannelIdentity, HarvestConfig};

/// Channel handles to harvest, in run order.
const CHANNELS: &[&str] = &["@HasanAbi", "@joerogan"];

/// Environment variable holding the metadata provider's API key.
pub(crate) const API_KEY_ENV: &str = "H_YOUTUBE_API_KEY";

pub(crate) fn build() -> HarvestConfig {
    HarvestConfig {
        channels: CHANNELS
            .iter()
            .map(|handle| ChannelIdentity::by_handle(*handle))
            .collect(),
        ..HarvestConfig::default()
    }
}
