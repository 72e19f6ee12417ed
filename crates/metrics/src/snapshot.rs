//! JSON view of the gauge state for `/api/metrics`.

use {
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// Point-in-time copy of the published gauges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GaugeSnapshot {
    /// When the snapshot was taken (Unix millis)
    pub timestamp: u64,
    /// Last published membership count, absent until the first success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<u64>,
    /// Last published message count per channel name
    pub channels: BTreeMap<String, u64>,
}

impl GaugeSnapshot {
    /// Sum of all published channel counts.
    #[must_use]
    pub fn total_messages(&self) -> u64 {
        self.channels.values().sum()
    }
}
