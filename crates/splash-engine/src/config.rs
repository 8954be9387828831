//! Engine settings shared by billing and refunds.

use chrono::{FixedOffset, Offset, Utc};

use splash_core::{Rate, DEFAULT_FACILITY_OFFSET_MINUTES};

/// Engine settings.
///
/// ## Example
/// ```rust
/// use splash_core::Rate;
/// use splash_engine::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_gst_rate(Rate::from_bps(1800))
///     .with_facility_name("Splash Park, Gate 2");
/// assert_eq!(config.max_conflict_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name printed at the top of every receipt.
    pub facility_name: String,

    /// The facility's clock. Bill timestamps and `bill_date` use it.
    /// Default: UTC+05:30
    pub facility_offset: FixedOffset,

    /// GST applied after discount.
    /// Default: 0 bps
    pub gst_rate: Rate,

    /// How many times a lost compare-and-set is retried before the caller
    /// sees `Conflict`.
    /// Default: 3
    pub max_conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            facility_name: "Splash Water Park".to_string(),
            facility_offset: offset_from_minutes(DEFAULT_FACILITY_OFFSET_MINUTES)
                .unwrap_or_else(|| Utc.fix()),
            gst_rate: Rate::zero(),
            max_conflict_retries: 3,
        }
    }
}

impl EngineConfig {
    pub fn with_facility_name(mut self, name: impl Into<String>) -> Self {
        self.facility_name = name.into();
        self
    }

    pub fn with_facility_offset(mut self, offset: FixedOffset) -> Self {
        self.facility_offset = offset;
        self
    }

    pub fn with_gst_rate(mut self, rate: Rate) -> Self {
        self.gst_rate = rate;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }
}

/// A UTC offset east of Greenwich, or `None` if it is not within ±24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}
