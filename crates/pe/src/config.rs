//! Run-time configuration of a processing element.

use serde::{Deserialize, Serialize};

/// What a processing element does when the mode changes mid-flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardPolicy {
    /// Refuse the switch with [`Error::ModeSwitchInFlight`](crate::Error::ModeSwitchInFlight).
    #[default]
    Reject,
    /// Apply the switch and let the datapath misroute in-flight data the way
    /// the hardware does.
    Faithful,
}

/// Processing-element configuration.
///
/// ```
/// use kyber_pe::{HazardPolicy, PeConfig};
///
/// let config = PeConfig::default()
///     .with_hazard_policy(HazardPolicy::Faithful)
///     .with_cross_check(false);
/// assert_eq!(config.hazard_policy, HazardPolicy::Faithful);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeConfig {
    /// Mode-switch behaviour. Default: [`HazardPolicy::Reject`].
    pub hazard_policy: HazardPolicy,

    /// Compare every completion against the formula reference.
    /// Default: on in debug builds.
    pub cross_check: bool,
}

impl Default for PeConfig {
    fn default() -> Self {
        Self { hazard_policy: HazardPolicy::default(), cross_check: cfg!(debug_assertions) }
    }
}

impl PeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardware-faithful configuration: hazards corrupt data, nothing is checked.
    #[must_use]
    pub fn faithful() -> Self {
        Self { hazard_policy: HazardPolicy::Faithful, cross_check: false }
    }

    #[must_use]
    pub fn with_hazard_policy(mut self, policy: HazardPolicy) -> Self {
        self.hazard_policy = policy;
        self
    }

    #[must_use]
    pub fn with_cross_check(mut self, enabled: bool) -> Self {
        self.cross_check = enabled;
        self
    }
}
