//! Parameter service configuration.

use typed_builder::TypedBuilder;

use homessm_core::{AccountId, Partition};

/// Identity the provider stamps into ARNs.
///
/// # Examples
///
/// ```
/// use homessm_ssm_core::config::SsmConfig;
///
/// let config = SsmConfig::builder().region("eu-west-1").build();
/// assert_eq!(config.region, "eu-west-1");
/// assert_eq!(config.account_id.as_str(), "000000000000");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SsmConfig {
    /// Configured region. Empty means "use the region the caller signed for".
    #[builder(default, setter(into))]
    pub region: String,

    /// Account that owns every parameter.
    #[builder(default)]
    pub account_id: AccountId,

    /// ARN partition.
    #[builder(default)]
    pub partition: Partition,
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
