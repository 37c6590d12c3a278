//! Account identity and ARN formatting.

use std::fmt;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// The all-zero account every HomeSSM parameter belongs to.
    pub const DEFAULT: &str = "000000000000";

    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::HomeSsmError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::HomeSsmError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ARN partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Partition {
    /// The standard `aws` partition.
    #[default]
    Aws,
}

impl Partition {
    /// Returns the partition segment used inside ARNs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the ARN of a parameter.
///
/// The leading `/` of an absolute parameter path is dropped, so `/app/db`
/// becomes `parameter/app/db`.
///
/// # Examples
///
/// ```
/// use homessm_core::{AccountId, Partition, parameter_arn};
///
/// let arn = parameter_arn(Partition::Aws, "us-east-1", &AccountId::default(), "/app/db");
/// assert_eq!(arn, "arn:aws:ssm:us-east-1:000000000000:parameter/app/db");
/// ```
#[must_use]
pub fn parameter_arn(partition: Partition, region: &str, account: &AccountId, name: &str) -> String {
    let path = name.strip_prefix('/').unwrap_or(name);
    format!("arn:{partition}:ssm:{region}:{account}:parameter/{path}")
}

/// Build the IAM user ARN credited as a parameter's last modifier.
#[must_use]
pub fn user_arn(partition: Partition, account: &AccountId, owner: &str) -> String {
    format!("arn:{partition}:iam::{account}:user/{owner}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_valid_account_id() {
        let id = AccountId::new("123456789012").unwrap();
        assert_eq!(id.as_str(), "123456789012");
    }

    #[test]
    fn test_should_reject_invalid_account_id() {
        assert!(AccountId::new("12345").is_err());
        assert!(AccountId::new("abcdefghijkl").is_err());
    }

    #[test]
    fn test_should_use_zero_account_by_default() {
        assert_eq!(AccountId::default().as_str(), "000000000000");
    }

    #[test]
    fn test_should_strip_leading_slash_in_parameter_arn() {
        let account = AccountId::default();
        assert_eq!(
            parameter_arn(Partition::Aws, "eu-west-1", &account, "/a/b"),
            "arn:aws:ssm:eu-west-1:000000000000:parameter/a/b"
        );
        assert_eq!(
            parameter_arn(Partition::Aws, "eu-west-1", &account, "plain"),
            "arn:aws:ssm:eu-west-1:000000000000:parameter/plain"
        );
    }

    #[test]
    fn test_should_format_user_arn() {
        assert_eq!(
            user_arn(Partition::Aws, &AccountId::default(), "alice"),
            "arn:aws:iam::000000000000:user/alice"
        );
    }
}
