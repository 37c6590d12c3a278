//! SSM operation enum.

use std::fmt;

/// All supported SSM operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsmOperation {
    // Reads
    /// Get one parameter.
    GetParameter,
    /// Get up to ten parameters by name.
    GetParameters,
    /// Get parameters under a path.
    GetParametersByPath,
    /// Describe parameter metadata with filters.
    DescribeParameters,

    // Writes
    /// Create or overwrite a parameter.
    PutParameter,
    /// Delete one parameter.
    DeleteParameter,
    /// Delete up to ten parameters.
    DeleteParameters,

    // Tags
    /// Add or overwrite tags on a parameter.
    AddTagsToResource,
    /// Remove tags by key.
    RemoveTagsFromResource,
    /// List a parameter's tags.
    ListTagsForResource,
}

impl SsmOperation {
    /// Returns the AWS operation name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetParameter => "GetParameter",
            Self::GetParameters => "GetParameters",
            Self::GetParametersByPath => "GetParametersByPath",
            Self::DescribeParameters => "DescribeParameters",
            Self::PutParameter => "PutParameter",
            Self::DeleteParameter => "DeleteParameter",
            Self::DeleteParameters => "DeleteParameters",
            Self::AddTagsToResource => "AddTagsToResource",
            Self::RemoveTagsFromResource => "RemoveTagsFromResource",
            Self::ListTagsForResource => "ListTagsForResource",
        }
    }

    /// Parse an operation name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GetParameter" => Some(Self::GetParameter),
            "GetParameters" => Some(Self::GetParameters),
            "GetParametersByPath" => Some(Self::GetParametersByPath),
            "DescribeParameters" => Some(Self::DescribeParameters),
            "PutParameter" => Some(Self::PutParameter),
            "DeleteParameter" => Some(Self::DeleteParameter),
            "DeleteParameters" => Some(Self::DeleteParameters),
            "AddTagsToResource" => Some(Self::AddTagsToResource),
            "RemoveTagsFromResource" => Some(Self::RemoveTagsFromResource),
            "ListTagsForResource" => Some(Self::ListTagsForResource),
            _ => None,
        }
    }

    /// Whether the operation mutates stored state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::PutParameter
                | Self::DeleteParameter
                | Self::DeleteParameters
                | Self::AddTagsToResource
                | Self::RemoveTagsFromResource
        )
    }
}

impl fmt::Display for SsmOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
