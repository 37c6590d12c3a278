//! Shared SSM types.
//!
//! The string enums keep unrecognized wire values in an `Unknown` variant so
//! the service can reject them with the proper error code instead of a
//! deserialization failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameter value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// Plain string.
    String,
    /// Comma-separated list of strings.
    StringList,
    /// Encrypted string.
    SecureString,
    /// Anything else the client sent.
    Unknown(std::string::String),
}

impl ParameterType {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "String",
            Self::StringList => "StringList",
            Self::SecureString => "SecureString",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "String" => Self::String,
            "StringList" => Self::StringList,
            "SecureString" => Self::SecureString,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl Serialize for ParameterType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParameterType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = std::string::String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter storage tier. HomeSSM stores every tier the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ParameterTier {
    /// `Standard`
    #[default]
    Standard,
    /// `Advanced`
    Advanced,
    /// `Intelligent-Tiering`
    IntelligentTiering,
    /// Anything else the client sent.
    Unknown(String),
}

impl ParameterTier {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "Standard",
            Self::Advanced => "Advanced",
            Self::IntelligentTiering => "Intelligent-Tiering",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "Standard" => Self::Standard,
            "Advanced" => Self::Advanced,
            "Intelligent-Tiering" => Self::IntelligentTiering,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl Serialize for ParameterTier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParameterTier {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

impl fmt::Display for ParameterTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// `text`
    #[default]
    Text,
    /// `aws:ec2:image`
    Ec2Image,
    /// `aws:ssm:integration`
    SsmIntegration,
    /// Anything else the client sent.
    Unknown(String),
}

impl DataType {
    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Ec2Image => "aws:ec2:image",
            Self::SsmIntegration => "aws:ssm:integration",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "text" => Self::Text,
            "aws:ec2:image" => Self::Ec2Image,
            "aws:ssm:integration" => Self::SsmIntegration,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// A filter for `DescribeParameters` and `GetParametersByPath`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterStringFilter {
    /// `Name`, `Type`, `KeyId`, `Path`, `Label`, `Tier` or `DataType`.
    pub key: String,
    /// `Equals`, `BeginsWith`, `Recursive` or `OneLevel`. Absent means `Equals`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A parameter as returned by the `Get*` operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "ARN")]
    pub arn: String,
    pub data_type: DataType,
    /// Epoch seconds.
    pub last_modified_date: f64,
    pub name: String,
    #[serde(rename = "Type")]
    pub parameter_type: ParameterType,
    pub value: String,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_result: Option<String>,
}

/// Parameter metadata as returned by `DescribeParameters`. Never carries the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_pattern: Option<String>,
    #[serde(rename = "ARN")]
    pub arn: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    pub last_modified_date: f64,
    pub last_modified_user: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
    pub tier: ParameterTier,
    #[serde(rename = "Type")]
    pub parameter_type: ParameterType,
    pub version: i64,
}
