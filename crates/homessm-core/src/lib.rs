//! Core types and configuration for HomeSSM.
//!
//! This crate holds the pieces every other HomeSSM crate agrees on: the
//! YAML configuration file format, the fixed account identity, and the ARN
//! formats used when shaping responses.

mod config;
mod error;
mod types;

pub use config::{CredentialConfig, HomeSsmConfig, KeyConfig};
pub use error::{HomeSsmError, HomeSsmResult};
pub use types::{AccountId, Partition, parameter_arn, user_arn};
