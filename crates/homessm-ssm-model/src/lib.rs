//! SSM Parameter Store model types for HomeSSM.
//!
//! Hand-written serde types for the `awsJson1_1` protocol spoken by the AWS
//! SDK's SSM client. Only the parameter and tag operations are modelled.
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{SsmError, SsmErrorCode};
pub use operations::SsmOperation;
