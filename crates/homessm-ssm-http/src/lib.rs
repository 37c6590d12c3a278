//! SSM HTTP service layer for HomeSSM.
//!
//! This crate implements the `awsJson1_1` protocol for the parameter API:
//!
//! - **Router**: Extracts the operation from the `X-Amz-Target` header
//! - **Handler trait**: The boundary between HTTP and the parameter service
//! - **Service**: Hyper `Service` that collects, authenticates and dispatches
//! - **Response helpers**: JSON success and error envelopes
#![allow(missing_docs)]

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::SsmResponseBody;
pub use dispatch::{RequestContext, SsmHandler};
pub use service::{SsmHttpConfig, SsmHttpService};
