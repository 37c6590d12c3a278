//! SSM Parameter Store core for HomeSSM.
//!
//! Layering, from the leaves up:
//!
//! - [`storage`]: transactional key/value backends (redb, in-memory)
//! - [`crypto`]: AES-256-GCM sealing of `SecureString` values
//! - [`store`]: the versioned, encrypted parameter store
//! - [`validation`] and [`filter`]: request checks and filter compilation
//! - [`provider`]: the ten parameter and tag operations
//! - [`handler`]: the bridge from the HTTP layer to the provider
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod config;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod handler;
pub mod provider;
pub mod storage;
pub mod store;
pub mod validation;
