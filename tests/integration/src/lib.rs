//! Integration tests for the HomeSSM server.
//!
//! These tests require a running HomeSSM server at `localhost:9080` whose
//! configuration accepts the `test` / `test` credential for `us-east-1`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p homessm-integration -- --ignored
//! ```

use std::sync::Once;

use aws_credential_types::Credentials;
use aws_sdk_ssm::config::{BehaviorVersion, Region};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("HOMESSM_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:9080".to_owned())
}

/// Create an SSM client signing with `access_key` / `secret_key`.
#[must_use]
pub fn ssm_client_with(access_key: &str, secret_key: &str) -> aws_sdk_ssm::Client {
    init_tracing();

    let creds = Credentials::new(access_key, secret_key, None, None, "integration-test");

    let config = aws_sdk_ssm::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .build();

    aws_sdk_ssm::Client::from_conf(config)
}

/// Create an SSM client with the `test` / `test` credential.
#[must_use]
pub fn ssm_client() -> aws_sdk_ssm::Client {
    ssm_client_with("test", "test")
}

/// Generate a unique parameter path prefix for a test.
#[must_use]
pub fn test_prefix(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("/test-{prefix}-{id}")
}

/// Delete every parameter under `prefix`.
pub async fn cleanup_prefix(client: &aws_sdk_ssm::Client, prefix: &str) {
    let mut next_token = None;
    loop {
        let mut req = client
            .get_parameters_by_path()
            .path(prefix)
            .recursive(true);
        if let Some(token) = next_token.take() {
            req = req.next_token(token);
        }
        let Ok(resp) = req.send().await else {
            return;
        };

        for param in resp.parameters() {
            if let Some(name) = param.name() {
                let _ = client.delete_parameter().name(name).send().await;
            }
        }

        match resp.next_token() {
            Some(token) => next_token = Some(token.to_owned()),
            None => break,
        }
    }
}

mod test_auth;
mod test_parameters;
mod test_path;
mod test_tags;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_client_with_static_credentials() {
        let client = ssm_client_with("AKIAHOME", "s3cret");
        let region = client.config().region().map(ToString::to_string);
        assert_eq!(region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn test_should_generate_unique_prefixes() {
        let a = test_prefix("x");
        let b = test_prefix("x");
        assert!(a.starts_with("/test-x-"));
        assert_ne!(a, b);
    }
}
