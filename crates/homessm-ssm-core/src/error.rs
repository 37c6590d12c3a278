//! Mapping from store failures to wire errors.

use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::ssm_error;

use crate::store::StoreError;

/// Convert a store error into an SSM error.
///
/// Infrastructure failures are logged here and reach the client only as the
/// generic internal error.
///
/// Takes `e` by value because this is used as a closure argument to `.map_err()`.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn store_error_to_ssm(e: StoreError) -> SsmError {
    let err = match &e {
        StoreError::NotFound(name) => SsmError::parameter_not_found(name),
        StoreError::AlreadyExists(_) => ssm_error!(ParameterAlreadyExists),
        StoreError::UnknownKey(_) | StoreError::Crypto(_) => ssm_error!(InvalidKeyId),
        StoreError::KeyConfig(_)
        | StoreError::Storage(_)
        | StoreError::Corrupt { .. }
        | StoreError::Encode(_) => {
            tracing::error!(error = %e, "parameter store failure");
            SsmError::internal_error()
        }
    };
    err.with_source(e)
}

/// Like [`store_error_to_ssm`], but reports a missing parameter under the
/// name the caller sent.
#[must_use]
pub fn lookup_error(requested: &str) -> impl FnOnce(StoreError) -> SsmError + '_ {
    move |e| match e {
        StoreError::NotFound(_) => SsmError::parameter_not_found(requested),
        other => store_error_to_ssm(other),
    }
}
