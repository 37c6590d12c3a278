//! SSM provider implementing the parameter and tag operations.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use homessm_core::{parameter_arn, user_arn};
use homessm_ssm_http::dispatch::RequestContext;
use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::input::{
    AddTagsToResourceInput, DeleteParameterInput, DeleteParametersInput, DescribeParametersInput,
    GetParameterInput, GetParametersByPathInput, GetParametersInput, ListTagsForResourceInput,
    PutParameterInput, RemoveTagsFromResourceInput,
};
use homessm_ssm_model::output::{
    AddTagsToResourceOutput, DeleteParameterOutput, DeleteParametersOutput,
    DescribeParametersOutput, GetParameterOutput, GetParametersByPathOutput, GetParametersOutput,
    ListTagsForResourceOutput, PutParameterOutput, RemoveTagsFromResourceOutput,
};
use homessm_ssm_model::ssm_error;
use homessm_ssm_model::types::{Parameter, ParameterMetadata, ParameterType, Tag};

use crate::config::SsmConfig;
use crate::error::{lookup_error, store_error_to_ssm};
use crate::filter::{CompiledFilters, compile_by_path, compile_describe};
use crate::store::{KeyFilter, MatchMode, ParameterRecord, ParameterStore, StoreError};
use crate::validation;

/// Upper bound of `MaxResults` for `GetParametersByPath`.
const MAX_RESULTS_BY_PATH: usize = 10;

/// Upper bound of `MaxResults` for `DescribeParameters`.
const MAX_RESULTS_DESCRIBE: usize = 50;

/// The only taggable resource type.
const RESOURCE_TYPE_PARAMETER: &str = "Parameter";

/// Current time as fractional epoch seconds.
#[allow(clippy::cast_precision_loss)]
fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Split a sorted result set into one page and the token for the next.
fn paginate(
    records: Vec<ParameterRecord>,
    next_token: Option<&str>,
    page_size: usize,
) -> Result<(Vec<ParameterRecord>, Option<String>), SsmError> {
    let start_after = next_token
        .filter(|t| !t.is_empty())
        .map(validation::decode_next_token)
        .transpose()?;

    let mut remaining = records
        .into_iter()
        .filter(|r| start_after.as_deref().is_none_or(|after| r.name.as_str() > after));
    let page: Vec<ParameterRecord> = remaining.by_ref().take(page_size).collect();
    let next = if remaining.next().is_some() {
        page.last().map(|r| validation::encode_next_token(&r.name))
    } else {
        None
    };
    Ok((page, next))
}

/// Reject duplicate tag keys within one request.
fn check_unique_tags(tags: &[Tag]) -> Result<(), SsmError> {
    let mut seen = HashSet::new();
    for tag in tags {
        if tag.key.is_empty() {
            return Err(SsmError::validation("Tag keys must not be empty."));
        }
        if !seen.insert(tag.key.as_str()) {
            return Err(SsmError::validation(format!(
                "Duplicate tag key '{}' in request.",
                tag.key
            )));
        }
    }
    Ok(())
}

fn check_resource_type(resource_type: &str) -> Result<(), SsmError> {
    if resource_type == RESOURCE_TYPE_PARAMETER {
        Ok(())
    } else {
        Err(SsmError::validation(format!(
            "Resource type '{resource_type}' is not supported. Only Parameter can be tagged."
        )))
    }
}

/// The HomeSSM parameter service.
#[derive(Debug)]
pub struct HomeSsmProvider {
    store: ParameterStore,
    config: SsmConfig,
}

impl HomeSsmProvider {
    /// Create a provider over an opened store.
    #[must_use]
    pub fn new(store: ParameterStore, config: SsmConfig) -> Self {
        Self { store, config }
    }

    /// Configured region, or the caller's scope region when none is set.
    fn region<'a>(&'a self, ctx: &'a RequestContext) -> &'a str {
        if self.config.region.is_empty() {
            &ctx.region
        } else {
            &self.config.region
        }
    }

    fn arn(&self, ctx: &RequestContext, name: &str) -> String {
        parameter_arn(
            self.config.partition,
            self.region(ctx),
            &self.config.account_id,
            name,
        )
    }

    /// Plaintext of a stored value when requested, else the stored form.
    fn value_of(&self, record: &ParameterRecord, with_decryption: bool) -> Result<String, SsmError> {
        if record.is_secure() && with_decryption {
            let key_ref = record.key_id.as_deref().unwrap_or_default();
            self.store
                .decrypt(&record.value, key_ref)
                .map_err(store_error_to_ssm)
        } else {
            Ok(record.value.clone())
        }
    }

    fn to_parameter(
        &self,
        ctx: &RequestContext,
        record: &ParameterRecord,
        name: &str,
        with_decryption: bool,
    ) -> Result<Parameter, SsmError> {
        Ok(Parameter {
            arn: self.arn(ctx, &record.name),
            data_type: record.data_type.clone(),
            last_modified_date: record.last_modified_date,
            name: name.to_owned(),
            parameter_type: record.parameter_type.clone(),
            value: self.value_of(record, with_decryption)?,
            version: record.version,
            selector: None,
            source_result: None,
        })
    }

    fn to_metadata(&self, ctx: &RequestContext, record: ParameterRecord) -> ParameterMetadata {
        ParameterMetadata {
            arn: self.arn(ctx, &record.name),
            allowed_pattern: record.allowed_pattern,
            data_type: record.data_type,
            description: record.description,
            key_id: record.key_id,
            last_modified_date: record.last_modified_date,
            last_modified_user: record.last_modified_user,
            name: record.name,
            policies: record.policies,
            tier: record.tier,
            parameter_type: record.parameter_type,
            version: record.version,
        }
    }

    /// Scan candidates and keep those that pass the attribute predicates.
    fn find(&self, filters: &CompiledFilters) -> Result<Vec<ParameterRecord>, SsmError> {
        let mut records = self
            .store
            .find_by_filters(&filters.key_filters)
            .map_err(store_error_to_ssm)?;
        records.retain(|r| filters.matches(r));
        Ok(records)
    }

    // -- Reads --

    /// Handle `GetParameter`.
    pub fn handle_get_parameter(
        &self,
        ctx: &RequestContext,
        input: GetParameterInput,
    ) -> Result<GetParameterOutput, SsmError> {
        let name = validation::normalize_name(&input.name)?;
        let record = self.store.get(&name).map_err(lookup_error(&input.name))?;
        let parameter = self.to_parameter(
            ctx,
            &record,
            &input.name,
            input.with_decryption.unwrap_or(false),
        )?;
        Ok(GetParameterOutput { parameter })
    }

    /// Handle `GetParameters`. Unknown and invalid names are reported, not
    /// raised.
    pub fn handle_get_parameters(
        &self,
        ctx: &RequestContext,
        input: GetParametersInput,
    ) -> Result<GetParametersOutput, SsmError> {
        validation::batch_size(&input.names)?;
        let with_decryption = input.with_decryption.unwrap_or(false);

        let mut output = GetParametersOutput::default();
        let mut seen = HashSet::new();
        for requested in &input.names {
            if !seen.insert(requested.as_str()) {
                continue;
            }
            let Ok(name) = validation::normalize_name(requested) else {
                output.invalid_parameters.push(requested.clone());
                continue;
            };
            match self.store.get(&name) {
                Ok(record) => output.parameters.push(self.to_parameter(
                    ctx,
                    &record,
                    requested,
                    with_decryption,
                )?),
                Err(StoreError::NotFound(_)) => output.invalid_parameters.push(requested.clone()),
                Err(e) => return Err(store_error_to_ssm(e)),
            }
        }
        Ok(output)
    }

    /// Handle `GetParametersByPath`.
    pub fn handle_get_parameters_by_path(
        &self,
        ctx: &RequestContext,
        input: GetParametersByPathInput,
    ) -> Result<GetParametersByPathOutput, SsmError> {
        let path = validation::normalize_path(&input.path)?;
        let page_size = validation::page_size(input.max_results, MAX_RESULTS_BY_PATH)?;
        let mode = if input.recursive.unwrap_or(false) {
            MatchMode::PrefixRecursive
        } else {
            MatchMode::PrefixOneLevel
        };
        let filters = compile_by_path(
            vec![KeyFilter::new(path.clone(), mode)],
            &input.parameter_filters,
        )?;

        let mut records = self.find(&filters)?;
        // A path is not its own child.
        records.retain(|r| r.name != path);

        let (page, next_token) = paginate(records, input.next_token.as_deref(), page_size)?;
        let with_decryption = input.with_decryption.unwrap_or(false);
        let parameters = page
            .iter()
            .map(|r| self.to_parameter(ctx, r, &r.name, with_decryption))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(path = %path, returned = parameters.len(), "listed parameters by path");
        Ok(GetParametersByPathOutput {
            parameters,
            next_token,
        })
    }

    /// Handle `DescribeParameters`. Values are never returned.
    pub fn handle_describe_parameters(
        &self,
        ctx: &RequestContext,
        input: DescribeParametersInput,
    ) -> Result<DescribeParametersOutput, SsmError> {
        let page_size = validation::page_size(input.max_results, MAX_RESULTS_DESCRIBE)?;
        let filters = compile_describe(&input.filters, &input.parameter_filters)?;
        let records = self.find(&filters)?;
        let (page, next_token) = paginate(records, input.next_token.as_deref(), page_size)?;

        Ok(DescribeParametersOutput {
            parameters: page.into_iter().map(|r| self.to_metadata(ctx, r)).collect(),
            next_token,
        })
    }

    // -- Writes --

    /// Handle `PutParameter`.
    pub fn handle_put_parameter(
        &self,
        ctx: &RequestContext,
        input: PutParameterInput,
    ) -> Result<PutParameterOutput, SsmError> {
        let name = validation::normalize_name(&input.name)?;
        if input.value.is_empty() {
            return Err(SsmError::validation(
                "1 validation error detected: Value at 'value' failed to satisfy constraint: \
                 Member must have length greater than or equal to 1",
            ));
        }
        let parameter_type = validation::parameter_type(input.parameter_type.as_ref())?;
        let tier = validation::parameter_tier(input.tier.as_ref())?;
        let data_type = validation::data_type(input.data_type.as_ref())?;
        let overwrite = input.overwrite.unwrap_or(false);

        if overwrite && !input.tags.is_empty() {
            return Err(SsmError::validation(
                "Invalid request: tags and overwrite can't be used together. To update tags \
                 for an existing parameter, use AddTagsToResource or RemoveTagsFromResource.",
            ));
        }
        check_unique_tags(&input.tags)?;

        let allowed_pattern = non_empty(input.allowed_pattern);
        if let Some(pattern) = &allowed_pattern {
            let regex = Regex::new(pattern).map_err(|e| {
                SsmError::validation(format!("AllowedPattern '{pattern}' is not a valid regex: {e}"))
            })?;
            if !regex.is_match(&input.value) {
                return Err(ssm_error!(
                    ParameterPatternMismatch,
                    format!("Parameter value, cannot be validated against allowedPattern: {pattern}")
                ));
            }
        }

        let key_id = if parameter_type == ParameterType::SecureString {
            Some(
                non_empty(input.key_id.map(|k| k.trim().to_owned()))
                    .unwrap_or_else(|| self.store.default_key_ref()),
            )
        } else {
            None
        };

        let record = ParameterRecord {
            name,
            value: input.value,
            parameter_type,
            data_type,
            tier: tier.clone(),
            key_id,
            version: 0,
            last_modified_date: epoch_seconds(),
            last_modified_user: user_arn(
                self.config.partition,
                &self.config.account_id,
                &ctx.owner,
            ),
            description: non_empty(input.description),
            allowed_pattern,
            policies: non_empty(input.policies),
            tags: input.tags,
        };

        let version = self
            .store
            .put(record, overwrite)
            .map_err(store_error_to_ssm)?;
        Ok(PutParameterOutput { version, tier })
    }

    /// Handle `DeleteParameter`.
    pub fn handle_delete_parameter(
        &self,
        _ctx: &RequestContext,
        input: DeleteParameterInput,
    ) -> Result<DeleteParameterOutput, SsmError> {
        let name = validation::normalize_name(&input.name)?;
        self.store
            .delete(&name)
            .map_err(lookup_error(&input.name))?;
        Ok(DeleteParameterOutput {})
    }

    /// Handle `DeleteParameters`. Unknown and invalid names are reported,
    /// not raised.
    pub fn handle_delete_parameters(
        &self,
        _ctx: &RequestContext,
        input: DeleteParametersInput,
    ) -> Result<DeleteParametersOutput, SsmError> {
        validation::batch_size(&input.names)?;

        let mut output = DeleteParametersOutput::default();
        for requested in input.names {
            let Ok(name) = validation::normalize_name(&requested) else {
                output.invalid_parameters.push(requested);
                continue;
            };
            match self.store.delete(&name) {
                Ok(()) => output.deleted_parameters.push(requested),
                Err(StoreError::NotFound(_)) => output.invalid_parameters.push(requested),
                Err(e) => return Err(store_error_to_ssm(e)),
            }
        }
        Ok(output)
    }

    // -- Tags --

    /// Handle `AddTagsToResource`. Existing keys are overwritten in place.
    pub fn handle_add_tags_to_resource(
        &self,
        _ctx: &RequestContext,
        input: AddTagsToResourceInput,
    ) -> Result<AddTagsToResourceOutput, SsmError> {
        check_resource_type(&input.resource_type)?;
        check_unique_tags(&input.tags)?;
        if input.tags.is_empty() {
            return Err(SsmError::validation("At least one tag must be supplied."));
        }
        let name = validation::normalize_name(&input.resource_id)?;

        self.store
            .update(&name, |record| {
                for tag in input.tags {
                    match record.tags.iter_mut().find(|t| t.key == tag.key) {
                        Some(existing) => existing.value = tag.value,
                        None => record.tags.push(tag),
                    }
                }
            })
            .map_err(lookup_error(&input.resource_id))?;
        Ok(AddTagsToResourceOutput {})
    }

    /// Handle `RemoveTagsFromResource`. Unknown keys are ignored.
    pub fn handle_remove_tags_from_resource(
        &self,
        _ctx: &RequestContext,
        input: RemoveTagsFromResourceInput,
    ) -> Result<RemoveTagsFromResourceOutput, SsmError> {
        check_resource_type(&input.resource_type)?;
        let name = validation::normalize_name(&input.resource_id)?;

        self.store
            .update(&name, |record| {
                record.tags.retain(|t| !input.tag_keys.contains(&t.key));
            })
            .map_err(lookup_error(&input.resource_id))?;
        Ok(RemoveTagsFromResourceOutput {})
    }

    /// Handle `ListTagsForResource`.
    pub fn handle_list_tags_for_resource(
        &self,
        _ctx: &RequestContext,
        input: ListTagsForResourceInput,
    ) -> Result<ListTagsForResourceOutput, SsmError> {
        check_resource_type(&input.resource_type)?;
        let name = validation::normalize_name(&input.resource_id)?;
        let record = self
            .store
            .get(&name)
            .map_err(lookup_error(&input.resource_id))?;
        Ok(ListTagsForResourceOutput {
            tag_list: record.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use base64::Engine as _;
    use homessm_core::KeyConfig;
    use homessm_ssm_model::error::SsmErrorCode;
    use homessm_ssm_model::types::{ParameterStringFilter, ParameterTier};

    use super::*;
    use crate::storage::MemoryStore;

    fn provider_with_region(region: &str) -> HomeSsmProvider {
        let keys = [KeyConfig {
            id: Some("k-home".to_owned()),
            alias: "home".to_owned(),
            key: base64::engine::general_purpose::STANDARD.encode([3u8; 32]),
        }];
        let store = ParameterStore::open(Arc::new(MemoryStore::new()), &keys).unwrap();
        HomeSsmProvider::new(store, SsmConfig::builder().region(region).build())
    }

    fn provider() -> HomeSsmProvider {
        provider_with_region("us-east-1")
    }

    fn ctx() -> RequestContext {
        RequestContext {
            access_key_id: "AKIAHOME".to_owned(),
            owner: "alice".to_owned(),
            region: "eu-central-1".to_owned(),
            request_id: "req".to_owned(),
        }
    }

    fn put(p: &HomeSsmProvider, name: &str, value: &str, t: ParameterType) -> PutParameterOutput {
        p.handle_put_parameter(
            &ctx(),
            PutParameterInput {
                name: name.to_owned(),
                value: value.to_owned(),
                parameter_type: Some(t),
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn get(p: &HomeSsmProvider, name: &str, decrypt: bool) -> Result<Parameter, SsmError> {
        p.handle_get_parameter(
            &ctx(),
            GetParameterInput {
                name: name.to_owned(),
                with_decryption: Some(decrypt),
            },
        )
        .map(|o| o.parameter)
    }

    fn by_path(p: &HomeSsmProvider, path: &str, recursive: bool) -> Vec<String> {
        p.handle_get_parameters_by_path(
            &ctx(),
            GetParametersByPathInput {
                path: path.to_owned(),
                recursive: Some(recursive),
                ..Default::default()
            },
        )
        .unwrap()
        .parameters
        .into_iter()
        .map(|p| p.name)
        .collect()
    }

    #[test]
    fn test_should_put_and_get_parameter() {
        let p = provider();
        let out = put(&p, "/app/url", "https://home", ParameterType::String);
        assert_eq!(out.version, 1);
        assert_eq!(out.tier, ParameterTier::Standard);

        let param = get(&p, "/app/url", false).unwrap();
        assert_eq!(param.value, "https://home");
        assert_eq!(param.version, 1);
        assert_eq!(param.arn, "arn:aws:ssm:us-east-1:000000000000:parameter/app/url");
        assert_eq!(param.parameter_type, ParameterType::String);
    }

    #[test]
    fn test_should_echo_requested_name() {
        let p = provider();
        put(&p, "app/key", "v", ParameterType::String);
        let param = get(&p, "app/key", false).unwrap();
        assert_eq!(param.name, "app/key");
        assert_eq!(param.arn, "arn:aws:ssm:us-east-1:000000000000:parameter/app/key");
        assert_eq!(get(&p, "/app/key", false).unwrap().name, "/app/key");
    }

    #[test]
    fn test_should_use_scope_region_when_unconfigured() {
        let p = provider_with_region("");
        put(&p, "/r", "v", ParameterType::String);
        assert_eq!(
            get(&p, "/r", false).unwrap().arn,
            "arn:aws:ssm:eu-central-1:000000000000:parameter/r"
        );
    }

    #[test]
    fn test_should_return_ciphertext_without_decryption() {
        let p = provider();
        put(&p, "/db/password", "hunter2", ParameterType::SecureString);

        let sealed = get(&p, "/db/password", false).unwrap();
        assert_ne!(sealed.value, "hunter2");
        assert_eq!(sealed.parameter_type, ParameterType::SecureString);

        let plain = get(&p, "/db/password", true).unwrap();
        assert_eq!(plain.value, "hunter2");
    }

    #[test]
    fn test_should_record_default_key_and_owner() {
        let p = provider();
        put(&p, "/s", "v", ParameterType::SecureString);
        let described = p
            .handle_describe_parameters(&ctx(), DescribeParametersInput::default())
            .unwrap();
        let meta = &described.parameters[0];
        assert_eq!(meta.key_id.as_deref(), Some("alias/home"));
        assert_eq!(meta.last_modified_user, "arn:aws:iam::000000000000:user/alice");
    }

    #[test]
    fn test_should_enforce_overwrite_and_versions() {
        let p = provider();
        put(&p, "/v", "1", ParameterType::String);
        let err = p
            .handle_put_parameter(
                &ctx(),
                PutParameterInput {
                    name: "/v".to_owned(),
                    value: "2".to_owned(),
                    parameter_type: Some(ParameterType::String),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ParameterAlreadyExists);

        let out = p
            .handle_put_parameter(
                &ctx(),
                PutParameterInput {
                    name: "/v".to_owned(),
                    value: "2".to_owned(),
                    parameter_type: Some(ParameterType::String),
                    overwrite: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(out.version, 2);
        assert_eq!(get(&p, "/v", false).unwrap().value, "2");
    }

    #[test]
    fn test_should_reject_invalid_put_requests() {
        let p = provider();
        let base = PutParameterInput {
            name: "/x".to_owned(),
            value: "v".to_owned(),
            parameter_type: Some(ParameterType::String),
            ..Default::default()
        };

        let cases = [
            (
                PutParameterInput {
                    name: "/aws/x".to_owned(),
                    ..base.clone()
                },
                SsmErrorCode::InvalidParameterName,
            ),
            (
                PutParameterInput {
                    value: String::new(),
                    ..base.clone()
                },
                SsmErrorCode::ValidationError,
            ),
            (
                PutParameterInput {
                    parameter_type: None,
                    ..base.clone()
                },
                SsmErrorCode::UnsupportedParameterType,
            ),
            (
                PutParameterInput {
                    tier: Some(ParameterTier::Unknown("Gold".to_owned())),
                    ..base.clone()
                },
                SsmErrorCode::InvalidParameterTier,
            ),
            (
                PutParameterInput {
                    allowed_pattern: Some("^[0-9]+$".to_owned()),
                    ..base.clone()
                },
                SsmErrorCode::ParameterPatternMismatch,
            ),
            (
                PutParameterInput {
                    parameter_type: Some(ParameterType::SecureString),
                    key_id: Some("alias/nope".to_owned()),
                    ..base.clone()
                },
                SsmErrorCode::InvalidKeyId,
            ),
            (
                PutParameterInput {
                    overwrite: Some(true),
                    tags: vec![Tag {
                        key: "k".to_owned(),
                        value: "v".to_owned(),
                    }],
                    ..base.clone()
                },
                SsmErrorCode::ValidationError,
            ),
        ];
        for (input, code) in cases {
            let name = input.name.clone();
            assert_eq!(p.handle_put_parameter(&ctx(), input).unwrap_err().code, code, "{name}");
        }
        assert_eq!(
            get(&p, "/x", false).unwrap_err().code,
            SsmErrorCode::ParameterNotFound
        );
    }

    #[test]
    fn test_should_accept_matching_allowed_pattern() {
        let p = provider();
        let out = p
            .handle_put_parameter(
                &ctx(),
                PutParameterInput {
                    name: "/port".to_owned(),
                    value: "8080".to_owned(),
                    parameter_type: Some(ParameterType::String),
                    allowed_pattern: Some("^[0-9]+$".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(out.version, 1);
    }

    #[test]
    fn test_should_report_missing_parameter_by_requested_name() {
        let p = provider();
        let err = get(&p, "missing", false).unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ParameterNotFound);
        assert_eq!(err.message, "Parameter missing not found.");
    }

    #[test]
    fn test_should_split_get_parameters_results() {
        let p = provider();
        put(&p, "/a", "1", ParameterType::String);
        let out = p
            .handle_get_parameters(
                &ctx(),
                GetParametersInput {
                    names: vec!["/a".into(), "/missing".into(), "/aws/x".into()],
                    with_decryption: None,
                },
            )
            .unwrap();
        assert_eq!(out.parameters.len(), 1);
        assert_eq!(out.invalid_parameters, vec!["/missing", "/aws/x"]);
    }

    #[test]
    fn test_should_list_one_level_and_recursive_by_path() {
        let p = provider();
        for name in ["/app", "/app/a", "/app/b", "/app/b/c", "/apple"] {
            put(&p, name, "v", ParameterType::String);
        }
        assert_eq!(by_path(&p, "/app", false), vec!["/app/a", "/app/b"]);
        assert_eq!(by_path(&p, "/app/", true), vec!["/app/a", "/app/b", "/app/b/c"]);
        assert_eq!(by_path(&p, "/", false), vec!["/app", "/apple"]);
    }

    #[test]
    fn test_should_paginate_by_path() {
        let p = provider();
        for i in 0..5 {
            put(&p, &format!("/page/p{i}"), "v", ParameterType::String);
        }
        let first = p
            .handle_get_parameters_by_path(
                &ctx(),
                GetParametersByPathInput {
                    path: "/page".to_owned(),
                    max_results: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(first.parameters.len(), 2);
        let token = first.next_token.expect("more pages");

        let mut seen: Vec<String> = first.parameters.into_iter().map(|p| p.name).collect();
        let mut next = Some(token);
        while let Some(token) = next {
            let page = p
                .handle_get_parameters_by_path(
                    &ctx(),
                    GetParametersByPathInput {
                        path: "/page".to_owned(),
                        max_results: Some(2),
                        next_token: Some(token),
                        ..Default::default()
                    },
                )
                .unwrap();
            seen.extend(page.parameters.into_iter().map(|p| p.name));
            next = page.next_token;
        }
        assert_eq!(seen, vec!["/page/p0", "/page/p1", "/page/p2", "/page/p3", "/page/p4"]);

        let err = p
            .handle_get_parameters_by_path(
                &ctx(),
                GetParametersByPathInput {
                    path: "/page".to_owned(),
                    next_token: Some("!!".to_owned()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, SsmErrorCode::InvalidNextToken);
    }

    #[test]
    fn test_should_describe_with_filters() {
        let p = provider();
        put(&p, "/app/a", "v", ParameterType::String);
        put(&p, "/app/s", "v", ParameterType::SecureString);
        put(&p, "/other", "v", ParameterType::String);

        let out = p
            .handle_describe_parameters(
                &ctx(),
                DescribeParametersInput {
                    parameter_filters: vec![
                        ParameterStringFilter {
                            key: "Path".to_owned(),
                            option: Some("Recursive".to_owned()),
                            values: vec!["/app".to_owned()],
                        },
                        ParameterStringFilter {
                            key: "Type".to_owned(),
                            option: None,
                            values: vec!["SecureString".to_owned()],
                        },
                    ],
                    ..Default::default()
                },
            )
            .unwrap();
        let names: Vec<&str> = out.parameters.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["/app/s"]);

        let err = p
            .handle_describe_parameters(
                &ctx(),
                DescribeParametersInput {
                    parameter_filters: vec![ParameterStringFilter {
                        key: "Color".to_owned(),
                        option: None,
                        values: vec!["x".to_owned()],
                    }],
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, SsmErrorCode::InvalidFilterKey);
    }

    #[test]
    fn test_should_delete_parameters() {
        let p = provider();
        put(&p, "/a", "1", ParameterType::String);
        put(&p, "/b", "1", ParameterType::String);

        p.handle_delete_parameter(&ctx(), DeleteParameterInput { name: "/a".into() })
            .unwrap();
        let err = p
            .handle_delete_parameter(&ctx(), DeleteParameterInput { name: "/a".into() })
            .unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ParameterNotFound);

        let out = p
            .handle_delete_parameters(
                &ctx(),
                DeleteParametersInput {
                    names: vec!["/b".into(), "/a".into(), "/ssm/x".into()],
                },
            )
            .unwrap();
        assert_eq!(out.deleted_parameters, vec!["/b"]);
        assert_eq!(out.invalid_parameters, vec!["/a", "/ssm/x"]);
    }

    #[test]
    fn test_should_manage_tags_without_new_version() {
        let p = provider();
        put(&p, "/t", "v", ParameterType::String);

        p.handle_add_tags_to_resource(
            &ctx(),
            AddTagsToResourceInput {
                resource_type: "Parameter".to_owned(),
                resource_id: "/t".to_owned(),
                tags: vec![
                    Tag {
                        key: "env".into(),
                        value: "dev".into(),
                    },
                    Tag {
                        key: "team".into(),
                        value: "home".into(),
                    },
                ],
            },
        )
        .unwrap();
        p.handle_add_tags_to_resource(
            &ctx(),
            AddTagsToResourceInput {
                resource_type: "Parameter".to_owned(),
                resource_id: "/t".to_owned(),
                tags: vec![Tag {
                    key: "env".into(),
                    value: "prod".into(),
                }],
            },
        )
        .unwrap();
        p.handle_remove_tags_from_resource(
            &ctx(),
            RemoveTagsFromResourceInput {
                resource_type: "Parameter".to_owned(),
                resource_id: "/t".to_owned(),
                tag_keys: vec!["team".into(), "absent".into()],
            },
        )
        .unwrap();

        let tags = p
            .handle_list_tags_for_resource(
                &ctx(),
                ListTagsForResourceInput {
                    resource_type: "Parameter".to_owned(),
                    resource_id: "/t".to_owned(),
                },
            )
            .unwrap()
            .tag_list;
        assert_eq!(
            tags,
            vec![Tag {
                key: "env".into(),
                value: "prod".into(),
            }]
        );
        assert_eq!(get(&p, "/t", false).unwrap().version, 1);
    }

    #[test]
    fn test_should_reject_other_resource_types() {
        let p = provider();
        put(&p, "/t", "v", ParameterType::String);
        let err = p
            .handle_list_tags_for_resource(
                &ctx(),
                ListTagsForResourceInput {
                    resource_type: "Document".to_owned(),
                    resource_id: "/t".to_owned(),
                },
            )
            .unwrap_err();
        assert_eq!(err.code, SsmErrorCode::ValidationError);
    }
}
