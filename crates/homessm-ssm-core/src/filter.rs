//! `ParameterStringFilter` validation and compilation.
//!
//! Name and Path filters become [`KeyFilter`]s evaluated by the store scan.
//! The remaining keys become attribute predicates applied to the candidates.

use homessm_ssm_model::error::SsmError;
use homessm_ssm_model::input::ParametersFilter;
use homessm_ssm_model::ssm_error;
use homessm_ssm_model::types::ParameterStringFilter;

use crate::store::{KeyFilter, MatchMode, ParameterRecord};
use crate::validation;

/// Filter keys understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    /// Parameter name.
    Name,
    /// `String`, `StringList` or `SecureString`.
    Type,
    /// Encryption key reference.
    KeyId,
    /// Hierarchy path, describe only.
    Path,
    /// Version label. Labels are never stored, so nothing matches.
    Label,
    /// Parameter tier.
    Tier,
    /// Data type.
    DataType,
}

impl FilterKey {
    fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "Name" => Self::Name,
            "Type" => Self::Type,
            "KeyId" => Self::KeyId,
            "Path" => Self::Path,
            "Label" => Self::Label,
            "Tier" => Self::Tier,
            "DataType" => Self::DataType,
            _ => return None,
        })
    }
}

/// Filter options understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOption {
    /// Exact match; the default when no option is given.
    Equals,
    /// String prefix, or descendants for `Name`.
    BeginsWith,
    /// `Path` and everything under it.
    Recursive,
    /// `Path` and its immediate children.
    OneLevel,
}

impl FilterOption {
    fn parse(option: Option<&str>) -> Option<Self> {
        Some(match option {
            None | Some("Equals") => Self::Equals,
            Some("BeginsWith") => Self::BeginsWith,
            Some("Recursive") => Self::Recursive,
            Some("OneLevel") => Self::OneLevel,
            Some(_) => return None,
        })
    }
}

/// A filter whose key, option and values have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFilter {
    /// Attribute the filter tests.
    pub key: FilterKey,
    /// Comparison applied to each value.
    pub option: FilterOption,
    /// Candidate values; any one may match.
    pub values: Vec<String>,
}

/// Check key, option and values of one filter.
pub fn validate_filter(filter: &ParameterStringFilter) -> Result<ValidatedFilter, SsmError> {
    let key = FilterKey::parse(&filter.key).ok_or_else(|| ssm_error!(InvalidFilterKey))?;
    let option = FilterOption::parse(filter.option.as_deref())
        .ok_or_else(|| ssm_error!(InvalidFilterOption))?;

    let option_fits = match key {
        FilterKey::Path => matches!(option, FilterOption::Recursive | FilterOption::OneLevel),
        _ => matches!(option, FilterOption::Equals | FilterOption::BeginsWith),
    };
    if !option_fits {
        return Err(ssm_error!(InvalidFilterOption));
    }

    if filter.values.is_empty() {
        return Err(ssm_error!(InvalidFilterValue));
    }
    if key == FilterKey::Path && filter.values.iter().any(|v| !v.starts_with('/')) {
        return Err(ssm_error!(InvalidFilterValue));
    }

    Ok(ValidatedFilter {
        key,
        option,
        values: filter.values.clone(),
    })
}

/// Stored attribute compared by a non-name filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribute {
    Type,
    KeyId,
    Tier,
    DataType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributePredicate {
    attribute: Attribute,
    begins_with: bool,
    values: Vec<String>,
}

impl AttributePredicate {
    fn matches(&self, record: &ParameterRecord) -> bool {
        let actual = match self.attribute {
            Attribute::Type => record.parameter_type.as_str(),
            Attribute::KeyId => record.key_id.as_deref().unwrap_or_default(),
            Attribute::Tier => record.tier.as_str(),
            Attribute::DataType => record.data_type.as_str(),
        };
        self.values.iter().any(|v| {
            if self.begins_with {
                actual.starts_with(v.as_str())
            } else {
                actual == v
            }
        })
    }
}

/// Filters ready to run: name predicates for the scan plus attribute
/// predicates for the candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    /// Union of name predicates. Empty means every parameter is a candidate.
    pub key_filters: Vec<KeyFilter>,
    predicates: Vec<AttributePredicate>,
    /// Labels are not stored, so a label filter matches nothing.
    label: bool,
}

impl CompiledFilters {
    /// Start from a fixed set of name predicates.
    #[must_use]
    pub fn with_key_filters(key_filters: Vec<KeyFilter>) -> Self {
        Self {
            key_filters,
            ..Self::default()
        }
    }

    /// Whether a scan candidate passes every attribute predicate.
    #[must_use]
    pub fn matches(&self, record: &ParameterRecord) -> bool {
        !self.label && self.predicates.iter().all(|p| p.matches(record))
    }

    fn push(&mut self, filter: ValidatedFilter) -> Result<(), SsmError> {
        let attribute = match filter.key {
            FilterKey::Name => {
                for value in &filter.values {
                    let key_filter = if filter.option == FilterOption::BeginsWith {
                        let base = value.trim_end_matches('/');
                        let base = if base.is_empty() { "/" } else { base };
                        let path = if base == "/" {
                            base.to_owned()
                        } else {
                            validation::normalize_name(base)?
                        };
                        KeyFilter::new(path, MatchMode::PrefixRecursive)
                    } else {
                        KeyFilter::new(validation::normalize_name(value)?, MatchMode::Exact)
                    };
                    self.key_filters.push(key_filter);
                }
                return Ok(());
            }
            FilterKey::Path => {
                for value in &filter.values {
                    let path = validation::normalize_path(value)
                        .map_err(|_| ssm_error!(InvalidFilterValue))?;
                    if filter.option == FilterOption::OneLevel {
                        self.key_filters
                            .push(KeyFilter::new(path, MatchMode::PrefixOneLevel));
                    } else {
                        self.key_filters
                            .push(KeyFilter::new(path.clone(), MatchMode::Exact));
                        self.key_filters
                            .push(KeyFilter::new(path, MatchMode::PrefixRecursive));
                    }
                }
                return Ok(());
            }
            FilterKey::Label => {
                self.label = true;
                return Ok(());
            }
            FilterKey::Type => Attribute::Type,
            FilterKey::KeyId => Attribute::KeyId,
            FilterKey::Tier => Attribute::Tier,
            FilterKey::DataType => Attribute::DataType,
        };

        self.predicates.push(AttributePredicate {
            attribute,
            begins_with: filter.option == FilterOption::BeginsWith,
            values: filter.values,
        });
        Ok(())
    }
}

/// Compile `DescribeParameters` filters. Legacy `Filters` are treated as
/// `Equals` filters on the same key.
pub fn compile_describe(
    legacy: &[ParametersFilter],
    filters: &[ParameterStringFilter],
) -> Result<CompiledFilters, SsmError> {
    let mut compiled = CompiledFilters::default();
    let converted = legacy.iter().map(|f| ParameterStringFilter {
        key: f.key.clone(),
        option: None,
        values: f.values.clone(),
    });
    for filter in converted.chain(filters.iter().cloned()) {
        compiled.push(validate_filter(&filter)?)?;
    }
    Ok(compiled)
}

/// Compile the extra `ParameterFilters` of `GetParametersByPath` on top of
/// the path predicates. Name and Path keys are not allowed here.
pub fn compile_by_path(
    key_filters: Vec<KeyFilter>,
    filters: &[ParameterStringFilter],
) -> Result<CompiledFilters, SsmError> {
    let mut compiled = CompiledFilters::with_key_filters(key_filters);
    for filter in filters {
        let validated = validate_filter(filter)?;
        if matches!(validated.key, FilterKey::Name | FilterKey::Path) {
            return Err(ssm_error!(
                InvalidFilterKey,
                format!("The following filter key is not valid: {}", filter.key)
            ));
        }
        compiled.push(validated)?;
    }
    Ok(compiled)
}
