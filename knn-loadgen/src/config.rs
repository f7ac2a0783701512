use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampler::ValueSampler;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:9200";
pub const BINARY_DIMENSION: usize = 8;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("unrecognized data type: {0:?} (expected float, byte or binary)")]
    UnknownDataType(String),
    #[error("unrecognized space type: {0:?}")]
    UnknownSpaceType(String),
    #[error("dimension must be at least 1")]
    ZeroDimension,
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    #[error("number of neighbors (k) must be at least 1")]
    ZeroNeighbors,
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("invalid {what} {value:?}: {reason}")]
    InvalidName {
        what: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("{0} must be a finite number")]
    NonFiniteBound(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float,
    Byte,
    Binary,
}

impl DataType {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataType::Float => "float",
            DataType::Byte => "byte",
            DataType::Binary => "binary",
        }
    }
}

impl FromStr for DataType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "float" => Ok(DataType::Float),
            "byte" => Ok(DataType::Byte),
            "binary" => Ok(DataType::Binary),
            other => Err(ConfigError::UnknownDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceType {
    L2,
    InnerProduct,
    CosineSimil,
    L1,
    LInf,
    Hamming,
}

impl SpaceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            SpaceType::L2 => "l2",
            SpaceType::InnerProduct => "innerproduct",
            SpaceType::CosineSimil => "cosinesimil",
            SpaceType::L1 => "l1",
            SpaceType::LInf => "linf",
            SpaceType::Hamming => "hamming",
        }
    }
}

impl FromStr for SpaceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l2" => Ok(SpaceType::L2),
            "innerproduct" => Ok(SpaceType::InnerProduct),
            "cosinesimil" => Ok(SpaceType::CosineSimil),
            "l1" => Ok(SpaceType::L1),
            "linf" => Ok(SpaceType::LInf),
            "hamming" => Ok(SpaceType::Hamming),
            other => Err(ConfigError::UnknownSpaceType(other.to_string())),
        }
    }
}

impl fmt::Display for SpaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unvalidated script parameters, as read from a json config file or
/// assembled from command line flags.
///
/// Missing fields take the defaults below, which produce a 1000 vector,
/// 128 dimensional float index searched by inner product.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub record_count: usize,
    pub dimension: usize,
    pub index_name: String,
    pub field_name: String,
    pub data_type: String,
    pub space_type: String,
    /// Lower sampling bound. Allowed to exceed `max_value`, in which case
    /// samples fall in the reversed interval.
    pub min_value: f64,
    pub max_value: f64,
    pub endpoint: String,
    pub batch_size: usize,
    pub k: usize,
    pub result_lines: usize,
    pub settle_seconds: u64,
    pub engine: String,
    pub method: String,
    pub quiet_bulk: bool,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            record_count: 1000,
            dimension: 128,
            index_name: "target_index".to_string(),
            field_name: "target_field".to_string(),
            data_type: "float".to_string(),
            space_type: "innerproduct".to_string(),
            min_value: 2.0,
            max_value: -2.0,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: 10,
            k: 10,
            result_lines: 20,
            settle_seconds: 2,
            engine: "faiss".to_string(),
            method: "hnsw".to_string(),
            quiet_bulk: true,
        }
    }
}

/// Validated parameters with all data type specific overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub record_count: usize,
    /// dimension declared in the index mapping
    pub dimension: usize,
    /// number of scalars generated for every vector
    pub values_per_record: usize,
    pub index_name: String,
    pub field_name: String,
    pub data_type: DataType,
    pub space_type: SpaceType,
    pub min_value: f64,
    pub max_value: f64,
    pub endpoint: String,
    pub batch_size: usize,
    pub k: usize,
    pub result_lines: usize,
    pub settle_seconds: u64,
    pub engine: String,
    pub method: String,
    pub quiet_bulk: bool,
}

impl ResolvedConfig {
    pub fn sampler(&self) -> ValueSampler {
        match self.data_type {
            DataType::Float => ValueSampler::Float {
                min: self.min_value,
                max: self.max_value,
            },
            DataType::Byte => ValueSampler::Byte {
                min: self.min_value,
                max: self.max_value,
            },
            DataType::Binary => ValueSampler::Binary,
        }
    }

    pub fn batch_count(&self) -> usize {
        self.record_count.div_ceil(self.batch_size)
    }
}

impl ScriptConfig {
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let data_type: DataType = self.data_type.parse()?;
        let mut space_type: SpaceType = self.space_type.parse()?;

        if self.dimension == 0 {
            return Err(ConfigError::ZeroDimension);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.k == 0 {
            return Err(ConfigError::ZeroNeighbors);
        }
        if !self.min_value.is_finite() {
            return Err(ConfigError::NonFiniteBound("min_value"));
        }
        if !self.max_value.is_finite() {
            return Err(ConfigError::NonFiniteBound("max_value"));
        }
        validate_index_name(&self.index_name)?;
        validate_quotable("field name", &self.field_name)?;
        let endpoint = self.endpoint.trim_end_matches('/');
        validate_quotable("endpoint", endpoint)?;
        validate_quotable("engine", &self.engine)?;
        validate_quotable("method", &self.method)?;

        let mut dimension = self.dimension;
        let mut values_per_record = self.dimension;
        if data_type == DataType::Binary {
            // binary vectors pack 8 dimensions into every generated value
            space_type = SpaceType::Hamming;
            dimension = BINARY_DIMENSION;
            values_per_record = 1;
        }

        Ok(ResolvedConfig {
            record_count: self.record_count,
            dimension,
            values_per_record,
            index_name: self.index_name.clone(),
            field_name: self.field_name.clone(),
            data_type,
            space_type,
            min_value: self.min_value,
            max_value: self.max_value,
            endpoint: endpoint.to_string(),
            batch_size: self.batch_size,
            k: self.k,
            result_lines: self.result_lines,
            settle_seconds: self.settle_seconds,
            engine: self.engine.clone(),
            method: self.method.clone(),
            quiet_bulk: self.quiet_bulk,
        })
    }
}

/// Everything ends up inside single or double quoted shell and json strings.
fn validate_quotable(what: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyName(what));
    }
    if value
        .chars()
        .any(|c| c == '\'' || c == '"' || c == '\\' || c.is_whitespace() || c.is_control())
    {
        return Err(ConfigError::InvalidName {
            what,
            value: value.to_string(),
            reason: "quotes, backslashes, whitespace and control characters are not allowed",
        });
    }

    Ok(())
}

fn validate_index_name(name: &str) -> Result<(), ConfigError> {
    validate_quotable("index name", name)?;
    if name.starts_with(['_', '-', '+']) {
        return Err(ConfigError::InvalidName {
            what: "index name",
            value: name.to_string(),
            reason: "must not start with '_', '-' or '+'",
        });
    }
    if name.chars().any(|c| c.is_uppercase()) {
        return Err(ConfigError::InvalidName {
            what: "index name",
            value: name.to_string(),
            reason: "must be lowercase",
        });
    }
    if name.contains(['/', '?', '#', ',', '*', '<', '>', '|']) {
        return Err(ConfigError::InvalidName {
            what: "index name",
            value: name.to_string(),
            reason: "contains a character not allowed in index names",
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_to_float_innerproduct() {
        let resolved = ScriptConfig::default().resolve().unwrap();
        assert_eq!(DataType::Float, resolved.data_type);
        assert_eq!(SpaceType::InnerProduct, resolved.space_type);
        assert_eq!(1000, resolved.record_count);
        assert_eq!(128, resolved.dimension);
        assert_eq!(128, resolved.values_per_record);
        assert_eq!(100, resolved.batch_count());
    }

    #[test]
    fn binary_forces_dimension_and_space() {
        let config = ScriptConfig {
            data_type: "binary".to_string(),
            space_type: "l2".to_string(),
            dimension: 512,
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(8, resolved.dimension);
        assert_eq!(1, resolved.values_per_record);
        assert_eq!(SpaceType::Hamming, resolved.space_type);
        assert_eq!(ValueSampler::Binary, resolved.sampler());
    }

    #[test]
    fn byte_keeps_dimension() {
        let config = ScriptConfig {
            data_type: "byte".to_string(),
            dimension: 16,
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(16, resolved.dimension);
        assert_eq!(16, resolved.values_per_record);
        assert_eq!(
            ValueSampler::Byte {
                min: 2.0,
                max: -2.0
            },
            resolved.sampler()
        );
    }

    #[test]
    fn unknown_data_type_is_rejected() {
        let config = ScriptConfig {
            data_type: "half".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Err(ConfigError::UnknownDataType("half".to_string())),
            config.resolve()
        );
    }

    #[test]
    fn unknown_space_type_is_rejected() {
        let config = ScriptConfig {
            space_type: "dot".to_string(),
            ..Default::default()
        };
        assert_eq!(
            Err(ConfigError::UnknownSpaceType("dot".to_string())),
            config.resolve()
        );
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let zero_dim = ScriptConfig {
            dimension: 0,
            ..Default::default()
        };
        assert_eq!(Err(ConfigError::ZeroDimension), zero_dim.resolve());

        let zero_batch = ScriptConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert_eq!(Err(ConfigError::ZeroBatchSize), zero_batch.resolve());

        let zero_k = ScriptConfig {
            k: 0,
            ..Default::default()
        };
        assert_eq!(Err(ConfigError::ZeroNeighbors), zero_k.resolve());
    }

    #[test]
    fn zero_records_is_allowed() {
        let config = ScriptConfig {
            record_count: 0,
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(0, resolved.batch_count());
    }

    #[test]
    fn names_that_break_quoting_are_rejected() {
        for bad in ["it's", "a b", "with\"quote", "back\\slash", ""] {
            let config = ScriptConfig {
                field_name: bad.to_string(),
                ..Default::default()
            };
            assert!(config.resolve().is_err(), "accepted field name {bad:?}");
        }
    }

    #[test]
    fn index_name_rules() {
        for bad in ["Upper", "_hidden", "-dash", "a/b", "x*"] {
            let config = ScriptConfig {
                index_name: bad.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(config.resolve(), Err(ConfigError::InvalidName { .. })),
                "accepted index name {bad:?}"
            );
        }
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let config = ScriptConfig {
            max_value: f64::NAN,
            ..Default::default()
        };
        assert_eq!(
            Err(ConfigError::NonFiniteBound("max_value")),
            config.resolve()
        );
    }

    #[test]
    fn trailing_endpoint_slash_is_dropped() {
        let config = ScriptConfig {
            endpoint: "http://search:9200/".to_string(),
            ..Default::default()
        };
        assert_eq!("http://search:9200", config.resolve().unwrap().endpoint);
    }

    #[test]
    fn slash_only_endpoint_is_empty() {
        for endpoint in ["/", "//"] {
            let config = ScriptConfig {
                endpoint: endpoint.to_string(),
                ..Default::default()
            };
            assert_eq!(Err(ConfigError::EmptyName("endpoint")), config.resolve());
        }
    }

    #[test]
    fn partial_json_config_uses_defaults() {
        let config: ScriptConfig =
            serde_json::from_str(r#"{"record_count": 25, "data_type": "byte"}"#)
                .unwrap();
        assert_eq!(25, config.record_count);
        assert_eq!("byte", config.data_type);
        assert_eq!(128, config.dimension);
        assert_eq!("target_index", config.index_name);
    }
}
