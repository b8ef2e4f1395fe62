//! Subticket configuration surface.
//!
//! Options are parsed and validated ONCE at startup into a
//! [`SubticketsConfig`], then passed by reference into the render and
//! validation entry points. Malformed encodings, unsupported sort type
//! tags, and unsupported accumulation methods all fail here with a
//! [`ConfigError`]; nothing is deferred to render time.
//!
//! The three options keep the textual list encodings existing
//! installations already use (see [`literal`]), carried inside a TOML
//! file:
//!
//! ```toml
//! [subtickets]
//! sort_children = "[['priority', ['low', 'middle', 'high']], 'summary']"
//! show_fields = "['type', 'status', 'owner']"
//! show_accumulations = "[['estimate', 'Total estimate', 'sum']]"
//! ```

pub mod literal;

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::accumulate::{AccumulationMethod, AccumulationSpec};
use crate::sort::{SortKey, SortSpec};
use literal::{ListValue, LiteralError};

/// Fields shown per child row when `show_fields` is not configured.
pub const DEFAULT_SHOW_FIELDS: [&str; 3] = ["type", "status", "owner"];

/// Validated subticket configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubticketsConfig {
    sort_children: SortSpec,
    show_fields: Vec<String>,
    show_accumulations: Vec<AccumulationSpec>,
}

impl Default for SubticketsConfig {
    /// Children sorted by numeric id, the default field columns, no
    /// accumulations.
    fn default() -> Self {
        Self {
            sort_children: SortSpec::default(),
            show_fields: DEFAULT_SHOW_FIELDS
                .iter()
                .map(|field| (*field).to_string())
                .collect(),
            show_accumulations: Vec::new(),
        }
    }
}

impl SubticketsConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or any option
    /// fails to parse or validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string. Absent options keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the TOML is invalid, an option
    /// encoding is malformed, a sort key carries a type tag other than
    /// `int`, or an accumulation names a method other than `sum`.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        let mut config = Self::default();
        if let Some(encoded) = file.subtickets.sort_children {
            config.sort_children = parse_sort_children(&encoded)?;
        }
        if let Some(encoded) = file.subtickets.show_fields {
            config.show_fields = parse_show_fields(&encoded)?;
        }
        if let Some(encoded) = file.subtickets.show_accumulations {
            config.show_accumulations = parse_show_accumulations(&encoded)?;
        }
        Ok(config)
    }

    /// The sibling sort specification.
    #[must_use]
    pub fn sort_children(&self) -> &SortSpec {
        &self.sort_children
    }

    /// The fields shown per child row, in column order.
    #[must_use]
    pub fn show_fields(&self) -> &[String] {
        &self.show_fields
    }

    /// The configured accumulations, in display order.
    #[must_use]
    pub fn show_accumulations(&self) -> &[AccumulationSpec] {
        &self.show_accumulations
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    subtickets: RawOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    sort_children: Option<String>,
    show_fields: Option<String>,
    show_accumulations: Option<String>,
}

/// Parses the `sort_children` option encoding into a [`SortSpec`].
///
/// Each entry is a field name, a `[name, 'int']` pair, or a
/// `[name, [values...]]` pair. The name `id` always means the numeric
/// ticket id.
///
/// # Errors
///
/// Returns a [`ConfigError`] for malformed encodings and unsupported type
/// tags.
pub fn parse_sort_children(encoded: &str) -> Result<SortSpec, ConfigError> {
    let values = parse_option(encoded, "sort_children")?;
    let mut keys = Vec::with_capacity(values.len());
    for value in values {
        keys.push(sort_key_from_value(value)?);
    }
    Ok(SortSpec::new(keys))
}

/// Parses the `show_fields` option encoding.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the encoding is malformed or contains a
/// non-string entry.
pub fn parse_show_fields(encoded: &str) -> Result<Vec<String>, ConfigError> {
    parse_option(encoded, "show_fields")?
        .into_iter()
        .map(|value| match value {
            ListValue::Str(name) => Ok(name),
            ListValue::List(_) => Err(ConfigError::Validation(
                "show_fields entries must be field names".to_string(),
            )),
        })
        .collect()
}

/// Parses the `show_accumulations` option encoding into
/// [`AccumulationSpec`]s.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the encoding is malformed, an entry is not
/// a `[field, label, method]` triple, or the method is not `sum`.
pub fn parse_show_accumulations(encoded: &str) -> Result<Vec<AccumulationSpec>, ConfigError> {
    parse_option(encoded, "show_accumulations")?
        .into_iter()
        .map(accumulation_from_value)
        .collect()
}

fn parse_option(encoded: &str, option: &str) -> Result<Vec<ListValue>, ConfigError> {
    literal::parse_list(encoded).map_err(|source| ConfigError::Literal {
        option: option.to_string(),
        source,
    })
}

fn sort_key_from_value(value: ListValue) -> Result<SortKey, ConfigError> {
    match value {
        ListValue::Str(name) => Ok(plain_key(name)),
        ListValue::List(entry) => {
            let mut items = entry.into_iter();
            let (Some(ListValue::Str(name)), Some(second), None) =
                (items.next(), items.next(), items.next())
            else {
                return Err(ConfigError::Validation(
                    "sort_children entries must be a field name or a [name, type-or-values] pair"
                        .to_string(),
                ));
            };
            match second {
                ListValue::Str(tag) if tag == "int" => Ok(int_key(name)),
                ListValue::Str(tag) => Err(ConfigError::UnsupportedSortType { field: name, tag }),
                ListValue::List(raw_values) => {
                    let mut values = Vec::with_capacity(raw_values.len());
                    for raw in raw_values {
                        match raw {
                            ListValue::Str(allowed) => values.push(allowed),
                            ListValue::List(_) => {
                                return Err(ConfigError::Validation(format!(
                                    "sort_children value list for '{name}' must contain only \
                                     strings"
                                )));
                            }
                        }
                    }
                    Ok(SortKey::RankedField { name, values })
                }
            }
        }
    }
}

fn plain_key(name: String) -> SortKey {
    if name == "id" {
        SortKey::Id
    } else {
        SortKey::Field(name)
    }
}

fn int_key(name: String) -> SortKey {
    if name == "id" {
        SortKey::Id
    } else {
        SortKey::IntField(name)
    }
}

fn accumulation_from_value(value: ListValue) -> Result<AccumulationSpec, ConfigError> {
    let ListValue::List(entry) = value else {
        return Err(ConfigError::Validation(
            "show_accumulations entries must be [field, label, method] triples".to_string(),
        ));
    };
    let mut items = entry.into_iter();
    let (
        Some(ListValue::Str(field)),
        Some(ListValue::Str(label)),
        Some(ListValue::Str(method)),
        None,
    ) = (items.next(), items.next(), items.next(), items.next())
    else {
        return Err(ConfigError::Validation(
            "show_accumulations entries must be [field, label, method] triples".to_string(),
        ));
    };
    if method != AccumulationMethod::Sum.name() {
        return Err(ConfigError::UnsupportedAccumulationMethod { method });
    }
    Ok(AccumulationSpec {
        field,
        label,
        method: AccumulationMethod::Sum,
    })
}

/// Configuration error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// An option's list encoding is malformed.
    #[error("failed to parse option '{option}': {source}")]
    Literal {
        /// The option that failed.
        option: String,
        /// The underlying literal error.
        #[source]
        source: LiteralError,
    },

    /// A sort key carries an unsupported type tag.
    #[error("unsupported sort type '{tag}' for field '{field}' (only 'int' is supported)")]
    UnsupportedSortType {
        /// The field the key named.
        field: String,
        /// The unsupported tag.
        tag: String,
    },

    /// An accumulation names an unsupported method.
    #[error("unsupported accumulation method '{method}' (only 'sum' is supported)")]
    UnsupportedAccumulationMethod {
        /// The unsupported method.
        method: String,
    },

    /// The configuration is structurally invalid.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}
