//! fxl_options: Engine options and host configuration files.
//!
//! Options and host declarations are read from JSON with camelCase keys:
//!
//! ```json
//! {
//!   "options": { "numbersAreFloats": true },
//!   "variables": [
//!     { "name": "cr_orders", "displayName": "Orders", "type": "*[qty:n]", "mutable": true }
//!   ],
//!   "enums": { "Size": "%n[Small:1, Large:2]" }
//! }
//! ```

use fxl_core::Name;
use fxl_types::{DType, TypeParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options that change how formulas are checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Numeric literals are floats (`Number`) rather than `Decimal`.
    pub numbers_are_floats: bool,
    /// Allow `a; b` chains in formulas.
    pub allow_chaining: bool,
    /// Expose `ThisRecord` inside row scopes.
    pub expose_this_record: bool,
    /// Formulas longer than this are rejected without parsing.
    pub max_expression_length: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            numbers_are_floats: false,
            allow_chaining: false,
            expose_this_record: true,
            max_expression_length: 1000,
        }
    }
}

/// A variable the host makes visible to formulas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDecl {
    pub name: String,
    /// A type name (`Number`, `Text`, ...) or a type in the compact
    /// grammar (`n`, `![a:n]`, `*[qty:n]`).
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub mutable: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl VariableDecl {
    pub fn dtype(&self) -> Result<DType, OptionsError> {
        parse_type(&self.ty).map_err(|source| OptionsError::InvalidType {
            owner: self.name.clone(),
            source,
        })
    }
}

/// Host configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfig {
    pub options: EngineOptions,
    pub variables: Vec<VariableDecl>,
    /// Extra enums by name, in the enum grammar.
    pub enums: BTreeMap<String, String>,
}

impl HostConfig {
    /// The declared enums with their parsed types.
    pub fn enum_types(&self) -> Result<Vec<(Name, DType)>, OptionsError> {
        self.enums
            .iter()
            .map(|(name, spec)| match parse_type(spec) {
                Ok(ty @ DType::Enum(_)) => Ok((Name::new(name), ty)),
                Ok(_) => Err(OptionsError::NotAnEnum(name.clone())),
                Err(source) => Err(OptionsError::InvalidType {
                    owner: name.clone(),
                    source,
                }),
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid host configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid type for '{owner}': {source}")]
    InvalidType { owner: String, source: TypeParseError },

    #[error("enum '{0}' is not declared with the enum grammar")]
    NotAnEnum(String),
}

/// Read a type name or a type in the compact grammar.
fn parse_type(text: &str) -> Result<DType, TypeParseError> {
    match DType::from_type_name(text.trim()) {
        Some(ty) => Ok(ty),
        None => DType::parse(text),
    }
}

/// Parse a host configuration from a string.
pub fn parse_host_config(content: &str) -> Result<HostConfig, OptionsError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a host configuration file.
pub fn parse_host_config_file(path: impl AsRef<Path>) -> Result<HostConfig, OptionsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_host_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_for_missing_keys() {
        let config = parse_host_config("{}").unwrap();
        assert_eq!(config, HostConfig::default());
        assert!(config.options.expose_this_record);
        assert_eq!(config.options.max_expression_length, 1000);
    }

    #[test]
    fn test_camel_case_options() {
        let config = parse_host_config(
            r#"{ "options": { "numbersAreFloats": true, "allowChaining": true, "maxExpressionLength": 50 } }"#,
        )
        .unwrap();
        assert!(config.options.numbers_are_floats);
        assert!(config.options.allow_chaining);
        assert!(config.options.expose_this_record);
        assert_eq!(config.options.max_expression_length, 50);
    }

    #[test]
    fn test_variables() {
        let config = parse_host_config(
            r#"{ "variables": [
                { "name": "price", "type": "Decimal" },
                { "name": "cr_orders", "displayName": "Orders", "type": "*[qty:n]", "mutable": true }
            ] }"#,
        )
        .unwrap();
        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables[0].dtype().unwrap(), DType::Decimal);
        assert!(!config.variables[0].mutable);
        let orders = &config.variables[1];
        assert_eq!(orders.display_name.as_deref(), Some("Orders"));
        assert!(orders.mutable);
        assert_eq!(orders.dtype().unwrap().to_string(), "*[qty:n]");
    }

    #[test]
    fn test_bad_variable_type() {
        let config = parse_host_config(r#"{ "variables": [ { "name": "v", "type": "![a:" } ] }"#).unwrap();
        let err = config.variables[0].dtype().unwrap_err();
        assert!(matches!(err, OptionsError::InvalidType { ref owner, .. } if owner == "v"));
    }

    #[test]
    fn test_enums() {
        let config = parse_host_config(r#"{ "enums": { "Size": "%n[Small:1, Large:2]" } }"#).unwrap();
        let enums = config.enum_types().unwrap();
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].0, Name::new("Size"));
        assert!(enums[0].1.as_enum().is_some());

        let config = parse_host_config(r#"{ "enums": { "Size": "n" } }"#).unwrap();
        assert!(matches!(config.enum_types(), Err(OptionsError::NotAnEnum(name)) if name == "Size"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(parse_host_config("{"), Err(OptionsError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_host_config_file("/nonexistent/host.json").unwrap_err();
        assert!(matches!(err, OptionsError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/host.json"));
    }
}
