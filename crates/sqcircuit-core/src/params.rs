//! Branch parameter tokens and the symbolic parameter table.
//!
//! A parameter token is either a bare number (`"1.5"`), a declaration
//! (`"EJ=10"`) that introduces a symbolic parameter with its initial value,
//! or a bare name (`"EJ"`) that refers to an earlier declaration.

use indexmap::IndexMap;

use crate::branch::ParamValue;
use crate::error::{Error, Result};

/// A single parsed parameter token.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamToken {
    Number(f64),
    Declaration { name: String, value: f64 },
    Reference(String),
}

/// Parse one parameter token.
pub fn parse_token(word: &str) -> Result<ParamToken> {
    let word = word.trim();
    if let Ok(v) = word.parse::<f64>() {
        return Ok(ParamToken::Number(v));
    }

    let parts: Vec<&str> = word.split('=').collect();
    match parts.as_slice() {
        [name] => {
            check_name(name, word)?;
            Ok(ParamToken::Reference((*name).to_string()))
        }
        [name, value] => {
            check_name(name, word)?;
            let value = value.parse::<f64>().map_err(|_| {
                Error::Syntax(format!(
                    "initial value of `{name}` in `{word}` is not a number"
                ))
            })?;
            Ok(ParamToken::Declaration {
                name: (*name).to_string(),
                value,
            })
        }
        _ => Err(Error::Syntax(format!(
            "malformed parameter `{word}`, expected a number or name=value"
        ))),
    }
}

fn check_name(name: &str, word: &str) -> Result<()> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Syntax(format!("invalid parameter name in `{word}`")))
    }
}

/// Declared symbolic parameters and their bound values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    values: IndexMap<String, f64>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter with its initial value.
    ///
    /// A repeated declaration rebinds the value and keeps the parameter's
    /// original position.
    pub fn declare(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Turn a token into a branch parameter value, declaring it if needed.
    pub fn resolve(&mut self, token: ParamToken) -> Result<ParamValue> {
        match token {
            ParamToken::Number(v) => Ok(ParamValue::Number(v)),
            ParamToken::Declaration { name, value } => {
                self.declare(&name, value);
                Ok(ParamValue::Symbol(name))
            }
            ParamToken::Reference(name) => {
                if self.values.contains_key(&name) {
                    Ok(ParamValue::Symbol(name))
                } else {
                    Err(Error::UninitializedParameter(name))
                }
            }
        }
    }

    /// Bound value of a parameter.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Update the bound value of an existing parameter.
    ///
    /// Returns `false` when the parameter was never declared.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Numeric value of a branch parameter.
    pub fn value_of(&self, value: &ParamValue) -> Option<f64> {
        match value {
            ParamValue::Number(v) => Some(*v),
            ParamValue::Symbol(name) => self.get(name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_token("0.123").unwrap(), ParamToken::Number(0.123));
        assert_eq!(parse_token("1e-3").unwrap(), ParamToken::Number(1e-3));
    }

    #[test]
    fn test_parse_declaration() {
        assert_eq!(
            parse_token("EJ=10").unwrap(),
            ParamToken::Declaration {
                name: "EJ".to_string(),
                value: 10.0
            }
        );
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_token("ECJ").unwrap(),
            ParamToken::Reference("ECJ".to_string())
        );
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_token("EJ=1=2"), Err(Error::Syntax(_))));
        assert!(matches!(parse_token("EJ=abc"), Err(Error::Syntax(_))));
        assert!(matches!(parse_token("=3"), Err(Error::Syntax(_))));
        assert!(matches!(parse_token("1x=3"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_resolve_requires_declaration() {
        let mut table = ParameterTable::new();
        let err = table
            .resolve(ParamToken::Reference("EJ".to_string()))
            .unwrap_err();
        assert_eq!(err, Error::UninitializedParameter("EJ".to_string()));

        table.resolve(parse_token("EJ=5").unwrap()).unwrap();
        assert_eq!(
            table.resolve(parse_token("EJ").unwrap()).unwrap(),
            ParamValue::Symbol("EJ".to_string())
        );
        assert_eq!(table.get("EJ"), Some(5.0));
    }

    #[test]
    fn test_redeclaration() {
        let mut table = ParameterTable::new();
        table.declare("EC", 1.0);
        table.declare("EJ", 10.0);
        table.declare("EC", 2.0);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("EC"), Some(2.0));
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["EC", "EJ"]);
    }

    #[test]
    fn test_set_and_order() {
        let mut table = ParameterTable::new();
        table.declare("EJ", 10.0);
        table.declare("EC", 0.2);
        assert!(table.set("EJ", 12.0));
        assert!(!table.set("EL", 1.0));
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["EJ", "EC"]);
        assert_eq!(table.value_of(&ParamValue::Symbol("EJ".into())), Some(12.0));
        assert_eq!(table.value_of(&ParamValue::Number(3.0)), Some(3.0));
    }
}
