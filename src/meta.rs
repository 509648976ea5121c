//! Declarative metadata collection.
//!
//! A command node declares its metadata (name, help, arguments, ...) on a
//! [`Declarative`] target. [`collect`] reads the attributes listed in an
//! [`AttributeSpec`] table into a [`MetaRecord`] and fails loudly when a required
//! attribute is absent. This runs once per node, at construction time.

use std::collections::BTreeMap;

use tracing::trace;

use crate::argument::ArgumentSpec;
use crate::declaration::CommandSpec;
use crate::errors::{ConfigurationError, ConfigurationResult};

/// One named piece of declarative metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub required: bool,
}

impl AttributeSpec {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// Attributes read off the root command.
pub const COMMAND_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::required("name"),
    AttributeSpec::optional("arguments"),
    AttributeSpec::optional("help"),
    AttributeSpec::optional("description"),
    AttributeSpec::optional("version"),
    AttributeSpec::optional("subcommands"),
];

/// Attributes read off every sub-command.
pub const SUBCOMMAND_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::required("name"),
    AttributeSpec::optional("aliases"),
    AttributeSpec::optional("arguments"),
    AttributeSpec::optional("help"),
    AttributeSpec::optional("description"),
    AttributeSpec::optional("subcommands"),
];

/// Resolved value of one attribute.
#[derive(Debug, Clone)]
pub enum MetaValue {
    Text(String),
    List(Vec<String>),
    Arguments(Vec<ArgumentSpec>),
    Commands(Vec<CommandSpec>),
}

impl MetaValue {
    fn shape(&self) -> &'static str {
        match self {
            MetaValue::Text(_) => "text",
            MetaValue::List(_) => "a list of strings",
            MetaValue::Arguments(_) => "a list of arguments",
            MetaValue::Commands(_) => "a list of sub-commands",
        }
    }
}

/// Something that declares metadata by attribute name.
pub trait Declarative {
    /// Value of attribute `name`, or `None` if it is not declared.
    fn attribute(&self, name: &str) -> Option<MetaValue>;
}

/// Validated metadata of one command node. Immutable once collected.
#[derive(Debug, Clone)]
pub struct MetaRecord {
    owner: String,
    values: BTreeMap<&'static str, Option<MetaValue>>,
}

/// Read every attribute in `specs` off `target`.
///
/// `owner` names the node in error messages.
///
/// # Errors
///
/// [`ConfigurationError::MissingAttribute`] for the first required attribute that
/// `target` does not declare.
pub fn collect<D>(target: &D, specs: &[AttributeSpec], owner: &str) -> ConfigurationResult<MetaRecord>
where
    D: Declarative + ?Sized,
{
    let mut values = BTreeMap::new();
    for spec in specs {
        let value = target.attribute(spec.name);
        if spec.required && value.is_none() {
            return Err(ConfigurationError::MissingAttribute {
                attribute: spec.name,
                owner: owner.to_string(),
            });
        }
        trace!(attribute = spec.name, present = value.is_some(), "collected");
        values.insert(spec.name, value);
    }

    let owner = match values.get("name") {
        Some(Some(MetaValue::Text(name))) => format!("'{name}'"),
        _ => owner.to_string(),
    };
    Ok(MetaRecord { owner, values })
}

impl MetaRecord {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Raw value; `None` both for undeclared and for uncollected attributes.
    pub fn get(&self, name: &str) -> Option<&MetaValue> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Whether `name` was part of the attribute table this record was collected with.
    pub fn is_collected(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn name(&self) -> ConfigurationResult<&str> {
        self.text("name")?
            .ok_or_else(|| ConfigurationError::MissingAttribute {
                attribute: "name",
                owner: self.owner.clone(),
            })
    }

    pub fn text(&self, name: &'static str) -> ConfigurationResult<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(MetaValue::Text(text)) => Ok(Some(text)),
            Some(other) => Err(self.mismatch(name, other, "text")),
        }
    }

    /// List attribute; undeclared reads as empty.
    pub fn list(&self, name: &'static str) -> ConfigurationResult<&[String]> {
        match self.get(name) {
            None => Ok(&[]),
            Some(MetaValue::List(items)) => Ok(items),
            Some(other) => Err(self.mismatch(name, other, "a list of strings")),
        }
    }

    pub fn arguments(&self, name: &'static str) -> ConfigurationResult<&[ArgumentSpec]> {
        match self.get(name) {
            None => Ok(&[]),
            Some(MetaValue::Arguments(arguments)) => Ok(arguments),
            Some(other) => Err(self.mismatch(name, other, "a list of arguments")),
        }
    }

    pub fn commands(&self, name: &'static str) -> ConfigurationResult<&[CommandSpec]> {
        match self.get(name) {
            None => Ok(&[]),
            Some(MetaValue::Commands(commands)) => Ok(commands),
            Some(other) => Err(self.mismatch(name, other, "a list of sub-commands")),
        }
    }

    fn mismatch(
        &self,
        attribute: &'static str,
        found: &MetaValue,
        expected: &'static str,
    ) -> ConfigurationError {
        trace!(attribute, found = found.shape(), expected, "attribute shape mismatch");
        ConfigurationError::MismatchedAttribute {
            attribute,
            owner: self.owner.clone(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<(&'static str, MetaValue)>);

    impl Declarative for Fixed {
        fn attribute(&self, name: &str) -> Option<MetaValue> {
            self.0
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn given_required_attribute_missing_when_collecting_then_names_it() {
        let target = Fixed(vec![("help", MetaValue::Text("h".into()))]);

        let err = collect(&target, SUBCOMMAND_ATTRIBUTES, "sub-command of 'calc'").unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::MissingAttribute {
                attribute: "name",
                owner: "sub-command of 'calc'".into()
            }
        );
    }

    #[test]
    fn given_optional_attributes_absent_when_collecting_then_resolve_to_none() {
        let target = Fixed(vec![("name", MetaValue::Text("sum".into()))]);

        let meta = collect(&target, SUBCOMMAND_ATTRIBUTES, "sub-command").unwrap();

        assert_eq!(meta.name().unwrap(), "sum");
        assert_eq!(meta.owner(), "'sum'");
        assert_eq!(meta.text("help").unwrap(), None);
        assert!(meta.list("aliases").unwrap().is_empty());
        assert!(meta.arguments("arguments").unwrap().is_empty());
        assert!(meta.is_collected("description"));
        assert!(!meta.is_collected("version"));
    }

    #[test]
    fn given_attribute_outside_table_when_collecting_then_it_is_ignored() {
        let target = Fixed(vec![
            ("name", MetaValue::Text("sum".into())),
            ("version", MetaValue::Text("1.0".into())),
        ]);

        let meta = collect(&target, SUBCOMMAND_ATTRIBUTES, "sub-command").unwrap();

        assert!(meta.get("version").is_none());
    }

    #[test]
    fn given_wrong_shape_when_reading_then_fails() {
        let target = Fixed(vec![
            ("name", MetaValue::Text("sum".into())),
            ("aliases", MetaValue::Text("add".into())),
        ]);
        let meta = collect(&target, SUBCOMMAND_ATTRIBUTES, "sub-command").unwrap();

        let err = meta.list("aliases").unwrap_err();

        assert!(matches!(
            err,
            ConfigurationError::MismatchedAttribute { attribute: "aliases", .. }
        ));
    }
}
