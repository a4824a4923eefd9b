//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. Only the
//! parts consumed by identity brokering are modeled here; the XML layer that
//! produces them lives elsewhere.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// SAML Assertion.
///
/// A package of information that supplies one or more statements made
/// by a SAML authority (the issuer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the identity provider that issued this assertion.
    pub issuer: String,

    /// Attribute statements, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_statements: Vec<AttributeStatement>,

    /// Whether this assertion has been signed.
    #[serde(skip)]
    pub signed: bool,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl Assertion {
    /// Creates a new assertion.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            version: default_version(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            attribute_statements: Vec::new(),
            signed: false,
        }
    }

    /// Creates a new assertion with a custom ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(issuer)
        }
    }

    /// Appends an attribute statement.
    #[must_use]
    pub fn with_attribute_statement(mut self, statement: AttributeStatement) -> Self {
        self.attribute_statements.push(statement);
        self
    }

    /// Iterates over every attribute of every statement, in document order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attribute_statements
            .iter()
            .flat_map(|statement| statement.attributes.iter())
    }
}

/// Attribute statement.
///
/// Contains attributes about the subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// List of attributes.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    /// Creates a new empty attribute statement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name (typically a URI).
    pub name: String,

    /// The format of the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// A human-readable name for the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// The attribute values.
    #[serde(default)]
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// URI name format.
    pub const NAME_FORMAT_URI: &'static str = "urn:oasis:names:tc:SAML:2.0:attrname-format:uri";

    /// Basic name format.
    pub const NAME_FORMAT_BASIC: &'static str =
        "urn:oasis:names:tc:SAML:2.0:attrname-format:basic";

    /// Unspecified name format.
    pub const NAME_FORMAT_UNSPECIFIED: &'static str =
        "urn:oasis:names:tc:SAML:2.0:attrname-format:unspecified";

    /// Creates a new attribute with a single text value.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_values(name, vec![AttributeValue::Text(value.into())])
    }

    /// Creates a new attribute with multiple text values.
    #[must_use]
    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::with_values(name, values.into_iter().map(AttributeValue::Text).collect())
    }

    /// Creates a new attribute with arbitrarily typed values.
    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values,
        }
    }

    /// Sets the friendly name.
    #[must_use]
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Sets the name format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.name_format = Some(format.into());
        self
    }

    /// Returns true if `key` equals either the name or the friendly name.
    #[must_use]
    pub fn is_named(&self, key: &str) -> bool {
        self.name == key || self.friendly_name.as_deref() == Some(key)
    }

    /// Returns the string form of every non-nil value, in order.
    #[must_use]
    pub fn text_values(&self) -> Vec<String> {
        self.values.iter().filter_map(AttributeValue::to_text).collect()
    }
}

/// A single `AttributeValue` element.
///
/// `Nil` stands for an element carrying `xsi:nil="true"`.
///
/// The JSON form is untagged and strings are read as [`AttributeValue::Text`],
/// so a serialized `DateTime` comes back as `Text` holding the same RFC 3339
/// rendering. Text that merely looks like a timestamp is never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// `xs:boolean`.
    Boolean(bool),
    /// `xs:integer` and friends.
    Integer(i64),
    /// `xs:string` or any untyped value.
    Text(String),
    /// `xs:dateTime`.
    DateTime(DateTime<Utc>),
    /// Explicitly empty value.
    Nil,
}

impl AttributeValue {
    /// Returns true for `xsi:nil` values.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the string form of the value, or `None` if it is nil.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        if self.is_nil() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Nil => Ok(()),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}
