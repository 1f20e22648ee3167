//! Parameter schemas and the validation seam shared by the guard and registry.
//!
//! [`ParameterSchema`] mirrors the JSON-Schema subset that model providers
//! accept for tool parameters. [`Schema`] is the opaque validation capability
//! the guard consults; any validation library can sit behind it, and
//! [`ParameterSchema`] itself implements it for the common case.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

const OBJECT_TYPE: &str = "object";

/// Validation capability consulted before a tool runs.
///
/// Implementations return the validated (and possibly coerced) value, or one
/// [`Violation`] per offending field.
pub trait Schema: Send + Sync {
    /// Validates `value`, returning the accepted value or the violations found.
    ///
    /// # Errors
    ///
    /// Returns every [`Violation`] detected in `value`.
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Violation>>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> std::result::Result<Value, Vec<Violation>> + Send + Sync,
{
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Violation>> {
        (self)(value)
    }
}

/// A single field-level validation failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    path: String,
    message: String,
}

impl Violation {
    /// Creates a violation for the dotted field `path` (empty for the root).
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns the dotted path of the offending field.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the violation message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "(root)"
        } else {
            &self.path
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// Type tag attached to a declared property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// UTF-8 string.
    String,
    /// Any JSON number.
    Number,
    /// Number without a fractional part.
    Integer,
    /// `true` or `false`.
    Boolean,
    /// JSON array; element shape given by `items`.
    Array,
    /// JSON object; nested shape given by `properties`.
    Object,
}

impl PropertyType {
    /// Returns the lowercase JSON-Schema name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value
                        .as_f64()
                        .is_some_and(|number| number.fract().abs() < f64::EPSILON)
            }
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl Display for PropertyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared shape of one tool parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    kind: PropertyType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<PropertySchema>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    allowed_values: Vec<Value>,
}

impl PropertySchema {
    /// Creates a property of the given type.
    #[must_use]
    pub fn new(kind: PropertyType, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            items: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            allowed_values: Vec::new(),
        }
    }

    /// Shorthand for a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PropertyType::String, description)
    }

    /// Shorthand for a number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Number, description)
    }

    /// Shorthand for an integer property.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Integer, description)
    }

    /// Shorthand for a boolean property.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Boolean, description)
    }

    /// Shorthand for an array property whose elements follow `items`.
    #[must_use]
    pub fn array(description: impl Into<String>, items: PropertySchema) -> Self {
        let mut schema = Self::new(PropertyType::Array, description);
        schema.items = Some(Box::new(items));
        schema
    }

    /// Shorthand for an object property.
    #[must_use]
    pub fn object(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Object, description)
    }

    /// Adds a nested property (object properties only).
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Marks a nested property as required (object properties only).
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    /// Restricts the property to the supplied values.
    #[must_use]
    pub fn with_allowed_values<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        self.allowed_values = values.into_iter().collect();
        self
    }

    /// Returns the property type.
    #[must_use]
    pub const fn kind(&self) -> PropertyType {
        self.kind
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the element schema for array properties.
    #[must_use]
    pub fn items(&self) -> Option<&PropertySchema> {
        self.items.as_deref()
    }

    /// Returns nested properties for object properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    fn check_shape(&self, path: &str) -> Result<()> {
        match (self.kind, &self.items) {
            (PropertyType::Array, None) => {
                return Err(Error::schema(format!(
                    "array property `{path}` must declare `items`"
                )));
            }
            (PropertyType::Array, Some(items)) => items.check_shape(&format!("{path}[]"))?,
            (_, Some(_)) => {
                return Err(Error::schema(format!(
                    "property `{path}` declares `items` but is not an array"
                )));
            }
            (_, None) => {}
        }

        if self.kind != PropertyType::Object
            && (!self.properties.is_empty() || !self.required.is_empty())
        {
            return Err(Error::schema(format!(
                "property `{path}` declares nested properties but is not an object"
            )));
        }

        check_members(&self.properties, &self.required, path)
    }

    fn check_value(&self, value: &Value, path: &str, violations: &mut Vec<Violation>) {
        if !self.kind.matches(value) {
            violations.push(Violation::new(
                path,
                format!("expected {}, received {}", self.kind, describe(value)),
            ));
            return;
        }

        if !self.allowed_values.is_empty() && !self.allowed_values.contains(value) {
            violations.push(Violation::new(
                path,
                "value is not one of the allowed options",
            ));
            return;
        }

        match self.kind {
            PropertyType::Array => {
                if let (Some(items), Some(elements)) = (self.items.as_deref(), value.as_array()) {
                    for (index, element) in elements.iter().enumerate() {
                        items.check_value(element, &join(path, &index.to_string()), violations);
                    }
                }
            }
            PropertyType::Object => {
                check_object(&self.properties, &self.required, value, path, violations);
            }
            _ => {}
        }
    }
}

/// Top-level parameter shape of a tool (`{"type": "object", ...}`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type", default = "object_type")]
    kind: String,
    #[serde(default)]
    properties: BTreeMap<String, PropertySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    required: Vec<String>,
}

fn object_type() -> String {
    OBJECT_TYPE.to_owned()
}

impl Default for ParameterSchema {
    fn default() -> Self {
        Self {
            kind: object_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl ParameterSchema {
    /// Creates an empty object schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an optional property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, property: PropertySchema) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Adds a property and marks it as required.
    #[must_use]
    pub fn with_required_property(
        mut self,
        name: impl Into<String>,
        property: PropertySchema,
    ) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, property);
        self
    }

    /// Returns the top-level type tag; well-formed schemas always carry `object`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the declared properties.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertySchema> {
        &self.properties
    }

    /// Returns the names of required properties.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Checks that the schema is structurally sound.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] when the top-level type is not
    /// `object`, a property name is blank, a required entry is undeclared,
    /// an array omits `items`, or a nested object is malformed.
    pub fn check_shape(&self) -> Result<()> {
        if self.kind != OBJECT_TYPE {
            return Err(Error::schema(format!(
                "top-level type must be `object`, found `{}`",
                self.kind
            )));
        }
        check_members(&self.properties, &self.required, "")
    }
}

impl Schema for ParameterSchema {
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Violation>> {
        let mut violations = Vec::new();
        check_object(&self.properties, &self.required, value, "", &mut violations);
        if violations.is_empty() {
            Ok(value.clone())
        } else {
            Err(violations)
        }
    }
}

fn check_members(
    properties: &BTreeMap<String, PropertySchema>,
    required: &[String],
    path: &str,
) -> Result<()> {
    for (name, property) in properties {
        if name.trim().is_empty() {
            return Err(Error::schema(format!(
                "property names cannot be blank (in `{}`)",
                if path.is_empty() { "(root)" } else { path }
            )));
        }
        property.check_shape(&join(path, name))?;
    }

    if let Some(missing) = required.iter().find(|name| !properties.contains_key(*name)) {
        return Err(Error::schema(format!(
            "required property `{}` is not declared",
            join(path, missing)
        )));
    }

    Ok(())
}

fn check_object(
    properties: &BTreeMap<String, PropertySchema>,
    required: &[String],
    value: &Value,
    path: &str,
    violations: &mut Vec<Violation>,
) {
    let Some(map) = value.as_object() else {
        violations.push(Violation::new(
            path,
            format!("expected object, received {}", describe(value)),
        ));
        return;
    };

    for name in required {
        if !map.contains_key(name) {
            violations.push(Violation::new(join(path, name), "required"));
        }
    }

    for (name, property) in properties {
        if let Some(field) = map.get(name) {
            property.check_value(field, &join(path, name), violations);
        }
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}.{segment}")
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
