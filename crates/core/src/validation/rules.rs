//! Rule, rule set, and validation outcome types.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::DbId;

/// Tables that can be the target of an [`Rule::Exists`] check.
///
/// Only live rows (`deleted_at IS NULL`) satisfy the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiveTable {
    Categories,
    Genres,
}

impl LiveTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LiveTable::Categories => "categories",
            LiveTable::Genres => "genres",
        }
    }
}

/// A single validation predicate applied to one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Present, not null, not a blank string, not an empty array.
    Required,
    /// An explicit `null` (or blank string) is accepted and stored as null.
    Nullable,
    /// A JSON string.
    String,
    /// Upper bound: characters for strings, value for numbers, length for arrays.
    Max(u64),
    /// `true`, `false`, `1`, `0`, `"1"` or `"0"`. Coerced to a JSON boolean.
    Boolean,
    /// A four-digit year. Coerced to a JSON integer.
    YearFormat,
    /// Membership in a closed list of string codes.
    In(&'static [&'static str]),
    /// An integer (or integer string) that fits in 32 bits. Coerced to a JSON integer.
    Integer,
    /// A JSON array.
    Array,
    /// Every element is the id of a live row in the given table.
    Exists(LiveTable),
}

impl Rule {
    /// Machine-readable reason code recorded when this rule fails.
    pub fn code(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::Nullable => "nullable",
            Rule::String => "string",
            Rule::Max(_) => "max",
            Rule::Boolean => "boolean",
            Rule::YearFormat => "date_format",
            Rule::In(_) => "in",
            Rule::Integer => "integer",
            Rule::Array => "array",
            Rule::Exists(_) => "exists",
        }
    }
}

/// The ordered rules for one input field.
#[derive(Debug, Clone)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: Vec<Rule>,
}

impl FieldRules {
    pub fn is_required(&self) -> bool {
        self.rules.contains(&Rule::Required)
    }

    pub fn is_nullable(&self) -> bool {
        self.rules.contains(&Rule::Nullable)
    }
}

/// Rules for every accepted field of an entity, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field with its ordered rules.
    pub fn field(mut self, field: &'static str, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.fields.push(FieldRules {
            field,
            rules: rules.into_iter().collect(),
        });
        self
    }

    pub fn fields(&self) -> &[FieldRules] {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&FieldRules> {
        self.fields.iter().find(|f| f.field == field)
    }
}

/// A single rule failure on a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    /// Reason code, e.g. `required`, `max.string`, `exists`.
    pub rule: String,
    /// Interpolation parameters, e.g. `{"max": 255}`.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl FieldViolation {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }
}

/// Every failing field of a request, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<FieldViolation>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, violation: FieldViolation) {
        self.0.entry(field.to_string()).or_default().push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[FieldViolation]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Reason code of the first violation on `field`, if any.
    pub fn rule_for(&self, field: &str) -> Option<&str> {
        self.get(field)
            .and_then(|violations| violations.first())
            .map(|v| v.rule.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, violations) in &self.0 {
            for violation in violations {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} ({})", violation.rule)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Fields that passed validation, with their values coerced to the JSON
/// types the typed DTOs expect. Only fields named in the rule set are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFields(Map<String, Value>);

impl ValidatedFields {
    pub(crate) fn insert(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Parse an id-array field. `None` when the field was not supplied.
    pub fn id_list(&self, field: &str) -> Result<Option<Vec<DbId>>, CoreError> {
        let Some(value) = self.0.get(field) else {
            return Ok(None);
        };
        let items = value.as_array().ok_or_else(|| {
            CoreError::Internal(format!("validated field '{field}' is not an array"))
        })?;
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .and_then(|s| s.parse::<DbId>().ok())
                    .ok_or_else(|| {
                        CoreError::Internal(format!("validated field '{field}' holds a non-UUID"))
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Deserialize into a typed DTO. Unknown fields are ignored by the DTO.
    pub fn to_dto<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| {
            CoreError::Internal(format!(
                "validated fields do not match {}: {e}",
                std::any::type_name::<T>()
            ))
        })
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
