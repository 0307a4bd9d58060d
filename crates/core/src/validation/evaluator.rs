//! Rule evaluator.
//!
//! Pure logic except for [`Rule::Exists`], which asks an [`ExistenceCheck`]
//! implementation which of the referenced ids belong to live rows.

use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use validator::ValidateLength;

use super::rules::{
    FieldRules, FieldViolation, LiveTable, Rule, RuleSet, ValidatedFields, ValidationErrors,
};
use crate::error::CoreError;
use crate::types::DbId;

/// Looks up which ids refer to live (not soft-deleted) rows.
#[async_trait]
pub trait ExistenceCheck: Sync {
    type Error: From<CoreError> + Send;

    /// Return the subset of `ids` that exist in `table` with `deleted_at IS NULL`.
    async fn live_ids(&self, table: LiveTable, ids: &[DbId])
        -> Result<HashSet<DbId>, Self::Error>;
}

/// Validate `input` against `rules`.
///
/// Every field is checked before returning; the first failing rule of a
/// field is recorded and the rest of that field's rules are skipped. Fails
/// with [`CoreError::Validation`] when any field is invalid. Lookup errors
/// from `existence` are returned as-is.
pub async fn validate<C>(
    input: &Map<String, Value>,
    rules: &RuleSet,
    existence: &C,
) -> Result<ValidatedFields, C::Error>
where
    C: ExistenceCheck + ?Sized,
{
    let mut validated = ValidatedFields::default();
    let mut errors = ValidationErrors::new();

    for field_rules in rules.fields() {
        let field = field_rules.field;
        match check_field(field_rules, input.get(field), existence).await? {
            FieldOutcome::Valid(value) => validated.insert(field, value),
            FieldOutcome::Skipped => {}
            FieldOutcome::Invalid(violation) => errors.add(field, violation),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(CoreError::Validation(errors).into())
    }
}

enum FieldOutcome {
    Valid(Value),
    Skipped,
    Invalid(FieldViolation),
}

async fn check_field<C>(
    field_rules: &FieldRules,
    raw: Option<&Value>,
    existence: &C,
) -> Result<FieldOutcome, C::Error>
where
    C: ExistenceCheck + ?Sized,
{
    let Some(value) = raw.filter(|v| is_filled(v)) else {
        if field_rules.is_required() {
            return Ok(FieldOutcome::Invalid(FieldViolation::new("required")));
        }
        if field_rules.is_nullable() && raw.is_some() {
            return Ok(FieldOutcome::Valid(Value::Null));
        }
        return Ok(FieldOutcome::Skipped);
    };

    let mut value = value.clone();
    for rule in &field_rules.rules {
        let checked = match rule {
            Rule::Exists(table) => check_exists(*table, &value, existence).await?,
            other => check_value(other, &value),
        };
        match checked {
            Ok(coerced) => value = coerced,
            Err(violation) => return Ok(FieldOutcome::Invalid(violation)),
        }
    }

    Ok(FieldOutcome::Valid(value))
}

/// A value counts as supplied unless it is null, blank, or an empty array.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn check_value(rule: &Rule, value: &Value) -> Result<Value, FieldViolation> {
    match rule {
        Rule::Required | Rule::Nullable | Rule::Exists(_) => Ok(value.clone()),
        Rule::String => {
            if value.is_string() {
                Ok(value.clone())
            } else {
                Err(FieldViolation::new("string"))
            }
        }
        Rule::Max(max) => check_max(*max, value),
        Rule::Boolean => coerce_boolean(value).ok_or_else(|| FieldViolation::new("boolean")),
        Rule::YearFormat => coerce_year(value)
            .ok_or_else(|| FieldViolation::new("date_format").with_param("format", "Y")),
        Rule::In(allowed) => coerce_code(value)
            .filter(|code| allowed.contains(&code.as_str()))
            .map(Value::String)
            .ok_or_else(|| FieldViolation::new("in")),
        Rule::Integer => coerce_integer(value).ok_or_else(|| FieldViolation::new("integer")),
        Rule::Array => {
            if value.is_array() {
                Ok(value.clone())
            } else {
                Err(FieldViolation::new("array"))
            }
        }
    }
}

fn check_max(max: u64, value: &Value) -> Result<Value, FieldViolation> {
    let (within, kind) = match value {
        Value::String(s) => (s.validate_length(None, Some(max), None), "max.string"),
        Value::Array(items) => (items.validate_length(None, Some(max), None), "max.array"),
        Value::Number(n) => (
            n.as_f64().is_some_and(|x| x <= max as f64),
            "max.numeric",
        ),
        _ => (true, ""),
    };
    if within {
        Ok(value.clone())
    } else {
        Err(FieldViolation::new(kind).with_param("max", max))
    }
}

fn coerce_boolean(value: &Value) -> Option<Value> {
    let b = match value {
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_i64() {
            Some(1) => true,
            Some(0) => false,
            _ => return None,
        },
        Value::String(s) => match s.as_str() {
            "1" => true,
            "0" => false,
            _ => return None,
        },
        _ => return None,
    };
    Some(Value::Bool(b))
}

fn coerce_year(value: &Value) -> Option<Value> {
    let year = match value {
        Value::String(s) if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse::<i64>().ok()?
        }
        Value::Number(n) => n.as_i64()?,
        _ => return None,
    };
    (1000..=9999).contains(&year).then(|| Value::from(year))
}

fn coerce_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_i64().map(|i| i.to_string()),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<Value> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|i| i32::try_from(i).ok())?,
        Value::String(s) => s.trim().parse::<i32>().ok()?,
        _ => return None,
    };
    Some(Value::from(parsed))
}

async fn check_exists<C>(
    table: LiveTable,
    value: &Value,
    existence: &C,
) -> Result<Result<Value, FieldViolation>, C::Error>
where
    C: ExistenceCheck + ?Sized,
{
    let ids: Option<Vec<DbId>> = value.as_array().and_then(|items| {
        items
            .iter()
            .map(|item| item.as_str().and_then(|s| s.parse::<DbId>().ok()))
            .collect()
    });

    let Some(ids) = ids else {
        return Ok(Err(FieldViolation::new("exists")));
    };

    if !ids.is_empty() {
        let live = existence.live_ids(table, &ids).await?;
        if !ids.iter().all(|id| live.contains(id)) {
            return Ok(Err(FieldViolation::new("exists")));
        }
    }

    Ok(Ok(Value::Array(
        ids.iter().map(|id| Value::String(id.to_string())).collect(),
    )))
}
