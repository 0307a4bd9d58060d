//! Field validation engine.
//!
//! Provides typed rule definitions, the per-entity rule sets, and an
//! evaluator that checks a JSON field mapping against a rule set. Foreign
//! key checks go through the [`ExistenceCheck`] trait so this module stays
//! free of database dependencies.

pub mod evaluator;
pub mod rule_sets;
pub mod rules;

pub use evaluator::{validate, ExistenceCheck};
pub use rules::{
    FieldViolation, LiveTable, Rule, RuleSet, ValidatedFields, ValidationErrors,
};
