//! Domain logic for the catalog backend.
//!
//! Everything in this crate is free of database and HTTP dependencies:
//! identifier types, the error taxonomy, the rating code set, the field
//! validation engine and the relation sync plan.

pub mod error;
pub mod rating;
pub mod sync;
pub mod types;
pub mod validation;
