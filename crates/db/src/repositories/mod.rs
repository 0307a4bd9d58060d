//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Reads take `&PgPool`; writes that may run inside an upsert transaction
//! take `&mut PgConnection` (pass `&mut *tx` or a pooled connection).
//! Soft-delete filtering is explicit in every query.

pub mod category_repo;
pub mod genre_repo;
pub mod relation_repo;
pub mod video_repo;

pub use category_repo::CategoryRepo;
pub use genre_repo::GenreRepo;
pub use relation_repo::{Relation, RelationRepo};
pub use video_repo::VideoRepo;
