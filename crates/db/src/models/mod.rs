//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` create DTOs for inserts
//! - Query-parameter DTOs where the resource supports listing

pub mod booking;
pub mod credit;
pub mod payment;
pub mod user;
