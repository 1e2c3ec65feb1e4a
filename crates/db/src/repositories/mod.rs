//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` for standalone queries, or `&mut PgConnection` for
//! steps that must run inside a caller-owned transaction (status
//! transition + distribution are one atomic unit of work).

pub mod booking_repo;
pub mod credit_repo;
pub mod payment_repo;
pub mod user_repo;

pub use booking_repo::BookingRepo;
pub use credit_repo::CreditRepo;
pub use payment_repo::PaymentRepo;
pub use user_repo::UserRepo;
