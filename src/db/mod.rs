pub mod connection;
pub mod dao;
pub mod entities;

/// Anything statements can run against: the pooled connection or an open
/// transaction.
pub use sea_orm::ConnectionTrait as Executor;
