//! PLCALL Core - Core abstractions and traits for the stored-procedure call engine
//!
//! This crate provides the fundamental traits and types that the other
//! plcall crates depend on. It defines:
//!
//! - `Connection` - Trait for the database connection collaborator
//! - `BindTarget` - Trait for bind/fetch targets (prepared call statements)
//! - `RowStream` / `CursorHandle` - Lazily-iterable ref-cursor results
//! - Common types like `Value`, `WireValue`, `SqlTag`, `Row`, `ColumnMeta`

mod connection;
mod error;
mod types;
mod wire;

pub use connection::*;
pub use error::*;
pub use types::*;
pub use wire::*;
