//! PLCALL Metadata - procedure-metadata resolution engine
//!
//! Turns flat catalog rows into callable routine descriptions:
//!
//! - `RoutineIdentity` + locators - resolve a routine name (possibly
//!   via package or synonym indirection) to catalog identifiers
//! - `CatalogRow` - the ordered argument row stream consumed from the
//!   catalog
//! - `ArgumentMetadata` / `ProcedureMetadata` - the reconstructed
//!   per-overload argument forest
//! - `OverloadView` - call-shape views (ordered argument names, OUT
//!   subsequence, return slot) per overload
//! - `TempTables` - session-scoped backing tables for package-local
//!   collection parameters

mod arguments;
mod catalog;
mod identity;
mod locator;
mod overload;
mod temp_storage;

pub use arguments::*;
pub use catalog::*;
pub use identity::*;
pub use locator::*;
pub use overload::*;
pub use temp_storage::*;
