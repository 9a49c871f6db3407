//! Resolved routine identity

use serde::{Deserialize, Serialize};

/// How a routine name was resolved to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Found directly under the requested owner
    Direct,
    /// Reached through a synonym; `owner` is the synonym's owner
    /// (the caller's schema or PUBLIC)
    Synonym { owner: String },
}

/// Catalog identity of a routine, immutable once resolved
///
/// Built once per `find` and meant to be cached by the caller for the
/// life of the schema handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineIdentity {
    /// Owning schema (post synonym resolution)
    pub schema: String,
    /// Package the routine lives in, if any
    pub package: Option<String>,
    /// Routine name as stored in the catalog
    pub routine: String,
    /// How the owner was resolved
    pub resolution: Resolution,
    /// Catalog object identifier driving the argument query; backends
    /// without numeric object ids leave this empty
    pub object_id: Option<i64>,
}

impl RoutineIdentity {
    /// Fully qualified display name
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(package) => format!("{}.{}.{}", self.schema, package, self.routine),
            None => format!("{}.{}", self.schema, self.routine),
        }
    }
}
