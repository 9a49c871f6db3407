//! Per-overload call-shape views

use crate::{
    build_overloads, fetch_argument_rows, ArgumentMetadata, CatalogRow, OverloadMetadata,
    RoutineIdentity,
};
use plcall_core::{Connection, PlcallError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete metadata of one routine: the argument forest for every
/// overload plus the identity it was built from
///
/// Immutable after construction; safe to share read-only across
/// sessions and meant to be cached per (schema, routine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureMetadata {
    identity: RoutineIdentity,
    overloads: BTreeMap<i32, OverloadMetadata>,
    overloaded: bool,
}

impl ProcedureMetadata {
    /// Build from an already-fetched catalog row stream
    pub fn build(
        identity: RoutineIdentity,
        rows: impl IntoIterator<Item = CatalogRow>,
    ) -> Result<ProcedureMetadata> {
        let (overloads, overloaded) = build_overloads(rows)?;
        tracing::debug!(
            routine = %identity.qualified_name(),
            overloads = overloads.len(),
            overloaded,
            "argument metadata built"
        );
        Ok(ProcedureMetadata {
            identity,
            overloads,
            overloaded,
        })
    }

    /// Query the catalog and build in one step
    pub fn fetch(conn: &dyn Connection, identity: RoutineIdentity) -> Result<ProcedureMetadata> {
        let rows = fetch_argument_rows(conn, &identity)?;
        Self::build(identity, rows)
    }

    pub fn identity(&self) -> &RoutineIdentity {
        &self.identity
    }

    /// True iff the catalog reported more than one signature
    pub fn overloaded(&self) -> bool {
        self.overloaded
    }

    /// Overload keys in ascending order
    pub fn overload_keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.overloads.keys().copied()
    }

    pub fn overload(&self, key: i32) -> Option<&OverloadMetadata> {
        self.overloads.get(&key)
    }

    /// Derive the call-shape view for every overload
    pub fn resolve(&self) -> Result<BTreeMap<i32, OverloadView>> {
        self.overloads
            .iter()
            .map(|(key, overload)| Ok((*key, OverloadView::derive(*key, overload)?)))
            .collect()
    }
}

/// Call shape of a single overload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadView {
    /// Argument names sorted ascending by position
    pub arguments: Vec<String>,
    /// The subsequence of `arguments` whose direction contains OUT
    pub out_arguments: Vec<String>,
    /// Return metadata, present only for functions
    pub return_value: Option<ArgumentMetadata>,
}

impl OverloadView {
    fn derive(key: i32, overload: &OverloadMetadata) -> Result<OverloadView> {
        let mut ordered: Vec<(&String, &ArgumentMetadata)> = overload.arguments.iter().collect();
        ordered.sort_by_key(|(_, meta)| meta.position);

        // positions must be unique within an overload; a duplicate is
        // a catalog defect, never something to silently reorder
        for pair in ordered.windows(2) {
            if pair[0].1.position == pair[1].1.position {
                return Err(PlcallError::MetadataDefect(format!(
                    "overload {} has arguments {:?} and {:?} at the same position {:?}",
                    key, pair[0].0, pair[1].0, pair[0].1.position
                )));
            }
        }

        let arguments: Vec<String> = ordered.iter().map(|(name, _)| (*name).clone()).collect();
        let out_arguments = ordered
            .iter()
            .filter(|(_, meta)| meta.direction.is_out())
            .map(|(name, _)| (*name).clone())
            .collect();
        Ok(OverloadView {
            arguments,
            out_arguments,
            return_value: overload.return_value.clone(),
        })
    }
}
