//! Argument metadata and the catalog-row builder
//!
//! The catalog reports a routine's arguments as a flat stream: nested
//! record fields and collection elements appear as extra rows one
//! nesting level deeper than their parent. The builder reconstructs
//! the hierarchy in a single linear pass, keeping a per-overload table
//! of the last composite row seen at each level.

use crate::{CatalogRow, Direction, TempTableSpec};
use indexmap::IndexMap;
use plcall_core::{PlcallError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Composite types that hold a sequence of elements
pub const COLLECTION_TYPES: [&str; 3] = ["PL/SQL TABLE", "TABLE", "VARRAY"];

pub fn is_collection_type(data_type: &str) -> bool {
    COLLECTION_TYPES.contains(&data_type)
}

/// Owner/name/subname triple identifying a named database type
///
/// A present `subname` means the type is declared inside a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub owner: String,
    pub name: String,
    pub subname: Option<String>,
}

impl TypeRef {
    /// SQL-level name; a PUBLIC owner is elided
    pub fn sql_type_name(&self) -> String {
        let mut name = String::new();
        if self.owner != "PUBLIC" {
            name.push_str(&self.owner);
            name.push('.');
        }
        name.push_str(&self.name);
        if let Some(subname) = &self.subname {
            name.push('.');
            name.push_str(subname);
        }
        name
    }

    /// Whether the type is declared inside a package
    pub fn in_package(&self) -> bool {
        self.subname.is_some()
    }
}

/// Child structure of a composite argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Composite {
    /// Plain scalar, no children
    Scalar,
    /// Record fields in catalog order
    Record(IndexMap<String, ArgumentMetadata>),
    /// Table or varray element
    Collection(Option<Box<ArgumentMetadata>>),
    /// Ref cursor; a declared row shape may be present but fetch-time
    /// shape always comes from the live cursor
    RefCursor(Option<Box<ArgumentMetadata>>),
}

/// One argument (or nested type member) of a routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentMetadata {
    /// 1-based ordinal within the argument's nesting level
    pub position: Option<i32>,
    /// Catalog type name
    pub data_type: String,
    pub direction: Direction,
    pub data_length: Option<i32>,
    pub data_precision: Option<i32>,
    pub data_scale: Option<i32>,
    pub char_used: Option<String>,
    pub char_length: Option<i32>,
    /// Named-type reference, present for composite and object types
    pub type_ref: Option<TypeRef>,
    pub composite: Composite,
}

impl ArgumentMetadata {
    pub fn is_composite(&self) -> bool {
        !matches!(self.composite, Composite::Scalar)
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.composite, Composite::Collection(_))
    }

    /// Record field map, if this is a record
    pub fn fields(&self) -> Option<&IndexMap<String, ArgumentMetadata>> {
        match &self.composite {
            Composite::Record(fields) => Some(fields),
            _ => None,
        }
    }

    /// Element metadata, if this is a collection or ref cursor
    pub fn element(&self) -> Option<&ArgumentMetadata> {
        match &self.composite {
            Composite::Collection(element) | Composite::RefCursor(element) => {
                element.as_deref()
            }
            Composite::Scalar | Composite::Record(_) => None,
        }
    }

    /// SQL-level name of the argument's named type, if any
    pub fn sql_type_name(&self) -> Option<String> {
        self.type_ref.as_ref().map(TypeRef::sql_type_name)
    }

    /// Number of catalog rows this subtree was built from
    pub fn node_count(&self) -> usize {
        1 + match &self.composite {
            Composite::Scalar => 0,
            Composite::Record(fields) => {
                fields.values().map(ArgumentMetadata::node_count).sum()
            }
            Composite::Collection(element) | Composite::RefCursor(element) => element
                .as_deref()
                .map(ArgumentMetadata::node_count)
                .unwrap_or(0),
        }
    }
}

/// One reconstructed overload signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverloadMetadata {
    /// Top-level arguments keyed by lower-cased name, catalog order
    pub arguments: IndexMap<String, ArgumentMetadata>,
    /// Return slot, present only for functions
    pub return_value: Option<ArgumentMetadata>,
    /// Backing temp tables queued for package-local collections
    pub temp_tables: Vec<TempTableSpec>,
}

/// Reconstruct the per-overload argument forest from the flat stream.
///
/// Returns the forest plus whether the catalog reported overloads at
/// all. Rows must arrive pre-sorted by (overload, sequence).
pub(crate) fn build_overloads(
    rows: impl IntoIterator<Item = CatalogRow>,
) -> Result<(BTreeMap<i32, OverloadMetadata>, bool)> {
    let mut accums: BTreeMap<i32, OverloadAccum> = BTreeMap::new();
    let mut overloaded = false;

    for row in rows {
        overloaded |= row.overload.is_some();
        // a routine without overloads stores its arguments at key 0
        let key = row.overload.unwrap_or(0);

        if let Some(type_ref) = type_ref_of(&row) {
            if type_ref.in_package() {
                if is_collection_type(&row.data_type) {
                    if row.data_level > 0 {
                        return Err(PlcallError::unsupported_type(
                            type_ref.sql_type_name(),
                            format!(
                                "{} definition inside package is not supported as part of \
                                 another type definition, use CREATE TYPE outside package",
                                row.data_type
                            ),
                        ));
                    }
                } else if row.data_type != "PL/SQL RECORD" && key == 0 {
                    // raise only for the default/only overload; an
                    // unused overload's unsupported shape should not
                    // block callers of the other overloads
                    return Err(PlcallError::unsupported_type(
                        type_ref.sql_type_name(),
                        "parameter type definition inside package is not supported, \
                         use CREATE TYPE outside package",
                    ));
                }
            }
        }

        let accum = accums.entry(key).or_default();
        let meta = metadata_from_row(&row);
        let idx = accum.nodes.len();
        let composite = meta.is_composite();
        let package_collection = meta
            .type_ref
            .as_ref()
            .is_some_and(TypeRef::in_package)
            && is_collection_type(&row.data_type);
        accum.nodes.push(Node {
            meta,
            fields: Vec::new(),
            element: None,
        });

        if package_collection {
            accum.temp_queue.push(QueuedTempTable {
                position: row.position.unwrap_or(0),
                discriminator: row.subprogram_id.unwrap_or(key as i64),
                node: idx,
            });
        }

        if composite {
            accum.last_at_level.insert(row.data_level, idx);
        }

        if row.argument_name.is_none() && row.data_level == 0 && row.direction == Direction::Out {
            // the function's own return slot
            accum.return_slot = Some(idx);
        } else if row.data_level == 0 {
            // the catalog sometimes reports an empty IN argument row
            // for routines without arguments; those have no name
            if let Some(name) = &row.argument_name {
                accum.top_level.push((name.to_lowercase(), idx));
            }
        } else {
            let parent = *accum
                .last_at_level
                .get(&(row.data_level - 1))
                .ok_or_else(|| {
                    PlcallError::MetadataDefect(format!(
                        "argument row at level {} has no recorded parent at level {}",
                        row.data_level,
                        row.data_level - 1
                    ))
                })?;
            match &accum.nodes[parent].meta.composite {
                Composite::Record(_) => {
                    let name = row.argument_name.as_ref().ok_or_else(|| {
                        PlcallError::MetadataDefect(
                            "record field row without an argument name".into(),
                        )
                    })?;
                    let name = name.to_lowercase();
                    accum.nodes[parent].fields.push((name, idx));
                }
                Composite::Collection(_) | Composite::RefCursor(_) => {
                    accum.nodes[parent].element = Some(idx);
                }
                Composite::Scalar => {
                    return Err(PlcallError::MetadataDefect(format!(
                        "argument row at level {} attached to a scalar parent",
                        row.data_level
                    )));
                }
            }
        }
    }

    // a routine without arguments still gets a default empty overload
    if accums.is_empty() {
        accums.insert(0, OverloadAccum::default());
    }

    let forest = accums
        .into_iter()
        .map(|(key, accum)| (key, accum.into_metadata()))
        .collect();
    Ok((forest, overloaded))
}

struct Node {
    meta: ArgumentMetadata,
    fields: Vec<(String, usize)>,
    element: Option<usize>,
}

struct QueuedTempTable {
    position: i32,
    discriminator: i64,
    node: usize,
}

#[derive(Default)]
struct OverloadAccum {
    nodes: Vec<Node>,
    top_level: Vec<(String, usize)>,
    return_slot: Option<usize>,
    /// last composite row seen at each nesting level
    last_at_level: HashMap<i32, usize>,
    temp_queue: Vec<QueuedTempTable>,
}

impl OverloadAccum {
    fn into_metadata(self) -> OverloadMetadata {
        let arguments = self
            .top_level
            .iter()
            .map(|(name, idx)| (name.clone(), materialize(&self.nodes, *idx)))
            .collect();
        let return_value = self.return_slot.map(|idx| materialize(&self.nodes, idx));
        let temp_tables = self
            .temp_queue
            .iter()
            .map(|queued| TempTableSpec {
                position: queued.position,
                discriminator: queued.discriminator,
                collection: materialize(&self.nodes, queued.node),
            })
            .collect();
        OverloadMetadata {
            arguments,
            return_value,
            temp_tables,
        }
    }
}

fn materialize(nodes: &[Node], idx: usize) -> ArgumentMetadata {
    let node = &nodes[idx];
    let mut meta = node.meta.clone();
    meta.composite = match &node.meta.composite {
        Composite::Scalar => Composite::Scalar,
        Composite::Record(_) => Composite::Record(
            node.fields
                .iter()
                .map(|(name, child)| (name.clone(), materialize(nodes, *child)))
                .collect(),
        ),
        Composite::Collection(_) => Composite::Collection(
            node.element.map(|child| Box::new(materialize(nodes, child))),
        ),
        Composite::RefCursor(_) => Composite::RefCursor(
            node.element.map(|child| Box::new(materialize(nodes, child))),
        ),
    };
    meta
}

fn type_ref_of(row: &CatalogRow) -> Option<TypeRef> {
    match (&row.type_owner, &row.type_name) {
        (Some(owner), Some(name)) => Some(TypeRef {
            owner: owner.clone(),
            name: name.clone(),
            subname: row.type_subname.clone(),
        }),
        _ => None,
    }
}

fn metadata_from_row(row: &CatalogRow) -> ArgumentMetadata {
    let composite = match row.data_type.as_str() {
        "PL/SQL RECORD" => Composite::Record(IndexMap::new()),
        "REF CURSOR" => Composite::RefCursor(None),
        collection if is_collection_type(collection) => Composite::Collection(None),
        _ => Composite::Scalar,
    };
    ArgumentMetadata {
        position: row.position,
        data_type: row.data_type.clone(),
        direction: row.direction,
        data_length: row.data_length,
        data_precision: row.data_precision,
        data_scale: row.data_scale,
        char_used: row.char_used.clone(),
        char_length: row.char_length,
        type_ref: type_ref_of(row),
        composite,
    }
}

#[cfg(test)]
mod tests;
