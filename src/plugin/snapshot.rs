//! Serializable view of a registry.

use crate::core::{Result, Timestamp, TypeId};
use crate::plugin::descriptor::{TypeHandle, TypeKind};
use serde::{Deserialize, Serialize};

/// One declared type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeSummary {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub root: TypeId,
    pub bases: Vec<TypeId>,
    pub registered_at: Timestamp,
}

impl From<&TypeHandle> for TypeSummary {
    fn from(ty: &TypeHandle) -> Self {
        Self {
            id: ty.id(),
            name: ty.name().to_string(),
            kind: ty.kind(),
            root: ty.root_id(),
            bases: ty.bases().iter().map(TypeHandle::id).collect(),
            registered_at: ty.registered_at(),
        }
    }
}

/// Bookkeeping of one root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSummary {
    pub id: TypeId,
    pub name: String,
    /// Frontier member names, sorted
    pub frontier: Vec<String>,
    pub cache_valid: bool,
    /// Cached composite, if valid
    pub extended: Option<TypeId>,
}

/// Point-in-time view of every type and root.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    pub types: Vec<TypeSummary>,
    pub roots: Vec<RootSummary>,
}

impl RegistrySnapshot {
    /// Look up a root by name.
    pub fn root(&self, name: &str) -> Option<&RootSummary> {
        self.roots.iter().find(|r| r.name == name)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
