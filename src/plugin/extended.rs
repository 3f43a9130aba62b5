//! Composite types.
//!
//! An [`Extended`] combines every frontier member of a root into one type.
//! It defines nothing of its own: members resolve through its linearization,
//! so the most derived plugin branches win.

use crate::core::{Result, Timestamp, TypeId};
use crate::plugin::descriptor::TypeHandle;
use crate::plugin::interface;
use serde_json::Value;
use std::sync::Arc;

/// The composite of a root's frontier.
#[derive(Debug)]
pub struct Extended {
    handle: TypeHandle,
    chain: Arc<[TypeHandle]>,
    built_at: Timestamp,
}

impl Extended {
    pub(crate) fn new(handle: TypeHandle, built_at: Timestamp) -> Self {
        let chain = handle.mro().into();
        Self {
            handle,
            chain,
            built_at,
        }
    }

    /// Composite name, `<Root><suffix>`.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Type handle of the composite. Usable as a base for further subclassing.
    pub fn handle(&self) -> &TypeHandle {
        &self.handle
    }

    /// Direct supertypes: the frontier at synthesis time.
    pub fn bases(&self) -> &[TypeHandle] {
        self.handle.bases()
    }

    /// Full linearization, starting with the composite itself.
    pub fn mro(&self) -> &[TypeHandle] {
        &self.chain
    }

    pub fn root_id(&self) -> TypeId {
        self.handle.root_id()
    }

    /// When the composite was synthesized.
    pub fn built_at(&self) -> Timestamp {
        self.built_at
    }

    /// Whether `ty` is part of this composite's ancestry.
    pub fn includes(&self, ty: &TypeHandle) -> bool {
        self.chain.contains(ty)
    }

    /// Type whose implementation of `method` wins.
    pub fn resolve(&self, method: &str) -> Option<&TypeHandle> {
        self.chain.iter().find(|ty| ty.defines(method))
    }

    /// Every type implementing `method`, in resolution order.
    pub fn implementers(&self, method: &str) -> Vec<&TypeHandle> {
        self.chain.iter().filter(|ty| ty.defines(method)).collect()
    }

    /// Attribute resolved through the linearization.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.handle.attribute(key)
    }

    /// Invoke the winning implementation of `method`.
    pub fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        interface::dispatch(&self.chain, method, args)
    }

    /// Invoke every implementation of `method` and collect the results.
    pub fn collect(&self, method: &str, args: &Value) -> Result<Vec<Value>> {
        interface::collect(&self.chain, method, args)
    }
}
