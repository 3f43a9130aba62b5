//! Type declarations and handles.
//!
//! A [`TypeSpec`] describes a type about to be declared: its name, its
//! ordered direct supertypes, and its own attributes and behaviors. Once
//! declared, the type is immutable and reachable through a cheap,
//! clonable [`TypeHandle`].

use crate::core::{Result, Timestamp, TypeId};
use crate::plugin::interface::{self, Behavior, Call};
use crate::plugin::registry::RegistryInner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

/// Bookkeeping names owned by a root. Subtypes may not declare them.
pub const RESERVED_FIELDS: [&str; 3] = ["plugin_extensions", "plugin_root", "plugin_cache_valid"];

/// Kind of a declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Anchor of a plugin hierarchy
    Root,
    /// Subtype declared under a root
    Plugin,
    /// Synthesized composite of a root's frontier
    Composite,
}

/// Declaration of a new type.
#[derive(Clone, Default)]
pub struct TypeSpec {
    pub(crate) name: String,
    pub(crate) bases: Vec<TypeHandle>,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) methods: BTreeMap<String, Arc<dyn Behavior>>,
    /// Attribute values that failed to serialize; `declare` rejects the spec
    pub(crate) errors: Vec<String>,
}

impl TypeSpec {
    /// Start a declaration with no supertypes yet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Declaration of a new plugin root.
    pub fn root(name: &str) -> Self {
        Self::new(name)
    }

    /// Append a direct supertype.
    pub fn with_base(mut self, base: &TypeHandle) -> Self {
        self.bases.push(base.clone());
        self
    }

    /// Append several direct supertypes, in order.
    pub fn with_bases<'a>(mut self, bases: impl IntoIterator<Item = &'a TypeHandle>) -> Self {
        self.bases.extend(bases.into_iter().cloned());
        self
    }

    /// Add an attribute.
    ///
    /// A value that fails to serialize is recorded and makes the declaration
    /// fail with a serialization error.
    pub fn with_attribute(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => {
                self.attributes.insert(key.to_string(), v);
            }
            Err(e) => self.errors.push(format!("attribute {}: {}", key, e)),
        }
        self
    }

    /// Add a method implemented by a closure.
    pub fn with_method<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&Call, Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_behavior(name, Arc::new(f))
    }

    /// Add a method implemented by any [`Behavior`].
    pub fn with_behavior(mut self, name: &str, behavior: Arc<dyn Behavior>) -> Self {
        self.methods.insert(name.to_string(), behavior);
        self
    }

    /// Name being declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct supertypes, in declaration order.
    pub fn bases(&self) -> &[TypeHandle] {
        &self.bases
    }

    /// Reserved bookkeeping names this declaration tries to define.
    pub fn reserved_names(&self) -> Vec<&str> {
        RESERVED_FIELDS
            .iter()
            .copied()
            .filter(|name| self.attributes.contains_key(*name) || self.methods.contains_key(*name))
            .collect()
    }
}

impl std::fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeSpec")
            .field("name", &self.name)
            .field("bases", &self.bases)
            .field("attributes", &self.attributes)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .finish()
    }
}

/// A declared type.
pub struct TypeNode {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) root: TypeId,
    pub(crate) bases: Vec<TypeHandle>,
    /// Linearization without the type itself
    pub(crate) ancestors: Vec<TypeHandle>,
    pub(crate) attributes: BTreeMap<String, Value>,
    pub(crate) methods: BTreeMap<String, Arc<dyn Behavior>>,
    pub(crate) registered_at: Timestamp,
    pub(crate) registry: Weak<RegistryInner>,
}

/// Shared handle to a declared type. Equality is identity.
#[derive(Clone)]
pub struct TypeHandle(pub(crate) Arc<TypeNode>);

impl TypeHandle {
    pub(crate) fn new(node: TypeNode) -> Self {
        Self(Arc::new(node))
    }

    /// Type id.
    pub fn id(&self) -> TypeId {
        self.0.id
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Kind of type.
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn is_root(&self) -> bool {
        self.0.kind == TypeKind::Root
    }

    /// Id of the root this type belongs to.
    pub fn root_id(&self) -> TypeId {
        self.0.root
    }

    /// Direct supertypes, in declaration order.
    pub fn bases(&self) -> &[TypeHandle] {
        &self.0.bases
    }

    /// Full linearization, starting with this type.
    pub fn mro(&self) -> Vec<TypeHandle> {
        std::iter::once(self.clone())
            .chain(self.0.ancestors.iter().cloned())
            .collect()
    }

    /// Whether `other` is this type or one of its ancestors.
    pub fn is_subtype_of(&self, other: &TypeHandle) -> bool {
        self == other || self.0.ancestors.iter().any(|a| a == other)
    }

    /// Attribute declared on this type itself.
    pub fn own_attribute(&self, key: &str) -> Option<&Value> {
        self.0.attributes.get(key)
    }

    /// Attribute resolved through the linearization.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.own_attribute(key).or_else(|| {
            self.0
                .ancestors
                .iter()
                .find_map(|ty| ty.0.attributes.get(key))
        })
    }

    /// Whether this type itself defines `method`.
    pub fn defines(&self, method: &str) -> bool {
        self.0.methods.contains_key(method)
    }

    /// Names of the methods this type itself defines.
    pub fn method_names(&self) -> Vec<&str> {
        self.0.methods.keys().map(String::as_str).collect()
    }

    pub(crate) fn method(&self, method: &str) -> Option<&Arc<dyn Behavior>> {
        self.0.methods.get(method)
    }

    /// Invoke `method` through this type's linearization.
    pub fn invoke(&self, method: &str, args: Value) -> Result<Value> {
        let chain: Arc<[TypeHandle]> = self.mro().into();
        interface::dispatch(&chain, method, args)
    }

    /// When the type was declared.
    pub fn registered_at(&self) -> Timestamp {
        self.0.registered_at
    }

    pub(crate) fn belongs_to(&self, registry: &Arc<RegistryInner>) -> bool {
        std::ptr::eq(self.0.registry.as_ptr(), Arc::as_ptr(registry))
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for TypeHandle {}

impl std::hash::Hash for TypeHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl std::fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.0.name, self.0.id)
    }
}

impl std::fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name)
    }
}
