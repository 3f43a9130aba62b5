//! Plugin registry and composer.
//!
//! Tracks, per root, the frontier of most-derived plugin types and builds
//! the cached composite of that frontier on demand.

use crate::core::{now, Error, Result, TypeId};
use crate::plugin::config::RegistryConfig;
use crate::plugin::descriptor::{TypeHandle, TypeKind, TypeNode, TypeSpec};
use crate::plugin::extended::Extended;
use crate::plugin::linearize;
use crate::plugin::snapshot::{RegistrySnapshot, RootSummary, TypeSummary};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Per-root bookkeeping.
struct RootState {
    /// Root name
    name: String,
    /// Most-derived known types under the root
    frontier: BTreeSet<TypeId>,
    /// Composite of the current frontier; `None` while invalid
    cached: Option<Arc<Extended>>,
}

impl RootState {
    fn new(root: &TypeHandle) -> Self {
        Self {
            name: root.name().to_string(),
            frontier: BTreeSet::from([root.id()]),
            cached: None,
        }
    }

    fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            debug!(root = %self.name, "composite cache invalidated");
        }
    }
}

pub(crate) struct RegistryInner {
    config: RegistryConfig,
    /// Next id for declared types and composites
    next_id: AtomicU64,
    /// Every declared type. Composites live only in their root's cache.
    types: RwLock<BTreeMap<TypeId, TypeHandle>>,
    /// Lock order: a root's mutex before `types`.
    roots: RwLock<HashMap<TypeId, Arc<Mutex<RootState>>>>,
}

/// Plugin registry.
///
/// Cheap to clone; clones share the same hierarchy.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

impl Registry {
    /// Create an empty registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                config,
                next_id: AtomicU64::new(0),
                types: RwLock::new(BTreeMap::new()),
                roots: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static Registry {
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Declare a new type.
    ///
    /// A declaration without bases declares a new root. Otherwise the type joins the
    /// root found first in its linearization, replaces its direct bases in
    /// that root's frontier and invalidates the root's composite.
    pub fn declare(&self, spec: TypeSpec) -> Result<TypeHandle> {
        self.validate(&spec)?;
        if spec.bases.is_empty() {
            return self.declare_root(spec);
        }

        let ancestors = linearize::c3(&spec.bases)?;
        let root = ancestors
            .iter()
            .find(|ty| ty.is_root())
            .cloned()
            .ok_or_else(|| Error::Internal(format!("no root above {}", spec.name)))?;

        let reserved = spec.reserved_names();
        if !reserved.is_empty() {
            return Err(Error::Configuration(format!(
                "{} cannot declare {}: owned by root {}",
                spec.name,
                reserved.join(", "),
                root.name()
            )));
        }

        let slot = self.root_state(root.id())?;
        let mut state = slot.lock()?;

        let handle = self.insert(|id| TypeNode {
            id,
            name: spec.name.clone(),
            kind: TypeKind::Plugin,
            root: root.id(),
            bases: spec.bases.clone(),
            ancestors,
            attributes: spec.attributes,
            methods: spec.methods,
            registered_at: now(),
            registry: Arc::downgrade(&self.inner),
        })?;

        for base in &spec.bases {
            state.frontier.remove(&base.id());
            // A composite stands for the frontier it was built from.
            if base.kind() == TypeKind::Composite {
                for member in base.bases() {
                    state.frontier.remove(&member.id());
                }
            }
        }
        state.frontier.insert(handle.id());
        state.invalidate();

        debug!(
            ty = %handle.name(),
            id = %handle.id(),
            root = %root.name(),
            frontier = state.frontier.len(),
            "plugin type declared"
        );
        Ok(handle)
    }

    fn declare_root(&self, spec: TypeSpec) -> Result<TypeHandle> {
        let handle = self.insert(|id| TypeNode {
            id,
            name: spec.name.clone(),
            kind: TypeKind::Root,
            root: id,
            bases: Vec::new(),
            ancestors: Vec::new(),
            attributes: spec.attributes,
            methods: spec.methods,
            registered_at: now(),
            registry: Arc::downgrade(&self.inner),
        })?;

        let state = RootState::new(&handle);
        self.inner
            .roots
            .write()?
            .insert(handle.id(), Arc::new(Mutex::new(state)));

        info!(root = %handle.name(), id = %handle.id(), "plugin root declared");
        Ok(handle)
    }

    /// Composite of the frontier of `ty`'s root.
    ///
    /// Returns the cached composite while no declaration has happened since
    /// it was built; callers may rely on `Arc::ptr_eq` identity.
    pub fn get_extended(&self, ty: &TypeHandle) -> Result<Arc<Extended>> {
        self.check_owned(ty)?;
        let slot = self.root_state(ty.root_id())?;
        let mut state = slot.lock()?;

        if let Some(extended) = &state.cached {
            debug!(root = %state.name, "composite cache hit");
            return Ok(Arc::clone(extended));
        }

        let bases = self.frontier_handles(&state.frontier)?;
        let ancestors = linearize::linearize(&bases, self.inner.config.linearization)?;
        let name = self.inner.config.extended_name(&state.name);
        let built_at = now();

        let handle = TypeHandle::new(TypeNode {
            id: self.allocate_id(),
            name,
            kind: TypeKind::Composite,
            root: ty.root_id(),
            bases: bases.clone(),
            ancestors,
            attributes: Default::default(),
            methods: Default::default(),
            registered_at: built_at,
            registry: Arc::downgrade(&self.inner),
        });

        let extended = Arc::new(Extended::new(handle, built_at));
        state.cached = Some(Arc::clone(&extended));

        let members: Vec<&str> = bases.iter().map(TypeHandle::name).collect();
        info!(
            root = %state.name,
            composite = %extended.name(),
            bases = ?members,
            "composite synthesized"
        );
        Ok(extended)
    }

    /// Root of the hierarchy `ty` belongs to.
    pub fn root_of(&self, ty: &TypeHandle) -> Result<TypeHandle> {
        self.check_owned(ty)?;
        self.get(ty.root_id())
    }

    /// Type by id.
    pub fn get(&self, id: TypeId) -> Result<TypeHandle> {
        self.inner
            .types
            .read()?
            .get(&id)
            .cloned()
            .ok_or(Error::UnknownType(id))
    }

    /// Number of declared types. Composites are not counted.
    pub fn len(&self) -> usize {
        self.inner
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared types under `root`'s hierarchy, in declaration order.
    pub fn types_under(&self, root: &TypeHandle) -> Vec<TypeHandle> {
        self.inner
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|ty| ty.root_id() == root.root_id())
            .cloned()
            .collect()
    }

    /// Frontier of `ty`'s root, in composition order.
    pub fn frontier(&self, ty: &TypeHandle) -> Result<Vec<TypeHandle>> {
        self.check_owned(ty)?;
        let slot = self.root_state(ty.root_id())?;
        let state = slot.lock()?;
        self.frontier_handles(&state.frontier)
    }

    /// Frontier member names, sorted.
    pub fn frontier_names(&self, ty: &TypeHandle) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .frontier(ty)?
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Whether `ty`'s root currently holds a valid composite.
    pub fn is_cache_valid(&self, ty: &TypeHandle) -> Result<bool> {
        self.check_owned(ty)?;
        let slot = self.root_state(ty.root_id())?;
        let state = slot.lock()?;
        Ok(state.cached.is_some())
    }

    /// Drop `ty`'s root composite so the next request rebuilds it.
    pub fn invalidate(&self, ty: &TypeHandle) -> Result<()> {
        self.check_owned(ty)?;
        let slot = self.root_state(ty.root_id())?;
        slot.lock()?.invalidate();
        Ok(())
    }

    /// Rewrite the frontier of `ty`'s root by hand.
    ///
    /// `edit` works on a copy of the frontier and runs without any registry
    /// lock held, so it may read from the registry. Every member must be a
    /// declared type under the same root and the frontier may not end up
    /// empty. If the frontier changed while `edit` ran, the edit is rejected.
    /// On error the frontier is left untouched. A successful edit
    /// invalidates the composite.
    pub fn edit_extensions<F>(&self, ty: &TypeHandle, edit: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeSet<TypeId>),
    {
        self.check_owned(ty)?;
        let slot = self.root_state(ty.root_id())?;
        let original = slot.lock()?.frontier.clone();

        let mut frontier = original.clone();
        edit(&mut frontier);

        let mut state = slot.lock()?;
        if state.frontier != original {
            warn!(root = %state.name, "frontier changed during edit");
            return Err(Error::Configuration(format!(
                "frontier of {} changed during edit",
                state.name
            )));
        }
        if let Err(err) = self.validate_frontier(ty.root_id(), &frontier) {
            warn!(root = %state.name, error = %err, "frontier edit rejected");
            return Err(err);
        }

        state.frontier = frontier;
        state.invalidate();
        debug!(root = %state.name, frontier = state.frontier.len(), "frontier edited");
        Ok(())
    }

    /// Put `ty` back into its root's frontier.
    pub fn enable(&self, ty: &TypeHandle) -> Result<()> {
        let id = ty.id();
        self.edit_extensions(ty, |frontier| {
            frontier.insert(id);
        })
    }

    /// Take `ty` out of its root's frontier.
    pub fn disable(&self, ty: &TypeHandle) -> Result<()> {
        let id = ty.id();
        self.edit_extensions(ty, |frontier| {
            frontier.remove(&id);
        })
    }

    /// Serializable view of every type and root.
    pub fn snapshot(&self) -> Result<RegistrySnapshot> {
        let mut slots: Vec<(TypeId, Arc<Mutex<RootState>>)> = self
            .inner
            .roots
            .read()?
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();
        slots.sort_by_key(|(id, _)| *id);

        let mut roots = Vec::with_capacity(slots.len());
        for (id, slot) in slots {
            let state = slot.lock()?;
            let mut frontier: Vec<String> = self
                .frontier_handles(&state.frontier)?
                .iter()
                .map(|t| t.name().to_string())
                .collect();
            frontier.sort();
            roots.push(RootSummary {
                id,
                name: state.name.clone(),
                frontier,
                cache_valid: state.cached.is_some(),
                extended: state.cached.as_ref().map(|ext| ext.handle().id()),
            });
        }

        let types = self.inner.types.read()?.values().map(TypeSummary::from).collect();
        Ok(RegistrySnapshot { types, roots })
    }

    fn allocate_id(&self) -> TypeId {
        TypeId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, build: impl FnOnce(TypeId) -> TypeNode) -> Result<TypeHandle> {
        let mut types = self.inner.types.write()?;
        let handle = TypeHandle::new(build(self.allocate_id()));
        types.insert(handle.id(), handle.clone());
        Ok(handle)
    }

    fn root_state(&self, root: TypeId) -> Result<Arc<Mutex<RootState>>> {
        self.inner
            .roots
            .read()?
            .get(&root)
            .cloned()
            .ok_or(Error::UnknownType(root))
    }

    /// Frontier members, most recently declared first, so that any
    /// descendant precedes its ancestors.
    fn frontier_handles(&self, frontier: &BTreeSet<TypeId>) -> Result<Vec<TypeHandle>> {
        let types = self.inner.types.read()?;
        frontier
            .iter()
            .rev()
            .map(|id| types.get(id).cloned().ok_or(Error::UnknownType(*id)))
            .collect()
    }

    fn validate(&self, spec: &TypeSpec) -> Result<()> {
        if spec.name.trim().is_empty() {
            return Err(Error::Configuration("type name cannot be empty".to_string()));
        }
        if let Some(err) = spec.errors.first() {
            return Err(Error::SerializationError(format!("{}: {}", spec.name, err)));
        }

        let mut seen = HashSet::new();
        for base in &spec.bases {
            if !base.belongs_to(&self.inner) {
                return Err(Error::Configuration(format!(
                    "{}: base {} belongs to another registry",
                    spec.name,
                    base.name()
                )));
            }
            if !seen.insert(base.id()) {
                return Err(Error::Configuration(format!(
                    "{}: duplicate base {}",
                    spec.name,
                    base.name()
                )));
            }
        }
        Ok(())
    }

    fn validate_frontier(&self, root: TypeId, frontier: &BTreeSet<TypeId>) -> Result<()> {
        if frontier.is_empty() {
            return Err(Error::Configuration("frontier cannot be empty".to_string()));
        }

        let types = self.inner.types.read()?;
        for id in frontier {
            let ty = types.get(id).ok_or(Error::UnknownType(*id))?;
            if ty.root_id() != root {
                return Err(Error::Configuration(format!(
                    "{} does not belong to root {}",
                    ty.name(),
                    root
                )));
            }
        }
        Ok(())
    }

    fn check_owned(&self, ty: &TypeHandle) -> Result<()> {
        if ty.belongs_to(&self.inner) {
            Ok(())
        } else {
            Err(Error::Configuration(format!(
                "{} belongs to another registry",
                ty.name()
            )))
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.inner.config)
            .field("types", &self.len())
            .finish()
    }
}

impl TypeHandle {
    /// Composite of this type's root; see [`Registry::get_extended`].
    pub fn plugin_extended(&self) -> Result<Arc<Extended>> {
        let inner = self.0.registry.upgrade().ok_or(Error::RegistryDropped)?;
        Registry { inner }.get_extended(self)
    }
}
