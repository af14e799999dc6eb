//! The [`ObjectManager`] registry.

use std::collections::BTreeMap;

use carta_types::{ClassName, ObjectHandle, ObjectId, ObjectPath, SnapshotKind};

use crate::arena::Arena;
use crate::command::{CommandAddress, CREATE_OBJECT, DESTROY_OBJECT};
use crate::config::ManagerConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::factory::ClassRegistryEntry;
use crate::object::{CartaObject, ObjectCore};
use crate::snapshot::{ObjectSnapshot, RestoreReport, Snapshot};

/// A live object together with the identity it was registered under.
pub struct ObjectRegistryEntry {
    class_name: ClassName,
    id: ObjectId,
    path: ObjectPath,
    object: Box<dyn CartaObject>,
}

impl ObjectRegistryEntry {
    pub fn class_name(&self) -> &ClassName {
        &self.class_name
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    pub fn object(&self) -> &dyn CartaObject {
        self.object.as_ref()
    }
}

impl std::fmt::Debug for ObjectRegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistryEntry")
            .field("class_name", &self.class_name)
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Registry of object classes and live objects.
///
/// The manager is an ordinary owned value: create one per session and pass
/// it to whatever needs to create or address objects. All mutation goes
/// through `&mut self`, so no locking happens inside.
///
/// Objects are stored in a generation-checked [`Arena`]; IDs map to arena
/// handles. IDs come from a counter that only moves forward, so an ID is
/// never reissued after its object is destroyed.
pub struct ObjectManager {
    config: ManagerConfig,
    root_path: ObjectPath,
    classes: BTreeMap<ClassName, ClassRegistryEntry>,
    objects: Arena<ObjectRegistryEntry>,
    index: BTreeMap<ObjectId, ObjectHandle>,
    next_id: ObjectId,
}

impl ObjectManager {
    /// Create an empty registry. Fails if the configured root is not a valid
    /// path segment.
    pub fn new(config: ManagerConfig) -> RegistryResult<Self> {
        let root_path = ObjectPath::root(&config.root)?;
        Ok(Self {
            config,
            root_path,
            classes: BTreeMap::new(),
            objects: Arena::new(),
            index: BTreeMap::new(),
            next_id: ObjectId::new(1),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Name of the root segment (e.g. `CartaObjects`).
    pub fn root(&self) -> &str {
        &self.config.root
    }

    /// Path every top-level object lives under (e.g. `/CartaObjects`).
    pub fn root_path(&self) -> &ObjectPath {
        &self.root_path
    }

    // ---- Classes ----

    /// Register a factory under `class_name`.
    ///
    /// Returns `false`, leaving the existing registration in place, if the
    /// name is already taken.
    pub fn register_class<F>(&mut self, class_name: ClassName, factory: F) -> bool
    where
        F: Fn(ObjectCore) -> RegistryResult<Box<dyn CartaObject>> + Send + Sync + 'static,
    {
        if self.classes.contains_key(&class_name) {
            tracing::debug!(class = %class_name, "class already registered");
            return false;
        }
        tracing::debug!(class = %class_name, "registered class");
        self.classes.insert(
            class_name.clone(),
            ClassRegistryEntry::new(class_name, Box::new(factory)),
        );
        true
    }

    pub fn is_registered(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }

    /// Registered class names in sorted order.
    pub fn class_names(&self) -> impl Iterator<Item = &ClassName> {
        self.classes.keys()
    }

    // ---- Lifecycle ----

    /// Create a top-level object of a registered class and return its ID.
    pub fn create_object(&mut self, class_name: &str) -> RegistryResult<ObjectId> {
        let parent = self.root_path.clone();
        self.create_under(class_name, parent)
    }

    /// Create an object whose path lies underneath `parent`'s path.
    pub fn create_child(&mut self, parent: ObjectId, class_name: &str) -> RegistryResult<ObjectId> {
        let parent_path = self
            .entry(parent)
            .map(|e| e.path.clone())
            .ok_or_else(|| RegistryError::ParentNotFound {
                id: parent.to_string(),
            })?;
        self.create_under(class_name, parent_path)
    }

    fn create_under(&mut self, class_name: &str, parent: ObjectPath) -> RegistryResult<ObjectId> {
        let class = self
            .classes
            .get(class_name)
            .ok_or_else(|| RegistryError::ClassNotRegistered {
                class_name: class_name.to_string(),
            })?;

        if let Some(limit) = self.config.max_objects {
            if self.objects.len() >= limit {
                return Err(RegistryError::CapacityExceeded { limit });
            }
        }

        let id = self.next_id;
        let path = parent.join(&id.to_string())?;
        let core = ObjectCore::new(class.class_name().clone(), id, path.clone());
        let object = class.create(core)?;
        let class_name = class.class_name().clone();

        self.next_id = id.next();
        let handle = self.objects.insert(ObjectRegistryEntry {
            class_name: class_name.clone(),
            id,
            path: path.clone(),
            object,
        });
        self.index.insert(id, handle);

        tracing::debug!(class = %class_name, %id, %path, "created object");
        Ok(id)
    }

    /// Destroy a live object, dropping it.
    pub fn destroy_object(&mut self, id: ObjectId) -> RegistryResult<()> {
        let handle = self
            .index
            .remove(&id)
            .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
        let entry = self
            .objects
            .remove(handle)
            .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
        tracing::debug!(class = %entry.class_name, %id, "destroyed object");
        Ok(())
    }

    /// Return the ID of the oldest live object of `class_name`, creating one
    /// if there is none.
    pub fn find_singleton(&mut self, class_name: &str) -> RegistryResult<ObjectId> {
        let existing = self
            .entries()
            .find(|e| e.class_name.as_str() == class_name)
            .map(|e| e.id);
        match existing {
            Some(id) => Ok(id),
            None => self.create_object(class_name),
        }
    }

    // ---- Lookup ----

    /// Parse textual ID and check that it names a live object.
    pub fn resolve(&self, id: &str) -> RegistryResult<ObjectId> {
        id.parse::<ObjectId>()
            .ok()
            .filter(|id| self.index.contains_key(id))
            .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&dyn CartaObject> {
        let entry = self.entry(id)?;
        Some(entry.object.as_ref())
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut dyn CartaObject> {
        let handle = *self.index.get(&id)?;
        let entry = self.objects.get_mut(handle)?;
        Some(entry.object.as_mut())
    }

    /// Typed access to a live object.
    pub fn get_as<T: CartaObject>(&self, id: ObjectId) -> Option<&T> {
        self.get_object(id)?.as_any().downcast_ref::<T>()
    }

    pub fn get_as_mut<T: CartaObject>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.get_object_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    /// The arena handle of a live object.
    pub fn handle(&self, id: ObjectId) -> Option<ObjectHandle> {
        self.index.get(&id).copied()
    }

    /// Resolve a handle. Handles of destroyed objects never resolve.
    pub fn get_by_handle(&self, handle: ObjectHandle) -> Option<&dyn CartaObject> {
        let entry = self.objects.get(handle)?;
        Some(entry.object.as_ref())
    }

    pub fn entry(&self, id: ObjectId) -> Option<&ObjectRegistryEntry> {
        let handle = self.index.get(&id)?;
        self.objects.get(*handle)
    }

    /// Live objects in creation order.
    pub fn entries(&self) -> impl Iterator<Item = &ObjectRegistryEntry> {
        self.index.values().filter_map(|h| self.objects.get(*h))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // ---- Commands ----

    /// Route one command and return its reply text.
    ///
    /// [`CREATE_OBJECT`] takes a class name and replies with the new ID;
    /// [`DESTROY_OBJECT`] takes an ID and replies with an empty string. Any
    /// other command must be a `<ClassName>:<id>.<command>` address.
    pub fn dispatch(
        &mut self,
        command: &str,
        parameters: &str,
        session_id: &str,
    ) -> RegistryResult<String> {
        match command {
            CREATE_OBJECT => self.create_object(parameters.trim()).map(|id| id.to_string()),
            DESTROY_OBJECT => {
                let id = self.resolve(parameters.trim())?;
                self.destroy_object(id)?;
                Ok(String::new())
            }
            _ => {
                let address = CommandAddress::parse(command)?;
                let id = self.resolve(&address.id)?;
                let object = self
                    .get_object_mut(id)
                    .ok_or_else(|| RegistryError::ObjectNotFound { id: id.to_string() })?;
                if object.class_name().as_str() != address.class_name {
                    return Err(RegistryError::ClassMismatch {
                        expected: address.class_name,
                        actual: object.class_name().to_string(),
                    });
                }
                let bare = object.remove_id(command);
                tracing::trace!(%id, command = %bare, session = session_id, "dispatching");
                object.handle_command(&bare, parameters, session_id)
            }
        }
    }

    // ---- Snapshots ----

    /// Capture every live object's contribution to a `kind` snapshot.
    pub fn snapshot(&self, kind: SnapshotKind) -> RegistryResult<Snapshot> {
        let mut objects = Vec::new();
        for entry in self.entries() {
            let text = entry.object.state_string(kind);
            if text.is_empty() {
                continue;
            }
            objects.push(ObjectSnapshot {
                id: entry.id,
                class_name: entry.class_name.clone(),
                path: entry.path.clone(),
                state: serde_json::from_str(&text)?,
            });
        }
        Ok(Snapshot::new(kind, objects))
    }

    /// Reset live objects from a snapshot.
    ///
    /// Entries whose ID is gone, now belongs to a different class, or whose
    /// state the object refuses are skipped and reported, not treated as
    /// errors. Every other entry is still applied.
    pub fn restore(&mut self, snapshot: &Snapshot) -> RegistryResult<RestoreReport> {
        let mut report = RestoreReport::default();
        for saved in &snapshot.objects {
            let Some(object) = self.get_object_mut(saved.id) else {
                tracing::warn!(id = %saved.id, "snapshot object no longer exists");
                report.skipped.push(saved.id);
                continue;
            };
            if *object.class_name() != saved.class_name {
                tracing::warn!(
                    id = %saved.id,
                    expected = %saved.class_name,
                    actual = %object.class_name(),
                    "snapshot class does not match live object"
                );
                report.skipped.push(saved.id);
                continue;
            }
            if let Err(e) = object.reset_state(&saved.state.to_string()) {
                tracing::warn!(id = %saved.id, error = %e, "snapshot state rejected");
                report.skipped.push(saved.id);
                continue;
            }
            report.restored.push(saved.id);
        }
        tracing::debug!(
            restored = report.restored.len(),
            skipped = report.skipped.len(),
            "restored snapshot"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectManager")
            .field("root", &self.root_path)
            .field("classes", &self.classes.len())
            .field("objects", &self.objects.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
