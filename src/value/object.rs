use std::any::Any;
use std::fmt;
use std::ops::Deref;

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A mapped application object that can travel inside a [`Variant`](super::Variant).
///
/// Implemented for every `Send + Sync + Debug + 'static` type, so plain structs
/// can be stored without ceremony.
pub trait Object: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Send + Sync + fmt::Debug> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Exclusive owner of an object payload. Empty once the object was extracted.
/// Readers never block each other; only extraction takes the write lock.
pub(crate) struct ObjectSlot(RwLock<Option<Box<dyn Object>>>);

impl ObjectSlot {
    pub(crate) fn new(object: Box<dyn Object>) -> Self {
        Self(RwLock::new(Some(object)))
    }

    pub(crate) fn is_present(&self) -> bool {
        self.0.read_recursive().is_some()
    }

    pub(crate) fn borrow(&self) -> Option<ObjectRef<'_>> {
        RwLockReadGuard::try_map(self.0.read_recursive(), |slot| slot.as_deref())
            .ok()
            .map(ObjectRef)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Option<Box<dyn Object>>> {
        self.0.write()
    }
}

impl fmt::Debug for ObjectSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read_recursive() {
            Some(slot) => match slot.as_deref() {
                Some(object) => f.debug_tuple("Object").field(&object).finish(),
                None => f.write_str("Object(<extracted>)"),
            },
            None => f.write_str("Object(<locked>)"),
        }
    }
}

/// Non-owning view of an object payload.
///
/// Any number of views may be alive at once, on any thread and through any
/// variant sharing the storage. Extraction waits until every view is dropped,
/// so extracting on a thread that still holds its own `ObjectRef` to the same
/// storage blocks forever.
pub struct ObjectRef<'a>(MappedRwLockReadGuard<'a, dyn Object + 'static>);

impl ObjectRef<'_> {
    #[must_use]
    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        let object: &dyn Object = &*self.0;
        object.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Object>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl Deref for ObjectRef<'_> {
    type Target = dyn Object;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for ObjectRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let object: &dyn Object = &*self.0;
        f.debug_tuple("ObjectRef").field(&object).finish()
    }
}
