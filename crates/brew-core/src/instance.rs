//! Class instances and the native state slot
//!
//! Every instance carries one opaque slot for host-side data that ordinary
//! fields cannot hold (a random generator, an output sink). The slot starts
//! empty and is filled exactly once, by a native constructor. Readers go
//! through [`ClassInstance::native_state`], which reports an empty slot as a
//! null reference and a slot of the wrong type as a bridge violation.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::class::Class;
use crate::error::{BridgeViolation, NativeError, NativeResult};
use crate::value::Value;

/// Marker for types that may live in an instance's native state slot
///
/// Implementations must handle their own interior mutability: the slot hands
/// out shared references only, and several threads may hold the same
/// instance. Any mutable part must sit behind a lock owned by the state.
pub trait NativeState: Any + Send + Sync {}

struct NativeSlot {
    state: Box<dyn Any + Send + Sync>,
    kind: &'static str,
}

/// Object instance (heap-allocated)
pub struct ClassInstance {
    /// Class of this instance
    class: Arc<Class>,
    /// Instance field values, indexed by field storage index
    fields: RwLock<Vec<Value>>,
    /// Host-side state, empty until a constructor runs
    native: OnceCell<NativeSlot>,
}

impl ClassInstance {
    /// Create a new instance with default field values and no native state
    pub fn new(class: &Arc<Class>) -> Self {
        let fields = class
            .instance_field_types()
            .iter()
            .map(|ty| ty.default_value())
            .collect();
        Self {
            class: Arc::clone(class),
            fields: RwLock::new(fields),
            native: OnceCell::new(),
        }
    }

    /// Create a new instance whose native state is already populated
    ///
    /// For instances the runtime wires itself (such as a console stream
    /// stored in a static field) rather than through a guest constructor.
    pub fn with_native_state<T: NativeState>(class: &Arc<Class>, state: T) -> Self {
        let instance = Self::new(class);
        let slot = NativeSlot {
            state: Box::new(state),
            kind: type_name::<T>(),
        };
        // A fresh cell is always empty, so this cannot fail.
        let _ = instance.native.set(slot);
        instance
    }

    /// Class of this instance
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Whether this is an instance of the class named `class_name`
    pub fn is_instance_of(&self, class_name: &str) -> bool {
        self.class.name() == class_name
    }

    /// Get an instance field value by name
    pub fn field(&self, name: &str) -> Option<Value> {
        let info = self.class.field(name).filter(|f| !f.access.is_static())?;
        self.fields.read().get(info.index).cloned()
    }

    /// Set an instance field value by name
    pub fn set_field(&self, name: &str, value: Value) -> Result<(), String> {
        let info = self
            .class
            .field(name)
            .filter(|f| !f.access.is_static())
            .ok_or_else(|| format!("No instance field '{}' in {}", name, self.class.name()))?;
        let mut fields = self.fields.write();
        match fields.get_mut(info.index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!(
                "Field index {} out of bounds (object has {} fields)",
                info.index,
                fields.len()
            )),
        }
    }

    /// Whether a constructor has populated the native state slot
    pub fn has_native_state(&self) -> bool {
        self.native.get().is_some()
    }

    /// Fill the native state slot
    ///
    /// # Errors
    ///
    /// `BridgeViolation::AlreadyInitialized` if the slot is already filled;
    /// the existing state is left untouched.
    pub fn init_native_state<T: NativeState>(&self, state: T) -> NativeResult<()> {
        let slot = NativeSlot {
            state: Box::new(state),
            kind: type_name::<T>(),
        };
        self.native.set(slot).map_err(|_| {
            NativeError::from(BridgeViolation::AlreadyInitialized(
                self.class.name().to_string(),
            ))
        })
    }

    /// Borrow the native state as `T`
    ///
    /// # Errors
    ///
    /// - `GuestException::NullReference` if no constructor has run
    /// - `BridgeViolation::WrongNativeState` if the slot holds another type
    pub fn native_state<T: NativeState>(&self) -> NativeResult<&T> {
        let slot = self.native.get().ok_or_else(|| {
            NativeError::null_reference(format!(
                "{} instance used before its constructor ran",
                self.class.name()
            ))
        })?;
        slot.state.downcast_ref::<T>().ok_or_else(|| {
            BridgeViolation::WrongNativeState {
                class: self.class.name().to_string(),
                expected: type_name::<T>(),
                found: slot.kind,
            }
            .into()
        })
    }
}

impl fmt::Debug for ClassInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInstance")
            .field("class", &self.class.name())
            .field("fields", &*self.fields.read())
            .field("native", &self.native.get().map(|slot| slot.kind))
            .finish()
    }
}
