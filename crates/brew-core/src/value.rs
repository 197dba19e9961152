//! Guest value representation
//!
//! Primitive values live inline in [`Value`]. Everything else is a
//! [`Reference`] to a shared heap object: either an instance of some class
//! or a guest string. `boolean`, `byte`, `char` and `short` occupy an `Int`
//! slot on the operand stack, as they do in class-file bytecode.

use std::fmt;
use std::sync::Arc;

use crate::class::Class;
use crate::instance::{ClassInstance, NativeState};

/// Internal name of the guest string class
pub const STRING_CLASS: &str = "java/lang/String";

/// A single operand stack slot or field value
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// `int` (also boolean, byte, char, short)
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Non-null reference
    Ref(Reference),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Extract int value
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract long value
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Extract reference
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Ref(_) => "reference",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "int({})", i),
            Value::Long(l) => write!(f, "long({})", l),
            Value::Float(x) => write!(f, "float({})", x),
            Value::Double(x) => write!(f, "double({})", x),
            Value::Ref(r) => write!(f, "{:?}", r),
        }
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Ref(r)
    }
}

/// Heap object kinds a reference can point at
#[derive(Debug)]
pub enum HeapObject {
    /// Instance of a class
    Instance(ClassInstance),
    /// Guest string
    String(GuestString),
}

/// Shared handle to a heap object
///
/// Cloning a reference aliases the same object; equality is identity.
#[derive(Clone)]
pub struct Reference(Arc<HeapObject>);

impl Reference {
    /// Allocate a fresh instance of `class`
    ///
    /// Instance fields hold their type's default value and the native state
    /// slot is empty until a constructor fills it.
    pub fn new_instance(class: &Arc<Class>) -> Self {
        Reference(Arc::new(HeapObject::Instance(ClassInstance::new(class))))
    }

    /// Allocate an instance of `class` with its native state already set
    pub fn new_instance_with<T: NativeState>(class: &Arc<Class>, state: T) -> Self {
        Reference(Arc::new(HeapObject::Instance(ClassInstance::with_native_state(
            class, state,
        ))))
    }

    /// Allocate a guest string
    pub fn new_string(value: impl Into<String>) -> Self {
        Reference(Arc::new(HeapObject::String(GuestString::new(value))))
    }

    /// Borrow the heap object
    pub fn object(&self) -> &HeapObject {
        &self.0
    }

    /// The instance behind this reference, if it is one
    pub fn as_instance(&self) -> Option<&ClassInstance> {
        match &*self.0 {
            HeapObject::Instance(instance) => Some(instance),
            HeapObject::String(_) => None,
        }
    }

    /// The string behind this reference, if it is one
    pub fn as_string(&self) -> Option<&GuestString> {
        match &*self.0 {
            HeapObject::String(s) => Some(s),
            HeapObject::Instance(_) => None,
        }
    }

    /// Internal name of the referenced object's class
    pub fn class_name(&self) -> &str {
        match &*self.0 {
            HeapObject::Instance(instance) => instance.class().name(),
            HeapObject::String(_) => STRING_CLASS,
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Reference) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Reference {}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.class_name(), Arc::as_ptr(&self.0))
    }
}

/// Immutable guest string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestString {
    value: String,
}

impl GuestString {
    /// Create from host text
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Contents as host text
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Length in UTF-16 code units, as the guest sees it
    pub fn guest_len(&self) -> usize {
        self.value.encode_utf16().count()
    }
}

impl fmt::Display for GuestString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_identity() {
        let a = Reference::new_string("x");
        let b = Reference::new_string("x");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(Value::Ref(a.clone()), Value::from(a));
    }

    #[test]
    fn test_string_reference() {
        let s = Reference::new_string("héllo");
        assert_eq!(s.class_name(), STRING_CLASS);
        assert_eq!(s.as_string().unwrap().as_str(), "héllo");
        assert_eq!(s.as_string().unwrap().guest_len(), 5);
        assert!(s.as_instance().is_none());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(5).as_int(), Some(5));
        assert_eq!(Value::Long(5).as_int(), None);
        assert_eq!(Value::Long(9).as_long(), Some(9));
        assert!(Value::default().is_null());
        assert_eq!(Value::Double(1.0).type_name(), "double");
    }
}
