//! Class model and the builder for synthetic builtin classes
//!
//! A [`Class`] is the record the interpreter dispatches through, whether it
//! came from a class file or from [`ClassBuilder`]. Builtin classes are
//! assembled with the builder:
//!
//! ```ignore
//! let mut builder = ClassBuilder::new("java/util/Random");
//! builder.add_native_method("nextInt", AccessFlags::PUBLIC, vec![], TypeDescriptor::Int, next_int)?;
//! let class = builder.build();
//! ```
//!
//! Once built, a class is immutable apart from its static field values.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::access::AccessFlags;
use crate::descriptor::{MethodDescriptor, MethodKey, TypeDescriptor};
use crate::error::{BridgeViolation, BuildError, NativeResult};
use crate::thread::VmThread;
use crate::value::Value;

/// Native method entry point
///
/// Receives the calling thread and talks to the guest only through its
/// operand stack.
pub type NativeMethodFn = Arc<dyn Fn(&mut VmThread) -> NativeResult<()> + Send + Sync>;

/// Parsed class-file data backing a loaded class
///
/// Builtin classes have none; every reader must accept its absence.
pub trait ClassFile: Send + Sync + fmt::Debug {
    /// Source file or archive entry the class was read from
    fn source(&self) -> &str;
}

/// Bytecode body of an interpreted method
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    /// Instruction bytes
    pub code: Vec<u8>,
    /// Local variable slots
    pub max_locals: u16,
    /// Operand stack slots
    pub max_stack: u16,
}

/// Implementation of a method: exactly one of native or bytecode
#[derive(Clone)]
pub enum MethodBody {
    /// Host function
    Native(NativeMethodFn),
    /// Interpreted bytecode
    Bytecode(Bytecode),
}

/// Method record
#[derive(Clone)]
pub struct Method {
    class_name: String,
    name: String,
    key: MethodKey,
    descriptor: MethodDescriptor,
    access: AccessFlags,
    prepared: bool,
    body: MethodBody,
}

impl Method {
    /// Create a native method, already prepared for dispatch
    pub fn native(
        class_name: impl Into<String>,
        name: impl Into<String>,
        access: AccessFlags,
        descriptor: MethodDescriptor,
        entry: NativeMethodFn,
    ) -> Self {
        let name = name.into();
        Self {
            class_name: class_name.into(),
            key: MethodKey::new(&name, &descriptor),
            name,
            descriptor,
            access: access | AccessFlags::NATIVE,
            prepared: true,
            body: MethodBody::Native(entry),
        }
    }

    /// Create a bytecode method that still needs preparation
    pub fn bytecode(
        class_name: impl Into<String>,
        name: impl Into<String>,
        access: AccessFlags,
        descriptor: MethodDescriptor,
        code: Bytecode,
    ) -> Self {
        let name = name.into();
        Self {
            class_name: class_name.into(),
            key: MethodKey::new(&name, &descriptor),
            name,
            descriptor,
            access,
            prepared: false,
            body: MethodBody::Bytecode(code),
        }
    }

    /// Name of the owning class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatch key
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    /// Argument and return types
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Access flags
    pub fn access(&self) -> AccessFlags {
        self.access
    }

    /// Whether the method takes no receiver
    pub fn is_static(&self) -> bool {
        self.access.is_static()
    }

    /// Whether no bytecode-level preparation is needed before dispatch
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Implementation body
    pub fn body(&self) -> &MethodBody {
        &self.body
    }

    /// Native entry point, if native
    pub fn native_entry(&self) -> Option<&NativeMethodFn> {
        match &self.body {
            MethodBody::Native(entry) => Some(entry),
            MethodBody::Bytecode(_) => None,
        }
    }

    /// Operand stack slots consumed by a call (arguments plus receiver)
    pub fn arg_slots(&self) -> usize {
        self.descriptor.params().len() + usize::from(!self.is_static())
    }

    /// Run the native entry point on `thread`
    ///
    /// # Errors
    ///
    /// `BridgeViolation::NotNative` for bytecode methods; otherwise whatever
    /// the entry point returns.
    pub fn invoke(&self, thread: &mut VmThread) -> NativeResult<()> {
        match &self.body {
            MethodBody::Native(entry) => entry(thread),
            MethodBody::Bytecode(_) => Err(BridgeViolation::NotNative(self.key.clone()).into()),
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("class", &self.class_name)
            .field("key", &self.key.as_str())
            .field("access", &self.access)
            .field("prepared", &self.prepared)
            .field("native", &self.native_entry().is_some())
            .finish()
    }
}

/// Field metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Access flags (static-ness included)
    pub access: AccessFlags,
    /// Declared type
    pub field_type: TypeDescriptor,
    /// Storage slot in the class's static values or the instance's fields
    pub index: usize,
}

/// Class definition metadata
pub struct Class {
    /// Internal class name
    name: String,
    /// Methods by dispatch key
    methods: FxHashMap<MethodKey, Method>,
    /// Static and instance fields by name
    fields: FxHashMap<String, FieldInfo>,
    /// Static field names, in storage order
    static_field_names: Vec<String>,
    /// Static field types, in storage order
    static_field_types: Vec<TypeDescriptor>,
    /// Static field values, in storage order
    static_values: Vec<RwLock<Value>>,
    /// Instance field names, in storage order
    instance_field_names: Vec<String>,
    /// Instance field types, in storage order
    instance_field_types: Vec<TypeDescriptor>,
    /// Backing class file (None for builtin classes)
    class_file: Option<Arc<dyn ClassFile>>,
}

impl Class {
    fn empty(name: String) -> Self {
        Self {
            name,
            methods: FxHashMap::default(),
            fields: FxHashMap::default(),
            static_field_names: Vec::new(),
            static_field_types: Vec::new(),
            static_values: Vec::new(),
            instance_field_names: Vec::new(),
            instance_field_types: Vec::new(),
            class_file: None,
        }
    }

    /// Internal class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method by key
    pub fn method(&self, key: &MethodKey) -> Option<&Method> {
        self.methods.get(key)
    }

    /// Iterate over all methods (unordered)
    pub fn methods(&self) -> impl Iterator<Item = &Method> + '_ {
        self.methods.values()
    }

    /// Get number of methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Static field names in storage order
    pub fn static_field_names(&self) -> &[String] {
        &self.static_field_names
    }

    /// Static field types in storage order
    pub fn static_field_types(&self) -> &[TypeDescriptor] {
        &self.static_field_types
    }

    /// Instance field names in storage order
    pub fn instance_field_names(&self) -> &[String] {
        &self.instance_field_names
    }

    /// Instance field types in storage order
    pub fn instance_field_types(&self) -> &[TypeDescriptor] {
        &self.instance_field_types
    }

    /// Get a static field value by storage index
    pub fn static_value_at(&self, index: usize) -> Option<Value> {
        self.static_values.get(index).map(|cell| cell.read().clone())
    }

    /// Get a static field value by name
    pub fn static_value(&self, name: &str) -> Option<Value> {
        let info = self.static_field(name)?;
        self.static_value_at(info.index)
    }

    /// Set a static field value by name
    pub fn set_static_value(&self, name: &str, value: Value) -> Result<(), String> {
        let info = self
            .static_field(name)
            .ok_or_else(|| format!("No static field '{}' in {}", name, self.name))?;
        match self.static_values.get(info.index) {
            Some(cell) => {
                *cell.write() = value;
                Ok(())
            }
            None => Err(format!(
                "Static field index {} out of bounds (class has {} static fields)",
                info.index,
                self.static_values.len()
            )),
        }
    }

    /// Get number of static fields
    pub fn static_field_count(&self) -> usize {
        self.static_values.len()
    }

    /// Backing class file; always `None` for builtin classes
    pub fn class_file(&self) -> Option<&Arc<dyn ClassFile>> {
        self.class_file.as_ref()
    }

    /// Where the class came from, for diagnostics
    pub fn source(&self) -> &str {
        self.class_file.as_ref().map_or("<builtin>", |cf| cf.source())
    }

    fn static_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name).filter(|f| f.access.is_static())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.methods.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("source", &self.source())
            .field("methods", &keys)
            .field("static_fields", &self.static_field_names)
            .field("instance_fields", &self.instance_field_names)
            .finish()
    }
}

/// Assembles a synthetic class
///
/// [`ClassBuilder::new`] yields an empty skeleton; the `add_*` registrars
/// populate it; [`ClassBuilder::build`] freezes it. Nothing outside the
/// builder sees the class until it is built.
#[derive(Debug)]
pub struct ClassBuilder {
    class: Class,
}

impl ClassBuilder {
    /// Empty class: no methods, no fields, no class file
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            class: Class::empty(name.into()),
        }
    }

    /// Name of the class being built
    pub fn name(&self) -> &str {
        &self.class.name
    }

    fn insert_field(
        &mut self,
        name: &str,
        access: AccessFlags,
        field_type: TypeDescriptor,
        index: usize,
    ) -> Result<(), BuildError> {
        if self.class.fields.contains_key(name) {
            return Err(BuildError::DuplicateField {
                class: self.class.name.clone(),
                field: name.to_string(),
            });
        }
        self.class.fields.insert(
            name.to_string(),
            FieldInfo {
                access,
                field_type,
                index,
            },
        );
        Ok(())
    }

    /// Append a static field with its initial value
    ///
    /// The field's storage index is the number of static fields registered
    /// before it. `STATIC` is added to `access` if missing.
    ///
    /// # Errors
    ///
    /// `BuildError::DuplicateField` if `name` is already a field of the class.
    pub fn add_static_field(
        &mut self,
        name: &str,
        access: AccessFlags,
        field_type: TypeDescriptor,
        initial: Value,
    ) -> Result<&mut Self, BuildError> {
        let index = self.class.static_values.len();
        self.insert_field(name, access | AccessFlags::STATIC, field_type.clone(), index)?;
        self.class.static_field_names.push(name.to_string());
        self.class.static_field_types.push(field_type);
        self.class.static_values.push(RwLock::new(initial));
        Ok(self)
    }

    /// Append an instance field
    ///
    /// # Errors
    ///
    /// `BuildError::DuplicateField` if `name` is already a field of the class.
    pub fn add_instance_field(
        &mut self,
        name: &str,
        access: AccessFlags,
        field_type: TypeDescriptor,
    ) -> Result<&mut Self, BuildError> {
        let index = self.class.instance_field_names.len();
        self.insert_field(name, access, field_type.clone(), index)?;
        self.class.instance_field_names.push(name.to_string());
        self.class.instance_field_types.push(field_type);
        Ok(self)
    }

    /// Attach a native implementation under its dispatch key
    ///
    /// # Errors
    ///
    /// `BuildError::DuplicateMethod` if a method with the same name,
    /// argument types and return type is already registered.
    pub fn add_native_method<F>(
        &mut self,
        name: &str,
        access: AccessFlags,
        params: Vec<TypeDescriptor>,
        ret: TypeDescriptor,
        entry: F,
    ) -> Result<&mut Self, BuildError>
    where
        F: Fn(&mut VmThread) -> NativeResult<()> + Send + Sync + 'static,
    {
        let method = Method::native(
            self.class.name.clone(),
            name,
            access,
            MethodDescriptor::new(params, ret),
            Arc::new(entry),
        );
        self.add_method(method)
    }

    /// Public instance method taking one argument and returning void
    ///
    /// # Errors
    ///
    /// Same as [`ClassBuilder::add_native_method`].
    pub fn add_void_method<F>(
        &mut self,
        name: &str,
        param: TypeDescriptor,
        entry: F,
    ) -> Result<&mut Self, BuildError>
    where
        F: Fn(&mut VmThread) -> NativeResult<()> + Send + Sync + 'static,
    {
        self.add_native_method(
            name,
            AccessFlags::PUBLIC,
            vec![param],
            TypeDescriptor::Void,
            entry,
        )
    }

    /// Insert a prebuilt method record
    ///
    /// # Errors
    ///
    /// `BuildError::DuplicateMethod` if its key is already taken.
    pub fn add_method(&mut self, method: Method) -> Result<&mut Self, BuildError> {
        if self.class.methods.contains_key(method.key()) {
            return Err(BuildError::DuplicateMethod {
                class: self.class.name.clone(),
                key: method.key().clone(),
            });
        }
        self.class.methods.insert(method.key().clone(), method);
        Ok(self)
    }

    /// Freeze the class
    pub fn build(self) -> Arc<Class> {
        Arc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_thread: &mut VmThread) -> NativeResult<()> {
        Ok(())
    }

    #[test]
    fn test_empty_class() {
        let class = ClassBuilder::new("test/Empty").build();
        assert_eq!(class.name(), "test/Empty");
        assert_eq!(class.method_count(), 0);
        assert_eq!(class.static_field_count(), 0);
        assert!(class.instance_field_names().is_empty());
        assert!(class.class_file().is_none());
        assert_eq!(class.source(), "<builtin>");
    }

    #[test]
    fn test_static_field_indices_follow_registration_order() {
        let mut builder = ClassBuilder::new("test/Statics");
        builder
            .add_static_field("a", AccessFlags::PUBLIC, TypeDescriptor::Int, Value::Int(1))
            .unwrap()
            .add_static_field("b", AccessFlags::PUBLIC, TypeDescriptor::Long, Value::Long(2))
            .unwrap()
            .add_static_field("c", AccessFlags::PRIVATE, TypeDescriptor::Int, Value::Int(3))
            .unwrap();
        let class = builder.build();

        assert_eq!(class.static_field_names(), &["a", "b", "c"]);
        assert_eq!(
            class.static_field_types(),
            &[TypeDescriptor::Int, TypeDescriptor::Long, TypeDescriptor::Int]
        );
        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            let info = class.field(name).unwrap();
            assert_eq!(info.index, i);
            assert!(info.access.is_static());
        }
        assert_eq!(class.static_value("b"), Some(Value::Long(2)));
        assert_eq!(class.static_value_at(2), Some(Value::Int(3)));
    }

    #[test]
    fn test_duplicate_static_field_rejected() {
        let mut builder = ClassBuilder::new("test/Dup");
        builder
            .add_static_field("x", AccessFlags::PUBLIC, TypeDescriptor::Int, Value::Int(0))
            .unwrap();
        let err = builder
            .add_static_field("x", AccessFlags::PUBLIC, TypeDescriptor::Long, Value::Long(0))
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateField {
                class: "test/Dup".to_string(),
                field: "x".to_string()
            }
        );
        assert_eq!(builder.build().static_field_count(), 1);
    }

    #[test]
    fn test_static_and_instance_fields_share_namespace() {
        let mut builder = ClassBuilder::new("test/Shared");
        builder
            .add_instance_field("x", AccessFlags::PRIVATE, TypeDescriptor::Int)
            .unwrap();
        assert!(builder
            .add_static_field("x", AccessFlags::PUBLIC, TypeDescriptor::Int, Value::Int(0))
            .is_err());
    }

    #[test]
    fn test_native_method_registration() {
        let mut builder = ClassBuilder::new("test/Natives");
        builder
            .add_native_method("f", AccessFlags::PUBLIC, vec![], TypeDescriptor::Int, noop)
            .unwrap()
            .add_native_method(
                "f",
                AccessFlags::PUBLIC,
                vec![TypeDescriptor::Int],
                TypeDescriptor::Int,
                noop,
            )
            .unwrap()
            .add_void_method("g", TypeDescriptor::Char, noop)
            .unwrap();
        let class = builder.build();

        assert_eq!(class.method_count(), 3);
        let g = class
            .method(&MethodKey::parse("g", "(C)V").unwrap())
            .unwrap();
        assert!(g.is_prepared());
        assert!(g.native_entry().is_some());
        assert!(g.access().contains(AccessFlags::PUBLIC | AccessFlags::NATIVE));
        assert!(!g.is_static());
        assert_eq!(g.arg_slots(), 2);
        assert_eq!(g.class_name(), "test/Natives");
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let mut builder = ClassBuilder::new("test/DupMethod");
        builder
            .add_native_method("f", AccessFlags::PUBLIC, vec![], TypeDescriptor::Void, noop)
            .unwrap();
        let err = builder
            .add_native_method("f", AccessFlags::STATIC, vec![], TypeDescriptor::Void, noop)
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateMethod { ref key, .. } if key.as_str() == "f()V"));
    }

    #[test]
    fn test_bytecode_method_is_not_invocable_natively() {
        let mut builder = ClassBuilder::new("test/Mixed");
        let method = Method::bytecode(
            "test/Mixed",
            "run",
            AccessFlags::PUBLIC | AccessFlags::STATIC,
            MethodDescriptor::new(vec![], TypeDescriptor::Void),
            Bytecode::default(),
        );
        builder.add_method(method).unwrap();
        let class = builder.build();

        let run = class.method(&MethodKey::parse("run", "()V").unwrap()).unwrap();
        assert!(!run.is_prepared());
        assert!(run.native_entry().is_none());
        assert_eq!(run.arg_slots(), 0);

        let mut thread = VmThread::new();
        let err = run.invoke(&mut thread).unwrap_err();
        assert!(!err.is_guest());
    }

    #[test]
    fn test_set_static_value() {
        let mut builder = ClassBuilder::new("test/Mutable");
        builder
            .add_static_field("n", AccessFlags::PUBLIC, TypeDescriptor::Int, Value::Int(0))
            .unwrap()
            .add_instance_field("m", AccessFlags::PUBLIC, TypeDescriptor::Int)
            .unwrap();
        let class = builder.build();

        class.set_static_value("n", Value::Int(9)).unwrap();
        assert_eq!(class.static_value("n"), Some(Value::Int(9)));
        assert!(class.set_static_value("m", Value::Int(1)).is_err());
        assert_eq!(class.static_value("m"), None);
    }
}
