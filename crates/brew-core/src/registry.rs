//! Class registry for managing runtime class metadata
//!
//! The VM hands the builtin classes to the registry at startup; afterwards
//! the interpreter resolves class names and method keys through it. The
//! registry is populated before any guest code runs and only read after.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::{Class, Method};
use crate::descriptor::MethodKey;
use crate::error::{BridgeViolation, BuildError, NativeResult};
use crate::thread::VmThread;

/// Class registry for the VM
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Classes indexed by ID
    classes: Vec<Arc<Class>>,
    /// Class name to ID mapping
    name_to_id: FxHashMap<String, usize>,
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class, returning its ID
    ///
    /// # Errors
    ///
    /// `BuildError::DuplicateClass` if a class of the same name exists.
    pub fn register_class(&mut self, class: Arc<Class>) -> Result<usize, BuildError> {
        if self.name_to_id.contains_key(class.name()) {
            return Err(BuildError::DuplicateClass(class.name().to_string()));
        }

        let id = self.classes.len();
        self.name_to_id.insert(class.name().to_string(), id);
        self.classes.push(class);
        Ok(id)
    }

    /// Register several classes, stopping at the first duplicate
    pub fn register_all(
        &mut self,
        classes: impl IntoIterator<Item = Arc<Class>>,
    ) -> Result<(), BuildError> {
        for class in classes {
            self.register_class(class)?;
        }
        Ok(())
    }

    /// Get class by ID
    pub fn get_class(&self, id: usize) -> Option<&Arc<Class>> {
        self.classes.get(id)
    }

    /// Get class by name
    pub fn get_class_by_name(&self, name: &str) -> Option<&Arc<Class>> {
        self.name_to_id
            .get(name)
            .and_then(|id| self.classes.get(*id))
    }

    /// Resolve a method by class name and key
    pub fn resolve_method(&self, class_name: &str, key: &MethodKey) -> Option<&Method> {
        self.get_class_by_name(class_name)?.method(key)
    }

    /// Dispatch a native method on `thread`
    ///
    /// The caller has already pushed receiver and arguments.
    ///
    /// # Errors
    ///
    /// `BridgeViolation::Unresolved` if the class or method is unknown,
    /// `BridgeViolation::NotNative` if it has a bytecode body, otherwise
    /// whatever the method returns.
    pub fn invoke(&self, thread: &mut VmThread, class_name: &str, key: &MethodKey) -> NativeResult<()> {
        let method = self.resolve_method(class_name, key).ok_or_else(|| {
            BridgeViolation::Unresolved {
                class: class_name.to_string(),
                key: key.clone(),
            }
        })?;
        method.invoke(thread)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are registered
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes with their IDs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<Class>)> {
        self.classes.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessFlags;
    use crate::class::ClassBuilder;
    use crate::descriptor::TypeDescriptor;
    use crate::error::NativeError;
    use crate::value::Value;

    fn answer_class() -> Arc<Class> {
        let mut builder = ClassBuilder::new("test/Answer");
        builder
            .add_native_method(
                "get",
                AccessFlags::PUBLIC | AccessFlags::STATIC,
                vec![],
                TypeDescriptor::Int,
                |thread| thread.push_result(42i32),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ClassRegistry::new();
        let id = registry.register_class(answer_class()).unwrap();
        assert_eq!(id, 0);
        assert_eq!(registry.get_class(0).unwrap().name(), "test/Answer");
        assert!(registry.get_class_by_name("test/Answer").is_some());
        assert!(registry.get_class_by_name("test/Missing").is_none());
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register_class(answer_class()).unwrap();
        assert_eq!(
            registry.register_class(answer_class()),
            Err(BuildError::DuplicateClass("test/Answer".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invoke_native() {
        let mut registry = ClassRegistry::new();
        registry.register_all([answer_class()]).unwrap();

        let mut thread = VmThread::new();
        let key = MethodKey::parse("get", "()I").unwrap();
        registry.invoke(&mut thread, "test/Answer", &key).unwrap();
        assert_eq!(thread.stack_mut().pop().unwrap(), Value::Int(42));
    }

    #[test]
    fn test_invoke_unresolved() {
        let registry = ClassRegistry::new();
        let mut thread = VmThread::new();
        let key = MethodKey::parse("get", "()J").unwrap();
        let err = registry.invoke(&mut thread, "test/Answer", &key).unwrap_err();
        assert!(matches!(err, NativeError::Bridge(BridgeViolation::Unresolved { .. })));
    }
}
