//! The set of builtin classes the VM registers at startup
//!
//! Each class is built on first request and cached. Concurrent first
//! requests race to build; exactly one result is kept and every caller gets
//! that same `Arc`. A failed build is not cached, so the next request tries
//! again.

use std::sync::Arc;

use brew_core::{BuildError, Class, ClassRegistry};
use once_cell::sync::OnceCell;

use crate::options::StdlibOptions;
use crate::{print_stream, random, system};

/// Builds and caches the builtin classes
#[derive(Debug)]
pub struct BuiltinCatalog {
    options: StdlibOptions,
    system: OnceCell<Arc<Class>>,
    random: OnceCell<Arc<Class>>,
    print_stream: OnceCell<Arc<Class>>,
}

fn built(class: Arc<Class>) -> Arc<Class> {
    #[cfg(debug_assertions)]
    eprintln!(
        "[catalog] built {} ({} methods, {} static fields)",
        class.name(),
        class.method_count(),
        class.static_field_count()
    );
    class
}

impl BuiltinCatalog {
    /// Catalog using `options`
    pub fn new(options: StdlibOptions) -> Self {
        Self {
            options,
            system: OnceCell::new(),
            random: OnceCell::new(),
            print_stream: OnceCell::new(),
        }
    }

    /// Options the classes are built with
    pub fn options(&self) -> &StdlibOptions {
        &self.options
    }

    /// `java/lang/System`
    pub fn system(&self) -> Result<Arc<Class>, BuildError> {
        self.system
            .get_or_try_init(|| {
                let print_stream = self.print_stream()?;
                system::build_class(&print_stream, Arc::clone(&self.options.stdout)).map(built)
            })
            .map(Arc::clone)
    }

    /// `java/util/Random`
    pub fn random(&self) -> Result<Arc<Class>, BuildError> {
        self.random
            .get_or_try_init(|| random::build_class(self.options.random_seed).map(built))
            .map(Arc::clone)
    }

    /// `java/io/PrintStream`
    pub fn print_stream(&self) -> Result<Arc<Class>, BuildError> {
        self.print_stream
            .get_or_try_init(|| print_stream::build_class().map(built))
            .map(Arc::clone)
    }

    /// All builtin classes, in registration order
    pub fn classes(&self) -> Result<Vec<Arc<Class>>, BuildError> {
        Ok(vec![self.system()?, self.random()?, self.print_stream()?])
    }

    /// Register every builtin class with `registry`
    ///
    /// # Errors
    ///
    /// Build failures, or `BuildError::DuplicateClass` if the registry
    /// already holds a class with a builtin's name. Classes registered
    /// before the failure stay registered.
    pub fn register_into(&self, registry: &mut ClassRegistry) -> Result<(), BuildError> {
        registry.register_all(self.classes()?)
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new(StdlibOptions::default())
    }
}
