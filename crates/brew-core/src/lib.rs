//! Brew VM native bridge
//!
//! This crate provides the pieces the VM needs to host classes implemented
//! in Rust rather than bytecode:
//! - Method descriptors and dispatch keys
//! - Class records and the builder for synthetic classes
//! - Instances with a write-once native state slot
//! - The operand-stack calling convention for native methods
//! - A class registry the interpreter resolves through

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod access;
pub mod class;
pub mod descriptor;
pub mod error;
pub mod instance;
pub mod marshal;
pub mod registry;
pub mod stack;
pub mod thread;
pub mod value;

pub use access::AccessFlags;
pub use class::{Bytecode, Class, ClassBuilder, ClassFile, FieldInfo, Method, MethodBody, NativeMethodFn};
pub use descriptor::{DescriptorError, MethodDescriptor, MethodKey, TypeDescriptor};
pub use error::{BridgeViolation, BuildError, GuestException, NativeError, NativeResult};
pub use instance::{ClassInstance, NativeState};
pub use marshal::{ArgList, FromValue, IntoValue};
pub use registry::ClassRegistry;
pub use stack::{Stack, StackError};
pub use thread::VmThread;
pub use value::{GuestString, HeapObject, Reference, Value, STRING_CLASS};
