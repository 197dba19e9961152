//! Error types for class building and native calls
//!
//! Two families never mix:
//! - [`BuildError`] comes out of the class builder and the registry. The
//!   builtin catalog is fixed, so any of these is a bug in the catalog.
//! - [`NativeError`] comes out of native method calls. Its `Guest` side is
//!   turned into a guest exception by the VM; its `Bridge` side means the
//!   host-side invariants of the bridge were broken.

use crate::descriptor::MethodKey;
use crate::stack::StackError;

/// Result type for native method calls
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors raised while assembling classes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Field name already registered on the class
    #[error("Duplicate field '{field}' in class {class}")]
    DuplicateField {
        /// Class being built
        class: String,
        /// Field name
        field: String,
    },

    /// Method key already registered on the class
    #[error("Duplicate method {key} in class {class}")]
    DuplicateMethod {
        /// Class being built
        class: String,
        /// Method key
        key: MethodKey,
    },

    /// Class name already present in the registry
    #[error("Class {0} is already registered")]
    DuplicateClass(String),
}

/// Conditions the guest program can trigger through ordinary calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuestException {
    /// Value of the wrong type where a specific type was required
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Argument outside the accepted domain
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// Null receiver or argument, or an instance whose constructor never ran
    #[error("Null reference: {0}")]
    NullReference(String),
}

impl GuestException {
    /// Internal name of the guest exception class the VM should throw
    pub fn exception_class(&self) -> &'static str {
        match self {
            GuestException::TypeMismatch { .. } => "java/lang/ClassCastException",
            GuestException::IllegalArgument(_) => "java/lang/IllegalArgumentException",
            GuestException::NullReference(_) => "java/lang/NullPointerException",
        }
    }
}

/// Host-side invariant failures at the native boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeViolation {
    /// Native state present but of another concrete type
    #[error("Native state of {class} instance is {found}, expected {expected}")]
    WrongNativeState {
        /// Class of the receiver
        class: String,
        /// Expected state type
        expected: &'static str,
        /// Stored state type
        found: &'static str,
    },

    /// Constructor ran twice on one instance
    #[error("Native state of {0} instance is already initialized")]
    AlreadyInitialized(String),

    /// Native dispatch reached a bytecode-bodied method
    #[error("Method {0} has no native entry point")]
    NotNative(MethodKey),

    /// Class or method key not found in the registry
    #[error("Cannot resolve {class}.{key}")]
    Unresolved {
        /// Class name
        class: String,
        /// Method key
        key: MethodKey,
    },

    /// Operand stack misuse
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Error returned by a native method
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NativeError {
    /// Translate into a guest exception
    #[error(transparent)]
    Guest(#[from] GuestException),

    /// Bridge invariant broken; log or abort
    #[error("Bridge invariant violated: {0}")]
    Bridge(#[from] BridgeViolation),
}

impl NativeError {
    /// Type mismatch helper
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        GuestException::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
        .into()
    }

    /// Illegal argument helper
    pub fn illegal_argument(msg: impl Into<String>) -> Self {
        GuestException::IllegalArgument(msg.into()).into()
    }

    /// Null reference helper
    pub fn null_reference(msg: impl Into<String>) -> Self {
        GuestException::NullReference(msg.into()).into()
    }

    /// Whether the VM should surface this as a guest exception
    pub fn is_guest(&self) -> bool {
        matches!(self, NativeError::Guest(_))
    }

    /// Guest exception class for guest errors, `None` for bridge violations
    pub fn exception_class(&self) -> Option<&'static str> {
        match self {
            NativeError::Guest(e) => Some(e.exception_class()),
            NativeError::Bridge(_) => None,
        }
    }
}

impl From<StackError> for NativeError {
    fn from(e: StackError) -> Self {
        NativeError::Bridge(BridgeViolation::Stack(e))
    }
}
