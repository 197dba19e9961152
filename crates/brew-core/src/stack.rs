//! Operand stack
//!
//! Per-thread LIFO of guest values. The interpreter pushes a method's
//! receiver and arguments left to right before dispatch; a native method
//! pops them right to left and pushes at most one result.
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   arg₁                              │  ← top (popped first)
//! │   arg₀                              │
//! │   receiver                          │  ← popped last
//! ├─────────────────────────────────────┤
//! │   caller operands                   │
//! └─────────────────────────────────────┘
//! ```

use crate::value::{Reference, Value};

/// Default maximum stack size (in slots)
pub const DEFAULT_MAX_STACK_SIZE: usize = 1024 * 64;

/// Operand stack errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// Push beyond the configured maximum
    #[error("Stack overflow (max {0} slots)")]
    Overflow(usize),

    /// Pop from an empty stack
    #[error("Stack underflow")]
    Underflow,

    /// Reference pop found a primitive
    #[error("Expected reference on stack, found {0}")]
    NotAReference(&'static str),
}

/// Operand stack for one VM thread
#[derive(Debug)]
pub struct Stack {
    /// Stack slots
    slots: Vec<Value>,

    /// Maximum stack size (in slots)
    max_size: usize,
}

impl Stack {
    /// Create a new stack with default size
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_STACK_SIZE)
    }

    /// Create a stack with specific capacity
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Push a value onto the stack
    ///
    /// # Errors
    ///
    /// Returns `StackError::Overflow` if the stack is full.
    #[inline]
    pub fn push(&mut self, value: Value) -> Result<(), StackError> {
        if self.slots.len() >= self.max_size {
            return Err(StackError::Overflow(self.max_size));
        }
        self.slots.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    ///
    /// # Errors
    ///
    /// Returns `StackError::Underflow` if the stack is empty.
    #[inline]
    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.slots.pop().ok_or(StackError::Underflow)
    }

    /// Pop a reference slot; `None` means the slot held null
    ///
    /// # Errors
    ///
    /// Returns `StackError::NotAReference` if the top slot is a primitive.
    /// The slot is consumed either way.
    pub fn pop_reference(&mut self) -> Result<Option<Reference>, StackError> {
        match self.pop()? {
            Value::Null => Ok(None),
            Value::Ref(r) => Ok(Some(r)),
            other => Err(StackError::NotAReference(other.type_name())),
        }
    }

    /// Peek at the top value without popping
    #[inline]
    pub fn peek(&self) -> Result<&Value, StackError> {
        self.slots.last().ok_or(StackError::Underflow)
    }

    /// Peek at value N slots from top (0 = top)
    #[inline]
    pub fn peek_n(&self, n: usize) -> Result<&Value, StackError> {
        let depth = self.slots.len();
        if depth <= n {
            return Err(StackError::Underflow);
        }
        Ok(&self.slots[depth - 1 - n])
    }

    /// Get current stack depth
    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Check if stack is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Get maximum stack size
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Iterate over live values, bottom first
    pub fn iter_values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.slots.iter()
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
