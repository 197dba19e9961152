//! Virtual thread handle passed to native methods

use std::sync::atomic::{AtomicU64, Ordering};

use crate::stack::Stack;

/// Global counter for generating unique thread IDs
static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

/// The executing virtual thread as a native method sees it
///
/// Native code only touches the operand stack; scheduling state stays with
/// the interpreter.
#[derive(Debug)]
pub struct VmThread {
    id: u64,
    stack: Stack,
}

impl VmThread {
    /// Create a thread with a default-sized operand stack
    pub fn new() -> Self {
        Self::with_stack(Stack::new())
    }

    /// Create a thread around an existing operand stack
    pub fn with_stack(stack: Stack) -> Self {
        Self {
            id: NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed),
            stack,
        }
    }

    /// Unique thread ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Operand stack
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Mutable operand stack
    pub fn stack_mut(&mut self) -> &mut Stack {
        &mut self.stack
    }
}

impl Default for VmThread {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_ids_are_unique() {
        let a = VmThread::new();
        let b = VmThread::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_custom_stack() {
        let thread = VmThread::with_stack(Stack::with_capacity(8));
        assert_eq!(thread.stack().max_size(), 8);
        assert!(thread.stack().is_empty());
    }
}
