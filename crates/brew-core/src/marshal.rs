//! Typed argument marshalling for native methods
//!
//! The interpreter pushes the receiver first and the arguments left to
//! right, so a native method must pop the last argument first and the
//! receiver last. [`ArgList`] encodes that order once:
//!
//! ```ignore
//! // println(Ljava/lang/String;)V
//! let (this, (text,)) = thread.pop_instance_call::<(Reference,)>()?;
//! let state = this.expect_instance(PRINT_STREAM_CLASS)?.native_state::<PrintStreamState>()?;
//! ```
//!
//! Conversions report wrong primitive types and non-null expectations as
//! guest errors; stack underflow is a bridge violation.

use crate::error::{NativeError, NativeResult};
use crate::instance::ClassInstance;
use crate::stack::Stack;
use crate::thread::VmThread;
use crate::value::{GuestString, Reference, Value, STRING_CLASS};

/// Convert a popped stack value into a Rust type
pub trait FromValue: Sized {
    /// Convert, returning a guest error if the value has the wrong shape
    fn from_value(value: Value) -> NativeResult<Self>;
}

/// Convert a Rust type into a value to push
pub trait IntoValue {
    /// Convert to a stack value
    fn into_value(self) -> Value;
}

impl FromValue for Value {
    fn from_value(value: Value) -> NativeResult<Self> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(NativeError::type_mismatch("int", other.type_name())),
        }
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Long(l) => Ok(l),
            other => Err(NativeError::type_mismatch("long", other.type_name())),
        }
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Long(self)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Float(x) => Ok(x),
            other => Err(NativeError::type_mismatch("float", other.type_name())),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Double(x) => Ok(x),
            other => Err(NativeError::type_mismatch("double", other.type_name())),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Int(i) => Ok(i != 0),
            other => Err(NativeError::type_mismatch("boolean", other.type_name())),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Int(self as i32)
    }
}

// A `char` slot holds one UTF-16 code unit; lone surrogates decode to U+FFFD.
impl FromValue for char {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Int(i) => Ok(char::decode_utf16([i as u16])
                .next()
                .and_then(Result::ok)
                .unwrap_or(char::REPLACEMENT_CHARACTER)),
            other => Err(NativeError::type_mismatch("char", other.type_name())),
        }
    }
}

impl FromValue for Reference {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Ref(r) => Ok(r),
            Value::Null => Err(NativeError::null_reference("expected a non-null reference")),
            other => Err(NativeError::type_mismatch("reference", other.type_name())),
        }
    }
}

impl IntoValue for Reference {
    fn into_value(self) -> Value {
        Value::Ref(self)
    }
}

impl FromValue for Option<Reference> {
    fn from_value(value: Value) -> NativeResult<Self> {
        match value {
            Value::Ref(r) => Ok(Some(r)),
            Value::Null => Ok(None),
            other => Err(NativeError::type_mismatch("reference", other.type_name())),
        }
    }
}

impl IntoValue for Option<Reference> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, Value::Ref)
    }
}

/// A fixed-arity argument list popped in reverse declaration order
pub trait ArgList: Sized {
    /// Number of stack slots consumed
    const COUNT: usize;

    /// Pop the arguments, last one first
    fn pop_from(stack: &mut Stack) -> NativeResult<Self>;
}

impl ArgList for () {
    const COUNT: usize = 0;

    fn pop_from(_stack: &mut Stack) -> NativeResult<Self> {
        Ok(())
    }
}

impl<A: FromValue> ArgList for (A,) {
    const COUNT: usize = 1;

    fn pop_from(stack: &mut Stack) -> NativeResult<Self> {
        let a = A::from_value(stack.pop()?)?;
        Ok((a,))
    }
}

impl<A: FromValue, B: FromValue> ArgList for (A, B) {
    const COUNT: usize = 2;

    fn pop_from(stack: &mut Stack) -> NativeResult<Self> {
        let b = B::from_value(stack.pop()?)?;
        let a = A::from_value(stack.pop()?)?;
        Ok((a, b))
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> ArgList for (A, B, C) {
    const COUNT: usize = 3;

    fn pop_from(stack: &mut Stack) -> NativeResult<Self> {
        let c = C::from_value(stack.pop()?)?;
        let b = B::from_value(stack.pop()?)?;
        let a = A::from_value(stack.pop()?)?;
        Ok((a, b, c))
    }
}

impl VmThread {
    /// Pop the arguments of a static call
    pub fn pop_args<A: ArgList>(&mut self) -> NativeResult<A> {
        A::pop_from(self.stack_mut())
    }

    /// Pop the arguments of an instance call, then its receiver
    ///
    /// # Errors
    ///
    /// `GuestException::NullReference` if the receiver is null.
    pub fn pop_instance_call<A: ArgList>(&mut self) -> NativeResult<(Reference, A)> {
        let args = A::pop_from(self.stack_mut())?;
        let receiver = self
            .stack_mut()
            .pop_reference()?
            .ok_or_else(|| NativeError::null_reference("method invoked on null receiver"))?;
        Ok((receiver, args))
    }

    /// Push a method result
    pub fn push_result<T: IntoValue>(&mut self, value: T) -> NativeResult<()> {
        self.stack_mut().push(value.into_value())?;
        Ok(())
    }
}

impl Reference {
    /// The instance behind this reference, checked against `class_name`
    ///
    /// # Errors
    ///
    /// `GuestException::TypeMismatch` for strings and instances of other
    /// classes.
    pub fn expect_instance(&self, class_name: &str) -> NativeResult<&ClassInstance> {
        match self.as_instance() {
            Some(instance) if instance.is_instance_of(class_name) => Ok(instance),
            _ => Err(NativeError::type_mismatch(class_name, self.class_name())),
        }
    }

    /// The guest string behind this reference
    ///
    /// # Errors
    ///
    /// `GuestException::TypeMismatch` if the reference is not a string.
    pub fn expect_string(&self) -> NativeResult<&GuestString> {
        self.as_string()
            .ok_or_else(|| NativeError::type_mismatch(STRING_CLASS, self.class_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::error::{BridgeViolation, GuestException};
    use crate::stack::StackError;

    #[test]
    fn test_args_pop_in_reverse_declaration_order() {
        let mut thread = VmThread::new();
        thread.push_result(1i32).unwrap();
        thread.push_result(2i64).unwrap();
        thread.push_result(true).unwrap();

        let (a, b, c) = thread.pop_args::<(i32, i64, bool)>().unwrap();
        assert_eq!((a, b, c), (1, 2, true));
        assert!(thread.stack().is_empty());
    }

    #[test]
    fn test_receiver_popped_last() {
        let class = ClassBuilder::new("test/Receiver").build();
        let receiver = Reference::new_instance(&class);

        let mut thread = VmThread::new();
        thread.push_result(receiver.clone()).unwrap();
        thread.push_result(5i32).unwrap();
        thread.push_result(Reference::new_string("s")).unwrap();

        let (this, (n, s)) = thread.pop_instance_call::<(i32, Reference)>().unwrap();
        assert_eq!(this, receiver);
        assert_eq!(n, 5);
        assert_eq!(s.expect_string().unwrap().as_str(), "s");
        assert!(thread.stack().is_empty());
    }

    #[test]
    fn test_null_receiver() {
        let mut thread = VmThread::new();
        thread.push_result(Value::Null).unwrap();
        let err = thread.pop_instance_call::<()>().unwrap_err();
        assert!(matches!(err, NativeError::Guest(GuestException::NullReference(_))));
    }

    #[test]
    fn test_underflow_is_bridge_violation() {
        let mut thread = VmThread::new();
        let err = thread.pop_args::<(i32,)>().unwrap_err();
        assert_eq!(err, NativeError::Bridge(BridgeViolation::Stack(StackError::Underflow)));
    }

    #[test]
    fn test_primitive_mismatch_is_guest_error() {
        let mut thread = VmThread::new();
        thread.push_result(3i64).unwrap();
        let err = thread.pop_args::<(i32,)>().unwrap_err();
        assert_eq!(err, NativeError::type_mismatch("int", "long"));
    }

    #[test]
    fn test_char_conversion() {
        assert_eq!(char::from_value(Value::Int('A' as i32)).unwrap(), 'A');
        assert_eq!(char::from_value(Value::Int(0x00e9)).unwrap(), 'é');
        assert_eq!(
            char::from_value(Value::Int(0xd800)).unwrap(),
            char::REPLACEMENT_CHARACTER
        );
    }

    #[test]
    fn test_expect_instance_checks_class() {
        let a = ClassBuilder::new("test/A").build();
        let r = Reference::new_instance(&a);
        assert!(r.expect_instance("test/A").is_ok());
        assert_eq!(
            r.expect_instance("test/B").unwrap_err(),
            NativeError::type_mismatch("test/B", "test/A")
        );
        assert!(Reference::new_string("x").expect_instance("test/A").is_err());
        assert_eq!(
            r.expect_string().unwrap_err(),
            NativeError::type_mismatch(STRING_CLASS, "test/A")
        );
    }

    #[test]
    fn test_optional_reference() {
        assert_eq!(Option::<Reference>::from_value(Value::Null).unwrap(), None);
        assert_eq!(None::<Reference>.into_value(), Value::Null);
    }
}
