//! `java/lang/System`
//!
//! System has no methods of its own here. Its only member is the static
//! `out` field, which holds a PrintStream wired to the VM's stdout sink.

use std::sync::Arc;

use brew_core::{AccessFlags, BuildError, Class, ClassBuilder, TypeDescriptor, Value};

use crate::print_stream::{self, PRINT_STREAM_CLASS};
use crate::sink::SharedSink;

/// Internal name of the System class
pub const SYSTEM_CLASS: &str = "java/lang/System";

/// Name of the console output field
pub const OUT_FIELD: &str = "out";

/// Build the System class
///
/// `print_stream` must be the PrintStream class the VM registers, so that
/// `System.out` is an instance of the same class guest code resolves.
pub fn build_class(print_stream: &Arc<Class>, stdout: SharedSink) -> Result<Arc<Class>, BuildError> {
    let out = print_stream::new_stream(print_stream, stdout);

    let mut builder = ClassBuilder::new(SYSTEM_CLASS);
    builder.add_static_field(
        OUT_FIELD,
        AccessFlags::PUBLIC_STATIC_FINAL,
        TypeDescriptor::object(PRINT_STREAM_CLASS),
        Value::Ref(out),
    )?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print_stream::PrintStreamState;
    use crate::sink::{same_sink, CaptureSink};

    #[test]
    fn test_out_field() {
        let print_stream = print_stream::build_class().unwrap();
        let sink: SharedSink = CaptureSink::shared();
        let system = build_class(&print_stream, Arc::clone(&sink)).unwrap();

        let info = system.field(OUT_FIELD).unwrap();
        assert_eq!(info.access, AccessFlags::PUBLIC_STATIC_FINAL);
        assert_eq!(info.field_type.to_string(), "Ljava/io/PrintStream;");
        assert_eq!(system.static_field_count(), 1);
        assert_eq!(system.method_count(), 0);

        let out = system.static_value(OUT_FIELD).unwrap();
        let instance = out.as_reference().unwrap().as_instance().unwrap();
        assert!(Arc::ptr_eq(instance.class(), &print_stream));
        let state = instance.native_state::<PrintStreamState>().unwrap();
        assert!(same_sink(state.sink(), &sink));
    }
}
