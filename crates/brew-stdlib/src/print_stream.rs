//! `java/io/PrintStream`
//!
//! A print stream formats its argument into one buffer and hands it to the
//! sink in a single write, so concurrent `println` calls never split a line.
//! Write failures are not guest exceptions: they are remembered on the
//! stream and surface through `checkError()`.

use std::io;
use std::sync::Arc;

use brew_core::{
    AccessFlags, BuildError, Class, ClassBuilder, NativeResult, NativeState, Reference,
    TypeDescriptor,
};
use parking_lot::Mutex;

use crate::sink::SharedSink;

/// Internal name of the PrintStream class
pub const PRINT_STREAM_CLASS: &str = "java/io/PrintStream";

const LINE_SEPARATOR: &str = "\n";

/// Native state of a PrintStream instance
pub struct PrintStreamState {
    sink: SharedSink,
    last_error: Mutex<Option<String>>,
}

impl NativeState for PrintStreamState {}

impl PrintStreamState {
    /// Stream writing to `sink`
    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            last_error: Mutex::new(None),
        }
    }

    /// The sink this stream writes to
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// Whether any write or flush has failed
    pub fn check_error(&self) -> bool {
        self.last_error.lock().is_some()
    }

    /// Message of the most recent failure
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Write text as one sink call
    pub fn write_str(&self, text: &str) {
        if let Err(err) = self.sink.write_all(text.as_bytes()) {
            self.record(err);
        }
    }

    /// Flush the sink
    pub fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            self.record(err);
        }
    }

    fn record(&self, err: io::Error) {
        #[cfg(debug_assertions)]
        eprintln!("[PrintStream] write to {} failed: {}", self.sink.name(), err);
        *self.last_error.lock() = Some(err.to_string());
    }
}

impl std::fmt::Debug for PrintStreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintStreamState")
            .field("sink", &self.sink.name())
            .field("last_error", &*self.last_error.lock())
            .finish()
    }
}

fn state(this: &Reference) -> NativeResult<&PrintStreamState> {
    this.expect_instance(PRINT_STREAM_CLASS)?
        .native_state::<PrintStreamState>()
}

/// Guest text for a string argument; null prints as `null`
fn string_arg(arg: &Option<Reference>) -> NativeResult<&str> {
    match arg {
        Some(reference) => Ok(reference.expect_string()?.as_str()),
        None => Ok("null"),
    }
}

/// Allocate a stream already wired to `sink`
pub fn new_stream(class: &Arc<Class>, sink: SharedSink) -> Reference {
    Reference::new_instance_with(class, PrintStreamState::new(sink))
}

/// Build the PrintStream class
pub fn build_class() -> Result<Arc<Class>, BuildError> {
    let string = TypeDescriptor::object(brew_core::STRING_CLASS);
    let mut builder = ClassBuilder::new(PRINT_STREAM_CLASS);

    builder
        .add_void_method("print", TypeDescriptor::Char, |thread| {
            let (this, (c,)) = thread.pop_instance_call::<(char,)>()?;
            let state = state(&this)?;
            let mut buf = [0u8; 4];
            state.write_str(c.encode_utf8(&mut buf));
            Ok(())
        })?
        .add_void_method("print", string.clone(), |thread| {
            let (this, (text,)) = thread.pop_instance_call::<(Option<Reference>,)>()?;
            let state = state(&this)?;
            state.write_str(string_arg(&text)?);
            Ok(())
        })?
        .add_void_method("println", string, |thread| {
            let (this, (text,)) = thread.pop_instance_call::<(Option<Reference>,)>()?;
            let state = state(&this)?;
            let text = string_arg(&text)?;
            let mut line = String::with_capacity(text.len() + LINE_SEPARATOR.len());
            line.push_str(text);
            line.push_str(LINE_SEPARATOR);
            state.write_str(&line);
            Ok(())
        })?
        .add_void_method("println", TypeDescriptor::Int, |thread| {
            let (this, (value,)) = thread.pop_instance_call::<(i32,)>()?;
            let state = state(&this)?;
            state.write_str(&format!("{}{}", value, LINE_SEPARATOR));
            Ok(())
        })?
        .add_native_method(
            "println",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Void,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                state(&this)?.write_str(LINE_SEPARATOR);
                Ok(())
            },
        )?
        .add_native_method(
            "flush",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Void,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                state(&this)?.flush();
                Ok(())
            },
        )?
        .add_native_method(
            "checkError",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Boolean,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                let failed = state(&this)?.check_error();
                thread.push_result(failed)
            },
        )?;

    Ok(builder.build())
}
