//! Brew Standard Library
//!
//! Native implementations of the builtin classes the VM provides before any
//! bytecode is loaded: `java/lang/System`, `java/util/Random` and
//! `java/io/PrintStream`. Build them through a [`BuiltinCatalog`] and hand
//! them to the class registry at startup.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod catalog;
pub mod options;
pub mod print_stream;
pub mod random;
pub mod sink;
pub mod system;

pub use catalog::BuiltinCatalog;
pub use options::StdlibOptions;
pub use print_stream::{PrintStreamState, PRINT_STREAM_CLASS};
pub use random::{RandomState, RANDOM_CLASS};
pub use sink::{CaptureSink, OutputSink, SharedSink, StdoutSink};
pub use system::{OUT_FIELD, SYSTEM_CLASS};
