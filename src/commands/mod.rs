//! Command dispatch: registry (§4.4), argument binder (§4.5), and the
//! middleware pipeline (§4.6).

pub mod binder;
pub mod registry;
pub mod runtime;
pub mod spec;
pub mod well_known;

pub use registry::CommandRegistry;
pub use spec::{ArgSpec, CommandKind, CommandSpec};
