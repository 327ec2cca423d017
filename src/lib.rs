//! # Coi Codegen
//!
//! Lowers a parsed component program to target source text calling the `webcc`
//! runtime.
//!
//! ## Lowering Invariants
//!
//! 1. **Collision-free names**: every emitted type name is prefixed with its component
//!    or module. `Vector3` declared inside `Physics` is emitted as `Physics_Vector3`.
//!
//! 2. **Idempotent resolution**: resolving an already-resolved type name returns it
//!    unchanged, so call sites never track whether a name was resolved.
//!
//! 3. **Schema dispatch order**: built-in shortcuts, static schema calls, built-in
//!    family overloads, mapped runtime calls, then a plain passthrough call.
//!
//! 4. **Rebind before create**: appending to a rendered collection rebinds every
//!    existing item before the new item's view is created.
//!
//! 5. **Reorder is not a change**: writing an element of a rendered collection moves
//!    its view and is never reported as a modification.
//!
//! 6. **Conservative reads**: dependency sets may contain names that are not read,
//!    never the other way round.
//!
//! 7. **One hard error**: a callback passed without `&` aborts the unit
//!    (`C-ERR-CALLBACK-001`). Every other unknown degrades to passthrough text.

pub mod ast;
pub mod codegen;
pub mod definitions;
pub mod dependencies;
pub mod dispatch;
pub mod emitter;
pub mod error;
pub mod formatter;
pub mod intrinsics;
pub mod match_lowerer;
pub mod mutation;
pub mod reactive;
pub mod schema;
pub mod scope;
pub mod statements;
pub mod types;
pub mod visitor;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod component_tests;
#[cfg(test)]
mod dispatch_tests;
#[cfg(test)]
mod types_tests;

#[cfg(feature = "napi")]
pub use codegen::generate_component_native;

pub use codegen::{
    generate_component, generate_component_json, generate_units, generate_units_parallel,
    CodegenOptions, ComponentOutput, ComponentUnit, Fragment, FragmentKind,
};
pub use emitter::Emitter;
pub use error::{CodegenResult, CompilerError};
pub use mutation::analyze;
pub use reactive::{BoundCollection, LoopTable};
pub use schema::Schema;
pub use scope::TypeContext;
pub use statements::StmtEmitter;
pub use types::TypeResolver;
