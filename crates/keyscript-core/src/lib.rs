//! Compiler contract, execution surface, and emulation store for Keyscript.

pub mod backend;
pub mod error;
pub mod store;

pub use backend::{Args, Backend, ExecFunction, Keys, Slots};
pub use error::{BindingError, CompileError, ExecError};
pub use store::{Reply, SharedStore, Store, StoreError, Txn};

pub use rhizome_keyscript_ir as ir;
pub use rhizome_keyscript_ir::{CommandObj, ExprObj, JsonType, Opcode, SequenceObj};
