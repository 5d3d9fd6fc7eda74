//! Domain layer: inventory records and the AVL tree that indexes them
//!
//! This layer is independent of external concerns (no I/O beyond the
//! caller-supplied export sink, no CLI, no config loading, no event log).

pub mod avl;
pub mod export;
mod node;
pub mod record;

pub use avl::{AvlTree, InOrder};
pub use export::TreeDisplay;
pub use record::{Code, Record};
