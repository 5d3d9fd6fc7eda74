//! stockavl: an inventory kept in a self-balancing AVL tree
//!
//! Layers, innermost first:
//! - [`domain`]: records, the AVL tree and its DOT/termtree renderings
//! - [`application`]: catalog ingestion, export and the depletion simulation
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
