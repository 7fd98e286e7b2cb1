//! Pipeline stage implementations.
//!
//! Each stage consumes the filesystem output of the previous one:
//!
//! - [`acquire`] - shallow-clone the engine and binding source trees
//! - [`engine`] - configure and amalgamate the encrypted engine
//! - [`staging`] - publish the amalgamation pair into the binding's
//!   staging slots and regenerate its combined source
//! - [`binding`] - compile the binding extension module
//! - [`collect`] - discover the tagged build output and vendor artifacts

pub mod acquire;
pub mod binding;
pub mod collect;
pub mod engine;
pub mod staging;
