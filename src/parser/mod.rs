//! Model loaders.
//!
//! Both compilers are generic over [`ContentSource`] so they can read from
//! the filesystem ([`FsSource`]) or from memory in tests.
//!
//! - [`source`] – document I/O abstraction
//! - [`helpers`] – component file resolution and edge anchors
//! - [`forsyde`] – hierarchical ForSyDe-XML process networks
//! - [`sdf3`] – flat SDF3 application graphs

pub mod forsyde;
pub mod helpers;
pub mod sdf3;
pub mod source;

pub use forsyde::{Endpoint, LeafSet, ModelCompiler, resolve_endpoint};
pub use helpers::resolve_component_file;
pub use sdf3::Sdf3Compiler;
pub use source::*;
