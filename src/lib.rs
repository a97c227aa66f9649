//! ForSyDe-XML to Graphviz compiler.
//!
//! This crate provides a [`parser::ModelCompiler`] that walks a hierarchical
//! ForSyDe-XML process network (one document per composite process) and
//! turns it into a clustered [`graph::Graph`], plus a flat
//! [`parser::Sdf3Compiler`] for SDF3 application graphs. Node and edge
//! labels are computed from user-defined path queries ([`label`]).
//!
//! The binary `f2dot` loads the settings, runs a compiler and hands the DOT
//! source to Graphviz.

pub mod cluster;
pub mod color;
pub mod graph;
pub mod label;
pub mod model;
pub mod parser;
pub mod settings;
