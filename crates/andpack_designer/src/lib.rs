//! Resource designer and layout code-behind generation.
//!
//! Symbols are collected from every file of a merged resource tree with one
//! of two interchangeable XML backends ([`ManagedParser`],
//! [`StreamingParser`]), assigned ids in a [`DesignerModel`] and rendered as
//! `R.txt`, `R.java` and `Resource.designer.{cs,fs}`. In assembly mode the
//! application designer also redirects library fields through an
//! [`AliasTable`]. Layouts that name their owning types in `tools:classes`
//! get a binding class ([`generate_bindings`]).

#![warn(missing_docs)]

pub mod alias;
pub mod codebehind;
pub mod collect;
pub mod designer;
pub mod error;
pub mod generate;
pub mod java;
pub mod kind;
pub mod model;
pub mod parser;
pub mod symbols;

pub use alias::{Alias, AliasTable, LibrarySymbols};
pub use codebehind::{generate_bindings, parse_layout_binding, render_binding, BindingReport, LayoutBinding, GENERATED_DIR};
pub use collect::{collect_symbols, GenerationMode, SymbolCollection};
pub use designer::{designer_file_name, generate_designer, DesignerOptions};
pub use error::DesignerError;
pub use generate::{generate, DesignerPaths, DesignerRequest, GeneratedDesigner};
pub use java::{generate_r_java, r_java_path};
pub use model::{parse_r_txt, DesignerModel, RTxtEntry};
pub use parser::{parser_for, ManagedParser, ResourceParser, StreamingParser};
pub use symbols::FileSymbols;
