//! # Schema Nodes
//!
//! The interface between the (external) streamer-metadata layer and the
//! reader registry. That layer inspects class descriptions and hands over a
//! `SchemaNode` tree describing the shape of one branch; the registry's
//! factories turn the tree into a reader tree.
//!
//! Built-in nodes cover everything the built-in readers decode. `Custom`
//! nodes carry an opaque type name and child nodes; no built-in factory
//! recognizes them, so they decode only when a user factory does.

use crate::payload::PrimitiveKind;
use crate::readers::MapLayout;

#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// Fixed-width primitive field.
    Primitive { name: String, kind: PrimitiveKind },
    /// Length-prefixed string without a byte-count header.
    TString { name: String },
    /// Serialized-object prefix; `retain` keeps the reference words.
    TObject { name: String, retain: bool },
    /// Library string, optionally under its own byte-count header.
    StlString { name: String, with_header: bool },
    /// Variable-length sequence of one element shape.
    StlSequence {
        name: String,
        with_header: bool,
        element: Box<SchemaNode>,
    },
    /// Map with parallel key and value shapes.
    StlMap {
        name: String,
        with_header: bool,
        layout: MapLayout,
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
    /// Counted primitive array (no header, count on the wire).
    TArray { name: String, kind: PrimitiveKind },
    /// Fixed (`flat_size > 0`) or unsized (`flat_size < 0`) repetition of
    /// one element shape.
    CStyleArray {
        name: String,
        flat_size: i64,
        element: Box<SchemaNode>,
    },
    /// Named class body: byte-count+version header, then the members in
    /// declared order.
    Class {
        name: String,
        members: Vec<SchemaNode>,
    },
    /// Object behind an object header (byte count, tag, optional class
    /// name indirection).
    Pointer {
        name: String,
        element: Box<SchemaNode>,
    },
    /// A field the schema layer decided to drop.
    Empty { name: String },
    /// A node only user-registered factories recognize.
    Custom {
        name: String,
        type_name: String,
        children: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn name(&self) -> &str {
        match self {
            SchemaNode::Primitive { name, .. }
            | SchemaNode::TString { name }
            | SchemaNode::TObject { name, .. }
            | SchemaNode::StlString { name, .. }
            | SchemaNode::StlSequence { name, .. }
            | SchemaNode::StlMap { name, .. }
            | SchemaNode::TArray { name, .. }
            | SchemaNode::CStyleArray { name, .. }
            | SchemaNode::Class { name, .. }
            | SchemaNode::Pointer { name, .. }
            | SchemaNode::Empty { name }
            | SchemaNode::Custom { name, .. } => name,
        }
    }

    /// Short label for error messages.
    pub fn type_label(&self) -> &str {
        match self {
            SchemaNode::Primitive { .. } => "primitive",
            SchemaNode::TString { .. } => "tstring",
            SchemaNode::TObject { .. } => "tobject",
            SchemaNode::StlString { .. } => "stl-string",
            SchemaNode::StlSequence { .. } => "stl-sequence",
            SchemaNode::StlMap { .. } => "stl-map",
            SchemaNode::TArray { .. } => "t-array",
            SchemaNode::CStyleArray { .. } => "c-style-array",
            SchemaNode::Class { .. } => "class",
            SchemaNode::Pointer { .. } => "pointer",
            SchemaNode::Empty { .. } => "empty",
            SchemaNode::Custom { type_name, .. } => type_name,
        }
    }
}
