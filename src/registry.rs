//! # Reader Factory Registry
//!
//! Readers are built from schema nodes by factories. The registry keeps
//! factories in a stable total order (priority descending, registration
//! order breaking ties) and asks each in turn: the first factory that
//! recognizes a node builds the reader, a factory that declines returns
//! `None`, and a node no factory recognizes fails the build.
//!
//! The registry is a plain owned value, not process-wide state. Callers
//! that want the stock behavior start from [`Registry::with_defaults`] and
//! register their own factories on top; a higher priority shadows the
//! built-in handling of a node.
//!
//! ## Built-in priorities
//!
//! | Factory | Priority |
//! |---------|----------|
//! | c-style arrays | 20 |
//! | everything else | 10 (default) |
//! | object headers | 0 |

use eyre::{bail, ensure, Result};
use hashbrown::HashSet;

use crate::payload::PrimitiveKind;
use crate::readers::Reader;
use crate::schema::SchemaNode;

/// Default factory priority.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Builds readers for the schema nodes it recognizes.
pub trait ReaderFactory {
    /// Unique factory name; duplicate registrations are rejected.
    fn name(&self) -> &str;

    /// Call order: higher priorities are consulted first.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Build a reader for `node`, or decline with `Ok(None)`. Child nodes
    /// are built back through the registry so user factories participate in
    /// the recursion.
    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>>;
}

pub struct Registry {
    factories: Vec<Box<dyn ReaderFactory>>,
    names: HashSet<String>,
}

impl Registry {
    /// A registry with no factories at all.
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// A registry with the built-in factory set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        let defaults: Vec<Box<dyn ReaderFactory>> = vec![
            Box::new(CStyleArrayFactory),
            Box::new(BasicTypeFactory),
            Box::new(TStringFactory),
            Box::new(TObjectFactory),
            Box::new(StlStringFactory),
            Box::new(StlSeqFactory),
            Box::new(StlMapFactory),
            Box::new(TArrayFactory),
            Box::new(ClassFactory),
            Box::new(EmptyFactory),
            Box::new(ObjectHeaderFactory),
        ];
        for factory in defaults {
            registry.names.insert(factory.name().to_string());
            registry.factories.push(factory);
        }
        registry
            .factories
            .sort_by_key(|f| std::cmp::Reverse(f.priority()));
        registry
    }

    /// Register a factory, keeping the stable priority order.
    pub fn register(&mut self, factory: Box<dyn ReaderFactory>) -> Result<()> {
        ensure!(
            !self.names.contains(factory.name()),
            "a factory named {} is already registered",
            factory.name()
        );
        self.names.insert(factory.name().to_string());
        self.factories.push(factory);
        // stable sort: equal priorities keep registration order
        self.factories.sort_by_key(|f| std::cmp::Reverse(f.priority()));
        Ok(())
    }

    pub fn factory_names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|f| f.name())
    }

    /// Build the reader tree for a schema node. The first factory (in
    /// priority order) that recognizes the node wins.
    pub fn build(&self, node: &SchemaNode) -> Result<Reader> {
        for factory in &self.factories {
            if let Some(reader) = factory.build(node, self)? {
                return Ok(reader);
            }
        }
        bail!(
            "unknown schema node: {} for {}",
            node.type_label(),
            node.name()
        );
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

struct BasicTypeFactory;

impl ReaderFactory for BasicTypeFactory {
    fn name(&self) -> &str {
        "builtin.primitive"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::Primitive { name, kind } = node else {
            return Ok(None);
        };
        Ok(Some(Reader::primitive(name.clone(), *kind)))
    }
}

struct TStringFactory;

impl ReaderFactory for TStringFactory {
    fn name(&self) -> &str {
        "builtin.tstring"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::TString { name } = node else {
            return Ok(None);
        };
        Ok(Some(Reader::tstring(name.clone())))
    }
}

struct TObjectFactory;

impl ReaderFactory for TObjectFactory {
    fn name(&self) -> &str {
        "builtin.tobject"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::TObject { name, retain } = node else {
            return Ok(None);
        };
        Ok(Some(Reader::tobject(name.clone(), *retain)))
    }
}

struct StlStringFactory;

impl ReaderFactory for StlStringFactory {
    fn name(&self) -> &str {
        "builtin.stl-string"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::StlString { name, with_header } = node else {
            return Ok(None);
        };
        Ok(Some(Reader::stl_string(name.clone(), *with_header)))
    }
}

struct StlSeqFactory;

impl ReaderFactory for StlSeqFactory {
    fn name(&self) -> &str {
        "builtin.stl-sequence"
    }

    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::StlSequence {
            name,
            with_header,
            element,
        } = node
        else {
            return Ok(None);
        };
        let element = registry.build(element)?;
        Ok(Some(Reader::stl_sequence(name.clone(), *with_header, element)))
    }
}

struct StlMapFactory;

impl ReaderFactory for StlMapFactory {
    fn name(&self) -> &str {
        "builtin.stl-map"
    }

    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::StlMap {
            name,
            with_header,
            layout,
            key,
            value,
        } = node
        else {
            return Ok(None);
        };
        let key = registry.build(key)?;
        let value = registry.build(value)?;
        Ok(Some(Reader::stl_map(
            name.clone(),
            *with_header,
            *layout,
            key,
            value,
        )))
    }
}

struct TArrayFactory;

impl ReaderFactory for TArrayFactory {
    fn name(&self) -> &str {
        "builtin.t-array"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::TArray { name, kind } = node else {
            return Ok(None);
        };
        ensure!(
            *kind != PrimitiveKind::Bool,
            "counted arrays of booleans do not exist in the format (field {})",
            name
        );
        Ok(Some(Reader::tarray(name.clone(), *kind)))
    }
}

struct CStyleArrayFactory;

impl ReaderFactory for CStyleArrayFactory {
    fn name(&self) -> &str {
        "builtin.c-style-array"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::CStyleArray {
            name,
            flat_size,
            element,
        } = node
        else {
            return Ok(None);
        };
        ensure!(
            *flat_size != 0,
            "flat size of c-style array {} cannot be 0",
            name
        );
        let element = registry.build(element)?;
        Ok(Some(Reader::c_array(name.clone(), *flat_size, element)))
    }
}

struct ClassFactory;

impl ReaderFactory for ClassFactory {
    fn name(&self) -> &str {
        "builtin.class"
    }

    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::Class { name, members } = node else {
            return Ok(None);
        };

        // An unsized c-style array locates its end from the event boundary,
        // so nothing may follow it within the class.
        for member in members.iter().take(members.len().saturating_sub(1)) {
            if let SchemaNode::CStyleArray {
                name: member_name,
                flat_size,
                ..
            } = member
            {
                ensure!(
                    *flat_size > 0,
                    "unsized c-style array {} must be the last member of {}",
                    member_name,
                    name
                );
            }
        }

        let members = members
            .iter()
            .map(|m| registry.build(m))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Reader::class_body(name.clone(), members)))
    }
}

struct ObjectHeaderFactory;

impl ReaderFactory for ObjectHeaderFactory {
    fn name(&self) -> &str {
        "builtin.object-header"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn build(&self, node: &SchemaNode, registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::Pointer { name, element } = node else {
            return Ok(None);
        };
        let element = registry.build(element)?;
        Ok(Some(Reader::object_header(name.clone(), element)))
    }
}

struct EmptyFactory;

impl ReaderFactory for EmptyFactory {
    fn name(&self) -> &str {
        "builtin.empty"
    }

    fn build(&self, node: &SchemaNode, _registry: &Registry) -> Result<Option<Reader>> {
        let SchemaNode::Empty { name } = node else {
            return Ok(None);
        };
        Ok(Some(Reader::empty(name.clone())))
    }
}
