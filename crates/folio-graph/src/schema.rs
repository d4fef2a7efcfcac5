//! Type definitions for the content graph.
//!
//! Plugins declare types through [`SchemaActions::create_types`]. Declarations
//! are additive: declaring an already known type merges the new fields into
//! it, with the later declaration winning for a field declared twice.

use std::collections::BTreeMap;
use std::fmt;

/// Fields every node type exposes without being declared.
pub const BUILTIN_FIELDS: &[&str] = &["id", "parent", "children", "internal", "fields"];

/// Scalar field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Date,
    Boolean,
    Int,
}

impl ScalarType {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
            Self::Int => "Int",
        }
    }
}

/// Kind of a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    /// Nested object of the named type.
    Object(String),
    /// Reference to another node, resolved lazily through the node key `from`.
    Link { to: String, from: String },
}

/// A declared object or node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    /// Whether the type implements the node interface.
    pub is_node: bool,
    pub fields: BTreeMap<String, FieldKind>,
}

impl TypeDef {
    /// Start a node type declaration.
    pub fn node(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            is_node: true,
            fields: BTreeMap::new(),
        }
    }

    /// Start a plain object type declaration.
    pub fn object(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            is_node: false,
            fields: BTreeMap::new(),
        }
    }

    /// Add a scalar field.
    #[must_use]
    pub fn scalar(mut self, name: &str, scalar: ScalarType) -> Self {
        self.fields.insert(name.to_owned(), FieldKind::Scalar(scalar));
        self
    }

    /// Add a nested object field.
    #[must_use]
    pub fn nested(mut self, name: &str, type_name: &str) -> Self {
        self.fields
            .insert(name.to_owned(), FieldKind::Object(type_name.to_owned()));
        self
    }

    /// Add a link field resolved through the node key `from`.
    #[must_use]
    pub fn link(mut self, name: &str, to: &str, from: &str) -> Self {
        self.fields.insert(
            name.to_owned(),
            FieldKind::Link {
                to: to.to_owned(),
                from: from.to_owned(),
            },
        );
        self
    }
}

impl fmt::Display for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)?;
        if self.is_node {
            f.write_str(" implements Node")?;
        }
        f.write_str(" {\n")?;
        for (name, kind) in &self.fields {
            match kind {
                FieldKind::Scalar(scalar) => writeln!(f, "  {name}: {}", scalar.as_str())?,
                FieldKind::Object(type_name) => writeln!(f, "  {name}: {type_name}")?,
                FieldKind::Link { to, from } => {
                    writeln!(f, "  {name}: {to} @link(from: \"{from}\")")?;
                }
            }
        }
        f.write_str("}")
    }
}

/// Registry of declared types.
#[derive(Debug, Default, Clone)]
pub struct Schema {
    types: BTreeMap<String, TypeDef>,
}

impl Schema {
    /// Merge `def` into the registry.
    pub fn add(&mut self, def: TypeDef) {
        match self.types.get_mut(&def.name) {
            Some(existing) => {
                existing.is_node |= def.is_node;
                existing.fields.extend(def.fields);
            }
            None => {
                self.types.insert(def.name.clone(), def);
            }
        }
    }

    /// Declared type by name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Declared kind of `field` on `type_name`.
    pub fn field(&self, type_name: &str, field: &str) -> Option<&FieldKind> {
        self.types.get(type_name)?.fields.get(field)
    }

    /// Whether a dotted `path` resolves through declarations alone.
    ///
    /// Built-in node fields are opaque unless the type declares them: with
    /// no declaration anything below `fields` or `internal` is accepted.
    /// Paths that descend into an undeclared object type are accepted from
    /// that point on.
    pub fn declares_path(&self, type_name: &str, path: &str) -> bool {
        let mut segments = path.split('.');
        let Some(first) = segments.next() else {
            return false;
        };
        if BUILTIN_FIELDS.contains(&first) && self.field(type_name, first).is_none() {
            return true;
        }

        let mut current = type_name.to_owned();
        let mut segment = first;
        loop {
            let Some(def) = self.types.get(&current) else {
                // Undeclared object type: nothing more to check against.
                return current != type_name;
            };
            match def.fields.get(segment) {
                None => return false,
                Some(FieldKind::Scalar(_)) => return segments.next().is_none(),
                Some(FieldKind::Link { .. }) => return true,
                Some(FieldKind::Object(next)) => match segments.next() {
                    None => return true,
                    Some(s) => {
                        current.clone_from(next);
                        segment = s;
                    }
                },
            }
        }
    }

    /// SDL-style dump of every declared type.
    pub fn type_definitions(&self) -> String {
        self.types
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Schema customization callback handed to plugins.
pub trait SchemaActions: Send + Sync {
    /// Declare (or extend) types.
    fn create_types(&self, types: Vec<TypeDef>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        let mut schema = Schema::default();
        schema.add(
            TypeDef::node("Mdx")
                .nested("frontmatter", "Frontmatter")
                .link("featuredImageUrlSharp", "File", "featuredImageUrlSharp___NODE"),
        );
        schema.add(
            TypeDef::object("Frontmatter")
                .scalar("title", ScalarType::String)
                .scalar("date", ScalarType::Date),
        );
        schema
    }

    #[test]
    fn test_declares_path() {
        let schema = schema();
        assert!(schema.declares_path("Mdx", "id"));
        assert!(schema.declares_path("Mdx", "fields.owner"));
        assert!(schema.declares_path("Mdx", "frontmatter"));
        assert!(schema.declares_path("Mdx", "frontmatter.title"));
        assert!(schema.declares_path("Mdx", "featuredImageUrlSharp"));
        assert!(!schema.declares_path("Mdx", "frontmatter.status"));
        assert!(!schema.declares_path("Mdx", "frontmatter.title.length"));
        assert!(!schema.declares_path("Mdx", "slug"));
        assert!(!schema.declares_path("File", "relativePath"));
    }

    #[test]
    fn test_declared_builtin_field_is_checked() {
        let mut schema = schema();
        schema.add(TypeDef::node("Mdx").nested("fields", "MdxFields"));
        schema.add(TypeDef::object("MdxFields").scalar("slug", ScalarType::String));

        assert!(schema.declares_path("Mdx", "fields.slug"));
        assert!(!schema.declares_path("Mdx", "fields.owner"));
        assert!(schema.declares_path("Mdx", "internal.owner"));
        assert!(schema.declares_path("File", "fields.anything"));
    }

    #[test]
    fn test_undeclared_nested_type_is_open() {
        let mut schema = Schema::default();
        schema.add(TypeDef::node("Mdx").nested("frontmatter", "Frontmatter"));
        assert!(schema.declares_path("Mdx", "frontmatter.anything"));
    }

    #[test]
    fn test_redeclaration_merges_fields() {
        let mut schema = schema();
        schema.add(TypeDef::object("Frontmatter").scalar("status", ScalarType::String));

        let def = schema.get("Frontmatter").unwrap();
        assert_eq!(
            def.fields.keys().collect::<Vec<_>>(),
            vec!["date", "status", "title"]
        );
    }

    #[test]
    fn test_type_definitions_output() {
        let mut schema = Schema::default();
        schema.add(
            TypeDef::node("Mdx")
                .nested("frontmatter", "Frontmatter")
                .link("featuredImageUrlSharp", "File", "featuredImageUrlSharp___NODE"),
        );
        assert_eq!(
            schema.type_definitions(),
            "type Mdx implements Node {\n  featuredImageUrlSharp: File @link(from: \"featuredImageUrlSharp___NODE\")\n  frontmatter: Frontmatter\n}"
        );
    }
}
