//! Schema declaration for document nodes.

use folio_graph::{FILE_TYPE, LINK_SUFFIX, MDX_TYPE, ScalarType, SchemaActions, TypeDef};

use crate::IMAGE_FIELD;

/// Declare the document frontmatter shape, the annotated fields and the
/// featured image link.
///
/// Declaring frontmatter up front keeps queries on keys that no document
/// happens to set (say, `navigationLabel`) valid. Queries on `fields` are
/// limited to what annotation attaches.
pub fn declare_schema(actions: &dyn SchemaActions) {
    let link_key = format!("{IMAGE_FIELD}{LINK_SUFFIX}");

    actions.create_types(vec![
        TypeDef::node(MDX_TYPE)
            .nested("frontmatter", "Frontmatter")
            .nested("fields", "MdxFields")
            .link(IMAGE_FIELD, FILE_TYPE, &link_key),
        TypeDef::object("Frontmatter")
            .scalar("title", ScalarType::String)
            .scalar("navigationLabel", ScalarType::String)
            .scalar("status", ScalarType::String)
            .scalar("date", ScalarType::Date)
            .scalar("featuredImageUrl", ScalarType::String),
        TypeDef::object("MdxFields")
            .scalar("slug", ScalarType::String)
            .scalar("owner", ScalarType::String)
            .scalar("parent", ScalarType::String),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_graph::{ContentGraph, NodeQuery, QueryError, QueryRunner, SortOrder};

    #[test]
    fn test_declares_frontmatter_and_link() {
        let graph = ContentGraph::new();
        declare_schema(&graph);

        let sdl = graph.type_definitions();
        assert!(sdl.contains("type Mdx implements Node {"));
        assert!(sdl.contains("  frontmatter: Frontmatter\n"));
        assert!(sdl.contains(
            "  featuredImageUrlSharp: File @link(from: \"featuredImageUrlSharp___NODE\")\n"
        ));
        assert!(sdl.contains("  navigationLabel: String\n"));
        assert!(sdl.contains("  date: Date\n"));
    }

    #[test]
    fn test_queries_on_annotated_fields_are_declared() {
        let graph = ContentGraph::new();
        declare_schema(&graph);

        let sdl = graph.type_definitions();
        assert!(sdl.contains("  fields: MdxFields\n"));
        assert!(sdl.contains("type MdxFields {\n  owner: String\n  parent: String\n  slug: String\n}"));

        // No documents yet: only declarations can vouch for the paths
        let query = NodeQuery::all(MDX_TYPE)
            .eq("fields.owner", "source")
            .sort_by("fields.slug", SortOrder::Asc);
        assert!(graph.run_query(&query).unwrap().is_empty());

        let unknown = NodeQuery::all(MDX_TYPE).eq("fields.category", "x");
        assert!(matches!(
            graph.run_query(&unknown),
            Err(QueryError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_declaring_twice_is_harmless() {
        let graph = ContentGraph::new();
        declare_schema(&graph);
        let first = graph.type_definitions();
        declare_schema(&graph);
        assert_eq!(graph.type_definitions(), first);
    }
}
