//! Page generation for annotated documents.

use folio_config::SourceRoots;
use folio_graph::{
    MDX_TYPE, Node, NodeId, NodeQuery, PageActions, PageDescriptor, QueryRunner, Reporter,
    SortOrder,
};
use serde::Serialize;

use crate::OWNER_NAME;
use crate::error::PagesError;

/// Title or navigation label marking placeholder documents.
const DUMMY: &str = "dummy";
/// Status marking unpublished documents.
const DRAFT: &str = "draft";

/// Context handed to the page component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePageContext {
    pub id: NodeId,
    pub prev: Option<NeighborSummary>,
    pub next: Option<NeighborSummary>,
    pub parent: String,
}

/// What a page needs to know about an adjacent document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborSummary {
    pub frontmatter: NeighborFrontmatter,
    pub fields: NeighborFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborFrontmatter {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborFields {
    pub slug: Option<String>,
}

impl NeighborSummary {
    fn of(node: &Node) -> Self {
        let frontmatter = node.as_mdx().map(|mdx| &mdx.frontmatter);
        Self {
            frontmatter: NeighborFrontmatter {
                title: frontmatter.and_then(|f| f.title.clone()),
                status: frontmatter.and_then(|f| f.status.clone()),
            },
            fields: NeighborFields {
                slug: node.field_str("slug").map(str::to_owned),
            },
        }
    }
}

/// Published source-root documents, newest first.
pub fn source_documents_query() -> NodeQuery {
    NodeQuery::all(MDX_TYPE)
        .ne("frontmatter.title", DUMMY)
        .ne("frontmatter.navigationLabel", DUMMY)
        .ne("frontmatter.status", DRAFT)
        .eq("fields.owner", OWNER_NAME)
        .sort_by("frontmatter.date", SortOrder::Desc)
}

/// Request one page per published source-root document.
///
/// Does nothing when no source roots are configured. Pages are requested in
/// query order, each linked to its neighbors.
///
/// # Errors
///
/// A failed query is reported through [`Reporter::panic_on_build`] and
/// returned as [`PagesError::Query`]; no page is requested in that case.
pub fn generate_pages(
    source: Option<&SourceRoots>,
    component: &str,
    queries: &dyn QueryRunner,
    pages: &dyn PageActions,
    reporter: &dyn Reporter,
) -> Result<(), PagesError> {
    if source.is_none() {
        tracing::debug!("no source roots configured, skipping page generation");
        return Ok(());
    }

    let edges = match queries.run_query(&source_documents_query()) {
        Ok(edges) => edges,
        Err(e) => {
            reporter.panic_on_build(&format!("error while loading source documents: {e}"));
            return Err(e.into());
        }
    };

    let mut descriptors = Vec::with_capacity(edges.len());
    for edge in &edges {
        let context = SourcePageContext {
            id: edge.node.id.clone(),
            prev: edge.previous.as_ref().map(NeighborSummary::of),
            next: edge.next.as_ref().map(NeighborSummary::of),
            parent: edge.node.field_str("parent").unwrap_or_default().to_owned(),
        };
        descriptors.push(PageDescriptor {
            path: edge.node.field_str("slug").unwrap_or_default().to_owned(),
            component: component.to_owned(),
            context: serde_json::to_value(context)?,
        });
    }

    for page in descriptors {
        pages.create_page(page);
    }
    reporter.info(&format!("requested {} source pages", edges.len()));
    Ok(())
}
