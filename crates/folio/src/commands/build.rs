//! `folio build` command implementation.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use folio_cache::{Cache, FileCache, NullCache};
use folio_config::{CliSettings, Config, SourceRoots};
use folio_graph::{ContentGraph, MDX_TYPE, PageRegistry, TracingReporter, load_source_dir};
use folio_source::{AnnotateOutcome, RemoteFileNodeCreator, SourcePlugin, UreqFetcher};
use rayon::prelude::*;

use crate::error::CliError;
use crate::output::Output;

/// Name of the manifest written to the output directory.
const MANIFEST_FILENAME: &str = "pages.json";

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source root directory name (overrides config, repeatable).
    #[arg(short, long = "source", value_name = "NAME")]
    sources: Vec<String>,

    /// Output directory for pages.json (default: .folio/build/).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable caching.
    #[arg(long)]
    no_cache: bool,

    /// Skip downloading featured images.
    #[arg(long)]
    no_assets: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source: source_override(self.sources),
            output_dir: self.output_dir,
            cache_enabled: self.no_cache.then_some(false),
            assets_enabled: self.no_assets.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let site = &config.site_resolved;

        if config.theme.source.is_none() {
            output.warning("No source roots configured, no pages will be generated");
        }
        output.field("Root", site.root.display());
        output.field("Output", site.output_dir.display());

        let mut plugin = SourcePlugin::new(&config.theme);
        if config.assets.enabled {
            let cache: Box<dyn Cache> = if site.cache_enabled {
                Box::new(FileCache::new(site.cache_dir(), version))
            } else {
                Box::new(NullCache)
            };
            let fetcher = UreqFetcher::new(Duration::from_secs(config.assets.timeout_secs));
            plugin = plugin.with_remote_files(RemoteFileNodeCreator::new(
                Box::new(fetcher),
                cache.as_ref(),
                site.assets_dir(),
            ));
        }

        let graph = ContentGraph::new();
        plugin.create_schema_customization(&graph);

        for (name, dir) in config.source_dirs() {
            let summary = load_source_dir(&graph, &name, &dir)?;
            output.sourced(&name, summary);
        }

        let documents = graph.nodes_of_type(MDX_TYPE);
        let outcomes = documents
            .par_iter()
            .map(|node| plugin.on_create_node(node, &graph, &graph))
            .collect::<Result<Vec<_>, _>>()?;
        let annotated = outcomes
            .iter()
            .filter(|outcome| **outcome == AnnotateOutcome::Annotated)
            .count();
        tracing::info!(annotated, documents = documents.len(), "annotated documents");

        let registry = PageRegistry::new();
        plugin.create_pages(&graph, &registry, &TracingReporter)?;

        fs::create_dir_all(&site.output_dir)?;
        let manifest = site.output_dir.join(MANIFEST_FILENAME);
        let pages = registry.pages();
        fs::write(&manifest, serde_json::to_string_pretty(&pages)?)?;

        output.success(&format!(
            "Built {} pages from {annotated} documents to {}",
            pages.len(),
            manifest.display()
        ));
        Ok(())
    }
}

/// `--source` values as a source root override.
fn source_override(mut sources: Vec<String>) -> Option<SourceRoots> {
    match sources.len() {
        0 => None,
        1 => sources.pop().map(SourceRoots::Single),
        _ => Some(SourceRoots::Many(sources)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_override() {
        assert_eq!(source_override(Vec::new()), None);
        assert_eq!(
            source_override(vec!["docs".to_owned()]),
            Some(SourceRoots::Single("docs".to_owned()))
        );
        assert_eq!(
            source_override(vec!["blog".to_owned(), "notes".to_owned()]),
            Some(SourceRoots::Many(vec!["blog".to_owned(), "notes".to_owned()]))
        );
    }
}
