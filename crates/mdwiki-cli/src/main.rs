//! mdwiki command line entry point

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mdwiki_core::{PageRenderer, Wiki, WikiConfig};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "mdwiki.yaml";

#[derive(Parser)]
#[command(name = "mdwiki")]
#[command(about = "Publish an Obsidian-style Markdown vault as a linked wiki")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MDWIKI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Import the vault, then resolve links to newly created pages
    Import {
        /// Vault directory (defaults to `vault.path` from the config)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point unresolved links at pages whose title now matches
    ResolveLinks,

    /// Render a Markdown file to HTML without touching the database
    Render { file: PathBuf },

    /// Print a page with its tags and backlinks
    Show { slug: String },

    /// Search page titles and content
    Search {
        query: String,

        /// Result page, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },

    /// List pages carrying a tag, or every tag with its page count
    Tags { name: Option<String> },

    /// Print page, link and tag counts
    Stats,
}

fn load_config(path: Option<&Path>) -> Result<WikiConfig> {
    match path {
        Some(path) => WikiConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                WikiConfig::load(default)
                    .with_context(|| format!("Failed to load config from {:?}", default))
            } else {
                Ok(WikiConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    log::debug!(
        "Vault {:?}, database {:?}",
        config.vault.path,
        config.storage.database
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Commands::Render { file } = &cli.command {
        return render_file(&config, file, &mut out);
    }

    let mut wiki = Wiki::open(config.clone()).with_context(|| {
        format!(
            "Failed to open database {:?}",
            config.storage.database
        )
    })?;
    run(&mut wiki, cli.command, &mut out)
}

fn run(wiki: &mut Wiki, command: Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Import { vault, json } => {
            let vault = vault.unwrap_or_else(|| wiki.config().vault.path.clone());
            import(wiki, &vault, json, out)
        }
        Commands::ResolveLinks => {
            let resolved = wiki.resolve_broken_links()?;
            writeln!(out, "Resolved {} link(s)", resolved)?;
            Ok(())
        }
        Commands::Render { file } => render_file(wiki.config(), &file, out),
        Commands::Show { slug } => show(wiki, &slug, out),
        Commands::Search { query, page } => search(wiki, &query, page, out),
        Commands::Tags { name } => tags(wiki, name.as_deref(), out),
        Commands::Stats => stats(wiki, out),
    }
}

fn import(wiki: &mut Wiki, vault: &Path, json: bool, out: &mut dyn Write) -> Result<()> {
    let report = wiki
        .sync_vault(vault)
        .with_context(|| format!("Import of {:?} failed", vault))?;

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    let stats = &report.stats;
    writeln!(out, "Import completed in {:.2}s", stats.duration_seconds)?;
    writeln!(out, "  Total files: {}", stats.total_files)?;
    writeln!(out, "  New:         {}", stats.new_files)?;
    writeln!(out, "  Updated:     {}", stats.updated_files)?;
    writeln!(out, "  Unchanged:   {}", stats.unchanged_files)?;
    writeln!(out, "  Errors:      {}", stats.errors)?;
    writeln!(out, "  Links resolved: {}", report.resolved_links)?;
    Ok(())
}

fn render_file(config: &WikiConfig, file: &Path, out: &mut dyn Write) -> Result<()> {
    let markdown = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {:?}", file))?;
    let renderer = PageRenderer::new(config.site.page_url_prefix.clone());
    writeln!(out, "{}", renderer.render_page(&markdown).html)?;
    Ok(())
}

fn show(wiki: &Wiki, slug: &str, out: &mut dyn Write) -> Result<()> {
    let page = wiki
        .page_by_slug(slug)?
        .ok_or_else(|| anyhow!("No page with slug '{}'", slug))?;

    writeln!(out, "{}", page.title)?;
    writeln!(out)?;
    writeln!(out, "{}", page.html)?;

    let tags: Vec<String> = wiki
        .page_tags(page.id)?
        .into_iter()
        .map(|tag| format!("#{}", tag.name))
        .collect();
    if !tags.is_empty() {
        writeln!(out)?;
        writeln!(out, "Tags: {}", tags.join(" "))?;
    }

    let backlinks = wiki.backlinks(page.id)?;
    if !backlinks.is_empty() {
        writeln!(out)?;
        writeln!(out, "Backlinks:")?;
        for backlink in backlinks {
            writeln!(out, "  {} ({})", backlink.title, backlink.slug)?;
        }
    }
    Ok(())
}

fn search(wiki: &Wiki, query: &str, page: usize, out: &mut dyn Write) -> Result<()> {
    let results = wiki.search(query, page)?;
    if results.hits.is_empty() {
        writeln!(out, "No results found for \"{}\".", query.trim())?;
        return Ok(());
    }

    let pagination = &results.pagination;
    writeln!(
        out,
        "Found {} result(s) for \"{}\" (page {} of {})",
        pagination.total_results,
        query.trim(),
        pagination.current_page,
        pagination.total_pages
    )?;
    for hit in &results.hits {
        writeln!(out, "- {} [{}]", hit.title, hit.slug)?;
        writeln!(out, "  {}", hit.excerpt)?;
    }
    Ok(())
}

fn tags(wiki: &Wiki, name: Option<&str>, out: &mut dyn Write) -> Result<()> {
    match name {
        Some(name) => {
            let name = name.trim_start_matches('#');
            for page in wiki.pages_with_tag(name)? {
                writeln!(out, "{} ({})", page.title, page.slug)?;
            }
        }
        None => {
            for (tag, count) in wiki.tag_counts()? {
                writeln!(out, "#{}\t{}", tag.name, count)?;
            }
        }
    }
    Ok(())
}

fn stats(wiki: &Wiki, out: &mut dyn Write) -> Result<()> {
    let counts = wiki.counts()?;
    writeln!(out, "Pages:            {}", counts.pages)?;
    writeln!(out, "Links:            {}", counts.links)?;
    writeln!(out, "Unresolved links: {}", counts.unresolved_links)?;
    writeln!(out, "Tags:             {}", counts.tags)?;
    Ok(())
}
