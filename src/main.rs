mod cli;

use plex_export::config::{self, Config};
use plex_export::export::ExportContext;
use plex_catalog::{Catalog, ImageSlot, Node};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "plex_export=debug,plex_catalog=debug".to_string()
        } else {
            "plex_export=info,plex_catalog=info".to_string()
        }
    });

    // Logs go to stderr so command output can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::load_config_or_default(cli.config.as_deref())?.with_overrides(
        cli.url,
        cli.token,
        &cli.headers,
        cli.timeout,
    )?;
    let root = open_root(&config)?;

    match cli.command {
        Commands::Check { json } => check(&root, json),
        Commands::Ls { path } => list(navigate(&root, &path)?),
        Commands::Show { path, json } => show(navigate(&root, &path)?, json),
        Commands::Search { query, path } => search(navigate(&root, &path)?, &query),
        Commands::Image {
            path,
            art,
            data_uri,
        } => {
            let slot = if art { ImageSlot::Art } else { ImageSlot::Thumb };
            image(navigate(&root, &path)?, slot, data_uri)
        }
        Commands::Tree { path, depth } => tree(navigate(&root, &path)?, depth),
    }
}

fn open_root(config: &Config) -> Result<Node> {
    let mut builder = Catalog::builder().timeout(config.timeout());
    if let Some(headers) = config.request_headers()? {
        builder = builder.headers(headers);
    }
    let catalog = builder.build();

    let root = catalog.root(&config.server_url()?)?;
    tracing::debug!("Using server {}", root.endpoint());
    Ok(root)
}

/// Follow `path` from `root` with keyed lookups. Collections continue with
/// their first node.
fn navigate<'a>(root: &'a Node, path: &[String]) -> Result<&'a Node> {
    let mut node = root;
    for key in path {
        let value = node
            .get(key)
            .with_context(|| format!("Failed to look up '{}'", key))?;
        node = value
            .first_node()
            .with_context(|| format!("'{}' is an attribute, not a node", key))?;
    }
    Ok(node)
}

fn check(root: &Node, json: bool) -> Result<()> {
    let context = ExportContext::prepare(root)?;
    let summary = context.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Server: {}", summary.name.as_deref().unwrap_or("unknown"));
    println!("Version: {}", summary.version.as_deref().unwrap_or("unknown"));
    println!(
        "Machine identifier: {}",
        summary.machine_identifier.as_deref().unwrap_or("unknown")
    );
    println!(
        "Current server: {}",
        summary.current_server.as_deref().unwrap_or("not listed")
    );
    println!("Library entries: {}", summary.library_entries);
    println!("plex-export {}", summary.exporter_version);

    Ok(())
}

fn list(node: &Node) -> Result<()> {
    for child in node.iter()? {
        println!(
            "{:<15} {:<30} {}",
            child.kind().name(),
            label(child),
            child.element_attr("key").unwrap_or("-")
        );
    }
    Ok(())
}

fn show(node: &Node, json: bool) -> Result<()> {
    let attributes = node.attributes()?;

    if json {
        println!("{}", serde_json::to_string_pretty(attributes)?);
        return Ok(());
    }

    println!("{} at {}", node.kind().name(), node.endpoint());
    for (name, value) in attributes {
        println!("  {}: {}", name, value);
    }
    println!("Children: {}", node.len()?);
    Ok(())
}

fn search(node: &Node, query: &str) -> Result<()> {
    let results = node
        .search(query)?
        .with_context(|| format!("Nothing searchable below {}", node.endpoint()))?;
    tracing::info!("Searching {} for {:?}", results.endpoint(), query);

    if results.is_empty()? {
        println!("No results for {:?}", query);
        return Ok(());
    }
    list(&results)
}

fn image(node: &Node, slot: ImageSlot, data_uri: bool) -> Result<()> {
    let image = node
        .image(slot)?
        .with_context(|| format!("{} has no {} image", label(node), slot.attr()))?;

    if data_uri {
        let encoded = image
            .base64_encoded()
            .with_context(|| format!("Failed to download {}", image.reference()))?;
        println!("{}", encoded);
    } else {
        println!("{}", image.url());
    }
    Ok(())
}

fn tree(node: &Node, depth: usize) -> Result<()> {
    node.preload(depth)?;
    println!("{} {}", node.kind().name(), label(node));
    print_children(node, depth, 1)
}

fn print_children(node: &Node, depth: usize, level: usize) -> Result<()> {
    if level > depth {
        return Ok(());
    }
    for child in node.iter()? {
        println!("{}{} {}", "  ".repeat(level), child.kind().name(), label(child));
        print_children(child, depth, level + 1)?;
    }
    Ok(())
}

fn label(node: &Node) -> String {
    ["title", "name", "tag", "file"]
        .iter()
        .find_map(|name| node.element_attr(name))
        .map(str::to_string)
        .unwrap_or_else(|| node.identities().join(", "))
}
