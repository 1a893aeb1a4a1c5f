use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plex-export")]
#[command(author, version, about = "Browse a Plex Media Server catalog as a lazily loaded object graph")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL, optionally with ?X-Plex-Token=<token>
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Authentication token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Extra request header as NAME=VALUE (repeatable)
    #[arg(long = "header", global = true, value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the server and show what an export would see
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the children of a node
    Ls {
        /// Keys to follow from the root
        path: Vec<String>,
    },

    /// Show the attributes of a node
    Show {
        /// Keys to follow from the root
        path: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search below a node
    Search {
        /// Text to search for
        query: String,

        /// Keys to follow from the root
        path: Vec<String>,
    },

    /// Print the artwork of a node
    Image {
        /// Keys to follow from the root
        path: Vec<String>,

        /// Use the background art instead of the thumbnail
        #[arg(long)]
        art: bool,

        /// Download the image and print it as a data URI
        #[arg(long)]
        data_uri: bool,
    },

    /// Load several levels below a node and print them as a tree
    Tree {
        /// Keys to follow from the root
        path: Vec<String>,

        /// Number of levels to load
        #[arg(short, long, default_value = "1")]
        depth: usize,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}
