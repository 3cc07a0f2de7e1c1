// src/cli/mod.rs
// CLI definitions for symdex commands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod index;
pub mod query;
pub mod serve;

pub use index::{run_index, run_init};
pub use query::{run_callees, run_callers, run_lookup, run_search, run_status};
pub use serve::run_serve;

#[derive(Parser)]
#[command(name = "symdex")]
#[command(about = "Self-maintaining per-repository code index")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialise .symdex/ in the project root
    Init {
        /// Project root directory
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },

    /// Index the codebase
    Index {
        /// Reindex all files (ignore hash cache)
        #[arg(long)]
        full: bool,

        /// Regenerate all embeddings
        #[arg(long)]
        reembed: bool,

        /// Index specific files only (e.g. from git hooks)
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Project root (default: auto-detect)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Show index statistics
    Status {
        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Search the code index with a natural language or keyword query
    Search {
        query: String,

        /// Max results
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,

        #[arg(long, conflicts_with = "text_only")]
        semantic_only: bool,

        #[arg(long)]
        text_only: bool,

        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Look up a symbol by name and show its full details
    Lookup {
        name: String,

        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Find all functions/methods that call the named symbol
    Callers {
        name: String,

        /// Call-graph hops to traverse
        #[arg(short, long, default_value_t = 1)]
        depth: u32,

        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Find all functions/methods called by the named symbol
    Callees {
        name: String,

        /// Call-graph hops to traverse
        #[arg(short, long, default_value_t = 1)]
        depth: u32,

        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Start the MCP server on stdio
    Serve {
        /// Project root
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Manage git hooks
    Hooks {
        #[command(subcommand)]
        action: HookAction,
    },
}

#[derive(Subcommand)]
pub enum HookAction {
    /// Install post-commit and post-merge hooks into .git/hooks/
    Install {
        /// Project root (must contain .git/)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

/// Resolve a config for an optional explicit project root.
pub(crate) fn load_config(path: Option<PathBuf>) -> anyhow::Result<crate::config::SymdexConfig> {
    match path {
        Some(path) => {
            let root = std::fs::canonicalize(&path)
                .map_err(|e| anyhow::anyhow!("cannot resolve {}: {e}", path.display()))?;
            Ok(crate::config::SymdexConfig::load(&root))
        }
        None => crate::config::SymdexConfig::load_from_cwd().map_err(Into::into),
    }
}
