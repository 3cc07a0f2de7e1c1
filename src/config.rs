// src/config.rs
// Per-repository configuration from .symdex/config.toml

use crate::error::{Result, SymdexError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the per-repository state directory.
pub const STATE_DIR: &str = ".symdex";

/// File extensions mapped to language names.
const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("py", "python"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("rs", "rust"),
    ("java", "java"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("c", "cpp"),
    ("h", "cpp"),
    ("hpp", "cpp"),
    ("kt", "kotlin"),
    ("kts", "kotlin"),
    ("swift", "swift"),
];

/// Top-level config structure
#[derive(Debug, Deserialize, Default)]
pub struct SymdexConfig {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Directory holding config.toml; set after load, not read from the file.
    #[serde(skip)]
    config_dir: PathBuf,
    /// Compiled exclusion globs, built on first use.
    #[serde(skip)]
    exclusion_globs: OnceCell<ExclusionGlobs>,
}

/// Exclusion patterns compiled two ways: as path substrings and as basenames.
#[derive(Debug)]
struct ExclusionGlobs {
    by_path: GlobSet,
    by_name: GlobSet,
}

/// Indexing configuration section
#[derive(Debug, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "IndexConfig::default_root")]
    pub root: String,
    #[serde(default = "IndexConfig::default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "IndexConfig::default_languages")]
    pub languages: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            exclude: Self::default_exclude(),
            languages: Self::default_languages(),
        }
    }
}

impl IndexConfig {
    fn default_root() -> String {
        ".".to_string()
    }

    fn default_exclude() -> Vec<String> {
        [
            "node_modules/",
            ".git/",
            "__pycache__/",
            "target/",
            "dist/",
            "build/",
            ".symdex/",
            "*.min.js",
            "*.min.css",
            "*.lock",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn default_languages() -> Vec<String> {
        [
            "python",
            "typescript",
            "javascript",
            "rust",
            "java",
            "cpp",
            "kotlin",
            "swift",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

/// Embeddings configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "EmbeddingsConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "EmbeddingsConfig::default_api_url")]
    pub api_url: String,
    #[serde(default = "EmbeddingsConfig::default_model")]
    pub model: String,
    #[serde(default = "EmbeddingsConfig::default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "EmbeddingsConfig::default_batch_size")]
    pub batch_size: usize,
    /// ~400 tokens; keeps the text inside small embedding-model windows
    #[serde(default = "EmbeddingsConfig::default_max_chars")]
    pub max_chars: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: Self::default_api_url(),
            model: Self::default_model(),
            dimensions: Self::default_dimensions(),
            batch_size: Self::default_batch_size(),
            max_chars: Self::default_max_chars(),
        }
    }
}

impl EmbeddingsConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_api_url() -> String {
        "http://localhost:11434/v1/embeddings".to_string()
    }
    fn default_model() -> String {
        "nomic-embed-text-v2-moe".to_string()
    }
    fn default_dimensions() -> usize {
        768
    }
    fn default_batch_size() -> usize {
        32
    }
    fn default_max_chars() -> usize {
        1600
    }
}

/// Database configuration section
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "DatabaseConfig::default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

impl DatabaseConfig {
    fn default_path() -> String {
        format!("{STATE_DIR}/index.db")
    }
}

impl SymdexConfig {
    /// Load config for a project root. Missing or malformed files fall back
    /// to defaults with a warning; the state directory itself need not exist.
    pub fn load(project_root: &Path) -> Self {
        let config_dir = project_root.join(STATE_DIR);
        let config_file = config_dir.join("config.toml");

        let mut config = match std::fs::read_to_string(&config_file) {
            Ok(contents) => match toml::from_str::<SymdexConfig>(&contents) {
                Ok(config) => {
                    debug!(path = %config_file.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %config_file.display(), error = %e, "Failed to parse config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %config_file.display(), "Config file not found, using defaults");
                Self::default()
            }
        };
        config.config_dir = config_dir;
        config
    }

    /// Load config by walking up from the current directory to the nearest
    /// directory containing `.symdex/` or `.git/`.
    pub fn load_from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::load(&find_project_root(&cwd)))
    }

    /// The project root this config belongs to.
    pub fn project_root(&self) -> PathBuf {
        self.config_dir
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Root of the tree to index, resolved against the project root.
    pub fn index_root(&self) -> PathBuf {
        self.project_root().join(&self.index.root)
    }

    /// Database path, relative to the project root unless absolute.
    pub fn db_path(&self) -> PathBuf {
        let raw = PathBuf::from(&self.database.path);
        if raw.is_absolute() {
            raw
        } else {
            self.project_root().join(raw)
        }
    }

    /// Check whether a path matches any exclusion pattern. Patterns apply
    /// both as path substrings (`*pattern*`) and against the basename. The
    /// substring test also sees the path with a trailing slash so that
    /// directory patterns like `__pycache__/` prune the directory itself.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let globs = self.exclusion_globs.get_or_init(|| self.compile_exclusions());
        let path_str = path.to_string_lossy();
        let path_slash = format!("{path_str}/");
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        globs.by_path.is_match(path_str.as_ref())
            || globs.by_path.is_match(&path_slash)
            || globs.by_name.is_match(&name)
    }

    fn compile_exclusions(&self) -> ExclusionGlobs {
        let mut by_path = GlobSetBuilder::new();
        let mut by_name = GlobSetBuilder::new();
        for pattern in &self.index.exclude {
            // Wrap in wildcards for the substring match, without doubling
            // stars the pattern already carries (globset rejects `**` glued
            // to other characters).
            let wrapped = format!(
                "{}{pattern}{}",
                if pattern.starts_with('*') { "" } else { "*" },
                if pattern.ends_with('*') { "" } else { "*" },
            );
            match Glob::new(&wrapped) {
                Ok(glob) => {
                    by_path.add(glob);
                }
                Err(e) => warn!(pattern = %pattern, error = %e, "Skipping invalid exclude pattern"),
            }
            if let Ok(glob) = Glob::new(pattern) {
                by_name.add(glob);
            }
        }
        ExclusionGlobs {
            by_path: by_path.build().unwrap_or_else(|_| GlobSet::empty()),
            by_name: by_name.build().unwrap_or_else(|_| GlobSet::empty()),
        }
    }

    /// Map a file to its enabled language, if any.
    pub fn language_for_file(&self, path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let lang = LANGUAGE_EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, l)| *l)?;
        if self.index.languages.iter().any(|l| l == lang) {
            Some(lang)
        } else {
            None
        }
    }

    /// Require that the database file exists, for read-only commands.
    pub fn require_db(&self) -> Result<PathBuf> {
        let path = self.db_path();
        if !path.exists() {
            return Err(SymdexError::Config(format!(
                "no index found at {} — run `symdex init && symdex index` first",
                path.display()
            )));
        }
        Ok(path)
    }

    #[cfg(test)]
    pub fn for_tests(project_root: &Path) -> Self {
        let mut config = Self::default();
        config.config_dir = project_root.join(STATE_DIR);
        config.embeddings.enabled = false;
        config.embeddings.dimensions = 4;
        config
    }
}

/// Walk up to find the directory containing `.symdex/` or `.git/`.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if current.join(STATE_DIR).exists() || current.join(".git").exists() {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return start.to_path_buf(),
        }
    }
}

/// Default config written by `symdex init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"[index]
root = "."
exclude = [
    "node_modules/",
    ".git/",
    "__pycache__/",
    "target/",
    "dist/",
    "build/",
    ".symdex/",
    "*.min.js",
]
languages = ["python", "typescript", "javascript", "rust", "java", "cpp", "kotlin", "swift"]

[embeddings]
api_url    = "http://localhost:11434/v1/embeddings"
model      = "nomic-embed-text-v2-moe"
dimensions = 768
batch_size = 32
max_chars  = 1600
enabled    = true

[database]
path = ".symdex/index.db"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config_toml() {
        let config: SymdexConfig = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(config.embeddings.dimensions, 768);
        assert_eq!(config.embeddings.batch_size, 32);
        assert!(config.embeddings.enabled);
        assert!(config.index.languages.iter().any(|l| l == "python"));
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: SymdexConfig = toml::from_str("").unwrap();
        assert_eq!(config.index.root, ".");
        assert_eq!(config.embeddings.max_chars, 1600);
        assert_eq!(config.database.path, ".symdex/index.db");
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: SymdexConfig = toml::from_str(
            r#"
[embeddings]
dimensions = 1536
"#,
        )
        .unwrap();
        assert_eq!(config.embeddings.dimensions, 1536);
        assert_eq!(config.embeddings.batch_size, 32);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config: SymdexConfig = toml::from_str(
            r#"
[index]
root = "src"
frobnicate = true
"#,
        )
        .unwrap();
        assert_eq!(config.index.root, "src");
    }

    #[test]
    fn test_is_excluded_directory_pattern() {
        let config = SymdexConfig::default();
        assert!(config.is_excluded(Path::new("/repo/node_modules/lodash/index.js")));
        assert!(config.is_excluded(Path::new("/repo/src/__pycache__/mod.pyc")));
        // The directory itself is pruned, not just files inside it
        assert!(config.is_excluded(Path::new("/repo/src/__pycache__")));
        assert!(!config.is_excluded(Path::new("/repo/src/main.py")));
    }

    #[test]
    fn test_is_excluded_basename_pattern() {
        let config = SymdexConfig::default();
        assert!(config.is_excluded(Path::new("/repo/assets/app.min.js")));
        assert!(config.is_excluded(Path::new("/repo/Cargo.lock")));
        assert!(!config.is_excluded(Path::new("/repo/app.js")));
    }

    #[test]
    fn test_language_for_file() {
        let config = SymdexConfig::default();
        assert_eq!(config.language_for_file(Path::new("a/b.py")), Some("python"));
        assert_eq!(config.language_for_file(Path::new("a/b.rs")), Some("rust"));
        assert_eq!(config.language_for_file(Path::new("a/b.tsx")), Some("typescript"));
        assert_eq!(config.language_for_file(Path::new("a/b.kt")), Some("kotlin"));
        assert_eq!(config.language_for_file(Path::new("a/b.txt")), None);
    }

    #[test]
    fn test_language_disabled_in_config() {
        let config: SymdexConfig = toml::from_str(
            r#"
[index]
languages = ["rust"]
"#,
        )
        .unwrap();
        assert_eq!(config.language_for_file(Path::new("a.rs")), Some("rust"));
        assert_eq!(config.language_for_file(Path::new("a.py")), None);
    }

    #[test]
    fn test_db_path_relative_and_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SymdexConfig::for_tests(dir.path());
        assert!(config.db_path().starts_with(dir.path()));

        config.database.path = "/tmp/elsewhere.db".to_string();
        assert_eq!(config.db_path(), PathBuf::from("/tmp/elsewhere.db"));
    }

    #[test]
    fn test_find_project_root_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("src/deep/nested");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested), dir.path());
    }
}
