//! Pipeline configuration.
//!
//! Everything a stage needs to locate its inputs and outputs lives in
//! [`PipelineConfig`], loaded from `<data root>/tia.toml`. Every field has a
//! default, so a missing file (or a file that sets only a few keys) yields a
//! working configuration laid out like this:
//!
//! ```text
//! <data root>/
//!   raw/posts/            crawled post pages
//!   raw/comments/         crawled comment pages
//!   staging/              flattened CSV tables
//!   network_input/        node and edge tables
//!   network_output/       centrality report and text clusters
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the configuration inside the data root.
pub const CONFIG_FILE: &str = "tia.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub munge: MungeConfig,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// Stage directories, relative to the data root unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_posts: PathBuf,
    pub raw_comments: PathBuf,
    pub staging: PathBuf,
    pub network_input: PathBuf,
    pub network_output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_posts: PathBuf::from("raw/posts"),
            raw_comments: PathBuf::from("raw/comments"),
            staging: PathBuf::from("staging"),
            network_input: PathBuf::from("network_input"),
            network_output: PathBuf::from("network_output"),
        }
    }
}

/// Output file names inside the stage directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Stem of the post table; side tables are `<stem>_<list>.csv`.
    pub posts_stem: String,
    pub comments: String,
    pub comments_dedup: String,
    pub authors_node: String,
    pub companies_node: String,
    pub edges: String,
    pub centralities: String,
    pub clusters: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            posts_stem: "posts".to_string(),
            comments: "comments.csv".to_string(),
            comments_dedup: "comments_dedup.csv".to_string(),
            authors_node: "authors_node.csv".to_string(),
            companies_node: "companies_node.csv".to_string(),
            edges: "edges.csv".to_string(),
            centralities: "centralities.csv".to_string(),
            clusters: "clusters.csv".to_string(),
        }
    }
}

/// Which fields are split out of records during flattening.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MungeConfig {
    /// Top-level post fields left out of the post schema.
    pub post_exclude: Vec<String>,
    /// Nested post objects flattened into prefixed columns.
    pub post_nested: Vec<String>,
    /// Post list fields written to side tables.
    pub post_lists: Vec<String>,
    /// Top-level comment fields left out of the comment schema.
    pub comment_exclude: Vec<String>,
    /// Nested comment objects flattened into prefixed columns.
    pub comment_nested: Vec<String>,
    /// Keys holding child comments, visited in this order.
    pub comment_descend: Vec<String>,
}

impl Default for MungeConfig {
    fn default() -> Self {
        Self {
            post_exclude: strings(&["seo", "sponsor", "author", "categories", "companies", "tags"]),
            post_nested: strings(&["author", "seo", "sponsor"]),
            post_lists: strings(&["categories", "companies", "tags"]),
            comment_exclude: strings(&["children", "replies", "author"]),
            comment_nested: strings(&["author"]),
            comment_descend: strings(&["children", "replies"]),
        }
    }
}

/// Column names the network stage joins on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub post_id: String,
    pub post_author_id: String,
    pub post_title: String,
    pub author_name: String,
    pub author_roles: String,
    pub company_id: String,
    pub company_name: String,
    pub company_founded: String,
    pub company_post: String,
    pub comment_id: String,
    pub comment_post: String,
    pub comment_parent: String,
    pub comment_author_id: String,
    pub comment_excerpt: String,
    /// Parent value marking a comment made directly on the post.
    pub top_level_parent: String,
    /// Side table holding the post → company links.
    pub companies_list: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            post_id: "id".to_string(),
            post_author_id: "author_id".to_string(),
            post_title: "title".to_string(),
            author_name: "author_display_name".to_string(),
            author_roles: "author_roles".to_string(),
            company_id: "id".to_string(),
            company_name: "name".to_string(),
            company_founded: "date_founded".to_string(),
            company_post: "post_id".to_string(),
            comment_id: "id".to_string(),
            comment_post: "post".to_string(),
            comment_parent: "parent".to_string(),
            comment_author_id: "author_id".to_string(),
            comment_excerpt: "excerpt".to_string(),
            top_level_parent: "0".to_string(),
            companies_list: "companies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Abort the run when eigenvector centrality fails instead of
    /// reporting degree centrality alone.
    pub strict_eigenvector: bool,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
            strict_eigenvector: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub clusters: usize,
    /// Drop terms appearing in more than this fraction of documents.
    pub max_df: f64,
    /// Drop terms appearing in fewer than this fraction of documents.
    pub min_df: f64,
    pub max_iterations: usize,
    pub seed: u64,
    /// Column of the deduplicated comment table holding the text.
    pub text_column: String,
    /// Reduce tokens to their English stems before weighting.
    pub stem: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            clusters: 7,
            max_df: 0.5,
            min_df: 0.1,
            max_iterations: 300,
            seed: 42,
            text_column: "excerpt".to_string(),
            stem: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Pause for one second after every this many pages.
    pub sleep_interval: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.techinasia.com/wp-json/techinasia/2.0/posts".to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/61.0.3163.91 Safari/537.36"
                .to_string(),
            sleep_interval: 10,
        }
    }
}

/// Resolved absolute locations of every stage file for one data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    pub root: PathBuf,
    pub raw_posts: PathBuf,
    pub raw_comments: PathBuf,
    pub staging: PathBuf,
    pub network_input: PathBuf,
    pub network_output: PathBuf,
    posts_stem: String,
    pub comments: PathBuf,
    pub comments_dedup: PathBuf,
    pub authors_node: PathBuf,
    pub companies_node: PathBuf,
    pub edges: PathBuf,
    pub centralities: PathBuf,
    pub clusters: PathBuf,
}

impl PipelinePaths {
    /// Post table path (`staging/posts.csv`).
    #[must_use]
    pub fn posts(&self) -> PathBuf {
        self.staging.join(format!("{}.csv", self.posts_stem))
    }

    /// Side table path for a list key (`staging/posts_companies.csv`).
    #[must_use]
    pub fn posts_side(&self, list: &str) -> PathBuf {
        self.staging.join(format!("{}_{list}.csv", self.posts_stem))
    }
}

impl PipelineConfig {
    /// Resolve every configured path against `root`.
    #[must_use]
    pub fn resolve(&self, root: &Path) -> PipelinePaths {
        let dir = |p: &PathBuf| root.join(p);
        let staging = dir(&self.paths.staging);
        let network_input = dir(&self.paths.network_input);
        let network_output = dir(&self.paths.network_output);

        PipelinePaths {
            root: root.to_path_buf(),
            raw_posts: dir(&self.paths.raw_posts),
            raw_comments: dir(&self.paths.raw_comments),
            posts_stem: self.files.posts_stem.clone(),
            comments: staging.join(&self.files.comments),
            comments_dedup: staging.join(&self.files.comments_dedup),
            authors_node: network_input.join(&self.files.authors_node),
            companies_node: network_input.join(&self.files.companies_node),
            edges: network_input.join(&self.files.edges),
            centralities: network_output.join(&self.files.centralities),
            clusters: network_output.join(&self.files.clusters),
            staging,
            network_input,
            network_output,
        }
    }
}

/// Load `<root>/tia.toml`, falling back to defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<PipelineConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(PipelineConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<PipelineConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
