use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Reserved label for the sum over all repeat categories at a position.
pub const ALL_LABEL: &str = "ALL";

/// Closed set of repeat categories, fixed before any window is dispatched.
///
/// Index 0 is always the reserved "ALL" bucket; named categories follow in
/// the order they first appear in the cluster annotation table. Categories
/// never grow during aggregation, so per-window count arrays can be plain
/// index-addressed vectors instead of string-keyed maps.
#[derive(Debug, Clone)]
pub struct CategorySet {
    labels: Vec<String>,
}

impl CategorySet {
    pub const ALL: usize = 0;

    pub fn new(named: impl IntoIterator<Item = String>) -> Self {
        let mut labels = vec![ALL_LABEL.to_string()];
        for label in named {
            if label != ALL_LABEL && !labels.contains(&label) {
                labels.push(label);
            }
        }
        CategorySet { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        false // always contains ALL
    }

    pub fn label(&self, index: usize) -> &str {
        &self.labels[index]
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Category label with path-hostile characters replaced, usable as a
    /// track file stem.
    pub fn file_stem(&self, index: usize) -> String {
        self.labels[index]
            .chars()
            .map(|c| if c == '/' || c == '|' || c == '\\' { '_' } else { c })
            .collect()
    }
}

/// Read identifier to category index lookup built from the cluster listing.
/// Reads absent from the map resolve to the "ALL" bucket; a miss is not an
/// error.
#[derive(Debug, Default)]
pub struct ReadCategories {
    map: FxHashMap<String, usize>,
}

impl ReadCategories {
    pub fn resolve(&self, read_id: &str) -> usize {
        self.map.get(read_id).copied().unwrap_or(CategorySet::ALL)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Build a lookup directly from `(read id, category index)` pairs,
    /// bypassing the cluster files.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, usize)>) -> Self {
        ReadCategories {
            map: pairs.into_iter().collect(),
        }
    }
}

fn normalize_cluster(token: &str) -> &str {
    let token = token.trim_start_matches('>');
    token.strip_prefix("CL").unwrap_or(token)
}

/// Parse the cluster annotation table: one whitespace-separated
/// `<cluster> <category>` pair per line. Returns the closed category set and
/// the cluster to category-index map.
pub fn load_cluster_table(path: &Path) -> Result<(CategorySet, FxHashMap<String, usize>)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open annotation table: {}", path.display()))?;

    let mut order: Vec<String> = Vec::new();
    let mut pairs: Vec<(String, String)> = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        let (Some(cluster), Some(category)) = (fields.next(), fields.next()) else {
            continue;
        };
        if !order.contains(&category.to_string()) {
            order.push(category.to_string());
        }
        pairs.push((normalize_cluster(cluster).to_string(), category.to_string()));
    }

    let categories = CategorySet::new(order);
    let mut clusters = FxHashMap::default();
    for (cluster, category) in pairs {
        // index_of cannot miss: every category was inserted above
        if let Some(idx) = categories.index_of(&category) {
            clusters.insert(cluster, idx);
        }
    }
    Ok((categories, clusters))
}

/// Parse the cluster listing: a `>CL<n> ...` header line followed by one
/// line of whitespace-separated read identifiers belonging to that cluster.
/// Reads of clusters without a table entry are left unmapped (they count
/// into "ALL" only).
pub fn load_read_clusters(
    path: &Path,
    clusters: &FxHashMap<String, usize>,
) -> Result<ReadCategories> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open cluster listing: {}", path.display()))?;

    let mut map = FxHashMap::default();
    let mut current: Option<usize> = None;
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('>') {
            let token = trimmed.split_whitespace().next().unwrap_or(trimmed);
            current = clusters.get(normalize_cluster(token)).copied();
        } else if let Some(category) = current {
            for read in trimmed.split_whitespace() {
                map.insert(read.to_string(), category);
            }
        }
    }
    Ok(ReadCategories { map })
}
