use serde::{Deserialize, Serialize};

use crate::{Error, Result, util::is_under};

/// Raw taxonomy node as it appears in config.toml. Paths are derived
/// from nesting at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNodeConfig {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Frozen subtrees are never migration sources or keyword targets.
    #[serde(default)]
    pub frozen: bool,
    #[serde(default)]
    pub children: Vec<TaxonomyNodeConfig>,
}

/// Exact or prefix mapping from an existing directory to a category.
/// Declaration order matters: earlier mappings win.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryMapping {
    pub source: String,
    pub target: String,
}

/// One resolved category node.
#[derive(Debug, Clone)]
pub struct TaxonomyNode {
    pub name: String,
    /// Full category path, e.g. "/Docs/Finance".
    pub path: String,
    pub keywords: Vec<String>,
    pub frozen: bool,
    /// Child indexes into `Taxonomy::nodes`.
    pub children: Vec<usize>,
    /// Declaration position, used as the deterministic tie-break.
    pub order: usize,
}

/// The configured category tree, flattened with a path index.
///
/// Read-only to Classifier and Migrator during a run; owned by config.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    roots: Vec<usize>,
}

impl Taxonomy {
    pub fn from_config(categories: &[TaxonomyNodeConfig]) -> Result<Self> {
        let mut taxonomy = Taxonomy::default();
        for cat in categories {
            let idx = taxonomy.add_node(cat, "")?;
            taxonomy.roots.push(idx);
        }
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn add_node(&mut self, config: &TaxonomyNodeConfig, parent_path: &str) -> Result<usize> {
        if config.name.is_empty() || config.name.contains('/') {
            return Err(Error::Taxonomy(format!(
                "invalid category name: {:?}",
                config.name
            )));
        }
        let path = format!("{}/{}", parent_path, config.name);
        let idx = self.nodes.len();
        self.nodes.push(TaxonomyNode {
            name: config.name.clone(),
            path: path.clone(),
            keywords: config.keywords.clone(),
            frozen: config.frozen,
            children: Vec::new(),
            order: idx,
        });
        for child in &config.children {
            let child_idx = self.add_node(child, &path)?;
            self.nodes[idx].children.push(child_idx);
        }
        Ok(idx)
    }

    fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(Error::Taxonomy("taxonomy has no categories".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.path.as_str()) {
                return Err(Error::Taxonomy(format!(
                    "duplicate category path: {}",
                    node.path
                )));
            }
        }
        Ok(())
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }

    pub fn roots(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.roots.iter().map(|i| &self.nodes[*i])
    }

    pub fn children(&self, node: &TaxonomyNode) -> impl Iterator<Item = &TaxonomyNode> {
        node.children.iter().map(|i| &self.nodes[*i])
    }

    pub fn all_paths(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.path.clone()).collect()
    }

    pub fn leaf_paths(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.children.is_empty())
            .map(|n| n.path.clone())
            .collect()
    }

    pub fn find_node(&self, path: &str) -> Option<&TaxonomyNode> {
        self.nodes.iter().find(|n| n.path == path)
    }

    /// Whether a file path lies inside any category directory.
    pub fn contains_path(&self, path: &str) -> bool {
        self.nodes.iter().any(|n| is_under(path, &n.path))
    }

    /// Whether a path lies inside a frozen subtree.
    pub fn is_frozen(&self, path: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.frozen && is_under(path, &n.path))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
