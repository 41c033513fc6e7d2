use tidemark_types::{DirectoryMapping, Taxonomy, TaxonomyNodeConfig};

fn node(name: &str, keywords: &[&str]) -> TaxonomyNodeConfig {
    TaxonomyNodeConfig {
        name: name.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        frozen: false,
        children: Vec::new(),
    }
}

/// The taxonomy used across engine tests: Docs/{Finance,Legal}, Media,
/// and a frozen Archive subtree.
pub fn sample_taxonomy_config() -> Vec<TaxonomyNodeConfig> {
    vec![
        TaxonomyNodeConfig {
            name: "Docs".to_string(),
            keywords: vec!["document".to_string()],
            frozen: false,
            children: vec![
                node("Finance", &["invoice", "tax", "receipt"]),
                node("Legal", &["contract", "agreement"]),
            ],
        },
        node("Media", &["photo", "screenshot"]),
        TaxonomyNodeConfig {
            name: "Archive".to_string(),
            keywords: vec![],
            frozen: true,
            children: vec![],
        },
    ]
}

pub fn sample_taxonomy() -> Taxonomy {
    Taxonomy::from_config(&sample_taxonomy_config()).expect("sample taxonomy is valid")
}

pub fn sample_mappings() -> Vec<DirectoryMapping> {
    vec![
        DirectoryMapping {
            source: "/Inbox/Scans".to_string(),
            target: "/Docs/Finance".to_string(),
        },
        DirectoryMapping {
            source: "/Camera".to_string(),
            target: "/Media".to_string(),
        },
    ]
}
