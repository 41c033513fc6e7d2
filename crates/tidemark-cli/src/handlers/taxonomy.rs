use anyhow::Result;
use tidemark_types::{Taxonomy, TaxonomyNode};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle_show(ctx: &ExecutionContext) -> Result<()> {
    let taxonomy = ctx.config.taxonomy()?;

    if ctx.format == OutputFormat::Json {
        return output::print_json(&taxonomy.all_paths());
    }

    for root in taxonomy.roots() {
        print_node(&taxonomy, root, 0);
    }
    Ok(())
}

fn print_node(taxonomy: &Taxonomy, node: &TaxonomyNode, depth: usize) {
    let mut line = format!("{}{}", "  ".repeat(depth), node.name);
    if node.frozen {
        line.push_str(" [frozen]");
    }
    if !node.keywords.is_empty() {
        line.push_str(&format!("  ({})", node.keywords.join(", ")));
    }
    println!("{}", line);
    for child in taxonomy.children(node) {
        print_node(taxonomy, child, depth + 1);
    }
}
