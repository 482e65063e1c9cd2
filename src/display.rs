//! Plain-text rendering of the catalog and recommendation results.

use std::fmt::Write as _;

use crate::catalog::{Catalog, Product};
use crate::recommend::RecommendationResult;

/// One-line summary of a request outcome.
pub fn summary_line(result: &RecommendationResult) -> String {
    if result.is_empty() {
        "No specific matches found, but here are all our products!".to_owned()
    } else {
        format!("Found {} recommendation(s) for you!", result.len())
    }
}

/// Render a single product card, with an optional recommendation reason.
pub fn render_product(product: &Product, reason: Option<&str>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] {} {} - ${:.2}  ({:.1}/5)",
        product.id, product.brand, product.name, product.price, product.rating
    );
    let _ = writeln!(
        out,
        "    RAM {} | Storage {} | Battery {} | {}",
        product.specs.ram, product.specs.storage, product.specs.battery, product.specs.processor
    );
    if let Some(reason) = reason {
        let _ = writeln!(out, "    Why: {reason}");
    }
    out
}

/// Render the full catalog listing.
pub fn render_catalog(catalog: &Catalog) -> String {
    let mut out = String::from("Available Phones\n\n");
    for product in catalog.products() {
        out.push_str(&render_product(product, None));
    }
    out
}

/// Render a result: recommended products with reasons, then the rest.
pub fn render_results(catalog: &Catalog, result: &RecommendationResult) -> String {
    let (recommended, others) = catalog.partition(&result.matched_ids);

    let mut out = String::new();
    let _ = writeln!(out, "{}\n", summary_line(result));

    if recommended.is_empty() {
        out.push_str("No Specific Matches Found\n");
        out.push_str("We couldn't find exact matches, but check out all our phones below.\n\n");
        out.push_str(&render_catalog(catalog));
        return out;
    }

    out.push_str("Recommended For You\n\n");
    for product in recommended {
        out.push_str(&render_product(product, result.reason_for(product.id)));
    }

    if !others.is_empty() {
        out.push_str("\nAll Products\n\n");
        for product in others {
            out.push_str(&render_product(product, None));
        }
    }
    out
}
