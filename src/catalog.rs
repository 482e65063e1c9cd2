//! Read-only product catalog.
//!
//! The catalog is loaded once at startup, either from the built-in data
//! shipped with the binary or from a JSON file, and is never mutated
//! afterwards. Everything downstream borrows it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// Hardware specification bundle of a phone. Values are free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specs {
    /// Memory size, e.g. `"8GB"`.
    pub ram: String,
    /// Storage size, e.g. `"256GB"`.
    pub storage: String,
    /// Battery capacity, e.g. `"5000 mAh"`.
    pub battery: String,
    /// Processor name.
    pub processor: String,
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Stable, unique, positive identifier.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Price in the base currency unit.
    pub price: f64,
    /// Optional product image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Hardware specification bundle.
    pub specs: Specs,
    /// Average rating in `[0, 5]`.
    pub rating: f64,
}

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The catalog JSON did not match the product schema.
    #[error("catalog JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    /// A product failed a field constraint.
    #[error("product {id} is invalid: {reason}")]
    InvalidProduct {
        /// Offending product id.
        id: u32,
        /// What was wrong with it.
        reason: String,
    },
    /// Two products share an identifier.
    #[error("duplicate product id {0}")]
    DuplicateId(u32),
}

/// Immutable list of products available for recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from products, validating every entry.
    ///
    /// An empty list is a valid catalog; nothing can match against it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when an id repeats or a product violates its
    /// field constraints.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());
        for product in &products {
            validate_product(product)?;
            if !seen.insert(product.id) {
                return Err(CatalogError::DuplicateId(product.id));
            }
        }

        Ok(Self { products })
    }

    /// Parse and validate a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] on schema mismatch, or any validation
    /// error from [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::new(products)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Catalog::from_json`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// The catalog bundled with the binary.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled data is corrupt.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// All products, in catalog order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Look up a product by identifier.
    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Whether a product with this identifier exists.
    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Split the catalog into recommended and remaining products.
    ///
    /// Recommended products follow the order of `matched_ids` (repeats are
    /// shown once); everything else keeps catalog order.
    pub fn partition(&self, matched_ids: &[u32]) -> (Vec<&Product>, Vec<&Product>) {
        let mut recommended: Vec<&Product> = Vec::with_capacity(matched_ids.len());
        for id in matched_ids {
            if let Some(product) = self.get(*id) {
                if !recommended.iter().any(|p| p.id == product.id) {
                    recommended.push(product);
                }
            }
        }

        let others = self
            .products
            .iter()
            .filter(|p| !matched_ids.contains(&p.id))
            .collect();

        (recommended, others)
    }
}

fn validate_product(product: &Product) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidProduct {
        id: product.id,
        reason: reason.to_owned(),
    };

    if product.id == 0 {
        return Err(invalid("id must be positive"));
    }
    if product.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if !product.price.is_finite() || product.price <= 0.0 {
        return Err(invalid("price must be a positive number"));
    }
    if !(0.0..=5.0).contains(&product.rating) {
        return Err(invalid("rating must be between 0 and 5"));
    }
    Ok(())
}
