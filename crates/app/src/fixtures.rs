//! Catalog fixtures.
//!
//! A catalog file is a YAML document listing products with their name, price
//! and initial stock:
//!
//! ```yaml
//! products:
//!   - uuid: 0190b5c8-8c2e-7a39-9d4c-6f7a5ad1b001
//!     name: Enamel Mug
//!     price: "12.50"
//!     stock_quantity: 40
//! ```

use std::{fs, path::Path};

use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::products::data::NewProduct;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Negative price
    #[error("Invalid price for product {0}")]
    InvalidPrice(String),

    /// The same product is listed twice
    #[error("Duplicate product: {0}")]
    DuplicateProduct(String),
}

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
struct CatalogFixture {
    products: Vec<NewProduct>,
}

/// Read the products listed in the catalog file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if a price is
/// negative, or if a product uuid appears more than once.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<NewProduct>, FixtureError> {
    let contents = fs::read_to_string(path)?;

    parse_catalog(&contents)
}

fn parse_catalog(contents: &str) -> Result<Vec<NewProduct>, FixtureError> {
    let fixture: CatalogFixture = serde_norway::from_str(contents)?;

    let mut seen = FxHashSet::default();

    for product in &fixture.products {
        if product.price.is_sign_negative() {
            return Err(FixtureError::InvalidPrice(product.uuid.to_string()));
        }

        if !seen.insert(product.uuid) {
            return Err(FixtureError::DuplicateProduct(product.uuid.to_string()));
        }
    }

    Ok(fixture.products)
}
