//! Product catalog.
//!
//! Read-only for the lifetime of the process. Loaded from a JSON array of
//! `ProductDetail` when `CARTSYNC_CATALOG_PATH` is set, otherwise seeded with
//! the built-in sample products.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use thiserror::Error;

use cartsync_core::{CurrencyCode, Price, ProductDetail, ProductId};

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate product id in catalog: {0}")]
    DuplicateId(ProductId),
}

/// Products in display order, indexed by id.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<ProductDetail>,
    index: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from `products`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if two products share an id.
    pub fn new(products: Vec<ProductDetail>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products, index })
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: display.clone(),
            source,
        })?;
        let products = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: display,
            source,
        })?;
        Self::new(products)
    }

    /// The built-in sample catalog.
    #[must_use]
    pub fn sample() -> Self {
        let products: Vec<ProductDetail> = SAMPLE_PRODUCTS
            .iter()
            .map(|&(id, name, description, lira, category, stock)| ProductDetail {
                id: ProductId::new(id),
                name: name.to_string(),
                description: Some(description.to_string()),
                price: Price::new(Decimal::from(lira), CurrencyCode::TRY).unwrap_or_default(),
                category: category.to_string(),
                image_url: None,
                stock_quantity: stock,
            })
            .collect();
        let index = products
            .iter()
            .enumerate()
            .map(|(position, product)| (product.id.clone(), position))
            .collect();
        Self { products, index }
    }

    /// Every product, in display order.
    #[must_use]
    pub fn all(&self) -> &[ProductDetail] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&ProductDetail> {
        self.index.get(id).and_then(|&position| self.products.get(position))
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog has no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// (id, name, description, price in lira, category, stock)
const SAMPLE_PRODUCTS: &[(&str, &str, &str, u32, &str, u32)] = &[
    ("1", "Wireless Headphones", "Long battery life, Bluetooth 5.0 and active noise cancelling.", 749, "audio", 40),
    ("2", "Gaming Mouse", "RGB lighting and 16000 DPI precision.", 429, "peripherals", 60),
    ("3", "Smart Watch", "Step counter, heart-rate tracking and sleep analysis.", 899, "wearables", 25),
    ("4", "Bluetooth Speaker", "Portable, waterproof and loud.", 349, "audio", 80),
    ("5", "Wireless Keyboard", "Silent keys, ergonomic layout and long battery life.", 279, "peripherals", 55),
    ("6", "Power Bank 20000mAh", "High capacity portable power with fast charging.", 389, "accessories", 70),
    ("7", "USB-C Fast Charging Cable", "1.5 m long, 60 W fast charging.", 89, "accessories", 200),
    ("8", "Wireless Mouse", "Minimal design, 1600 DPI and silent clicks.", 149, "peripherals", 90),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_sample_catalog_lookup() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.len(), 8);
        let mouse = catalog.get(&ProductId::new("2")).unwrap();
        assert_eq!(mouse.name, "Gaming Mouse");
        assert_eq!(mouse.price.to_string(), "₺429.00");
        assert!(catalog.get(&ProductId::new("999")).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let product = Catalog::sample().all()[0].clone();
        let err = Catalog::new(vec![product.clone(), product]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let sample = Catalog::sample();
        let products = &sample.all()[..2];
        write!(file, "{}", serde_json::to_string(products).unwrap()).unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.all(), products);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Catalog::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("invalid catalog"));
    }
}
