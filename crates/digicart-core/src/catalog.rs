//! # Catalog Store
//!
//! In-memory product catalog. Reads are lock-shared; edits take the write
//! lock for the duration of a single upsert, so each edit is atomic but a
//! read-then-act sequence across requests is not (last write wins unless the
//! caller passes an expected version).

use crate::error::{ShopError, ShopResult};
use crate::product::Product;
use crate::session::AdminCapability;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Read access to products, as consumed by the verifier, gate and order issuer
pub trait ProductLookup: Send + Sync {
    fn get(&self, product_id: &str) -> Option<Product>;
}

/// Fields to set on a product. `None` leaves the current value in place.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub price: Option<i64>,
    pub url: Option<String>,
}

impl ProductPatch {
    pub fn price(price: i64) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }

    pub fn full(title: impl Into<String>, price: i64, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            price: Some(price),
            url: Some(url.into()),
        }
    }

    fn validate(&self) -> ShopResult<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ShopError::InvalidRequest("title must not be empty".into()));
            }
        }
        if let Some(price) = self.price {
            if price <= 0 {
                return Err(ShopError::InvalidRequest(
                    "price must be a positive amount in minor units".into(),
                ));
            }
        }
        if let Some(url) = &self.url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ShopError::InvalidRequest(
                    "url must be an http(s) address".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    products: Vec<Product>,
}

/// Owner of the product mapping
#[derive(Debug, Default)]
pub struct CatalogStore {
    products: RwLock<HashMap<String, Product>>,
}

impl CatalogStore {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Bootstrap insert, used before the server starts taking requests.
    ///
    /// Seeded products obey the same rules as admin edits; a bad entry or a
    /// repeated id is a configuration error.
    pub fn seed(products: impl IntoIterator<Item = Product>) -> ShopResult<Self> {
        let mut map = HashMap::new();
        for product in products {
            let invalid = |e: ShopError| {
                ShopError::Configuration(format!("seed product {:?}: {}", product.id, e))
            };
            validate_id(&product.id).map_err(invalid)?;
            ProductPatch::full(product.title.clone(), product.price, product.url.clone())
                .validate()
                .map_err(invalid)?;

            if map.contains_key(&product.id) {
                return Err(ShopError::Configuration(format!(
                    "duplicate seed product id {:?}",
                    product.id
                )));
            }
            map.insert(product.id.clone(), product);
        }

        Ok(Self {
            products: RwLock::new(map),
        })
    }

    /// Load a seed catalog from TOML (`[[products]]` tables)
    pub fn from_toml(toml_str: &str) -> ShopResult<Self> {
        let file: CatalogFile = toml::from_str(toml_str)
            .map_err(|e| ShopError::Configuration(format!("catalog file: {}", e)))?;
        Self::seed(file.products)
    }

    /// Find a product by ID
    pub fn get(&self, product_id: &str) -> Option<Product> {
        self.products.read().get(product_id).cloned()
    }

    /// Snapshot of all products, sorted by ID
    pub fn list_all(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.read().values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }

    /// Create or edit a product.
    ///
    /// * No `product_id`: create under a generated ID; all fields required.
    /// * Known `product_id`: overwrite the supplied fields and bump `version`.
    /// * Unknown `product_id`: create under that ID if all fields are present.
    ///
    /// With `expected_version`, the edit only applies if the stored version
    /// still matches.
    pub fn upsert(
        &self,
        admin: &AdminCapability,
        product_id: Option<&str>,
        patch: ProductPatch,
        expected_version: Option<u64>,
    ) -> ShopResult<Product> {
        patch.validate()?;

        let product_id = match product_id.map(str::trim) {
            Some("") | None => None,
            Some(id) => {
                validate_id(id)?;
                Some(id.to_string())
            }
        };

        let mut products = self.products.write();

        if let Some(existing) = product_id.as_deref().and_then(|id| products.get_mut(id)) {
            if let Some(expected) = expected_version {
                if expected != existing.version {
                    return Err(ShopError::VersionConflict {
                        product_id: existing.id.clone(),
                        expected,
                        actual: existing.version,
                    });
                }
            }

            if let Some(title) = patch.title {
                existing.title = title;
            }
            if let Some(price) = patch.price {
                existing.price = price;
            }
            if let Some(url) = patch.url {
                existing.url = url;
            }
            existing.version += 1;

            info!(
                admin = admin.username(),
                product_id = %existing.id,
                price = existing.price,
                version = existing.version,
                "Product updated"
            );
            return Ok(existing.clone());
        }

        let (Some(title), Some(price), Some(url)) = (patch.title, patch.price, patch.url) else {
            return Err(match product_id {
                Some(id) => ShopError::UnknownProduct { product_id: id },
                None => ShopError::InvalidRequest(
                    "title, price and url are required for a new product".into(),
                ),
            });
        };

        let id = product_id.unwrap_or_else(generate_product_id);
        let product = Product::new(id.clone(), title, price, url);
        products.insert(id, product.clone());

        info!(
            admin = admin.username(),
            product_id = %product.id,
            price = product.price,
            "Product added"
        );
        Ok(product)
    }
}

impl ProductLookup for CatalogStore {
    fn get(&self, product_id: &str) -> Option<Product> {
        CatalogStore::get(self, product_id)
    }
}

fn validate_id(id: &str) -> ShopResult<()> {
    if id.is_empty() {
        return Err(ShopError::InvalidRequest("product id must not be empty".into()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(ShopError::InvalidRequest(
            "product id must not contain whitespace".into(),
        ));
    }
    Ok(())
}

fn generate_product_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("prod-{}", &simple[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CatalogStore {
        CatalogStore::seed([
            Product::new("eb-js-beg", "JavaScript for Beginners", 100, "https://files.test/js"),
            Product::new("pdf-dsa-kit", "DSA Crash Kit", 17900, "https://files.test/dsa"),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_toml() {
        let catalog = CatalogStore::from_toml(
            r#"
            [[products]]
            id = "sw-win-tool"
            title = "Win Optimizer Tool"
            price = 29900
            url = "https://example.com/your-app.zip"
            "#,
        )
        .unwrap();

        let product = catalog.get("sw-win-tool").unwrap();
        assert_eq!(product.price, 29900);
        assert_eq!(product.version, 0);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_list_all_sorted() {
        let ids: Vec<_> = catalog().list_all().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["eb-js-beg", "pdf-dsa-kit"]);
    }

    #[test]
    fn test_update_price_in_place() {
        let catalog = catalog();
        let admin = AdminCapability::for_tests();

        let updated = catalog
            .upsert(&admin, Some("eb-js-beg"), ProductPatch::price(150), None)
            .unwrap();

        assert_eq!(updated.price, 150);
        assert_eq!(updated.title, "JavaScript for Beginners");
        assert_eq!(updated.version, 1);
        assert_eq!(catalog.get("eb-js-beg").unwrap().price, 150);
    }

    #[test]
    fn test_create_with_generated_id() {
        let catalog = catalog();
        let admin = AdminCapability::for_tests();

        let created = catalog
            .upsert(
                &admin,
                None,
                ProductPatch::full("Rust Notes", 9900, "https://files.test/rust"),
                None,
            )
            .unwrap();

        assert!(created.id.starts_with("prod-"));
        assert_eq!(created.id.len(), "prod-".len() + 12);
        assert_eq!(catalog.get(&created.id), Some(created));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_create_under_given_id_needs_all_fields() {
        let catalog = catalog();
        let admin = AdminCapability::for_tests();

        let err = catalog
            .upsert(&admin, Some("new-sku"), ProductPatch::price(500), None)
            .unwrap_err();
        assert!(matches!(err, ShopError::UnknownProduct { .. }));

        let created = catalog
            .upsert(
                &admin,
                Some("new-sku"),
                ProductPatch::full("New", 500, "https://files.test/new"),
                None,
            )
            .unwrap();
        assert_eq!(created.id, "new-sku");
    }

    #[test]
    fn test_version_conflict() {
        let catalog = catalog();
        let admin = AdminCapability::for_tests();

        catalog
            .upsert(&admin, Some("eb-js-beg"), ProductPatch::price(120), Some(0))
            .unwrap();

        let err = catalog
            .upsert(&admin, Some("eb-js-beg"), ProductPatch::price(130), Some(0))
            .unwrap_err();
        assert!(matches!(
            err,
            ShopError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));
        assert_eq!(catalog.get("eb-js-beg").unwrap().price, 120);
    }

    #[test]
    fn test_rejects_invalid_fields() {
        let catalog = catalog();
        let admin = AdminCapability::for_tests();

        assert!(catalog
            .upsert(&admin, Some("eb-js-beg"), ProductPatch::price(0), None)
            .is_err());
        assert!(catalog
            .upsert(
                &admin,
                None,
                ProductPatch::full("Bad", 100, "ftp://files.test/x"),
                None
            )
            .is_err());
        assert!(catalog
            .upsert(
                &admin,
                Some("has space"),
                ProductPatch::full("Bad", 100, "https://files.test/x"),
                None
            )
            .is_err());
    }

    #[test]
    fn test_seed_rejects_invalid_products() {
        let bad = [
            Product::new("neg", "Negative", -5, "https://files.test/n"),
            Product::new("empty-title", " ", 100, "https://files.test/e"),
            Product::new("script", "Script", 100, "javascript:alert(1)"),
            Product::new("", "No id", 100, "https://files.test/x"),
            Product::new("has space", "Spaced", 100, "https://files.test/s"),
        ];

        for product in bad {
            let id = product.id.clone();
            assert!(
                matches!(CatalogStore::seed([product]), Err(ShopError::Configuration(_))),
                "{:?} accepted",
                id
            );
        }
    }

    #[test]
    fn test_from_toml_rejects_bad_entries() {
        let err = CatalogStore::from_toml(
            r#"
            [[products]]
            id = "b"
            title = "B"
            price = -5
            url = "javascript:alert(1)"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ShopError::Configuration(_)));

        let err = CatalogStore::from_toml(
            r#"
            [[products]]
            id = "a"
            title = "First"
            price = 100
            url = "https://files.test/1"

            [[products]]
            id = "a"
            title = "Second"
            price = 200
            url = "https://files.test/2"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ShopError::Configuration(msg) if msg.contains("duplicate")));

        assert!(matches!(
            CatalogStore::from_toml("[[products]]\nid = 3"),
            Err(ShopError::Configuration(_))
        ));
    }
}
