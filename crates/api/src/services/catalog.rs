//! Product catalogue rules.
//!
//! A product must sit inside the taxonomy of the seller's major: the seller's
//! application names a major by title, the chosen category must belong to that
//! major, and the chosen service must belong to the chosen category. Every
//! lookup happens before the single write, so a rejected product leaves no
//! trace in the store.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use skillx_core::{
    CategoryId, Collection, ProductId, RecordPath, ServiceId, UserId, apply_nonblank,
    apply_present,
};

use crate::models::{Product, RegisterSeller};
use crate::services::taxonomy::{TaxonomyError, TaxonomyResolver};
use crate::store::{Store, StoreError};

/// Errors from product creation and update.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Seller must have a valid Major in registerSellers")]
    NotASeller,

    #[error("No matching Major ID found for seller's Major '{0}'")]
    SellerMajorUnknown(String),

    #[error("Selected Category is not part of the seller's Major")]
    CategoryOutsideMajor,

    #[error("Selected Service is not part of the chosen Category")]
    ServiceOutsideCategory,

    #[error("Product not found")]
    ProductNotFound,

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of a product creation request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewProduct {
    #[serde(rename = "nameProduct")]
    pub name: String,
    pub description: String,
    pub photo_url: Vec<String>,
    pub price: String,
    #[serde(rename = "idCategory")]
    pub id_category: CategoryId,
    #[serde(rename = "idService")]
    pub id_service: ServiceId,
}

/// Partial product update. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    #[serde(rename = "nameProduct")]
    pub name: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<Vec<String>>,
    pub price: Option<String>,
    #[serde(rename = "idCategory")]
    pub id_category: Option<CategoryId>,
    #[serde(rename = "idService")]
    pub id_service: Option<ServiceId>,
}

/// Product writes that need taxonomy validation.
pub struct CatalogService<'a> {
    store: &'a Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Validate `input` against the seller's taxonomy and persist it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` when a required field is blank, the caller has no
    /// seller major, a referenced category or service does not exist, or the
    /// chain major → category → service does not line up.
    #[instrument(skip(self, input), fields(seller = %seller))]
    pub async fn create_product(
        &self,
        seller: &UserId,
        input: NewProduct,
    ) -> Result<Product, CatalogError> {
        require(&input.name, "nameProduct")?;
        require(&input.price, "price")?;
        require(input.id_category.as_str(), "idCategory")?;
        require(input.id_service.as_str(), "idService")?;

        let application_path = RecordPath::record(Collection::RegisterSellers, seller)
            .map_err(|_| CatalogError::NotASeller)?;
        let application: RegisterSeller = self
            .store
            .get(&application_path)
            .await?
            .unwrap_or_default();
        if application.major.trim().is_empty() {
            return Err(CatalogError::NotASeller);
        }

        let resolver = TaxonomyResolver::new(self.store);
        let major = match resolver
            .resolve_major_by_title_ignore_case(&application.major)
            .await
        {
            Ok(major) => major,
            Err(TaxonomyError::MajorNotFound(title)) => {
                return Err(CatalogError::SellerMajorUnknown(title));
            }
            Err(e) => return Err(e.into()),
        };

        if !resolver
            .validate_category_belongs_to_major(&input.id_category, &major.id)
            .await?
        {
            return Err(CatalogError::CategoryOutsideMajor);
        }
        if !resolver
            .validate_service_belongs_to_category(&input.id_service, &input.id_category)
            .await?
        {
            return Err(CatalogError::ServiceOutsideCategory);
        }

        let now = Utc::now();
        let product = Product {
            uid: ProductId::generate(),
            seller_id: seller.clone(),
            name: input.name.trim().to_string(),
            description: input.description,
            photo_url: input.photo_url,
            price: input.price.trim().to_string(),
            major: major.title,
            id_major: major.id,
            id_category: input.id_category,
            id_service: input.id_service,
            created_at: now,
            updated_at: now,
        };

        let path = RecordPath::nested(Collection::Products, seller, &product.uid)
            .map_err(|_| CatalogError::NotASeller)?;
        self.store.set(&path, &product).await?;

        info!(product_id = %product.uid, "Created product");
        Ok(product)
    }

    /// Apply `patch` to one of the seller's products.
    ///
    /// Changing the category or the service re-checks that the service still
    /// belongs to the category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ProductNotFound` when the seller has no such
    /// product, a taxonomy error for an unknown category or service, and
    /// `ServiceOutsideCategory` on a mismatch.
    #[instrument(skip(self, patch), fields(seller = %seller, product_id = %product_id))]
    pub async fn update_product(
        &self,
        seller: &UserId,
        product_id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        let Ok(path) = RecordPath::nested(Collection::Products, seller, product_id) else {
            return Err(CatalogError::ProductNotFound);
        };
        let mut product: Product = self
            .store
            .get(&path)
            .await?
            .ok_or(CatalogError::ProductNotFound)?;

        apply_nonblank(&mut product.name, patch.name);
        apply_nonblank(&mut product.description, patch.description);
        apply_nonblank(&mut product.price, patch.price);
        apply_present(&mut product.photo_url, patch.photo_url);

        let resolver = TaxonomyResolver::new(self.store);
        let category_changed = apply_present(
            &mut product.id_category,
            patch.id_category.filter(|id| !id.is_blank()),
        );
        if category_changed {
            resolver.category(&product.id_category).await?;
        }
        let service_changed = apply_present(
            &mut product.id_service,
            patch.id_service.filter(|id| !id.is_blank()),
        );
        if (category_changed || service_changed)
            && !resolver
                .validate_service_belongs_to_category(&product.id_service, &product.id_category)
                .await?
        {
            return Err(CatalogError::ServiceOutsideCategory);
        }

        product.uid = product_id.clone();
        product.updated_at = Utc::now();
        self.store.set(&path, &product).await?;
        Ok(product)
    }
}

fn require(value: &str, field: &'static str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Category, Major, Service};
    use crate::store::MemoryStore;

    async fn put<T: serde::Serialize + Sync>(store: &Store, collection: Collection, key: &str, value: &T) {
        store
            .set(&RecordPath::record(collection, key).unwrap(), value)
            .await
            .unwrap();
    }

    async fn seeded() -> Store {
        let store = Store::new(MemoryStore::new());
        put(
            &store,
            Collection::Majors,
            "m-eng",
            &Major {
                title: "Engineering".to_string(),
                ..Major::default()
            },
        )
        .await;
        for (key, major) in [("c-web", "m-eng"), ("c-paint", "m-art")] {
            put(
                &store,
                Collection::Categories,
                key,
                &Category {
                    title: key.to_string(),
                    id_major: major.into(),
                    ..Category::default()
                },
            )
            .await;
        }
        for (key, category) in [("s-landing", "c-web"), ("s-api", "c-web"), ("s-mural", "c-paint")] {
            put(
                &store,
                Collection::Services,
                key,
                &Service {
                    title_service: key.to_string(),
                    id_category: category.into(),
                    ..Service::default()
                },
            )
            .await;
        }
        put(
            &store,
            Collection::RegisterSellers,
            "seller-1",
            &RegisterSeller {
                uid: "seller-1".into(),
                major: "engineering".to_string(),
                ..RegisterSeller::default()
            },
        )
        .await;
        store
    }

    fn draft(category: &str, service: &str) -> NewProduct {
        NewProduct {
            name: "Company profile site".to_string(),
            price: "1.500.000".to_string(),
            id_category: category.into(),
            id_service: service.into(),
            ..NewProduct::default()
        }
    }

    async fn product_count(store: &Store) -> usize {
        store
            .list_nested::<Product>(&RecordPath::collection(Collection::Products))
            .await
            .unwrap()
            .len()
    }

    #[tokio::test]
    async fn test_create_resolves_major() {
        let store = seeded().await;
        let product = CatalogService::new(&store)
            .create_product(&"seller-1".into(), draft("c-web", "s-landing"))
            .await
            .unwrap();

        assert_eq!(product.id_major.as_str(), "m-eng");
        assert_eq!(product.major, "Engineering");
        assert_eq!(product_count(&store).await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_service_from_other_category() {
        let store = seeded().await;
        let err = CatalogService::new(&store)
            .create_product(&"seller-1".into(), draft("c-web", "s-mural"))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ServiceOutsideCategory));
        assert_eq!(product_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_category_from_other_major() {
        let store = seeded().await;
        let err = CatalogService::new(&store)
            .create_product(&"seller-1".into(), draft("c-paint", "s-mural"))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::CategoryOutsideMajor));
        assert_eq!(product_count(&store).await, 0);
    }

    #[tokio::test]
    async fn test_create_requires_seller_application() {
        let store = seeded().await;
        let err = CatalogService::new(&store)
            .create_product(&"buyer-1".into(), draft("c-web", "s-landing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotASeller));
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let store = seeded().await;
        let mut input = draft("c-web", "s-landing");
        input.price = "  ".to_string();
        let err = CatalogService::new(&store)
            .create_product(&"seller-1".into(), input)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingField("price")));
    }

    #[tokio::test]
    async fn test_update_single_field_keeps_the_rest() {
        let store = seeded().await;
        let service = CatalogService::new(&store);
        let seller = UserId::new("seller-1");
        let created = service
            .create_product(&seller, draft("c-web", "s-landing"))
            .await
            .unwrap();

        let updated = service
            .update_product(
                &seller,
                &created.uid,
                ProductPatch {
                    price: Some("2.000.000".to_string()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, "2.000.000");
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.id_service, created.id_service);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_revalidates_service() {
        let store = seeded().await;
        let service = CatalogService::new(&store);
        let seller = UserId::new("seller-1");
        let created = service
            .create_product(&seller, draft("c-web", "s-landing"))
            .await
            .unwrap();

        let err = service
            .update_product(
                &seller,
                &created.uid,
                ProductPatch {
                    id_service: Some("s-mural".into()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ServiceOutsideCategory));

        let ok = service
            .update_product(
                &seller,
                &created.uid,
                ProductPatch {
                    id_service: Some("s-api".into()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ok.id_service.as_str(), "s-api");
    }

    #[tokio::test]
    async fn test_update_other_sellers_product_is_not_found() {
        let store = seeded().await;
        let service = CatalogService::new(&store);
        let created = service
            .create_product(&"seller-1".into(), draft("c-web", "s-landing"))
            .await
            .unwrap();

        let err = service
            .update_product(&"seller-2".into(), &created.uid, ProductPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound));
    }
}
