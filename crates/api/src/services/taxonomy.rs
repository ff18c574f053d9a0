//! Taxonomy lookups and parent-child validation.
//!
//! Lookups by title scan the whole reference collection; the collections are
//! small and admin-maintained, and the store has no case-insensitive index.
//! Everything here is read-only and unlocked, so a concurrent admin edit can
//! make a validation stale by the time the caller writes.

use thiserror::Error;

use skillx_core::{
    CategoryId, Collection, MajorId, RecordPath, ServiceId, titles_match, titles_match_ignore_case,
};

use crate::models::{Category, Major, Service};
use crate::store::{Store, StoreError};

/// Errors from taxonomy lookups.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Major '{0}' not found")]
    MajorNotFound(String),
    #[error("Category '{0}' not found")]
    CategoryNotFound(String),
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves majors, categories and services against the store.
pub struct TaxonomyResolver<'a> {
    store: &'a Store,
}

impl<'a> TaxonomyResolver<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Every major, with ids filled from record keys.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::Store` on store failure.
    pub async fn majors(&self) -> Result<Vec<Major>, TaxonomyError> {
        let rows: Vec<(String, Major)> = self
            .store
            .list(&RecordPath::collection(Collection::Majors))
            .await?;
        Ok(rows
            .into_iter()
            .map(|(key, mut major)| {
                major.id = MajorId::new(key);
                major
            })
            .collect())
    }

    /// Every category, with ids filled from record keys.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::Store` on store failure.
    pub async fn categories(&self) -> Result<Vec<Category>, TaxonomyError> {
        let rows: Vec<(String, Category)> = self
            .store
            .list(&RecordPath::collection(Collection::Categories))
            .await?;
        Ok(rows
            .into_iter()
            .map(|(key, mut category)| {
                category.id = CategoryId::new(key);
                category
            })
            .collect())
    }

    /// Every service, with ids filled from record keys.
    ///
    /// # Errors
    ///
    /// Returns `TaxonomyError::Store` on store failure.
    pub async fn services(&self) -> Result<Vec<Service>, TaxonomyError> {
        let rows: Vec<(String, Service)> = self
            .store
            .list(&RecordPath::collection(Collection::Services))
            .await?;
        Ok(rows
            .into_iter()
            .map(|(key, mut service)| {
                service.id = ServiceId::new(key);
                service
            })
            .collect())
    }

    // =========================================================================
    // By id
    // =========================================================================

    /// # Errors
    ///
    /// `MajorNotFound` when absent (or the id is not a legal key).
    pub async fn major(&self, id: &MajorId) -> Result<Major, TaxonomyError> {
        let Ok(path) = RecordPath::record(Collection::Majors, id) else {
            return Err(TaxonomyError::MajorNotFound(id.to_string()));
        };
        let mut major: Major = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| TaxonomyError::MajorNotFound(id.to_string()))?;
        major.id = id.clone();
        Ok(major)
    }

    /// # Errors
    ///
    /// `CategoryNotFound` when absent (or the id is not a legal key).
    pub async fn category(&self, id: &CategoryId) -> Result<Category, TaxonomyError> {
        let Ok(path) = RecordPath::record(Collection::Categories, id) else {
            return Err(TaxonomyError::CategoryNotFound(id.to_string()));
        };
        let mut category: Category = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| TaxonomyError::CategoryNotFound(id.to_string()))?;
        category.id = id.clone();
        Ok(category)
    }

    /// # Errors
    ///
    /// `ServiceNotFound` when absent (or the id is not a legal key).
    pub async fn service(&self, id: &ServiceId) -> Result<Service, TaxonomyError> {
        let Ok(path) = RecordPath::record(Collection::Services, id) else {
            return Err(TaxonomyError::ServiceNotFound(id.to_string()));
        };
        let mut service: Service = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| TaxonomyError::ServiceNotFound(id.to_string()))?;
        service.id = id.clone();
        Ok(service)
    }

    // =========================================================================
    // By title
    // =========================================================================

    /// Major whose title equals `title` exactly.
    ///
    /// # Errors
    ///
    /// `MajorNotFound` when no title matches.
    pub async fn resolve_major_by_title(&self, title: &str) -> Result<Major, TaxonomyError> {
        self.majors()
            .await?
            .into_iter()
            .find(|m| titles_match(&m.title, title))
            .ok_or_else(|| TaxonomyError::MajorNotFound(title.to_string()))
    }

    /// Major whose title matches ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `MajorNotFound` when no title matches.
    pub async fn resolve_major_by_title_ignore_case(
        &self,
        title: &str,
    ) -> Result<Major, TaxonomyError> {
        self.majors()
            .await?
            .into_iter()
            .find(|m| titles_match_ignore_case(&m.title, title))
            .ok_or_else(|| TaxonomyError::MajorNotFound(title.to_string()))
    }

    /// Id of the major titled exactly `title`.
    ///
    /// # Errors
    ///
    /// `MajorNotFound` when no title matches.
    pub async fn resolve_major_id_by_title(&self, title: &str) -> Result<MajorId, TaxonomyError> {
        Ok(self.resolve_major_by_title(title).await?.id)
    }

    /// Id of the major matching `title` ignoring case.
    ///
    /// # Errors
    ///
    /// `MajorNotFound` when no title matches.
    pub async fn resolve_major_id_by_title_case_insensitive(
        &self,
        title: &str,
    ) -> Result<MajorId, TaxonomyError> {
        Ok(self.resolve_major_by_title_ignore_case(title).await?.id)
    }

    /// Category titled exactly `title`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` when no title matches.
    pub async fn resolve_category_by_title(&self, title: &str) -> Result<Category, TaxonomyError> {
        self.categories()
            .await?
            .into_iter()
            .find(|c| titles_match(&c.title, title))
            .ok_or_else(|| TaxonomyError::CategoryNotFound(title.to_string()))
    }

    /// Id of the category titled exactly `title`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` when no title matches.
    pub async fn resolve_category_id_by_title(
        &self,
        title: &str,
    ) -> Result<CategoryId, TaxonomyError> {
        Ok(self.resolve_category_by_title(title).await?.id)
    }

    /// Service titled exactly `title`.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` when no title matches.
    pub async fn resolve_service_by_title(&self, title: &str) -> Result<Service, TaxonomyError> {
        self.services()
            .await?
            .into_iter()
            .find(|s| titles_match(&s.title_service, title))
            .ok_or_else(|| TaxonomyError::ServiceNotFound(title.to_string()))
    }

    /// Id of the service titled exactly `title`.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` when no title matches.
    pub async fn resolve_service_id_by_title(&self, title: &str) -> Result<ServiceId, TaxonomyError> {
        Ok(self.resolve_service_by_title(title).await?.id)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Whether `category_id` is filed under `major_id`.
    ///
    /// # Errors
    ///
    /// `CategoryNotFound` when the category does not exist.
    pub async fn validate_category_belongs_to_major(
        &self,
        category_id: &CategoryId,
        major_id: &MajorId,
    ) -> Result<bool, TaxonomyError> {
        Ok(self.category(category_id).await?.id_major == *major_id)
    }

    /// Whether `service_id` is filed under `category_id`.
    ///
    /// # Errors
    ///
    /// `ServiceNotFound` when the service does not exist.
    pub async fn validate_service_belongs_to_category(
        &self,
        service_id: &ServiceId,
        category_id: &CategoryId,
    ) -> Result<bool, TaxonomyError> {
        Ok(self.service(service_id).await?.id_category == *category_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seeded() -> Store {
        let store = Store::new(MemoryStore::new());
        let major = |title: &str| Major {
            title: title.to_string(),
            ..Major::default()
        };
        store
            .set(&RecordPath::record(Collection::Majors, "m-eng").unwrap(), &major("Engineering"))
            .await
            .unwrap();
        store
            .set(&RecordPath::record(Collection::Majors, "m-art").unwrap(), &major("Fine Arts"))
            .await
            .unwrap();
        store
            .set(
                &RecordPath::record(Collection::Categories, "c-web").unwrap(),
                &Category {
                    title: "Web Development".to_string(),
                    id_major: MajorId::new("m-eng"),
                    ..Category::default()
                },
            )
            .await
            .unwrap();
        store
            .set(
                &RecordPath::record(Collection::Services, "s-landing").unwrap(),
                &Service {
                    title_service: "Landing Page".to_string(),
                    id_category: CategoryId::new("c-web"),
                    ..Service::default()
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_major_title_exact_vs_ignore_case() {
        let store = seeded().await;
        let resolver = TaxonomyResolver::new(&store);

        assert_eq!(
            resolver.resolve_major_id_by_title("Engineering").await.unwrap(),
            MajorId::new("m-eng")
        );
        assert!(matches!(
            resolver.resolve_major_id_by_title("engineering").await,
            Err(TaxonomyError::MajorNotFound(_))
        ));
        assert_eq!(
            resolver
                .resolve_major_id_by_title_case_insensitive(" fine arts ")
                .await
                .unwrap(),
            MajorId::new("m-art")
        );
    }

    #[tokio::test]
    async fn test_membership() {
        let store = seeded().await;
        let resolver = TaxonomyResolver::new(&store);

        assert!(
            resolver
                .validate_category_belongs_to_major(&CategoryId::new("c-web"), &MajorId::new("m-eng"))
                .await
                .unwrap()
        );
        assert!(
            !resolver
                .validate_category_belongs_to_major(&CategoryId::new("c-web"), &MajorId::new("m-art"))
                .await
                .unwrap()
        );
        assert!(
            resolver
                .validate_service_belongs_to_category(
                    &ServiceId::new("s-landing"),
                    &CategoryId::new("c-web")
                )
                .await
                .unwrap()
        );
        assert!(matches!(
            resolver
                .validate_service_belongs_to_category(&ServiceId::new("nope"), &CategoryId::new("c-web"))
                .await,
            Err(TaxonomyError::ServiceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_by_title() {
        let store = seeded().await;
        let resolver = TaxonomyResolver::new(&store);

        assert_eq!(
            resolver.resolve_service_id_by_title("Landing Page").await.unwrap(),
            ServiceId::new("s-landing")
        );
        assert_eq!(
            resolver
                .resolve_category_id_by_title("Web Development")
                .await
                .unwrap(),
            CategoryId::new("c-web")
        );
        assert!(matches!(
            resolver.resolve_category_id_by_title("Cooking").await,
            Err(TaxonomyError::CategoryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_with_illegal_key_is_not_found() {
        let store = seeded().await;
        let resolver = TaxonomyResolver::new(&store);
        assert!(matches!(
            resolver.category(&CategoryId::new("a/b")).await,
            Err(TaxonomyError::CategoryNotFound(_))
        ));
    }
}
