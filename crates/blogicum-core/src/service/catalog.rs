use uuid::Uuid;

use super::BlogService;
use crate::domain::{Category, CategoryDraft, Location, LocationDraft};
use crate::error::{DomainError, FieldErrors};
use crate::policy::Viewer;
use crate::ports::BaseRepository;

impl BlogService {
    pub async fn published_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.repos.categories.list_published().await?)
    }

    pub async fn published_locations(&self) -> Result<Vec<Location>, DomainError> {
        Ok(self.repos.locations.list_published().await?)
    }

    pub async fn create_category(
        &self,
        viewer: &Viewer,
        draft: CategoryDraft,
    ) -> Result<Category, DomainError> {
        self.ensure_staff(viewer).await?;
        self.check_slug_free(&draft.slug, None).await?;

        let category = self.repos.categories.insert(Category::new(draft)).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        viewer: &Viewer,
        category_id: Uuid,
        draft: CategoryDraft,
    ) -> Result<Category, DomainError> {
        self.ensure_staff(viewer).await?;
        let mut category = self
            .repos
            .categories
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| DomainError::not_found("category", category_id))?;
        self.check_slug_free(&draft.slug, Some(category.id)).await?;

        category.apply(draft);
        let category = self.repos.categories.update(category).await?;
        tracing::info!(category_id = %category.id, slug = %category.slug, "Category updated");
        Ok(category)
    }

    pub async fn create_location(
        &self,
        viewer: &Viewer,
        draft: LocationDraft,
    ) -> Result<Location, DomainError> {
        self.ensure_staff(viewer).await?;
        let location = self.repos.locations.insert(Location::new(draft)).await?;
        tracing::info!(location_id = %location.id, "Location created");
        Ok(location)
    }

    pub async fn update_location(
        &self,
        viewer: &Viewer,
        location_id: Uuid,
        draft: LocationDraft,
    ) -> Result<Location, DomainError> {
        self.ensure_staff(viewer).await?;
        let mut location = self
            .repos
            .locations
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| DomainError::not_found("location", location_id))?;

        location.apply(draft);
        let location = self.repos.locations.update(location).await?;
        tracing::info!(location_id = %location.id, "Location updated");
        Ok(location)
    }

    /// Catalog management is reserved to staff, checked against the stored
    /// flag rather than token roles.
    async fn ensure_staff(&self, viewer: &Viewer) -> Result<(), DomainError> {
        if self.current_user(viewer).await?.is_staff {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }

    async fn check_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), DomainError> {
        match self.repos.categories.find_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != except => Err(DomainError::Validation(
                FieldErrors::single("slug", "A category with this slug already exists."),
            )),
            _ => Ok(()),
        }
    }
}
