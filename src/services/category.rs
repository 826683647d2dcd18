//! Category service
//!
//! Built-in categories are shared by everyone; custom ones belong to their
//! creator and are visible to the creator's whole family.

use crate::audit::EntityType;
use crate::error::{FintrackError, FintrackResult};
use crate::models::{Category, CategoryId, CategoryKind, UserId};
use crate::storage::Storage;

use super::household;

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Built-ins plus the custom categories of the user's household
    pub fn list_visible(&self, user_id: UserId) -> FintrackResult<Vec<Category>> {
        let owners = household(self.storage, user_id)?;
        self.storage.categories.visible_to(&owners)
    }

    /// Get a category the user can see
    pub fn get(&self, user_id: UserId, id: CategoryId) -> FintrackResult<Category> {
        self.list_visible(user_id)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| FintrackError::category_not_found(id.to_string()))
    }

    /// Find a visible category by name or ID
    ///
    /// Names are matched case-insensitively; an active category wins over an
    /// archived one of the same name.
    pub fn resolve(&self, user_id: UserId, name_or_id: &str) -> FintrackResult<Category> {
        let visible = self.list_visible(user_id)?;

        let mut by_name: Vec<&Category> =
            visible.iter().filter(|c| c.name_matches(name_or_id)).collect();
        by_name.sort_by_key(|c| c.archived);
        if let Some(category) = by_name.first() {
            return Ok((*category).clone());
        }

        let by_id = match CategoryId::parse(name_or_id.trim()) {
            Ok(id) => visible.iter().find(|c| c.id == id),
            Err(_) => visible.iter().find(|c| c.id.matches_short(name_or_id)),
        };
        by_id
            .cloned()
            .ok_or_else(|| FintrackError::category_not_found(name_or_id))
    }

    fn ensure_unique(
        &self,
        user_id: UserId,
        name: &str,
        except: Option<CategoryId>,
    ) -> FintrackResult<()> {
        let clash = self
            .list_visible(user_id)?
            .into_iter()
            .any(|c| Some(c.id) != except && c.name_matches(name));
        if clash {
            return Err(FintrackError::Duplicate {
                entity_type: "Category",
                identifier: name.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Create a custom category
    pub fn create(
        &self,
        user_id: UserId,
        name: &str,
        kind: CategoryKind,
    ) -> FintrackResult<Category> {
        let category = Category::new(name, kind, user_id);
        category
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        self.ensure_unique(user_id, &category.name, None)?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_create(
            Some(user_id),
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        Ok(category)
    }

    fn owned(&self, user_id: UserId, id: CategoryId) -> FintrackResult<Category> {
        let category = self
            .storage
            .categories
            .get(id)?
            .ok_or_else(|| FintrackError::category_not_found(id.to_string()))?;
        match category.owner {
            None => Err(FintrackError::Forbidden(format!(
                "'{}' is a built-in category",
                category.name
            ))),
            Some(owner) if owner != user_id => Err(FintrackError::Forbidden(
                "Only the creator may change this category".into(),
            )),
            Some(_) => Ok(category),
        }
    }

    pub fn rename(&self, user_id: UserId, id: CategoryId, name: &str) -> FintrackResult<Category> {
        let mut category = self.owned(user_id, id)?;
        let before = category.clone();

        category.name = name.trim().to_string();
        category
            .validate()
            .map_err(|e| FintrackError::Validation(e.to_string()))?;
        self.ensure_unique(user_id, &category.name, Some(id))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            Some(user_id),
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;

        Ok(category)
    }

    /// Archive (or restore) a category; archived categories take no new
    /// transactions but keep their history
    pub fn archive(
        &self,
        user_id: UserId,
        id: CategoryId,
        archived: bool,
    ) -> FintrackResult<Category> {
        let mut category = self.owned(user_id, id)?;
        if category.archived == archived {
            return Ok(category);
        }
        let before = category.clone();
        category.archived = archived;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;

        self.storage.log_update(
            Some(user_id),
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;

        Ok(category)
    }
}
