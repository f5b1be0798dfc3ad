//! Relationship Loading Utilities - deferred loading and caching of relations

use async_trait::async_trait;

use crate::backends::DatabasePool;
use crate::error::ModelResult;

/// Trait for loading relationships on demand
#[async_trait]
pub trait RelationshipLoader<T>: Send + Sync {
    /// Load the relationship from the database
    async fn load(&self, pool: &dyn DatabasePool) -> ModelResult<T>;

    /// Load again, ignoring anything cached by the loader
    async fn reload(&self, pool: &dyn DatabasePool) -> ModelResult<T> {
        self.load(pool).await
    }
}

/// Lazy loading wrapper for relationships
pub struct Lazy<T> {
    loader: Option<Box<dyn RelationshipLoader<T>>>,
    value: Option<T>,
}

impl<T> Lazy<T>
where
    T: Send + Sync + 'static,
{
    /// Create a new lazy relationship
    pub fn new<L>(loader: L) -> Self
    where
        L: RelationshipLoader<T> + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            value: None,
        }
    }

    /// Create a lazy relationship with a pre-loaded value
    pub fn loaded(value: T) -> Self {
        Self {
            loader: None,
            value: Some(value),
        }
    }

    /// Get the value, loading it on first access
    pub async fn get(&mut self, pool: &dyn DatabasePool) -> ModelResult<&T> {
        if self.value.is_none() {
            self.load(pool).await?;
        }
        self.value
            .as_ref()
            .ok_or_else(|| crate::error::ModelError::Query("lazy relationship has no value".to_string()))
    }

    /// Force a load through the loader, replacing any cached value
    pub async fn load(&mut self, pool: &dyn DatabasePool) -> ModelResult<()> {
        if let Some(loader) = &self.loader {
            self.value = Some(loader.load(pool).await?);
        }
        Ok(())
    }

    /// Reload and return the fresh value
    pub async fn reload(&mut self, pool: &dyn DatabasePool) -> ModelResult<&T> {
        if let Some(loader) = &self.loader {
            self.value = Some(loader.reload(pool).await?);
        }
        self.get(pool).await
    }

    pub fn is_loaded(&self) -> bool {
        self.value.is_some()
    }

    /// Cached value without loading
    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Take the cached value out, leaving the relation unloaded
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Replace the cached value
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Drop the cached value; the next `get` loads again
    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("loaded", &self.value.is_some())
            .field("value", &self.value)
            .finish()
    }
}
