//! Mock metadata lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::metadata::{MetadataError, MetadataLookup};

/// Mock implementation of the MetadataLookup trait.
///
/// Unknown content ids fail with `NotFound`.
#[derive(Debug, Default)]
pub struct MockMetadata {
    titles: Arc<RwLock<HashMap<String, String>>>,
    lookups: Arc<RwLock<Vec<String>>>,
}

impl MockMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title returned for a content id.
    pub async fn set_title(&self, content_id: &str, title: &str) {
        self.titles
            .write()
            .await
            .insert(content_id.to_string(), title.to_string());
    }

    /// Content ids looked up so far.
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl MetadataLookup for MockMetadata {
    async fn title(&self, content_id: &str) -> Result<String, MetadataError> {
        self.lookups.write().await.push(content_id.to_string());
        self.titles
            .read()
            .await
            .get(content_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(content_id.to_string()))
    }
}
