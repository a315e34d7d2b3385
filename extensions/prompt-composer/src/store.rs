//! Block store - in-memory storage owned by one server instance

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::types::{Block, ComposerError, ComposerResult};

/// Named prompt blocks, shared between clones of one server
#[derive(Clone, Debug)]
pub struct BlockStore {
    inner: Arc<RwLock<HashMap<String, Block>>>,
    max_blocks: usize,
}

impl BlockStore {
    pub fn new(max_blocks: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_blocks,
        }
    }

    /// Insert or replace a block; returns true if the name was new
    ///
    /// Replacing never fails on capacity.
    pub async fn save(
        &self,
        name: String,
        content: String,
        tags: Vec<String>,
    ) -> ComposerResult<bool> {
        let mut blocks = self.inner.write().await;

        let created = !blocks.contains_key(&name);
        if created && blocks.len() >= self.max_blocks {
            return Err(ComposerError::StoreFull {
                max: self.max_blocks,
            });
        }

        let block = Block {
            name: name.clone(),
            content,
            tags,
            updated_at: Utc::now(),
        };
        blocks.insert(name, block);
        Ok(created)
    }

    pub async fn get(&self, name: &str) -> Option<Block> {
        self.inner.read().await.get(name).cloned()
    }

    /// Fetch several blocks in the order given
    ///
    /// Fails on the first missing name.
    pub async fn get_many(&self, names: &[String]) -> ComposerResult<Vec<Block>> {
        let blocks = self.inner.read().await;
        names
            .iter()
            .map(|name| {
                blocks
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ComposerError::BlockNotFound(name.clone()))
            })
            .collect()
    }

    /// All blocks sorted by name, optionally only those carrying `tag`
    pub async fn list(&self, tag: Option<&str>) -> Vec<Block> {
        let blocks = self.inner.read().await;
        let mut list: Vec<Block> = blocks
            .values()
            .filter(|b| tag.map_or(true, |t| b.tags.iter().any(|bt| bt == t)))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.inner.write().await.remove(name).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_replace() {
        let store = BlockStore::new(4);
        assert!(store
            .save("intro".into(), "Hello".into(), vec![])
            .await
            .unwrap());
        assert!(!store
            .save("intro".into(), "Hi".into(), vec![])
            .await
            .unwrap());

        assert_eq!(store.get("intro").await.unwrap().content, "Hi");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity() {
        let store = BlockStore::new(1);
        store.save("a".into(), "1".into(), vec![]).await.unwrap();

        let err = store.save("b".into(), "2".into(), vec![]).await.unwrap_err();
        assert!(matches!(err, ComposerError::StoreFull { max: 1 }));

        // replacing at capacity is fine
        store.save("a".into(), "3".into(), vec![]).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_many_keeps_order() {
        let store = BlockStore::new(8);
        store.save("a".into(), "A".into(), vec![]).await.unwrap();
        store.save("b".into(), "B".into(), vec![]).await.unwrap();

        let blocks = store
            .get_many(&["b".to_string(), "a".to_string(), "b".to_string()])
            .await
            .unwrap();
        let contents: Vec<&str> = blocks.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(contents, vec!["B", "A", "B"]);

        let err = store.get_many(&["zzz".to_string()]).await.unwrap_err();
        assert!(matches!(err, ComposerError::BlockNotFound(ref n) if n == "zzz"));
    }

    #[tokio::test]
    async fn test_list_by_tag() {
        let store = BlockStore::new(8);
        store
            .save("z".into(), "".into(), vec!["style".into()])
            .await
            .unwrap();
        store.save("m".into(), "".into(), vec![]).await.unwrap();
        store
            .save("a".into(), "".into(), vec!["style".into()])
            .await
            .unwrap();

        let names: Vec<String> = store.list(None).await.into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["a", "m", "z"]);

        let styled: Vec<String> = store
            .list(Some("style"))
            .await
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(styled, vec!["a", "z"]);
    }

    #[tokio::test]
    async fn test_clones_share_state_instances_do_not() {
        let store = BlockStore::new(8);
        let clone = store.clone();
        store.save("a".into(), "A".into(), vec![]).await.unwrap();
        assert!(clone.get("a").await.is_some());

        let other = BlockStore::new(8);
        assert!(other.get("a").await.is_none());

        assert!(clone.remove("a").await);
        assert!(!store.remove("a").await);
    }
}
