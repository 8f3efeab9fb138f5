//! Read-only export context over the merged item collection.
//!
//! Every resolver borrows a [`Site`] instead of reaching into shared state.
//! Lookups by id go through an index built once at construction; when several
//! items share an id (overlapping export files) the first one wins.

use crate::model::{Channel, ContentItem, ItemType};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SiteError {
    #[error("Invalid parent hierarchy for page {title} ({item_id}): parent {missing_parent} not found")]
    BrokenHierarchy {
        item_id: i64,
        title: String,
        missing_parent: i64,
    },
    #[error("Parent hierarchy of item {item_id} loops back on itself")]
    CyclicHierarchy { item_id: i64 },
}

#[derive(Debug)]
pub struct Site {
    channel: Channel,
    index: HashMap<i64, usize>,
}

impl Site {
    pub fn new(channel: Channel) -> Self {
        let mut index = HashMap::with_capacity(channel.items.len());
        for (pos, item) in channel.items.iter().enumerate() {
            index.entry(item.id).or_insert(pos);
        }
        Self { channel, index }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.channel.items
    }

    /// Base link of the source site, without a trailing slash.
    pub fn base_link(&self) -> &str {
        self.channel.link.trim_end_matches('/')
    }

    pub fn find_item(&self, id: i64) -> Option<&ContentItem> {
        self.index.get(&id).map(|&pos| &self.channel.items[pos])
    }

    /// Attachments whose parent is `id`, in collection order.
    pub fn attachments_of(&self, id: i64) -> Vec<&ContentItem> {
        if id == 0 {
            return Vec::new();
        }
        self.channel
            .items
            .iter()
            .filter(|i| i.parent_id == id && i.item_type == ItemType::Attachment)
            .collect()
    }

    /// Ancestor chain of `item`, nearest parent first.
    ///
    /// A parent id that resolves to nothing is a [`SiteError::BrokenHierarchy`];
    /// revisiting an item is a [`SiteError::CyclicHierarchy`].
    pub fn ancestors<'a>(&'a self, item: &ContentItem) -> Result<Vec<&'a ContentItem>, SiteError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([item.id]);
        let mut parent_id = item.parent_id;
        while parent_id != 0 {
            let parent = self
                .find_item(parent_id)
                .ok_or_else(|| SiteError::BrokenHierarchy {
                    item_id: item.id,
                    title: item.title.clone(),
                    missing_parent: parent_id,
                })?;
            if !seen.insert(parent.id) {
                return Err(SiteError::CyclicHierarchy { item_id: item.id });
            }
            chain.push(parent);
            parent_id = parent.parent_id;
        }
        Ok(chain)
    }

    /// Number of items per `wp:post_type`, sorted by type name.
    pub fn type_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &self.channel.items {
            *counts.entry(item.item_type.as_str()).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        counts.sort();
        counts
    }
}
