//! Shared test utilities for the wp2hugo test suite.
//!
//! Builders produce minimal, valid items so each test only spells out the
//! fields it cares about:
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = site_of(vec![
//!     page(1, 0, "about"),
//!     attachment(2, 1, "https://example.com/wp-content/uploads/me.jpg", 0),
//! ]);
//! ```

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};

use crate::fetch::{Fetch, FetchError};
use crate::model::{Channel, Comment, ContentItem, ItemType, MetaEntry};
use crate::site::Site;

pub const BASE: &str = "https://example.com";

// =========================================================================
// Item builders
// =========================================================================

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn item(id: i64, parent_id: i64, item_type: ItemType, name: &str) -> ContentItem {
    ContentItem {
        id,
        parent_id,
        item_type,
        name: name.to_string(),
        title: name.replace('-', " "),
        creator: "admin".to_string(),
        created: date(2020, 3, 14),
        content: String::new(),
        menu_order: 0,
        attachment_url: String::new(),
        categories: Vec::new(),
        metadata: Vec::new(),
        comments: Vec::new(),
    }
}

pub fn post(id: i64, name: &str) -> ContentItem {
    item(id, 0, ItemType::Post, name)
}

pub fn page(id: i64, parent_id: i64, name: &str) -> ContentItem {
    item(id, parent_id, ItemType::Page, name)
}

pub fn attachment(id: i64, parent_id: i64, url: &str, menu_order: i64) -> ContentItem {
    let file = url.rsplit('/').next().unwrap_or(url);
    let mut a = item(id, parent_id, ItemType::Attachment, file);
    a.attachment_url = url.to_string();
    a.menu_order = menu_order;
    a.content = format!("caption of {file}");
    a
}

pub fn with_meta(mut item: ContentItem, key: &str, value: &str) -> ContentItem {
    item.metadata.push(MetaEntry {
        key: key.to_string(),
        value: value.to_string(),
    });
    item
}

pub fn comment(id: i64, parent_id: i64) -> Comment {
    Comment {
        id,
        parent_id,
        author: format!("author{id}"),
        date: date(2021, 1, 1),
        content: format!("comment {id}"),
        children: Vec::new(),
    }
}

pub fn site_of(items: Vec<ContentItem>) -> Site {
    Site::new(Channel {
        title: "Test blog".to_string(),
        description: String::new(),
        link: BASE.to_string(),
        items,
    })
}

// =========================================================================
// Fetcher double
// =========================================================================

/// Records every request and writes the URL itself as the file body.
/// URLs listed in `failures` answer with HTTP 404.
#[derive(Default)]
pub struct FakeFetcher {
    requests: RefCell<Vec<String>>,
    failures: HashSet<String>,
}

impl FakeFetcher {
    pub fn failing(urls: &[&str]) -> Self {
        Self {
            requests: RefCell::default(),
            failures: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetch for FakeFetcher {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        if self.failures.contains(url) {
            return Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            });
        }
        std::fs::write(dest, url.as_bytes())?;
        Ok(())
    }
}
