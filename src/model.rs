//! Content model shared by the reader, the resolvers and the exporter.
//!
//! Items arrive flat from one or more WordPress export files. Everything the
//! exporter computes (front matter, resources, comment threads) is derived from
//! these records; the records themselves are never rewritten except for the
//! comment tree attached right before serialization.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Kind of a WordPress item, from `wp:post_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemType {
    Post,
    Page,
    Attachment,
    /// Navigation menu items, custom post types, revisions…
    Other(String),
}

impl ItemType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "post" => Self::Post,
            "page" => Self::Page,
            "attachment" => Self::Attachment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Post => "post",
            Self::Page => "page",
            Self::Attachment => "attachment",
            Self::Other(raw) => raw,
        }
    }

    /// Only posts and pages produce content files.
    pub fn is_exported(&self) -> bool {
        matches!(self, Self::Post | Self::Page)
    }
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// A raw `<category>` element of an item: tags and categories share the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub domain: String,
    pub name: String,
    pub title: String,
}

/// One `wp:postmeta` pair. Keys may repeat within an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaEntry {
    pub key: String,
    pub value: String,
}

/// A comment as exported, plus the computed reply thread.
///
/// `id` and `parent_id` only drive tree reconstruction and never reach
/// `comments.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip)]
    pub parent_id: i64,
    pub author: String,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub date: NaiveDateTime,
    pub content: String,
    #[serde(rename = "comments", skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Comment>,
}

fn serialize_rfc3339<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// One post, page, attachment or other record from the export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: i64,
    /// `0` means no parent.
    pub parent_id: i64,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Slug (`wp:post_name`).
    pub name: String,
    pub title: String,
    pub creator: String,
    pub created: NaiveDateTime,
    /// Raw HTML body (`content:encoded`).
    pub content: String,
    pub menu_order: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attachment_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<MetaEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl ContentItem {
    /// First value stored under `key`, in document order.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.value.as_str())
    }
}

/// One export file's channel, or several merged into one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Channel {
    pub title: String,
    pub description: String,
    /// Site base link, e.g. `https://example.com`.
    pub link: String,
    pub items: Vec<ContentItem>,
}

/// Hugo front matter of a generated content file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrontMatter {
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(rename = "featured_image", skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
}

/// A page-bundle resource entry pointing at a locally stored file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Bundle-relative path, e.g. `images/photo.jpg`.
    #[serde(rename = "src")]
    pub source_path: String,
    pub title: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_yaml::Value>,
}

impl Resource {
    pub fn new(source_path: impl Into<String>, title: impl Into<String>, weight: i64) -> Self {
        let mut params = BTreeMap::new();
        params.insert("weight".to_string(), serde_yaml::Value::from(weight));
        Self {
            source_path: source_path.into(),
            title: title.into(),
            params,
        }
    }

    pub fn is_featured(&self) -> bool {
        self.params.get("featured") == Some(&serde_yaml::Value::Bool(true))
    }

    pub fn mark_featured(&mut self) {
        self.params
            .insert("featured".to_string(), serde_yaml::Value::Bool(true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, 14)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn item_type_parses_known_kinds() {
        assert_eq!(ItemType::parse("post"), ItemType::Post);
        assert_eq!(ItemType::parse("page"), ItemType::Page);
        assert_eq!(ItemType::parse("attachment"), ItemType::Attachment);
        assert_eq!(
            ItemType::parse("nav_menu_item"),
            ItemType::Other("nav_menu_item".into())
        );
        assert_eq!(ItemType::parse("nav_menu_item").as_str(), "nav_menu_item");
    }

    #[test]
    fn only_posts_and_pages_are_exported() {
        assert!(ItemType::Post.is_exported());
        assert!(ItemType::Page.is_exported());
        assert!(!ItemType::Attachment.is_exported());
        assert!(!ItemType::Other("revision".into()).is_exported());
    }

    #[test]
    fn front_matter_omits_empty_fields() {
        let fm = FrontMatter {
            title: "Hello".into(),
            date: "2020-03-14".into(),
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&fm).unwrap();
        assert!(yaml.starts_with("title: Hello\n"));
        assert!(yaml.contains("2020-03-14"));
        for key in ["slug", "featured_image", "categories", "tags", "resources"] {
            assert!(!yaml.contains(key), "{key} should be omitted: {yaml}");
        }
    }

    #[test]
    fn resource_params_serialize_sorted() {
        let mut r = Resource::new("images/a.png", "A", 3);
        r.mark_featured();
        assert!(r.is_featured());
        let yaml = serde_yaml::to_string(&r).unwrap();
        assert_eq!(
            yaml,
            "src: images/a.png\ntitle: A\nparams:\n  featured: true\n  weight: 3\n"
        );
    }

    #[test]
    fn comment_hides_ids_and_empty_children() {
        let c = Comment {
            id: 7,
            parent_id: 0,
            author: "ann".into(),
            date: noon(),
            content: "hi".into(),
            children: vec![],
        };
        let yaml = serde_yaml::to_string(&c).unwrap();
        assert!(!yaml.contains("id"));
        assert!(!yaml.contains("comments"));
        assert!(yaml.contains("date: 2020-03-14T12:30:00Z"));
    }

    #[test]
    fn meta_returns_first_match() {
        let item = ContentItem {
            id: 1,
            parent_id: 0,
            item_type: ItemType::Post,
            name: String::new(),
            title: String::new(),
            creator: String::new(),
            created: noon(),
            content: String::new(),
            menu_order: 0,
            attachment_url: String::new(),
            categories: vec![],
            metadata: vec![
                MetaEntry { key: "k".into(), value: "first".into() },
                MetaEntry { key: "k".into(), value: "second".into() },
            ],
            comments: vec![],
        };
        assert_eq!(item.meta("k"), Some("first"));
        assert_eq!(item.meta("missing"), None);
    }
}
