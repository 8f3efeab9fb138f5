//! WordPress eXtended RSS (WXR) reader.
//!
//! An export file is an RSS document with one `<channel>` holding flat
//! `<item>` records. The reader streams the document with `quick-xml` and
//! tracks the element path, so namespaced fields (`wp:post_id`,
//! `content:encoded`, …) are matched by their qualified names and elements
//! with the same local name in other places (`<image><title>` inside the
//! channel, `excerpt:encoded`) are never confused with item fields.
//!
//! Several files are merged into one logical channel: items are concatenated
//! in file order and the first file's title, description and link win.

use crate::model::{CategoryRecord, Channel, Comment, ContentItem, ItemType, MetaEntry};
use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// `wp:post_date` / `wp:comment_date` format.
pub const WP_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum WxrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),
    #[error("Invalid date {value:?}, expected YYYY-MM-DD HH:MM:SS")]
    InvalidDate { value: String },
    #[error("Invalid number in <{field}>: {value:?}")]
    InvalidNumber { field: String, value: String },
    #[error("No <channel> element found")]
    NoChannel,
    #[error("No export files given")]
    NoInput,
    #[error("Failed to read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: Box<WxrError>,
    },
}

/// Read and merge several export files.
pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<Channel, WxrError> {
    let mut merged: Option<Channel> = None;
    for path in paths {
        let channel = read_file(path.as_ref())?;
        match merged.as_mut() {
            None => {
                tracing::info!(items = channel.items.len(), "Created the first channel");
                merged = Some(channel);
            }
            Some(existing) => {
                existing.items.extend(channel.items);
                tracing::info!(
                    items = existing.items.len(),
                    "Merged channel into existing one"
                );
            }
        }
    }
    merged.ok_or(WxrError::NoInput)
}

/// Read a single export file.
pub fn read_file(path: &Path) -> Result<Channel, WxrError> {
    tracing::info!(path = %path.display(), "Reading export file");
    let wrap = |e: WxrError| WxrError::File {
        path: path.to_path_buf(),
        source: Box::new(e),
    };
    let file = File::open(path).map_err(|e| wrap(e.into()))?;
    let channel = parse(Reader::from_reader(BufReader::new(file))).map_err(wrap)?;
    tracing::info!(
        path = %path.display(),
        items = channel.items.len(),
        "Parsed export file"
    );
    Ok(channel)
}

/// Parse an export document held in memory.
pub fn parse_str(xml: &str) -> Result<Channel, WxrError> {
    parse(Reader::from_reader(xml.as_bytes()))
}

pub fn parse_date(raw: &str) -> Result<NaiveDateTime, WxrError> {
    NaiveDateTime::parse_from_str(raw.trim(), WP_DATE_FORMAT).map_err(|_| {
        WxrError::InvalidDate {
            value: raw.to_string(),
        }
    })
}

fn parse_number(field: &str, raw: &str) -> Result<i64, WxrError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|_| WxrError::InvalidNumber {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

// ============================================================================
// Streaming parser
// ============================================================================

/// Element path depths: `rss` = 1, `channel` = 2, `item` = 3, …
const CHANNEL_DEPTH: usize = 2;
const ITEM_DEPTH: usize = 3;
const ITEM_FIELD_DEPTH: usize = 4;
const NESTED_FIELD_DEPTH: usize = 5;

#[derive(Default)]
struct ItemBuilder {
    item: Option<ContentItem>,
    category: Option<CategoryRecord>,
    meta: Option<MetaEntry>,
    comment: Option<Comment>,
}

struct Parser {
    stack: Vec<String>,
    text: String,
    channel: Option<Channel>,
    /// Only the first channel of a document is read.
    in_first_channel: bool,
    current: ItemBuilder,
}

fn blank_item() -> ContentItem {
    ContentItem {
        id: 0,
        parent_id: 0,
        item_type: ItemType::Other(String::new()),
        name: String::new(),
        title: String::new(),
        creator: String::new(),
        created: NaiveDateTime::default(),
        content: String::new(),
        menu_order: 0,
        attachment_url: String::new(),
        categories: Vec::new(),
        metadata: Vec::new(),
        comments: Vec::new(),
    }
}

fn blank_comment() -> Comment {
    Comment {
        id: 0,
        parent_id: 0,
        author: String::new(),
        date: NaiveDateTime::default(),
        content: String::new(),
        children: Vec::new(),
    }
}

fn decode_name<R: BufRead>(reader: &Reader<R>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(|_| String::from_utf8_lossy(name).into_owned(), Cow::into_owned)
}

fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "amp" => "&".to_string(),
        "apos" => "'".to_string(),
        "quot" => "\"".to_string(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

fn parse<R: BufRead>(mut reader: Reader<R>) -> Result<Channel, WxrError> {
    let mut parser = Parser {
        stack: Vec::new(),
        text: String::new(),
        channel: None,
        in_first_channel: false,
        current: ItemBuilder::default(),
    };
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = decode_name(&reader, e.name().as_ref());
                parser.start(name, &reader, &e);
            }
            Event::Empty(e) => {
                let name = decode_name(&reader, e.name().as_ref());
                parser.start(name, &reader, &e);
                parser.end()?;
            }
            Event::End(_) => parser.end()?,
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?;
                parser.text.push_str(&text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?;
                parser.text.push_str(&decode_entity(&entity));
            }
            Event::CData(e) => {
                parser.text.push_str(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    parser.channel.ok_or(WxrError::NoChannel)
}

impl Parser {
    fn in_item(&self) -> bool {
        self.in_first_channel && self.current.item.is_some()
    }

    fn start<R: BufRead>(&mut self, name: String, reader: &Reader<R>, e: &BytesStart) {
        self.stack.push(name);
        self.text.clear();
        let depth = self.stack.len();
        let name = self.stack[depth - 1].as_str();

        match (depth, name) {
            (CHANNEL_DEPTH, "channel") if self.channel.is_none() => {
                self.channel = Some(Channel::default());
                self.in_first_channel = true;
            }
            (ITEM_DEPTH, "item") if self.in_first_channel => {
                self.current.item = Some(blank_item());
            }
            (ITEM_FIELD_DEPTH, "category") if self.in_item() => {
                let mut record = CategoryRecord {
                    domain: String::new(),
                    name: String::new(),
                    title: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().map_or_else(
                        |_| String::from_utf8_lossy(&attr.value).into_owned(),
                        Cow::into_owned,
                    );
                    match decode_name(reader, attr.key.as_ref()).as_str() {
                        "domain" => record.domain = value,
                        "nicename" => record.name = value,
                        _ => {}
                    }
                }
                self.current.category = Some(record);
            }
            (ITEM_FIELD_DEPTH, "wp:postmeta") if self.in_item() => {
                self.current.meta = Some(MetaEntry {
                    key: String::new(),
                    value: String::new(),
                });
            }
            (ITEM_FIELD_DEPTH, "wp:comment") if self.in_item() => {
                self.current.comment = Some(blank_comment());
            }
            _ => {}
        }
    }

    fn end(&mut self) -> Result<(), WxrError> {
        let depth = self.stack.len();
        let Some(name) = self.stack.pop() else {
            return Ok(());
        };
        let text = std::mem::take(&mut self.text);

        if !self.in_first_channel {
            return Ok(());
        }

        match depth {
            CHANNEL_DEPTH if name == "channel" => {
                self.in_first_channel = false;
            }
            ITEM_DEPTH => self.end_channel_field(&name, text),
            ITEM_FIELD_DEPTH if self.in_item() => self.end_item_field(&name, text)?,
            NESTED_FIELD_DEPTH if self.in_item() => self.end_nested_field(&name, text)?,
            _ => {}
        }
        Ok(())
    }

    fn end_channel_field(&mut self, name: &str, text: String) {
        if name == "item" {
            if let (Some(channel), Some(item)) = (self.channel.as_mut(), self.current.item.take()) {
                channel.items.push(item);
            }
            return;
        }
        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        match name {
            "title" => channel.title = text.trim().to_string(),
            "description" => channel.description = text.trim().to_string(),
            "link" => channel.link = text.trim().to_string(),
            _ => {}
        }
    }

    fn end_item_field(&mut self, name: &str, text: String) -> Result<(), WxrError> {
        if name == "category" {
            if let (Some(item), Some(mut record)) =
                (self.current.item.as_mut(), self.current.category.take())
            {
                record.title = text.trim().to_string();
                item.categories.push(record);
            }
            return Ok(());
        }
        if name == "wp:postmeta" {
            if let (Some(item), Some(meta)) = (self.current.item.as_mut(), self.current.meta.take()) {
                item.metadata.push(meta);
            }
            return Ok(());
        }
        if name == "wp:comment" {
            if let (Some(item), Some(comment)) =
                (self.current.item.as_mut(), self.current.comment.take())
            {
                item.comments.push(comment);
            }
            return Ok(());
        }

        let Some(item) = self.current.item.as_mut() else {
            return Ok(());
        };
        match name {
            "title" => item.title = text.trim().to_string(),
            "dc:creator" => item.creator = text.trim().to_string(),
            "content:encoded" => item.content = text,
            "wp:post_id" => item.id = parse_number(name, &text)?,
            "wp:post_name" => item.name = text.trim().to_string(),
            "wp:post_parent" => item.parent_id = parse_number(name, &text)?,
            "wp:post_type" => item.item_type = ItemType::parse(text.trim()),
            "wp:menu_order" => item.menu_order = parse_number(name, &text)?,
            "wp:post_date" => item.created = parse_date(&text)?,
            "wp:attachment_url" => item.attachment_url = text.trim().to_string(),
            _ => {}
        }
        Ok(())
    }

    fn end_nested_field(&mut self, name: &str, text: String) -> Result<(), WxrError> {
        if let Some(meta) = self.current.meta.as_mut() {
            match name {
                "wp:meta_key" => meta.key = text.trim().to_string(),
                "wp:meta_value" => meta.value = text,
                _ => {}
            }
            return Ok(());
        }
        if let Some(comment) = self.current.comment.as_mut() {
            match name {
                "wp:comment_id" => comment.id = parse_number(name, &text)?,
                "wp:comment_parent" => comment.parent_id = parse_number(name, &text)?,
                "wp:comment_author" => comment.author = text.trim().to_string(),
                "wp:comment_date" => comment.date = parse_date(&text)?,
                "wp:comment_content" => comment.content = text,
                _ => {}
            }
        }
        Ok(())
    }
}
