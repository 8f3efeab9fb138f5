//! CLI output formatting.
//!
//! Output is **information-centric**: every entity is shown by its identity
//! (id, type, title) first, with paths and counts as indented context lines.
//!
//! # Output Format
//!
//! ## Dump
//!
//! ```text
//! My Blog (https://example.com)
//!     3 items: 1 attachment, 1 page, 1 post
//!
//! 0001 page About
//!     Slug: about
//! 0002 post Hello world
//!     Slug: hello-world
//!     Date: 2020-03-14
//!     Attachments: 1
//!     Comments: 2
//! 0003 attachment photo.jpg
//!     Parent: 2
//!     Url: https://example.com/wp-content/uploads/photo.jpg
//! ```
//!
//! ## Export
//!
//! ```text
//! Section content/pages/about (created)
//! page About → content/pages/about/_index.md
//!     Resources: 2
//!     Media: 1 downloaded, 1 present
//! post Hello world → content/posts/2020/2020_03_14_hello-world/index.md
//!     Comments: 2
//!
//! Exported 1 post, 1 page
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::attachments::MediaStats;
use crate::export::{ExportEvent, ExportSummary};
use crate::model::{ContentItem, ItemType};
use crate::naming;
use crate::site::Site;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Non-zero media counters, e.g. `1 downloaded, 2 failed`.
fn media_line(media: &MediaStats) -> Option<String> {
    let parts: Vec<String> = [
        (media.downloaded, "downloaded"),
        (media.already_present, "present"),
        (media.skipped, "skipped"),
        (media.failed, "failed"),
        (media.unknown, "unknown"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{n} {label}"))
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

// ============================================================================
// Dump
// ============================================================================

fn item_lines(site: &Site, item: &ContentItem) -> Vec<String> {
    let title = if item.title.is_empty() {
        format!("({})", item.name)
    } else {
        item.title.clone()
    };
    let mut lines = vec![format!("{:0>4} {} {}", item.id, item.item_type.as_str(), title)];

    if item.parent_id != 0 {
        lines.push(format!("{}Parent: {}", indent(1), item.parent_id));
    }
    match item.item_type {
        ItemType::Attachment => {
            lines.push(format!("{}Url: {}", indent(1), item.attachment_url));
        }
        ItemType::Post | ItemType::Page => {
            if !item.name.is_empty() {
                lines.push(format!("{}Slug: {}", indent(1), item.name));
            }
            if item.item_type == ItemType::Post {
                lines.push(format!(
                    "{}Date: {}",
                    indent(1),
                    naming::front_matter_date(&item.created)
                ));
            }
            let attachments = site.attachments_of(item.id).len();
            if attachments > 0 {
                lines.push(format!("{}Attachments: {}", indent(1), attachments));
            }
        }
        ItemType::Other(_) => {}
    }
    if !item.comments.is_empty() {
        lines.push(format!("{}Comments: {}", indent(1), item.comments.len()));
    }
    lines
}

/// Format the merged export as an item inventory.
pub fn format_dump(site: &Site) -> Vec<String> {
    let channel = site.channel();
    let mut lines = vec![format!("{} ({})", channel.title, channel.link)];

    let counts: Vec<String> = site
        .type_counts()
        .into_iter()
        .map(|(kind, n)| plural(n, &kind))
        .collect();
    let total = plural(site.items().len(), "item");
    if counts.is_empty() {
        lines.push(format!("{}{}", indent(1), total));
    } else {
        lines.push(format!("{}{}: {}", indent(1), total, counts.join(", ")));
    }

    if !site.items().is_empty() {
        lines.push(String::new());
    }
    for item in site.items() {
        lines.extend(item_lines(site, item));
    }
    lines
}

pub fn print_dump(site: &Site) {
    for line in format_dump(site) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

/// Format a single progress event.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::SectionPromoted { dir, created } => {
            let how = if *created { "created" } else { "promoted" };
            vec![format!("Section {} ({})", dir.display(), how)]
        }
        ExportEvent::ItemWritten {
            item_type,
            title,
            path,
            resources,
            comments,
            media,
        } => {
            let mut lines = vec![format!(
                "{} {} → {}",
                item_type.as_str(),
                title,
                path.display()
            )];
            if *resources > 0 {
                lines.push(format!("{}Resources: {}", indent(1), resources));
            }
            if let Some(media) = media_line(media) {
                lines.push(format!("{}Media: {}", indent(1), media));
            }
            if *comments > 0 {
                lines.push(format!("{}Comments: {}", indent(1), comments));
            }
            lines
        }
    }
}

/// Format the closing summary of an export run.
pub fn format_export_summary(summary: &ExportSummary) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Exported {}, {}",
            plural(summary.posts, "post"),
            plural(summary.pages, "page")
        ),
    ];
    if summary.resources > 0 {
        lines.push(format!("{}Resources: {}", indent(1), summary.resources));
    }
    if let Some(media) = media_line(&summary.media) {
        lines.push(format!("{}Media: {}", indent(1), media));
    }
    if summary.comment_files > 0 {
        lines.push(format!(
            "{}Comment files: {}",
            indent(1),
            summary.comment_files
        ));
    }
    lines
}

pub fn print_export_summary(summary: &ExportSummary) {
    for line in format_export_summary(summary) {
        println!("{}", line);
    }
}
