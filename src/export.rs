//! Export orchestration: one content bundle per post and page.
//!
//! For every exported item, in collection order:
//!
//! ```text
//! plan directory → materialize (promote ancestors) → taxonomies
//!   → store attachments → featured image → Markdown body → index file
//!   → comments.yaml
//! ```
//!
//! Anything that leaves the tree in an undefined state (broken hierarchy,
//! unknown taxonomy, bad metadata, I/O) aborts the run. Failed downloads do
//! not: the resource is left out, a warning is logged and the failure is
//! counted in the [`ExportSummary`].
//!
//! Progress is reported through an optional [`ExportEvent`] channel so the
//! CLI can print while the export runs.

use crate::attachments::{self, AttachmentError, MediaStats};
use crate::comments::{self, CommentError};
use crate::config::ExportConfig;
use crate::fetch::Fetch;
use crate::hierarchy::{self, ContentRoots, Placement, SectionChange};
use crate::links::LinkRewriter;
use crate::model::{ContentItem, FrontMatter, ItemType};
use crate::naming::{self, COMMENTS_FILE};
use crate::site::{Site, SiteError};
use crate::taxonomy::{self, TaxonomyError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid link pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Attachment(#[from] AttachmentError),
    #[error(transparent)]
    Comments(#[from] CommentError),
}

/// Progress events sent while an export runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// A page directory became a section because a child was placed under it.
    SectionPromoted { dir: PathBuf, created: bool },
    /// An item's index file was written.
    ItemWritten {
        item_type: ItemType,
        title: String,
        /// Index file, relative to the output directory.
        path: PathBuf,
        resources: usize,
        comments: usize,
        media: MediaStats,
    },
}

/// Totals over one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub posts: usize,
    pub pages: usize,
    pub resources: usize,
    pub media: MediaStats,
    pub comment_files: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posts, {} pages, {} resources; media: {} downloaded, {} present, {} skipped, {} failed, {} unknown; {} comment files",
            self.posts,
            self.pages,
            self.resources,
            self.media.downloaded,
            self.media.already_present,
            self.media.skipped,
            self.media.failed,
            self.media.unknown,
            self.comment_files,
        )
    }
}

/// Write the whole site into `config.output_directory`.
pub fn export(
    site: &Site,
    config: &ExportConfig,
    fetcher: &dyn Fetch,
    events: Option<Sender<ExportEvent>>,
) -> Result<ExportSummary, ExportError> {
    let roots = ContentRoots::new(&config.output_directory);
    roots.ensure()?;
    let rewriter = LinkRewriter::new(site.base_link())?;

    let mut summary = ExportSummary::default();
    for item in site.items().iter().filter(|i| i.item_type.is_exported()) {
        let Some(plan) = hierarchy::plan(site, item, &roots)? else {
            continue;
        };
        let placement = hierarchy::materialize(&plan)?;
        report_promotions(&placement, &roots, events.as_ref());

        let mut media = MediaStats::default();
        let front_matter = build_front_matter(site, item, &placement, fetcher, config, &mut media)?;
        let body = rewriter.convert(&item.content);

        let index = placement.index_path();
        write_content_file(&index, &front_matter, &body)?;
        tracing::info!(id = item.id, path = %index.display(), "Wrote {}", item.item_type.as_str());

        let comment_count = if config.skip_comments {
            0
        } else {
            write_comments(item, &placement.item_dir)?
        };

        match item.item_type {
            ItemType::Post => summary.posts += 1,
            ItemType::Page => summary.pages += 1,
            _ => {}
        }
        summary.resources += front_matter.resources.len();
        summary.media.add(&media);
        if comment_count > 0 {
            summary.comment_files += 1;
        }

        if let Some(tx) = &events {
            tx.send(ExportEvent::ItemWritten {
                item_type: item.item_type.clone(),
                title: item.title.clone(),
                path: relative_to(&index, &roots.output),
                resources: front_matter.resources.len(),
                comments: comment_count,
                media,
            })
            .ok();
        }
    }

    Ok(summary)
}

fn build_front_matter(
    site: &Site,
    item: &ContentItem,
    placement: &Placement,
    fetcher: &dyn Fetch,
    config: &ExportConfig,
    media: &mut MediaStats,
) -> Result<FrontMatter, ExportError> {
    let taxonomies = taxonomy::resolve(&item.categories)?;
    let mut front_matter = FrontMatter {
        title: item.title.clone(),
        date: naming::front_matter_date(&item.created),
        slug: item.name.clone(),
        featured_image: None,
        categories: taxonomies.categories,
        tags: taxonomies.tags,
        resources: Vec::new(),
    };

    front_matter.resources = attachments::store_attachments(
        site,
        item,
        &placement.item_dir,
        fetcher,
        config.skip_downloads,
        media,
    )?;
    attachments::apply_featured_image(site, item, &mut front_matter)?;
    Ok(front_matter)
}

/// Render a content file: YAML front matter between `---` lines, a blank
/// line, then the body.
pub fn render_content_file(front_matter: &FrontMatter, body: &str) -> Result<String, ExportError> {
    let yaml = serde_yaml::to_string(front_matter)?;
    Ok(format!("---\n{yaml}---\n\n{body}"))
}

fn write_content_file(path: &Path, front_matter: &FrontMatter, body: &str) -> Result<(), ExportError> {
    fs::write(path, render_content_file(front_matter, body)?)?;
    Ok(())
}

/// Write `comments.yaml` for `item`. Returns the number of comments written.
fn write_comments(item: &ContentItem, item_dir: &Path) -> Result<usize, ExportError> {
    if item.comments.is_empty() {
        return Ok(0);
    }
    let forest = comments::build_tree(&item.comments, 0)?;
    let count = comments::count(&forest);
    if count == 0 {
        return Ok(0);
    }
    let path = item_dir.join(COMMENTS_FILE);
    fs::write(&path, serde_yaml::to_string(&forest)?)?;
    tracing::debug!(path = %path.display(), count, "Wrote comments");
    Ok(count)
}

fn report_promotions(placement: &Placement, roots: &ContentRoots, events: Option<&Sender<ExportEvent>>) {
    let Some(tx) = events else { return };
    for (dir, change) in &placement.section_changes {
        let created = match change {
            SectionChange::Unchanged => continue,
            SectionChange::Created => true,
            SectionChange::Promoted => false,
        };
        tx.send(ExportEvent::SectionPromoted {
            dir: relative_to(dir, &roots.output),
            created,
        })
        .ok();
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}
