//! Output directory layout for posts and pages.
//!
//! ## Layout
//!
//! ```text
//! build/
//! └── content/
//!     ├── posts/
//!     │   └── 2020/
//!     │       └── 2020_03_14_hello-world/
//!     │           ├── index.md
//!     │           └── images/
//!     └── pages/
//!         └── about/                  # page with children: a section
//!             ├── _index.md
//!             └── team/               # leaf page
//!                 └── index.md
//! ```
//!
//! ## Leaf and Section Markers
//!
//! Hugo tells a single page (`index.md`) from a list section (`_index.md`) by
//! file name only. A page directory starts out as a leaf and is promoted to a
//! section the first time a descendant is placed under it: its `index.md` is
//! renamed to `_index.md`, or an empty `_index.md` is created when the page
//! itself has not been written yet. Promotion never goes the other way.
//!
//! When a page is written into a directory that already holds `_index.md`,
//! the content goes into `_index.md` so the directory never carries both
//! markers. Together these rules make the layout independent of the order in
//! which items are visited, and re-running an export over its own output
//! reaches the same state.

use crate::model::{ContentItem, ItemType};
use crate::naming::{self, LEAF_INDEX, SECTION_INDEX};
use crate::site::{Site, SiteError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Which marker file holds a directory's own content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMarker {
    Leaf,
    Section,
}

impl IndexMarker {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Leaf => LEAF_INDEX,
            Self::Section => SECTION_INDEX,
        }
    }

    /// Marker present in `dir`, section first.
    pub fn detect(dir: &Path) -> Option<Self> {
        if dir.join(SECTION_INDEX).is_file() {
            Some(Self::Section)
        } else if dir.join(LEAF_INDEX).is_file() {
            Some(Self::Leaf)
        } else {
            None
        }
    }
}

/// The fixed roots every export writes under.
#[derive(Debug, Clone)]
pub struct ContentRoots {
    pub output: PathBuf,
    pub content: PathBuf,
    pub posts: PathBuf,
    pub pages: PathBuf,
}

impl ContentRoots {
    pub fn new(output: &Path) -> Self {
        let content = output.join("content");
        Self {
            output: output.to_path_buf(),
            posts: content.join("posts"),
            pages: content.join("pages"),
            content,
        }
    }

    pub fn ensure(&self) -> io::Result<()> {
        for dir in [&self.output, &self.content, &self.posts, &self.pages] {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

/// Where an item goes, before anything touches the disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryPlan {
    /// Ancestor directories, root first. Each must end up as a section.
    pub sections: Vec<PathBuf>,
    /// The item's own bundle directory.
    pub item_dir: PathBuf,
}

/// How an ancestor directory reached the section state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionChange {
    /// Already a section.
    Unchanged,
    /// An empty `_index.md` placeholder was created.
    Created,
    /// `index.md` was renamed to `_index.md`.
    Promoted,
}

/// A materialized plan: the bundle directory exists and its marker is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub item_dir: PathBuf,
    pub marker: IndexMarker,
    pub section_changes: Vec<(PathBuf, SectionChange)>,
}

impl Placement {
    pub fn index_path(&self) -> PathBuf {
        self.item_dir.join(self.marker.file_name())
    }
}

/// Directory name of an item: its slug, or its id for slug-less drafts.
fn dir_name(item: &ContentItem) -> String {
    if item.name.is_empty() {
        item.id.to_string()
    } else {
        item.name.clone()
    }
}

/// Compute where `item` goes. `None` for items that are not exported.
pub fn plan(
    site: &Site,
    item: &ContentItem,
    roots: &ContentRoots,
) -> Result<Option<DirectoryPlan>, SiteError> {
    match item.item_type {
        ItemType::Post => {
            let (year, bundle) = naming::post_dir_names(&item.created, &dir_name(item));
            Ok(Some(DirectoryPlan {
                sections: Vec::new(),
                item_dir: roots.posts.join(year).join(bundle),
            }))
        }
        ItemType::Page => {
            let mut ancestors = site.ancestors(item)?;
            ancestors.reverse();

            let mut sections = Vec::with_capacity(ancestors.len());
            let mut dir = roots.pages.clone();
            for ancestor in ancestors {
                dir.push(dir_name(ancestor));
                sections.push(dir.clone());
            }
            dir.push(dir_name(item));
            Ok(Some(DirectoryPlan {
                sections,
                item_dir: dir,
            }))
        }
        _ => Ok(None),
    }
}

/// Create every directory of `plan`, promoting ancestors to sections.
pub fn materialize(plan: &DirectoryPlan) -> io::Result<Placement> {
    let mut section_changes = Vec::with_capacity(plan.sections.len());
    for dir in &plan.sections {
        ensure_dir(dir)?;
        let change = promote_to_section(dir)?;
        section_changes.push((dir.clone(), change));
    }

    ensure_dir(&plan.item_dir)?;
    let marker = match IndexMarker::detect(&plan.item_dir) {
        Some(IndexMarker::Section) => {
            tracing::debug!(dir = %plan.item_dir.display(), "List index already exists, keeping it");
            IndexMarker::Section
        }
        _ => IndexMarker::Leaf,
    };

    Ok(Placement {
        item_dir: plan.item_dir.clone(),
        marker,
        section_changes,
    })
}

/// Make `dir` a section. Idempotent.
///
/// An empty `_index.md` is a placeholder and yields to an existing `index.md`;
/// a non-empty one is kept and the stray `index.md` is left alone.
pub fn promote_to_section(dir: &Path) -> io::Result<SectionChange> {
    let leaf = dir.join(LEAF_INDEX);
    let section = dir.join(SECTION_INDEX);

    if leaf.is_file() {
        let section_is_placeholder = match fs::metadata(&section) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e),
        };
        if section_is_placeholder {
            tracing::debug!(
                from = %leaf.display(),
                to = %section.display(),
                "Promoting page to section"
            );
            fs::rename(&leaf, &section)?;
            return Ok(SectionChange::Promoted);
        }
        tracing::warn!(dir = %dir.display(), "Both index.md and _index.md exist, keeping _index.md");
        return Ok(SectionChange::Unchanged);
    }

    if section.exists() {
        return Ok(SectionChange::Unchanged);
    }
    fs::File::create(&section)?;
    Ok(SectionChange::Created)
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    tracing::trace!(path = %path.display(), "Ensuring directory exists");
    fs::create_dir_all(path)
}
