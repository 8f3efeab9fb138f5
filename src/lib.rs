//! # wp2hugo
//!
//! Converts WordPress export files (WXR) into a Hugo content tree. The export
//! is a flat list of records; the output is a directory hierarchy of page
//! bundles with front matter, Markdown bodies, downloaded media and comment
//! threads.
//!
//! # Architecture: Read, Resolve, Write
//!
//! ```text
//! 1. Read      *.xml    →  Channel        (streaming XML → flat records)
//! 2. Resolve   Channel  →  Site           (id index, parent chains, attachments)
//! 3. Export    Site     →  build/content/ (bundles, media, comments.yaml)
//! ```
//!
//! Reading is separate from writing so `wp2hugo dump` can show exactly what
//! an export would see, and so the export logic can be tested against
//! in-memory sites without XML fixtures.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`wxr`] | Streaming WXR reader; merges several files into one [`model::Channel`] |
//! | [`model`] | Content items, comments, front matter and resources |
//! | [`site`] | Id index over the merged items, parent chains, attachment lookup |
//! | [`hierarchy`] | Bundle directory planning and leaf → section promotion |
//! | [`naming`] | Directory names, media classification and bundle subfolders |
//! | [`taxonomy`] | Tags and categories from `<category>` records |
//! | [`attachments`] | Attachment storage, resources and the featured image |
//! | [`fetch`] | HTTP downloads behind the [`fetch::Fetch`] trait |
//! | [`links`] | HTML → Markdown and site link rewriting |
//! | [`comments`] | Flat comment list → nested threads |
//! | [`export`] | Per-item orchestration, progress events and summary |
//! | [`config`] | `wp2hugo.toml` loading, layering and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Order-Independent Layout
//!
//! Hugo distinguishes a leaf page (`index.md`) from a section (`_index.md`)
//! by file name alone. Pages are visited in export order, so a parent can be
//! written before or after its children. Promotion only goes from leaf to
//! section, and a page written into a section directory keeps the section
//! marker, so both orders converge on the same tree. See [`hierarchy`].
//!
//! ## Resumable Downloads
//!
//! A file that already exists is never fetched again, and downloads land in a
//! `.part` file that is renamed on completion. Re-running an interrupted
//! export picks up where it stopped without re-downloading anything.
//!
//! ## Failed Downloads Are Not Fatal
//!
//! Old blogs link to media that has since disappeared. A failed download is
//! logged, counted, and its resource left out of the front matter; the rest
//! of the site is still exported. Malformed input (bad dates, unknown
//! taxonomy domains, dangling page parents) still aborts the run.

pub mod attachments;
pub mod comments;
pub mod config;
pub mod export;
pub mod fetch;
pub mod hierarchy;
pub mod links;
pub mod model;
pub mod naming;
pub mod output;
pub mod site;
pub mod taxonomy;
pub mod wxr;

#[cfg(test)]
pub(crate) mod test_helpers;
