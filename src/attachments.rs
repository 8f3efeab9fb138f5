//! Attachment and featured image resolution.
//!
//! An attachment belongs to an item when its `parent_id` is the item's id.
//! Each one is classified by extension (see [`crate::naming::MediaKind`]),
//! fetched into the item's bundle and, for images, registered as a front
//! matter resource weighted by the attachment's menu order. Track logs and
//! documents are only stored; unknown types are skipped with a warning.
//!
//! The featured image (`_thumbnail_id` metadata) is linked afterwards and
//! only when it points at one of the item's own image resources. Media
//! attached to some other item is not pulled in.

use crate::fetch::{self, DownloadOutcome, Fetch};
use crate::hierarchy::ensure_dir;
use crate::model::{ContentItem, FrontMatter, Resource};
use crate::naming::{self, IMAGES_DIR, MediaKind, MediaName};
use crate::site::Site;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const THUMBNAIL_META_KEY: &str = "_thumbnail_id";

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid _thumbnail_id value for item {item_id}: {value:?}")]
    InvalidThumbnailId { item_id: i64, value: String },
}

/// An attachment of an item together with its parsed file name.
#[derive(Debug, Clone)]
pub struct ResolvedAttachment<'a> {
    pub source: &'a ContentItem,
    pub media: MediaName,
}

impl ResolvedAttachment<'_> {
    /// Where the file is stored inside `item_dir`. `None` for unknown types.
    pub fn destination(&self, item_dir: &Path) -> Option<PathBuf> {
        self.media
            .kind
            .subfolder()
            .map(|dir| item_dir.join(dir).join(&self.media.file_name))
    }

    /// Front matter entry, for images only.
    pub fn resource(&self) -> Option<Resource> {
        if self.media.kind != MediaKind::Image {
            return None;
        }
        let src = self.media.bundle_path()?;
        Some(Resource::new(
            src,
            self.source.content.clone(),
            self.source.menu_order,
        ))
    }
}

/// Every attachment of `item_id`, in collection order.
pub fn resolve<'a>(site: &'a Site, item_id: i64) -> Vec<ResolvedAttachment<'a>> {
    site.attachments_of(item_id)
        .into_iter()
        .map(|source| ResolvedAttachment {
            media: naming::parse_media_url(&source.attachment_url),
            source,
        })
        .collect()
}

/// Per-run counters over attachment handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaStats {
    pub downloaded: usize,
    pub already_present: usize,
    pub skipped: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl MediaStats {
    fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded => self.downloaded += 1,
            DownloadOutcome::AlreadyPresent => self.already_present += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn add(&mut self, other: &MediaStats) {
        self.downloaded += other.downloaded;
        self.already_present += other.already_present;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.unknown += other.unknown;
    }
}

/// Store the attachments of `item` under `item_dir` and return the image
/// resources for its front matter.
///
/// A failed download is logged and leaves its resource out; it does not
/// abort the export.
pub fn store_attachments(
    site: &Site,
    item: &ContentItem,
    item_dir: &Path,
    fetcher: &dyn Fetch,
    skip_downloads: bool,
    stats: &mut MediaStats,
) -> Result<Vec<Resource>, AttachmentError> {
    let mut resources = Vec::new();

    for attachment in resolve(site, item.id) {
        let url = &attachment.source.attachment_url;
        tracing::debug!(file = %attachment.media.original, "Processing attachment");

        let Some(dest) = attachment.destination(item_dir) else {
            tracing::warn!(
                file = %attachment.media.original,
                url = %url,
                "Unknown attachment type, skipping"
            );
            stats.unknown += 1;
            continue;
        };
        if let Some(dir) = dest.parent() {
            ensure_dir(dir)?;
        }

        let outcome = fetch::download(fetcher, url, &dest, skip_downloads);
        stats.record(&outcome);
        if let DownloadOutcome::Failed(err) = &outcome {
            tracing::warn!(url = %url, error = %err, "Download failed, leaving attachment out");
            continue;
        }

        if let Some(resource) = attachment.resource() {
            resources.push(resource);
        }
    }

    Ok(resources)
}

/// Link the `_thumbnail_id` image to the item's own resources.
///
/// Must run after [`store_attachments`] has filled `front_matter.resources`.
/// A value that is not an integer is fatal; an id that resolves to nothing,
/// or to media not among the resources, leaves the front matter unchanged.
pub fn apply_featured_image(
    site: &Site,
    item: &ContentItem,
    front_matter: &mut FrontMatter,
) -> Result<(), AttachmentError> {
    let Some(raw) = item.meta(THUMBNAIL_META_KEY) else {
        return Ok(());
    };
    let media_id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AttachmentError::InvalidThumbnailId {
            item_id: item.id,
            value: raw.to_string(),
        })?;

    let Some(media) = site.find_item(media_id) else {
        tracing::debug!(item = item.id, media_id, "Featured image item not found");
        return Ok(());
    };
    let file_name = naming::parse_media_url(&media.attachment_url).file_name;
    let src = format!("{IMAGES_DIR}/{file_name}");

    match front_matter
        .resources
        .iter_mut()
        .find(|r| r.source_path == src)
    {
        Some(resource) => {
            resource.mark_featured();
            front_matter.featured_image = Some(src);
        }
        None => {
            tracing::debug!(item = item.id, src = %src, "Featured image is not attached to this item");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FakeFetcher, attachment, post, site_of, with_meta};
    use tempfile::TempDir;

    const PHOTO: &str = "https://example.com/wp-content/uploads/2020/03/photo.JPG";

    #[test]
    fn image_resource_is_case_folded_and_weighted() {
        let site = site_of(vec![post(1, "p"), attachment(2, 1, PHOTO, 4)]);
        let resolved = resolve(&site, 1);
        assert_eq!(resolved.len(), 1);

        let r = resolved[0].resource().unwrap();
        assert_eq!(r.source_path, "images/photo.jpg");
        assert_eq!(r.params.get("weight"), Some(&serde_yaml::Value::from(4i64)));
        assert!(!r.is_featured());
    }

    #[test]
    fn non_images_have_destinations_but_no_resource() {
        let site = site_of(vec![
            post(1, "p"),
            attachment(2, 1, "https://example.com/u/Track.gpx", 0),
            attachment(3, 1, "https://example.com/u/Guide.PDF", 0),
            attachment(4, 1, "https://example.com/u/clip.mp4", 0),
        ]);
        let dir = Path::new("bundle");
        let resolved = resolve(&site, 1);

        assert_eq!(
            resolved[0].destination(dir),
            Some(PathBuf::from("bundle/gpx/track.gpx"))
        );
        assert_eq!(
            resolved[1].destination(dir),
            Some(PathBuf::from("bundle/docs/guide.pdf"))
        );
        assert_eq!(resolved[2].destination(dir), None);
        assert!(resolved.iter().all(|a| a.resource().is_none()));
    }

    #[test]
    fn store_downloads_and_registers_images() {
        let tmp = TempDir::new().unwrap();
        let site = site_of(vec![
            post(1, "p"),
            attachment(2, 1, PHOTO, 1),
            attachment(3, 1, "https://example.com/u/route.gpx", 2),
            attachment(4, 1, "https://example.com/u/clip.mp4", 3),
        ]);
        let fetcher = FakeFetcher::default();
        let mut stats = MediaStats::default();

        let resources = store_attachments(
            &site,
            site.find_item(1).unwrap(),
            tmp.path(),
            &fetcher,
            false,
            &mut stats,
        )
        .unwrap();

        assert_eq!(resources.len(), 1);
        assert!(tmp.path().join("images/photo.jpg").is_file());
        assert!(tmp.path().join("gpx/route.gpx").is_file());
        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.unknown, 1);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[test]
    fn existing_files_are_not_fetched_again() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("images")).unwrap();
        std::fs::write(tmp.path().join("images/photo.jpg"), b"cached").unwrap();
        let site = site_of(vec![post(1, "p"), attachment(2, 1, PHOTO, 1)]);
        let fetcher = FakeFetcher::default();
        let mut stats = MediaStats::default();

        let resources = store_attachments(
            &site,
            site.find_item(1).unwrap(),
            tmp.path(),
            &fetcher,
            false,
            &mut stats,
        )
        .unwrap();

        assert_eq!(resources.len(), 1);
        assert!(fetcher.requests().is_empty());
        assert_eq!(stats.already_present, 1);
    }

    #[test]
    fn failed_download_drops_resource_and_continues() {
        let tmp = TempDir::new().unwrap();
        let ok = "https://example.com/u/ok.png";
        let site = site_of(vec![
            post(1, "p"),
            attachment(2, 1, PHOTO, 1),
            attachment(3, 1, ok, 2),
        ]);
        let fetcher = FakeFetcher::failing(&[PHOTO]);
        let mut stats = MediaStats::default();

        let resources = store_attachments(
            &site,
            site.find_item(1).unwrap(),
            tmp.path(),
            &fetcher,
            false,
            &mut stats,
        )
        .unwrap();

        let srcs: Vec<&str> = resources.iter().map(|r| r.source_path.as_str()).collect();
        assert_eq!(srcs, vec!["images/ok.png"]);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.downloaded, 1);
    }

    #[test]
    fn skipped_downloads_still_register_resources() {
        let tmp = TempDir::new().unwrap();
        let site = site_of(vec![post(1, "p"), attachment(2, 1, PHOTO, 1)]);
        let fetcher = FakeFetcher::default();
        let mut stats = MediaStats::default();

        let resources = store_attachments(
            &site,
            site.find_item(1).unwrap(),
            tmp.path(),
            &fetcher,
            true,
            &mut stats,
        )
        .unwrap();

        assert_eq!(resources.len(), 1);
        assert!(tmp.path().join("images").is_dir());
        assert!(!tmp.path().join("images/photo.jpg").exists());
        assert_eq!(stats.skipped, 1);
    }

    fn front_matter_for(site: &Site, id: i64) -> FrontMatter {
        FrontMatter {
            resources: resolve(site, id)
                .iter()
                .filter_map(ResolvedAttachment::resource)
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn featured_image_links_own_attachment() {
        let cover = "https://example.com/wp-content/uploads/cover.png";
        let site = site_of(vec![
            with_meta(post(1, "p"), THUMBNAIL_META_KEY, "42"),
            attachment(42, 1, cover, 0),
        ]);
        let mut fm = front_matter_for(&site, 1);

        apply_featured_image(&site, site.find_item(1).unwrap(), &mut fm).unwrap();

        assert_eq!(fm.featured_image.as_deref(), Some("images/cover.png"));
        assert!(fm.resources[0].is_featured());
    }

    #[test]
    fn featured_image_of_other_item_is_ignored() {
        let cover = "https://example.com/wp-content/uploads/cover.png";
        let site = site_of(vec![
            with_meta(post(1, "p"), THUMBNAIL_META_KEY, "42"),
            post(2, "other"),
            attachment(42, 2, cover, 0),
            attachment(43, 1, "https://example.com/u/own.png", 0),
        ]);
        let mut fm = front_matter_for(&site, 1);

        apply_featured_image(&site, site.find_item(1).unwrap(), &mut fm).unwrap();

        assert_eq!(fm.featured_image, None);
        assert!(!fm.resources[0].is_featured());
    }

    #[test]
    fn missing_thumbnail_item_is_ignored() {
        let site = site_of(vec![with_meta(post(1, "p"), THUMBNAIL_META_KEY, "7")]);
        let mut fm = FrontMatter::default();
        apply_featured_image(&site, site.find_item(1).unwrap(), &mut fm).unwrap();
        assert_eq!(fm.featured_image, None);
    }

    #[test]
    fn malformed_thumbnail_id_is_fatal() {
        let site = site_of(vec![with_meta(post(1, "p"), THUMBNAIL_META_KEY, "abc")]);
        let mut fm = FrontMatter::default();
        let err = apply_featured_image(&site, site.find_item(1).unwrap(), &mut fm).unwrap_err();
        assert!(matches!(
            err,
            AttachmentError::InvalidThumbnailId { item_id: 1, .. }
        ));
    }

    #[test]
    fn no_thumbnail_meta_is_noop() {
        let site = site_of(vec![post(1, "p")]);
        let mut fm = FrontMatter::default();
        apply_featured_image(&site, site.find_item(1).unwrap(), &mut fm).unwrap();
        assert_eq!(fm, FrontMatter::default());
    }
}
