//! Centralized naming rules for everything the exporter writes to disk.
//!
//! Attachment files are stored under a lowercased copy of the last segment of
//! their URL, in a subfolder picked from the extension:
//!
//! - `https://site/wp-content/uploads/2020/03/Photo.JPG` → `images/photo.jpg`
//! - `…/route.GPX` → `gpx/route.gpx`
//! - `…/Brochure.pdf` → `docs/brochure.pdf`
//!
//! Posts live in a date-derived directory, `posts/2020/2020_03_14_<slug>`.
//! Pages are named by their slug and nested under their ancestors, see
//! [`crate::hierarchy`].

use chrono::NaiveDateTime;

pub const IMAGES_DIR: &str = "images";
pub const GPX_DIR: &str = "gpx";
pub const DOCS_DIR: &str = "docs";

/// Marker file of a single page bundle.
pub const LEAF_INDEX: &str = "index.md";
/// Marker file of a list section (a page with children).
pub const SECTION_INDEX: &str = "_index.md";
/// Side file holding the comment threads of an item.
pub const COMMENTS_FILE: &str = "comments.yaml";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Attachment classification by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    TrackLog,
    Document,
    Unknown,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            e if IMAGE_EXTENSIONS.contains(&e) => Self::Image,
            "gpx" => Self::TrackLog,
            "pdf" => Self::Document,
            _ => Self::Unknown,
        }
    }

    /// Bundle subfolder the file is stored in; `None` for unknown types.
    pub fn subfolder(self) -> Option<&'static str> {
        match self {
            Self::Image => Some(IMAGES_DIR),
            Self::TrackLog => Some(GPX_DIR),
            Self::Document => Some(DOCS_DIR),
            Self::Unknown => None,
        }
    }
}

/// Result of parsing an attachment URL.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaName {
    /// Last path segment exactly as it appears in the URL.
    pub original: String,
    /// Lowercased file name used on disk.
    pub file_name: String,
    /// Lowercased extension without the dot, empty when there is none.
    pub extension: String,
    pub kind: MediaKind,
}

impl MediaName {
    /// Bundle-relative path, e.g. `images/photo.jpg`. `None` for unknown types.
    pub fn bundle_path(&self) -> Option<String> {
        self.kind
            .subfolder()
            .map(|dir| format!("{dir}/{}", self.file_name))
    }
}

/// Parse the file name out of an attachment URL.
///
/// Query strings and fragments are ignored:
/// - `"https://x/wp-content/uploads/2020/03/Photo.JPG"` → `photo.jpg`, image
/// - `"https://x/a/route.gpx?ver=2"` → `route.gpx`, track log
/// - `"https://x/a/notes"` → `notes`, unknown
pub fn parse_media_url(url: &str) -> MediaName {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let original = path.rsplit('/').next().unwrap_or(path).to_string();
    let file_name = original.to_lowercase();
    let extension = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
        _ => String::new(),
    };
    let kind = MediaKind::from_extension(&extension);
    MediaName {
        original,
        file_name,
        extension,
        kind,
    }
}

pub fn is_image_file(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| MediaKind::from_extension(ext) == MediaKind::Image)
}

/// Year directory and bundle directory of a post.
///
/// `2020-03-14 10:00:00` + `hello-world` → (`"2020"`, `"2020_03_14_hello-world"`)
pub fn post_dir_names(created: &NaiveDateTime, slug: &str) -> (String, String) {
    (
        created.format("%Y").to_string(),
        format!("{}{}", created.format("%Y_%m_%d_"), slug),
    )
}

/// Front matter date, `YYYY-MM-DD`.
pub fn front_matter_date(created: &NaiveDateTime) -> String {
    created.format("%Y-%m-%d").to_string()
}
