//! HTML body conversion and site link rewriting.
//!
//! Bodies are cleaned, converted to Markdown, then every absolute link into
//! the source site is rewritten to Hugo addressing. The converter emits links
//! in a handful of literal shapes, so the rewrite is a fixed sequence of
//! patterns, most specific first:
//!
//! | # | Markdown shape | Result |
//! |---|----------------|--------|
//! | 1 | `[![](…)](BASE/wp-content/…/a.png)` | `{{<figure src="images/a.png">}}` |
//! | 2 | `![](BASE/wp-content/…/a.png)` | `{{<figure src="images/a.png">}}` |
//! | 3 | `[text](BASE/wp-content/…/a.pdf)` | `[text]({{<ref "/docs/a.pdf" >}})` |
//! | 4 | `[text](BASE/category/x/)` | `[text]({{<ref "/categories/x/" >}})` |
//! | 5 | `[text](BASE/some/path/)` | `[text]({{<ref "/some/path/" >}})` |
//!
//! A named link to an image under `wp-content` (shape 3 with an image
//! extension) points at the bundle copy, `[text](images/a.png)`. Any shape may
//! carry a Markdown link title (`(url "title")`); the title is dropped. Shapes
//! 3 to 5 never match the text part of an image (`![…](…)`).
//!
//! All patterns are anchored on the escaped base link, so links to other hosts
//! pass through untouched. File names are lowercased to match the names the
//! attachments are stored under.
//!
//! # Cleaning
//!
//! html2md keeps an `<img>` as raw HTML when it carries presentation
//! attributes (`class`, `width`, `height`), which the classic WordPress editor
//! writes on every inserted image. Before conversion, `<img>` tags are reduced
//! to `src` and `alt`, `<a>` tags to `href` and `title`, and `<script>` and
//! `<style>` blocks are removed.

use crate::naming::{IMAGES_DIR, is_image_file};
use regex::{Captures, Regex};

/// Filename segment: no dots, slashes or blanks in the stem, alphabetic
/// extension.
const FILE: &str = r#"([^./)\s"]+\.[[:alpha:]]+)"#;

/// Optional Markdown link title after the URL.
const TITLE: &str = r#"(?:\s+"[^"]*")?"#;

/// Attributes kept on a cleaned tag.
fn kept_attributes(tag: &str) -> &'static [&'static str] {
    match tag {
        "img" => &["src", "alt"],
        _ => &["href", "title"],
    }
}

/// Rewrites absolute links of one site. Build once per export.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    script: Regex,
    style: Regex,
    tag: Regex,
    attribute: Regex,
    figure_link: Regex,
    bare_image: Regex,
    media_link: Regex,
    category_link: Regex,
    page_link: Regex,
}

impl LinkRewriter {
    pub fn new(base_link: &str) -> Result<Self, regex::Error> {
        let url = regex::escape(base_link.trim_end_matches('/'));
        Ok(Self {
            script: Regex::new(r"(?is)<script\b.*?</script>")?,
            style: Regex::new(r"(?is)<style\b.*?</style>")?,
            tag: Regex::new(r"(?i)<(img|a)\b([^>]*)>")?,
            attribute: Regex::new(r#"(?i)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            figure_link: Regex::new(&format!(
                r"\[!\[[^\]]*\]\([^)]*\)\]\({url}/wp-content/[^)\s]*/{FILE}{TITLE}\)"
            ))?,
            bare_image: Regex::new(&format!(
                r"!\[[^\]]*\]\({url}/wp-content/[^)\s]*/{FILE}{TITLE}\)"
            ))?,
            media_link: Regex::new(&format!(
                r"(!?)\[([^\[\]]+)\]\({url}/wp-content/[^)\s]*/{FILE}{TITLE}\)"
            ))?,
            category_link: Regex::new(&format!(
                r"(!?)\[([^\[\]]+)\]\({url}/category/([^)\s]*){TITLE}\)"
            ))?,
            page_link: Regex::new(&format!(r"(!?)\[([^\[\]]+)\]\({url}/([^)\s]*){TITLE}\)"))?,
        })
    }

    /// Reduce the HTML to what the Markdown converter renders as Markdown.
    pub fn clean_html(&self, html: &str) -> String {
        let html = self.script.replace_all(html, "");
        let html = self.style.replace_all(&html, "");
        self.tag
            .replace_all(&html, |caps: &Captures| {
                let name = caps[1].to_ascii_lowercase();
                let keep = kept_attributes(&name);
                let mut tag = format!("<{name}");
                for attr in self.attribute.captures_iter(&caps[2]) {
                    let key = attr[1].to_ascii_lowercase();
                    if !keep.contains(&key.as_str()) {
                        continue;
                    }
                    let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
                    tag.push_str(&format!(" {key}=\"{}\"", value.replace('"', "&quot;")));
                }
                tag.push('>');
                tag
            })
            .into_owned()
    }

    /// Clean, convert and rewrite an HTML body.
    pub fn convert(&self, html: &str) -> String {
        self.rewrite(&html2md::parse_html(&self.clean_html(html)))
    }

    pub fn rewrite(&self, markdown: &str) -> String {
        let figure = |caps: &Captures| {
            format!(
                "{{{{<figure src=\"{IMAGES_DIR}/{}\">}}}}",
                caps[1].to_lowercase()
            )
        };

        let md = self.figure_link.replace_all(markdown, figure);
        let md = self.bare_image.replace_all(&md, figure);
        let md = self.media_link.replace_all(&md, |caps: &Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            let file = caps[3].to_lowercase();
            if is_image_file(&file) {
                format!("[{}]({IMAGES_DIR}/{file})", &caps[2])
            } else {
                format!("[{}]({{{{<ref \"/docs/{file}\" >}}}})", &caps[2])
            }
        });
        let md = self.category_link.replace_all(&md, |caps: &Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            format!("[{}]({{{{<ref \"/categories/{}\" >}}}})", &caps[2], &caps[3])
        });
        let md = self.page_link.replace_all(&md, |caps: &Captures| {
            if !caps[1].is_empty() {
                return caps[0].to_string();
            }
            format!("[{}]({{{{<ref \"/{}\" >}}}})", &caps[2], &caps[3])
        });
        md.into_owned()
    }
}
