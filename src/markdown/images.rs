//! README image handling.
//!
//! READMEs reference images relative to the repository root. Before a README
//! is rendered those paths are made absolute against the raw-content host so
//! they resolve from a project page. After rendering, the images are
//! extracted again to build the screenshot gallery.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static MD_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)((?:\s+"[^"]*")?)\)"#).expect("valid regex")
});
static HTML_IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*")([^"]+)(")"#).expect("valid regex")
});
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid regex"));
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*"([^"]*)""#).expect("valid regex"));
static ALT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\balt\s*=\s*"([^"]*)""#).expect("valid regex"));
static WIDTH_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bwidth\s*=\s*"?\s*(\d+)"#).expect("valid regex"));
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("valid regex"));

/// Width assumed for images that do not declare one.
const UNKNOWN_WIDTH: u32 = 999;
const MIN_WIDTH: u32 = 200;
const LARGE_WIDTH: u32 = 400;

/// Rewrite relative image paths in README Markdown (both `![](...)` and
/// `<img src="...">`) to `{raw_base}/{repo}/{branch}/{path}`.
pub fn absolutize_readme_images(markdown: &str, raw_base: &str, repo: &str, branch: &str) -> String {
    let prefix = format!("{}/{}/{}/", raw_base.trim_end_matches('/'), repo, branch);

    let markdown = MD_IMAGE.replace_all(markdown, |caps: &Captures| {
        let src = &caps[2];
        if !is_relative(src) {
            return caps[0].to_string();
        }
        format!("![{}]({}{}{})", &caps[1], prefix, strip_root(src), &caps[3])
    });

    HTML_IMG_SRC
        .replace_all(&markdown, |caps: &Captures| {
            let src = &caps[2];
            if !is_relative(src) {
                return caps[0].to_string();
            }
            format!("{}{}{}{}", &caps[1], prefix, strip_root(src), &caps[3])
        })
        .into_owned()
}

fn is_relative(src: &str) -> bool {
    !src.starts_with("//") && !src.starts_with('#') && !SCHEME.is_match(src)
}

fn strip_root(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// An `<img>` found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
    /// Declared width in pixels; `None` when missing, zero or unparsable.
    pub width: Option<u32>,
}

/// All `<img>` tags in `html`, in document order.
pub fn extract_images(html: &str) -> Vec<ImageRef> {
    IMG_TAG
        .find_iter(html)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let src = SRC_ATTR.captures(tag)?[1].to_string();
            let alt = ALT_ATTR
                .captures(tag)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let width = WIDTH_ATTR
                .captures(tag)
                .and_then(|c| c[1].parse::<u32>().ok())
                .filter(|w| *w > 0);
            Some(ImageRef { src, alt, width })
        })
        .collect()
}

/// Whether an image looks like a screenshot rather than a badge or logo.
///
/// `project_name` is excluded as alt text, since READMEs commonly open with
/// the project logo captioned by its name.
pub fn is_screenshot(image: &ImageRef, project_name: &str) -> bool {
    let src = image.src.to_lowercase();
    let alt = image.alt.to_lowercase();

    if src.contains("shields.io") || src.contains("badge") || alt.contains("badge") {
        return false;
    }
    if alt.contains("logo") || alt.contains("icon") || src.contains("/icon") {
        return false;
    }
    if !project_name.is_empty() && alt == project_name.to_lowercase() {
        return false;
    }

    let width = image.width.unwrap_or(UNKNOWN_WIDTH);
    if width < MIN_WIDTH {
        return false;
    }
    if src.contains("screenshot") || alt.contains("screenshot") {
        return true;
    }
    if src.contains("/docs/") || src.contains("/assets/screenshots/") {
        return true;
    }
    width > LARGE_WIDTH
}

/// The screenshot subset of the images in rendered README HTML.
pub fn screenshots(readme_html: &str, project_name: &str) -> Vec<ImageRef> {
    extract_images(readme_html)
        .into_iter()
        .filter(|img| is_screenshot(img, project_name))
        .collect()
}
