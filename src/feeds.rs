//! Feed generation: `sitemap.xml`, `sitemap.html` and the RSS feed.
//!
//! All three are pure projections of the project list and the sorted posts,
//! regenerated from scratch on every build. Posts are emitted in the order
//! they are given; sorting happens once, in the blog index step.
//!
//! # Sitemap Format
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/</loc>
//!     <lastmod>2024-06-01</lastmod>
//!     <changefreq>weekly</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! Text in the XML documents is escaped. The HTML sitemap inserts titles,
//! excerpts and descriptions as they are, since they come from the site's
//! own frontmatter and project list.

use crate::config::{Language, PathsConfig, SiteInfo};
use crate::dates;
use crate::types::{BlogPost, Project};
use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use quick_xml::escape::escape;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

struct UrlEntry {
    loc: String,
    lastmod: String,
    changefreq: &'static str,
    priority: &'static str,
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// `sitemap.xml`: home page, then posts, then projects.
///
/// Posts use their own date as `lastmod` when it parses; everything else
/// uses the build date.
pub fn sitemap_xml(
    site: &SiteInfo,
    paths: &PathsConfig,
    projects: &[Project],
    posts: &[BlogPost],
    now: DateTime<Utc>,
) -> String {
    let today = dates::iso_date(now);

    let mut urls = Vec::with_capacity(1 + posts.len() + projects.len());
    urls.push(UrlEntry {
        loc: join_url(&site.base_url, ""),
        lastmod: today.clone(),
        changefreq: "weekly",
        priority: "1.0",
    });
    urls.extend(posts.iter().map(|post| UrlEntry {
        loc: join_url(&site.base_url, &paths.post_page(&post.slug)),
        lastmod: dates::parse_post_date(&post.date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| today.clone()),
        changefreq: "monthly",
        priority: "0.8",
    }));
    urls.extend(projects.iter().map(|project| UrlEntry {
        loc: join_url(&site.base_url, &paths.project_page(&project.id)),
        lastmod: today.clone(),
        changefreq: "monthly",
        priority: "0.7",
    }));

    let mut xml = String::with_capacity(256 * urls.len());
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{SITEMAP_NS}\">\n"));
    for entry in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(&entry.loc)));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", entry.lastmod));
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// RSS 2.0 feed of all posts, with an atom self link.
pub fn rss_feed(site: &SiteInfo, paths: &PathsConfig, posts: &[BlogPost], now: DateTime<Utc>) -> String {
    let mut rss = String::with_capacity(512 + 512 * posts.len());
    rss.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    rss.push_str(&format!("<rss version=\"2.0\" xmlns:atom=\"{ATOM_NS}\">\n"));
    rss.push_str("  <channel>\n");
    rss.push_str(&format!("    <title>{}</title>\n", escape(&site.title)));
    rss.push_str(&format!("    <link>{}</link>\n", escape(&join_url(&site.base_url, ""))));
    rss.push_str(&format!("    <description>{}</description>\n", escape(&site.description)));
    rss.push_str(&format!("    <language>{}</language>\n", escape(&site.language)));
    rss.push_str(&format!("    <lastBuildDate>{}</lastBuildDate>\n", dates::rfc2822_timestamp(now)));
    rss.push_str(&format!(
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape(&join_url(&site.base_url, &paths.feed))
    ));

    for post in posts {
        let link = escape(&join_url(&site.base_url, &paths.post_page(&post.slug))).into_owned();
        rss.push_str("    <item>\n");
        rss.push_str(&format!("      <title>{}</title>\n", escape(&post.title)));
        rss.push_str(&format!("      <link>{link}</link>\n"));
        rss.push_str(&format!("      <guid>{link}</guid>\n"));
        if let Some(date) = dates::parse_post_date(&post.date) {
            rss.push_str(&format!("      <pubDate>{}</pubDate>\n", dates::rfc2822_date(date)));
        }
        if !post.author.is_empty() {
            rss.push_str(&format!(
                "      <author>{}</author>\n",
                escape(&format!("{} ({})", site.feed_email, post.author))
            ));
        }
        if !post.excerpt.is_empty() {
            rss.push_str(&format!("      <description>{}</description>\n", escape(&post.excerpt)));
        }
        for tag in &post.tags {
            rss.push_str(&format!("      <category>{}</category>\n", escape(tag)));
        }
        rss.push_str("    </item>\n");
    }

    rss.push_str("  </channel>\n");
    rss.push_str("</rss>\n");
    rss
}

/// Renders the base HTML document structure
fn base_document(title: &str, language: Language, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(language.code()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href="css/styles.css";
            }
            body {
                (content)
            }
        }
    }
}

struct SitemapLabels {
    intro: &'static str,
    home: &'static str,
    home_link: &'static str,
    posts: &'static str,
    projects: &'static str,
}

fn sitemap_labels(language: Language) -> SitemapLabels {
    match language {
        Language::En => SitemapLabels {
            intro: "All pages on this site",
            home: "Home",
            home_link: "Start page",
            posts: "Blog posts",
            projects: "Projects",
        },
        Language::De => SitemapLabels {
            intro: "Übersicht aller Seiten auf dieser Website",
            home: "Hauptseite",
            home_link: "Startseite",
            posts: "Blog-Beiträge",
            projects: "Projekte",
        },
    }
}

/// Human-readable sitemap page.
pub fn sitemap_html(
    site: &SiteInfo,
    paths: &PathsConfig,
    projects: &[Project],
    posts: &[BlogPost],
    language: Language,
) -> String {
    let labels = sitemap_labels(language);
    let content = html! {
        header.site-header {
            a href=(paths.index_page) { (site.title) }
        }
        main.sitemap {
            h1 { "Sitemap" }
            p.intro { (labels.intro) }

            section {
                h2 { (labels.home) }
                ul {
                    li { a href=(paths.index_page) { (labels.home_link) " - " (PreEscaped(&site.title)) } }
                }
            }

            section {
                h2 { (labels.posts) " (" (posts.len()) ")" }
                ul {
                    @for post in posts {
                        li {
                            a href=(paths.post_page(&post.slug)) { (PreEscaped(&post.title)) }
                            div.date { (dates::display_post_date(&post.date, language)) }
                            @if !post.excerpt.is_empty() {
                                div.excerpt { (PreEscaped(&post.excerpt)) }
                            }
                        }
                    }
                }
            }

            section {
                h2 { (labels.projects) " (" (projects.len()) ")" }
                ul {
                    @for project in projects {
                        li {
                            a href=(paths.project_page(&project.id)) { (PreEscaped(&project.name)) }
                            @if !project.description.is_empty() {
                                div.description { (PreEscaped(&project.description)) }
                            }
                        }
                    }
                }
            }
        }
    };
    base_document(&format!("Sitemap | {}", site.title), language, content).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site() -> SiteInfo {
        SiteInfo {
            base_url: "https://example.com".to_string(),
            title: "Folio".to_string(),
            description: "Notes & projects".to_string(),
            language: "en".to_string(),
            feed_email: "noreply@example.com".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap()
    }

    fn post(slug: &str, title: &str, date: &str) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            author: String::new(),
            tags: vec![],
            excerpt: String::new(),
            content: String::new(),
        }
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: id.to_uppercase(),
            repo: format!("o/{id}"),
            description: String::new(),
            icon: None,
        }
    }

    // =========================================================================
    // sitemap.xml
    // =========================================================================

    #[test]
    fn sitemap_lists_home_posts_then_projects() {
        let xml = sitemap_xml(
            &site(),
            &PathsConfig::default(),
            &[project("tool")],
            &[post("hello", "Hello", "2024-06-01")],
            now(),
        );
        let home = xml.find("<loc>https://example.com/</loc>").unwrap();
        let post = xml.find("<loc>https://example.com/blog/posts/hello.html</loc>").unwrap();
        let proj = xml.find("<loc>https://example.com/projects/tool.html</loc>").unwrap();
        assert!(home < post && post < proj);
        assert_eq!(xml.matches("<url>").count(), 3);
        assert!(xml.contains("<lastmod>2024-06-01</lastmod>"));
        assert!(xml.contains("<lastmod>2024-07-01</lastmod>"));
    }

    #[test]
    fn undated_post_uses_build_date() {
        let xml = sitemap_xml(&site(), &PathsConfig::default(), &[], &[post("a", "A", "")], now());
        assert_eq!(xml.matches("<lastmod>2024-07-01</lastmod>").count(), 2);
    }

    // =========================================================================
    // RSS
    // =========================================================================

    #[test]
    fn rss_preserves_order_and_escapes_titles() {
        let posts = vec![
            post("b", "Second", "2024-02-01"),
            post("a", "A & B <tips>", "2024-01-01"),
        ];
        let rss = rss_feed(&site(), &PathsConfig::default(), &posts, now());
        let second = rss.find("<title>Second</title>").unwrap();
        let first = rss.find("<title>A &amp; B &lt;tips&gt;</title>").unwrap();
        assert!(second < first);
        assert_eq!(rss.matches("<item>").count(), 2);
    }

    #[test]
    fn rss_channel_metadata() {
        let rss = rss_feed(&site(), &PathsConfig::default(), &[], now());
        assert!(rss.contains("<description>Notes &amp; projects</description>"));
        assert!(rss.contains(
            r#"<atom:link href="https://example.com/feed.xml" rel="self" type="application/rss+xml"/>"#
        ));
        assert!(rss.contains("<lastBuildDate>Mon, 01 Jul 2024 09:00:00 GMT</lastBuildDate>"));
    }

    #[test]
    fn rss_item_details() {
        let mut p = post("a", "A", "2024-06-01");
        p.author = "Ann".to_string();
        p.excerpt = "Short <b>".to_string();
        p.tags = vec!["rust".to_string(), "c&c".to_string()];
        let rss = rss_feed(&site(), &PathsConfig::default(), &[p], now());

        assert!(rss.contains("<guid>https://example.com/blog/posts/a.html</guid>"));
        assert!(rss.contains("<pubDate>Sat, 01 Jun 2024 00:00:00 GMT</pubDate>"));
        assert!(rss.contains("<author>noreply@example.com (Ann)</author>"));
        assert!(rss.contains("<description>Short &lt;b&gt;</description>"));
        assert!(rss.contains("<category>c&amp;c</category>"));
    }

    #[test]
    fn rss_omits_pubdate_for_undated_posts() {
        let rss = rss_feed(&site(), &PathsConfig::default(), &[post("a", "A", "")], now());
        assert!(!rss.contains("<pubDate>"));
        assert!(!rss.contains("<author>"));
    }

    // =========================================================================
    // sitemap.html
    // =========================================================================

    #[test]
    fn html_sitemap_sections() {
        let mut p = post("hello", "Hello <em>world</em>", "2024-06-01");
        p.excerpt = "An intro".to_string();
        let html = sitemap_html(
            &site(),
            &PathsConfig::default(),
            &[project("tool")],
            &[p],
            Language::En,
        );
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Blog posts (1)"));
        assert!(html.contains("Projects (1)"));
        assert!(html.contains(r#"<a href="blog/posts/hello.html">Hello <em>world</em></a>"#));
        assert!(html.contains("June 1, 2024"));
        assert!(html.contains(r#"<a href="projects/tool.html">TOOL</a>"#));
    }

    #[test]
    fn html_sitemap_in_german() {
        let html = sitemap_html(&site(), &PathsConfig::default(), &[], &[], Language::De);
        assert!(html.contains(r#"<html lang="de">"#));
        assert!(html.contains("Blog-Beiträge (0)"));
    }
}
