//! Document metadata: title, byline, excerpt and friends.
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub lang: Option<String>,
    pub published_time: Option<String>,
}

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", " » "];

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn first_element<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    doc.select(&sel).next()
}

fn meta_content(doc: &Html, css: &str) -> Option<String> {
    first_element(doc, css)
        .and_then(|el| el.value().attr("content"))
        .map(normalize)
        .filter(|s| !s.is_empty())
}

fn element_text(doc: &Html, css: &str) -> Option<String> {
    first_element(doc, css)
        .map(|el| normalize(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a trailing site name (`"Post title | My Blog"`) when what remains
/// still looks like a real title.
fn trim_site_suffix(title: &str) -> String {
    let cut = TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| title.rfind(sep))
        .max();
    match cut {
        Some(pos) => {
            let head = title[..pos].trim();
            if head.split_whitespace().count() >= 3 {
                head.to_string()
            } else {
                title.to_string()
            }
        }
        None => title.to_string(),
    }
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//")
}

pub(crate) fn extract(doc: &Html) -> Metadata {
    let title = meta_content(doc, r#"meta[property="og:title"]"#)
        .or_else(|| meta_content(doc, r#"meta[name="twitter:title"]"#))
        .or_else(|| element_text(doc, "head > title").map(|t| trim_site_suffix(&t)))
        .or_else(|| element_text(doc, "h1"));

    let byline = meta_content(doc, r#"meta[name="author"]"#)
        .or_else(|| {
            meta_content(doc, r#"meta[property="article:author"]"#).filter(|a| !looks_like_url(a))
        })
        .or_else(|| element_text(doc, r#"[rel="author"]"#))
        .or_else(|| element_text(doc, r#"[itemprop="author"]"#))
        .or_else(|| element_text(doc, ".byline"));

    let excerpt = meta_content(doc, r#"meta[name="description"]"#)
        .or_else(|| meta_content(doc, r#"meta[property="og:description"]"#))
        .or_else(|| meta_content(doc, r#"meta[name="twitter:description"]"#));

    let lang = first_element(doc, "html")
        .and_then(|el| el.value().attr("lang"))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Metadata {
        title,
        byline,
        excerpt,
        site_name: meta_content(doc, r#"meta[property="og:site_name"]"#),
        lang,
        published_time: meta_content(doc, r#"meta[property="article:published_time"]"#),
    }
}
