//! Link preview metadata extraction
//!
//! Each field takes the first non-empty value among, in order: Open Graph,
//! Twitter Card, `<meta name="description">` (description only), JSON-LD and
//! `<title>` (title only).

use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;
use waypoint_core::models::LinkPreview;

/// Extract preview metadata from an HTML document served at `page_url`.
pub fn extract_link_preview(html: &str, page_url: &Url) -> LinkPreview {
    let document = Html::parse_document(html);
    let json_ld = json_ld_nodes(&document);

    let title = meta_content(&document, &["og:title", "twitter:title"])
        .or_else(|| json_ld_field(&json_ld, |node| text(node, "name").or_else(|| text(node, "headline"))))
        .or_else(|| title_tag(&document));

    let description = meta_content(&document, &["og:description", "twitter:description"])
        .or_else(|| meta_content(&document, &["description"]))
        .or_else(|| json_ld_field(&json_ld, |node| text(node, "description")));

    let image = meta_content(
        &document,
        &[
            "og:image",
            "og:image:url",
            "og:image:secure_url",
            "twitter:image",
            "twitter:image:src",
        ],
    )
    .or_else(|| json_ld_field(&json_ld, |node| node.get("image").and_then(json_image)))
    .and_then(|raw| resolve_image(&raw, page_url));

    let site_name = meta_content(&document, &["og:site_name"]).or_else(|| {
        json_ld_field(&json_ld, |node| {
            node.get("publisher").and_then(|p| text(p, "name"))
        })
    });

    LinkPreview {
        url: page_url.to_string(),
        title,
        description,
        image,
        site_name,
    }
}

/// First non-empty `content` of a `<meta>` whose `property` or `name` is one of `keys`
fn meta_content(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let selector =
            Selector::parse(&format!("meta[property=\"{key}\"], meta[name=\"{key}\"]")).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .find_map(non_empty)
    })
}

fn title_tag(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .find_map(|t| non_empty(&t))
}

/// Parsed JSON-LD objects, with arrays flattened and `@graph` unwrapped one level
fn json_ld_nodes(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse("script[type=\"application/ld+json\"]") else {
        return Vec::new();
    };

    let mut nodes = Vec::new();
    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(raw.trim()) else {
            tracing::debug!("Skipping unparseable JSON-LD block");
            continue;
        };

        let top_level = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        for node in top_level {
            if let Some(Value::Array(graph)) = node.get("@graph") {
                nodes.extend(graph.iter().filter(|n| n.is_object()).cloned());
            }
            if node.is_object() {
                nodes.push(node);
            }
        }
    }
    nodes
}

fn json_ld_field(nodes: &[Value], pick: impl Fn(&Value) -> Option<String>) -> Option<String> {
    nodes.iter().find_map(pick)
}

fn text(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).and_then(non_empty)
}

/// JSON-LD `image`: a string, a list, or an object with `url`
fn json_image(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(json_image),
        Value::Object(_) => text(value, "url"),
        _ => None,
    }
}

/// Resolve a possibly relative image reference against the page URL.
fn resolve_image(raw: &str, page_url: &Url) -> Option<String> {
    let resolved = page_url.join(raw).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
