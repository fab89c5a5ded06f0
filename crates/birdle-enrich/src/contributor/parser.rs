use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const CONTRIBUTOR_LABEL: &str = "Contributor";
const MAX_NAME_CHARS: usize = 60;

static RE_ASSET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"asset/(\d+)/").expect("invalid regex: asset id"));

static SEL_MAIN_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.main").expect("invalid selector: span.main"));

static SEL_LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: a[href]"));

/// Pulls the Macaulay Library asset id out of the embedded `Picture` iframe.
pub fn extract_asset_id(picture_html: Option<&str>) -> Option<String> {
    let html = picture_html.filter(|h| !h.is_empty())?;
    RE_ASSET_ID
        .captures(html)
        .map(|caps| caps[1].to_string())
}

/// Text of an element with each fragment trimmed, fragments concatenated.
fn stripped_text(element: ElementRef) -> String {
    element.text().map(str::trim).collect::<String>()
}

fn is_short(name: &str) -> bool {
    !name.is_empty() && name.chars().count() < MAX_NAME_CHARS
}

/// `<span class="main">Ad Konings</span>`
fn from_main_span(document: &Html) -> Option<String> {
    let span = document.select(&SEL_MAIN_SPAN).next()?;
    let name = stripped_text(span);
    (is_short(&name) && !name.contains(CONTRIBUTOR_LABEL)).then_some(name)
}

/// `<a href="/contributor/...">Jane Doe</a>`
fn from_contributor_link(document: &Html) -> Option<String> {
    let link = document.select(&SEL_LINK).find(|a| {
        a.value()
            .attr("href")
            .is_some_and(|href| href.contains("/contributor/"))
    })?;
    let name = stripped_text(link);
    is_short(&name).then_some(name)
}

/// The text node right after the first one mentioning "Contributor".
fn from_label_sibling(document: &Html) -> Option<String> {
    let mut text_nodes = document
        .root_element()
        .descendants()
        .filter_map(|node| node.value().as_text());

    text_nodes.find(|text| text.contains(CONTRIBUTOR_LABEL))?;
    let name = text_nodes.next()?.trim();

    (!name.is_empty() && name != CONTRIBUTOR_LABEL).then(|| name.to_string())
}

type Strategy = fn(&Html) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("main span", from_main_span),
    ("contributor link", from_contributor_link),
    ("label fallback", from_label_sibling),
];

/// Finds the contributor's display name on an asset page, trying the
/// strategies in order and returning the first hit.
pub fn parse_contributor(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    for (label, strategy) in STRATEGIES {
        if let Some(name) = strategy(&document) {
            log::info!("  → Contributor ({}): {}", label, name);
            return Some(name);
        }
    }

    log::warn!("  ! Could not find contributor on page.");
    None
}
