use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::types::CommonNames;

pub const DIALOG_SELECTOR: &str = r#"[data-lichen-dialog="allCommonNames"]"#;

/// Text under these never shows up on the rendered page.
const HIDDEN_TAGS: [&str; 6] = ["head", "script", "style", "noscript", "template", "title"];

static RE_NAMES_TOGGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Names\s*\(\d+\)").expect("invalid regex: names toggle"));

static SEL_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table tbody tr").expect("invalid selector: table row"));

static SEL_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: td"));

/// Matches the "Names (42)" control that opens the common-names dialog.
pub fn is_names_toggle(text: &str) -> bool {
    RE_NAMES_TOGGLE.is_match(text)
}

/// The "Names (N)" control located in a page snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamesToggle {
    /// Absolute positional XPath, e.g. `/html[1]/body[1]/div[2]/button[1]`.
    pub xpath: String,
    pub text: String,
}

fn is_hidden(element: ElementRef) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
}

/// All text below `element`, minus script/style and similar content.
fn rendered_text(element: ElementRef) -> String {
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .ancestors()
                .take_while(|a| a.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(is_hidden);
            (!hidden).then_some(&**text)
        })
        .collect()
}

fn xpath_of(element: ElementRef) -> String {
    let mut steps = Vec::new();
    let mut current = Some(element);

    while let Some(el) = current {
        let name = el.value().name();
        let position = 1 + el
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .filter(|sibling| sibling.value().name() == name)
            .count();
        steps.push(format!("{name}[{position}]"));
        current = el.parent().and_then(ElementRef::wrap);
    }

    steps.reverse();
    format!("/{}", steps.join("/"))
}

/// Finds the smallest element whose whole rendered text matches
/// [`is_names_toggle`]: the first match, in document order, none of whose
/// child elements match on their own.
pub fn find_names_toggle(html: &str) -> Option<NamesToggle> {
    let document = Html::parse_document(html);

    let matches = |element: ElementRef| {
        !is_hidden(element) && is_names_toggle(&rendered_text(element))
    };

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|&element| {
            matches(element) && !element.children().filter_map(ElementRef::wrap).any(matches)
        })
        .map(|element| NamesToggle {
            xpath: xpath_of(element),
            text: normalize_whitespace(&rendered_text(element)),
        })
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// `(language, name)` for every table row with exactly two cells.
pub fn parse_name_rows(html: &str) -> Vec<(String, String)> {
    let fragment = Html::parse_fragment(html);

    fragment
        .select(&SEL_ROW)
        .filter_map(|row| {
            let cells: Vec<ElementRef> = row.select(&SEL_CELL).collect();
            match cells.as_slice() {
                [lang, name] => Some((cell_text(*lang), cell_text(*name))),
                _ => None,
            }
        })
        .collect()
}

/// Reads the dialog's name table. A repeated language label keeps the
/// last name seen for it.
pub fn parse_name_table(html: &str) -> CommonNames {
    parse_name_rows(html).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_names_toggle() {
        assert!(is_names_toggle("Names (42)"));
        assert!(is_names_toggle("names(3)"));
        assert!(is_names_toggle("All NAMES  (120) »"));
        assert!(!is_names_toggle("Names"));
        assert!(!is_names_toggle("Names (many)"));
        assert!(!is_names_toggle("Scientific name"));
    }

    #[test]
    fn test_toggle_split_across_children() {
        let html = r#"
            <html><body>
                <div class="Species-header"><h1>Kea</h1></div>
                <div class="Species-names">
                    <button type="button"><span>Names</span> (42)</button>
                </div>
            </body></html>
        "#;

        let toggle = find_names_toggle(html).expect("toggle");
        assert_eq!(toggle.xpath, "/html[1]/body[1]/div[2]/button[1]");
        assert_eq!(toggle.text, "Names (42)");
    }

    #[test]
    fn test_toggle_prefers_innermost_match() {
        let html = r##"
            <html><body>
                <section>Common names <a href="#names">Names (42)</a></section>
            </body></html>
        "##;

        let toggle = find_names_toggle(html).expect("toggle");
        assert_eq!(toggle.xpath, "/html[1]/body[1]/section[1]/a[1]");
        assert_eq!(toggle.text, "Names (42)");
    }

    #[test]
    fn test_toggle_counts_same_tag_siblings() {
        let html = r#"
            <html><body>
                <ul>
                    <li>Overview</li>
                    <li>Identification</li>
                    <li><a>names (7)</a></li>
                </ul>
            </body></html>
        "#;

        let toggle = find_names_toggle(html).expect("toggle");
        assert_eq!(toggle.xpath, "/html[1]/body[1]/ul[1]/li[3]/a[1]");
    }

    #[test]
    fn test_toggle_ignores_script_text() {
        let html = r#"
            <html><head><title>Names (1)</title></head><body>
                <script>window.label = "Names (42)";</script>
                <p>Scientific name</p>
            </body></html>
        "#;

        assert_eq!(find_names_toggle(html), None);
    }

    #[test]
    fn test_toggle_absent() {
        assert_eq!(find_names_toggle("<html><body><a>Names</a></body></html>"), None);
        assert_eq!(find_names_toggle(""), None);
    }

    #[test]
    fn test_parse_name_table() {
        let html = r#"
            <div data-lichen-dialog="allCommonNames">
                <table>
                    <thead><tr><th>Language</th><th>Common name</th></tr></thead>
                    <tbody>
                        <tr><td> English </td><td>Kea</td></tr>
                        <tr><td>German</td><td>Kea</td></tr>
                        <tr><td>French</td><td>Nestor kéa</td></tr>
                    </tbody>
                </table>
            </div>
        "#;

        let names = parse_name_table(html);

        assert_eq!(names.len(), 3);
        assert_eq!(names["English"], "Kea");
        assert_eq!(names["French"], "Nestor kéa");
    }

    #[test]
    fn test_skips_rows_without_two_cells() {
        let html = r#"
            <table><tbody>
                <tr><td colspan="2">Other names</td></tr>
                <tr><td>Spanish</td><td>Loro kea</td></tr>
                <tr><td>A</td><td>B</td><td>C</td></tr>
                <tr><th>Dutch</th><td>Kea</td></tr>
            </tbody></table>
        "#;

        let rows = parse_name_rows(html);
        assert_eq!(rows, [("Spanish".to_string(), "Loro kea".to_string())]);
    }

    #[test]
    fn test_duplicate_label_last_wins() {
        let html = r#"
            <table><tbody>
                <tr><td>English (UK)</td><td>Kea</td></tr>
                <tr><td>English (UK)</td><td>Mountain Parrot</td></tr>
            </tbody></table>
        "#;

        let names = parse_name_table(html);
        assert_eq!(names.len(), 1);
        assert_eq!(names["English (UK)"], "Mountain Parrot");
    }

    #[test]
    fn test_labels_keep_page_order() {
        let html = r#"
            <table><tbody>
                <tr><td>Spanish</td><td>Loro kea</td></tr>
                <tr><td>English</td><td>Kea</td></tr>
                <tr><td>Spanish</td><td>Kea</td></tr>
                <tr><td>Dutch</td><td>Kea</td></tr>
            </tbody></table>
        "#;

        let names = parse_name_table(html);
        assert_eq!(names.keys().collect::<Vec<_>>(), ["Spanish", "English", "Dutch"]);
        assert_eq!(names["Spanish"], "Kea");
    }

    #[test]
    fn test_empty_dialog() {
        assert!(parse_name_table(r#"<div data-lichen-dialog="allCommonNames"></div>"#).is_empty());
    }

    #[test]
    fn test_parse_dialog_fixture() {
        let html = fs::read_to_string("fixtures/names/common_names_dialog.html")
            .expect("Failed to read fixture");

        let names = parse_name_table(&html);

        assert_eq!(names.len(), 6);
        assert_eq!(names["English (United States)"], "Kea");
        assert_eq!(names["Spanish"], "Kea");
        assert_eq!(names["Japanese"], "ミヤマオウム");
        assert!(!names.contains_key("Language"));
        assert_eq!(
            names.keys().collect::<Vec<_>>(),
            ["English (United States)", "French", "German", "Japanese", "Spanish", "Maori"]
        );
    }
}
