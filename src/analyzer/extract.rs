use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use super::fetcher::{FetchedDocument, SNIFF_WINDOW};

pub const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Failed to parse anchor selector"));

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("Failed to parse form selector"));

static INPUT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input").expect("Failed to parse input selector"));

static HEADING_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    HEADING_TAGS
        .iter()
        .map(|tag| {
            let selector = Selector::parse(tag).expect("Failed to parse heading selector");
            (*tag, selector)
        })
        .collect()
});

// Public identifiers, lowercased. Order matters only for documents that
// somehow contain more than one.
const DOCTYPE_TABLE: [(&str, HtmlVersion); 7] = [
    (
        r#"<!doctype html public "-//w3c//dtd html 4.01 transitional//en""#,
        HtmlVersion::Html401Transitional,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd html 4.01 strict//en""#,
        HtmlVersion::Html401Strict,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd html 4.01 frameset//en""#,
        HtmlVersion::Html401Frameset,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd xhtml 1.0 strict//en""#,
        HtmlVersion::Xhtml10Strict,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd xhtml 1.0 transitional//en""#,
        HtmlVersion::Xhtml10Transitional,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd xhtml 1.0 frameset//en""#,
        HtmlVersion::Xhtml10Frameset,
    ),
    (
        r#"<!doctype html public "-//w3c//dtd xhtml 1.1//en""#,
        HtmlVersion::Xhtml11,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtmlVersion {
    #[serde(rename = "HTML5")]
    Html5,
    #[serde(rename = "HTML 4.01 Transitional")]
    Html401Transitional,
    #[serde(rename = "HTML 4.01 Strict")]
    Html401Strict,
    #[serde(rename = "HTML 4.01 Frameset")]
    Html401Frameset,
    #[serde(rename = "XHTML 1.0 Strict")]
    Xhtml10Strict,
    #[serde(rename = "XHTML 1.0 Transitional")]
    Xhtml10Transitional,
    #[serde(rename = "XHTML 1.0 Frameset")]
    Xhtml10Frameset,
    #[serde(rename = "XHTML 1.1")]
    Xhtml11,
    Unknown,
}

impl HtmlVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtmlVersion::Html5 => "HTML5",
            HtmlVersion::Html401Transitional => "HTML 4.01 Transitional",
            HtmlVersion::Html401Strict => "HTML 4.01 Strict",
            HtmlVersion::Html401Frameset => "HTML 4.01 Frameset",
            HtmlVersion::Xhtml10Strict => "XHTML 1.0 Strict",
            HtmlVersion::Xhtml10Transitional => "XHTML 1.0 Transitional",
            HtmlVersion::Xhtml10Frameset => "XHTML 1.0 Frameset",
            HtmlVersion::Xhtml11 => "XHTML 1.1",
            HtmlVersion::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the analyzer derives from the document itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Features {
    pub title: String,
    pub html_version: HtmlVersion,
    /// Always holds all six heading tags.
    pub headings: BTreeMap<String, usize>,
    pub has_login_form: bool,
    /// Raw `href` values in document order.
    pub anchors: Vec<String>,
}

pub fn extract(document: &FetchedDocument) -> Features {
    let html_version = detect_html_version(document.inspection_window());
    let source = String::from_utf8_lossy(&document.body);
    let parsed = Html::parse_document(&source);

    Features {
        title: extract_title(&parsed),
        html_version,
        headings: count_headings(&parsed),
        has_login_form: has_login_form(&parsed),
        anchors: extract_anchors(&parsed),
    }
}

/// Classifies the DOCTYPE found at the start of `prefix`. Only the first
/// `SNIFF_WINDOW` bytes are looked at.
pub fn detect_html_version(prefix: &[u8]) -> HtmlVersion {
    let window = &prefix[..prefix.len().min(SNIFF_WINDOW)];
    let content = String::from_utf8_lossy(window).to_lowercase();
    let content = content.trim();

    if content.starts_with("<!doctype html>") {
        return HtmlVersion::Html5;
    }

    DOCTYPE_TABLE
        .iter()
        .find(|(doctype, _)| content.contains(doctype))
        .map(|(_, version)| *version)
        .unwrap_or(HtmlVersion::Unknown)
}

pub fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect::<String>())
        .unwrap_or_default()
}

pub fn count_headings(document: &Html) -> BTreeMap<String, usize> {
    HEADING_SELECTORS
        .iter()
        .map(|(tag, selector)| (tag.to_string(), document.select(selector).count()))
        .collect()
}

pub fn has_login_form(document: &Html) -> bool {
    document.select(&FORM_SELECTOR).any(is_login_form)
}

pub fn extract_anchors(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// A password input plus something that looks like a user identifier.
fn is_login_form(form: ElementRef<'_>) -> bool {
    let mut has_password = false;
    let mut has_identifier = false;

    for input in form.select(&INPUT_SELECTOR) {
        let input = input.value();
        let kind = input.attr("type").unwrap_or_default();

        if kind.eq_ignore_ascii_case("password") {
            has_password = true;
        } else if kind.eq_ignore_ascii_case("email") {
            has_identifier = true;
        } else if kind.eq_ignore_ascii_case("text")
            && (input.attr("name").is_some_and(has_login_keyword)
                || input.attr("id").is_some_and(has_login_keyword))
        {
            has_identifier = true;
        }

        if has_password && has_identifier {
            return true;
        }
    }

    false
}

fn has_login_keyword(attr: &str) -> bool {
    let attr = attr.to_lowercase();
    attr.contains("user") || attr.contains("login") || attr.contains("email")
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn document(html: &str) -> FetchedDocument {
        FetchedDocument {
            url: Url::parse("https://example.com/").unwrap(),
            status: 200,
            body: html.as_bytes().to_vec(),
        }
    }

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn full_document_features() {
        let features = extract(&document(
            r#"
            <!DOCTYPE html>
            <html>
                <head><title>Test Page</title></head>
                <body>
                    <h1>Main</h1>
                    <h2>Sub</h2>
                    <div><section><h6>a</h6><h6>b</h6></section></div>
                    <h6>c</h6>
                    <a href="http://example.com/internal">Internal</a>
                    <a>no href</a>
                    <a href="https://external.com">External</a>
                    <form>
                        <input type="email" name="address"/>
                        <input type="password"/>
                    </form>
                </body>
            </html>"#,
        ));

        assert_eq!(features.title, "Test Page");
        assert_eq!(features.html_version, HtmlVersion::Html5);
        assert_eq!(features.headings["h1"], 1);
        assert_eq!(features.headings["h2"], 1);
        assert_eq!(features.headings["h3"], 0);
        assert_eq!(features.headings["h6"], 3);
        assert!(features.has_login_form);
        assert_eq!(
            features.anchors,
            vec!["http://example.com/internal", "https://external.com"]
        );
    }

    #[test]
    fn empty_document_has_zeroed_features() {
        let features = extract(&document(""));
        assert_eq!(features.title, "");
        assert_eq!(features.html_version, HtmlVersion::Unknown);
        assert_eq!(features.headings.len(), 6);
        assert!(features.headings.values().all(|count| *count == 0));
        assert!(!features.has_login_form);
        assert!(features.anchors.is_empty());
    }

    #[test]
    fn first_title_wins() {
        let html = parse("<html><head><title>One</title></head><body><svg><title>Two</title></svg></body></html>");
        assert_eq!(extract_title(&html), "One");
    }

    #[test]
    fn html5_doctype_is_case_and_whitespace_insensitive() {
        assert_eq!(detect_html_version(b"  \n<!DocType HTML><html>"), HtmlVersion::Html5);
    }

    #[test]
    fn legacy_doctypes_are_recognized() {
        let cases = [
            (
                r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN" "http://www.w3.org/TR/html4/loose.dtd">"#,
                HtmlVersion::Html401Transitional,
            ),
            (
                r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01//EN" "http://www.w3.org/TR/html4/strict.dtd">"#,
                HtmlVersion::Unknown,
            ),
            (
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#,
                HtmlVersion::Xhtml10Strict,
            ),
            (
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#,
                HtmlVersion::Xhtml11,
            ),
            (
                r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Strict//EN">"#,
                HtmlVersion::Html401Strict,
            ),
            (
                r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Frameset//EN" "http://www.w3.org/TR/html4/frameset.dtd">"#,
                HtmlVersion::Html401Frameset,
            ),
            (
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#,
                HtmlVersion::Xhtml10Transitional,
            ),
            (
                r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#,
                HtmlVersion::Xhtml10Frameset,
            ),
        ];

        for (doctype, expected) in cases {
            assert_eq!(detect_html_version(doctype.as_bytes()), expected, "{}", doctype);
        }
    }

    #[test]
    fn doctype_beyond_window_is_ignored() {
        let mut body = vec![b' '; SNIFF_WINDOW];
        body.extend_from_slice(b"<!DOCTYPE html>");
        assert_eq!(detect_html_version(&body), HtmlVersion::Unknown);
    }

    #[test]
    fn version_serializes_as_display_string() {
        let json = serde_json::to_string(&HtmlVersion::Html401Frameset).unwrap();
        assert_eq!(json, r#""HTML 4.01 Frameset""#);
        assert_eq!(HtmlVersion::Xhtml10Transitional.to_string(), "XHTML 1.0 Transitional");
    }

    #[test]
    fn password_alone_is_not_a_login_form() {
        let html = parse(r#"<form><input type="password"/></form>"#);
        assert!(!has_login_form(&html));
    }

    #[test]
    fn text_input_needs_identifier_keyword() {
        let plain = parse(r#"<form><input type="text" name="q"/><input type="password"/></form>"#);
        assert!(!has_login_form(&plain));

        let by_name = parse(r#"<form><input type="text" name="UserName"/><input type="password"/></form>"#);
        assert!(has_login_form(&by_name));

        let by_id = parse(r#"<form><input type="text" id="login-field"/><input type="password"/></form>"#);
        assert!(has_login_form(&by_id));
    }

    #[test]
    fn identifier_and_password_must_share_a_form() {
        let html = parse(
            r#"
            <form><input type="email"/></form>
            <form><input type="password"/></form>"#,
        );
        assert!(!has_login_form(&html));
    }

    #[test]
    fn any_qualifying_form_sets_the_flag() {
        let html = parse(
            r#"
            <form><input type="search" name="q"/></form>
            <form><input type="password"/><input type="text" name="user_email"/></form>"#,
        );
        assert!(has_login_form(&html));
    }
}
