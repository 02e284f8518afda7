//! Directory listing extraction.
//!
//! Remote radar servers expose plain HTML index pages. A full HTML parser
//! is not worth carrying for that; a substring scan over `href=` attributes
//! pulls out the file names.

/// Extract `href` targets ending in `suffix` from an HTML listing page.
pub fn extract_hrefs(html: &str, suffix: &str) -> Vec<String> {
    let mut names = Vec::new();

    for chunk in html.split("href=").skip(1) {
        let mut chars = chunk.chars();
        let quote = match chars.next() {
            Some(q @ ('"' | '\'')) => q,
            _ => continue,
        };
        let rest = &chunk[1..];
        if let Some(end) = rest.find(quote) {
            let target = &rest[..end];
            if target.ends_with(suffix) {
                names.push(target.to_string());
            }
        }
    }

    names
}

/// Pick the most recent file from a listing.
///
/// Volume file names embed their timestamp, so lexicographic order is
/// chronological order and the greatest name is the newest volume.
pub fn latest(names: Vec<String>) -> Option<String> {
    names.into_iter().max()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_hrefs_filters_by_suffix() {
        let html = "<html><body>\
            <a href='KTLX_20240501_1200.ar2v'>KTLX_20240501_1200.ar2v</a>\
            <a href='KTLX_20240501_1206.ar2v'>KTLX_20240501_1206.ar2v</a>\
            <a href=\"index.html\">index</a>\
            </body></html>";

        let names = extract_hrefs(html, ".ar2v");
        assert_eq!(
            names,
            vec!["KTLX_20240501_1200.ar2v", "KTLX_20240501_1206.ar2v"]
        );
    }

    #[test]
    fn test_extract_hrefs_handles_both_quote_styles() {
        let html = r#"<a href="a.ar2v">x</a><a href='b.ar2v'>y</a>"#;
        assert_eq!(extract_hrefs(html, ".ar2v"), vec!["a.ar2v", "b.ar2v"]);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        assert!(extract_hrefs("<html></html>", ".ar2v").is_empty());
    }

    #[test]
    fn test_latest_is_lexicographic_max() {
        let names = vec![
            "KTLX_20240501_1206.ar2v".to_string(),
            "KTLX_20240501_1212.ar2v".to_string(),
            "KTLX_20240501_1200.ar2v".to_string(),
        ];
        assert_eq!(latest(names).unwrap(), "KTLX_20240501_1212.ar2v");
    }
}
