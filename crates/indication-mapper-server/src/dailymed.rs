//! DailyMed label source.
//!
//! Handles:
//! - Fetching label pages by set id (`drugInfo.cfm`)
//! - Resolving drug names to set ids (`search.cfm`)
//! - Turning label HTML into indications text, NDC codes and an update date

use std::time::Duration;

use indication_mapper_core::{LabelData, LabelError, LabelSource};
use once_cell::sync::Lazy;
use regex::Regex;

const INDICATIONS_HEADING: &str = "1 INDICATIONS AND USAGE";
const NEXT_SECTION: &str = "DOSAGE AND ADMINISTRATION";

static SCRIPT_OR_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->").expect("valid regex")
});
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(br|p|div|li|ul|ol|h[1-6]|tr|td|th|table|section|header|footer|dt|dd)\b[^>]*>")
        .expect("valid regex")
});
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static NDC_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{4}-\d{2}").expect("valid regex"));
static UPDATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Updated\s+([A-Za-z]+)\s+(\d{1,2}),\s+(\d{4})").expect("valid regex")
});
static SET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"setid=([^&\s'\x22]+)").expect("valid regex"));

/// Blocking HTTP client for DailyMed.
pub struct DailyMedClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl DailyMedClient {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn get_page(&self, path: &str, query: &[(&str, &str)]) -> Result<(String, String), LabelError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .send()
            .map_err(|e| LabelError::Fetch(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LabelError::NotFound(format!("{} returned 404", path)));
        }
        if !status.is_success() {
            return Err(LabelError::Fetch(format!("{} returned {}", path, status)));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .map_err(|e| LabelError::Fetch(e.to_string()))?;
        Ok((final_url, body))
    }
}

impl LabelSource for DailyMedClient {
    fn fetch_label(&self, set_id: &str) -> Result<LabelData, LabelError> {
        let (_, html) = self.get_page("drugInfo.cfm", &[("setid", set_id)])?;

        if is_error_page(&html) {
            return Err(LabelError::NotFound(format!(
                "No product labeling found for setid: {}",
                set_id
            )));
        }

        let label = parse_label(&html);
        tracing::info!(
            set_id = %set_id,
            ndc_codes = label.ndc_codes.len(),
            has_indications = !label.indications.is_empty(),
            "Fetched DailyMed label"
        );
        Ok(label)
    }

    fn resolve_set_id(&self, drug_name: &str) -> Result<String, LabelError> {
        let (final_url, html) = self.get_page("search.cfm", &[("query", drug_name)])?;
        let not_found = || LabelError::NotFound(format!("No drug found with name: {}", drug_name));

        if is_error_page(&html) {
            return Err(not_found());
        }

        extract_set_id(&final_url)
            .or_else(|| extract_set_id(&html))
            .ok_or_else(not_found)
    }
}

/// Parse a label page.
pub fn parse_label(html: &str) -> LabelData {
    let text = html_to_text(html);
    LabelData {
        ndc_codes: extract_ndc_codes(&text),
        indications: extract_indications(&text),
        last_update_date: extract_update_date(&text).unwrap_or_default(),
    }
}

/// Whether the page title marks an error or missing page.
pub fn is_error_page(html: &str) -> bool {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|title| {
            let title = title.as_str();
            title.contains("Error") || title.contains("Not Found")
        })
        .unwrap_or(false)
}

/// Visible page text, one line per block element, whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_OR_STYLE.replace_all(html, " ");
    let with_breaks = BLOCK_TAG.replace_all(&without_scripts, "\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    let decoded = decode_entities(&stripped);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&reg;", "®")
        .replace("&amp;", "&")
}

/// The indications section of the label text.
///
/// The heading appears twice on a full label (table of contents, then the
/// section itself); the second occurrence is used when present.
pub fn extract_indications(text: &str) -> String {
    let Some(first) = text.find(INDICATIONS_HEADING) else {
        return String::new();
    };
    let start = text[first + 1..]
        .find(INDICATIONS_HEADING)
        .map(|offset| first + 1 + offset)
        .unwrap_or(first);

    let section = &text[start..];
    let section = match section.find(NEXT_SECTION) {
        Some(end) => &section[..end],
        None => section,
    };

    section
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Distinct NDC codes in page order.
pub fn extract_ndc_codes(text: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for m in NDC_CODE.find_iter(text) {
        if !codes.iter().any(|c| c == m.as_str()) {
            codes.push(m.as_str().to_string());
        }
    }
    codes
}

/// `Updated <Month> <D>, <YYYY>` as `YYYYMMDD`.
pub fn extract_update_date(text: &str) -> Option<String> {
    let caps = UPDATED.captures(text)?;
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    Some(format!("{}{:02}{:02}", &caps[3], month, day))
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .map(|i| i as u32 + 1)
}

/// The `setid=` query value in a URL or page.
pub fn extract_set_id(text: &str) -> Option<String> {
    SET_ID.captures(text).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL_PAGE: &str = r##"<html>
<head><title>DailyMed - DUPIXENT- dupilumab injection</title>
<style>.toc { color: red; }</style>
<script>var label = "1 INDICATIONS AND USAGE";</script></head>
<body>
<div class="date">Updated January 5, 2024</div>
<ul class="toc">
  <li><a href="#s1">1 INDICATIONS AND USAGE</a></li>
  <li><a href="#s2">2 DOSAGE AND ADMINISTRATION</a></li>
</ul>
<div class="ndc">NDC Code(s): 0024-5915-01, 0024-5918-01, 0024-5915-01</div>
<h2>1 INDICATIONS AND USAGE</h2>
<h3>1.1 Atopic&nbsp;Dermatitis</h3>
<p>DUPIXENT is indicated for the treatment of patients aged 6 months
   and older with moderate-to-severe atopic dermatitis.</p>
<h3>1.2 Asthma</h3>
<p>Limitations of Use &amp; notes</p>
<h2>2 DOSAGE AND ADMINISTRATION</h2>
<p>300 mg every two weeks</p>
</body></html>"##;

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<p>Hello&nbsp;<b>world</b></p><script>x()</script><div>A &amp; B</div>");
        assert_eq!(text, "Hello world\nA & B");
    }

    #[test]
    fn test_parse_label() {
        let label = parse_label(LABEL_PAGE);

        assert_eq!(label.ndc_codes, vec!["0024-5915-01", "0024-5918-01"]);
        assert_eq!(label.last_update_date, "20240105");
        assert_eq!(
            label.indications,
            "1 INDICATIONS AND USAGE\n\
1.1 Atopic Dermatitis\n\
DUPIXENT is indicated for the treatment of patients aged 6 months\n\
and older with moderate-to-severe atopic dermatitis.\n\
1.2 Asthma\n\
Limitations of Use & notes\n\
2"
        );
    }

    #[test]
    fn test_indications_single_heading() {
        let text = "1 INDICATIONS AND USAGE\n1.1 COPD\n2 DOSAGE AND ADMINISTRATION\nTake daily";
        assert_eq!(extract_indications(text), "1 INDICATIONS AND USAGE\n1.1 COPD\n2");
        assert_eq!(extract_indications("No indications here"), "");
    }

    #[test]
    fn test_update_date() {
        assert_eq!(extract_update_date("Updated March 14, 2023"), Some("20230314".into()));
        assert_eq!(extract_update_date("Updated Smarch 14, 2023"), None);
        assert_eq!(extract_update_date("Published 2023"), None);
    }

    #[test]
    fn test_error_page() {
        assert!(is_error_page("<title>DailyMed - Error</title>"));
        assert!(is_error_page("<TITLE>Page Not Found</TITLE>"));
        assert!(!is_error_page(LABEL_PAGE));
        assert!(!is_error_page("<p>no title</p>"));
    }

    #[test]
    fn test_extract_set_id() {
        assert_eq!(
            extract_set_id("https://dailymed.nlm.nih.gov/dailymed/drugInfo.cfm?setid=595f437d-2729&audience=pro"),
            Some("595f437d-2729".into())
        );
        assert_eq!(
            extract_set_id(r#"<a href="/dailymed/drugInfo.cfm?setid=abc-123">DUPIXENT</a>"#),
            Some("abc-123".into())
        );
        assert_eq!(extract_set_id("search.cfm?query=dupixent"), None);
    }

    #[test]
    fn test_unreachable_host_is_fetch_error() {
        let client = DailyMedClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        assert!(matches!(client.fetch_label("abc"), Err(LabelError::Fetch(_))));
    }
}
