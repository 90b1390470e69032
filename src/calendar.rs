//! Daf Yomi lookup against the Sefaria calendar API.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DAF_YOMI_TITLE: &str = "Daf Yomi";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DafInfo {
    /// e.g. "Horayot 9"
    pub reference: String,
    pub he_reference: Option<String>,
    pub display_en: Option<String>,
    pub display_he: Option<String>,
}

impl DafInfo {
    pub fn english(&self) -> &str {
        self.display_en.as_deref().unwrap_or(&self.reference)
    }

    pub fn hebrew(&self) -> &str {
        self.display_he
            .as_deref()
            .or(self.he_reference.as_deref())
            .unwrap_or(&self.reference)
    }
}

/// Today's daf, or `None` when the calendar is unreachable or has no
/// Daf Yomi entry.
pub async fn fetch_todays_daf(client: &reqwest::Client, url: &str) -> Option<DafInfo> {
    match fetch_calendar(client, url).await {
        Ok(body) => {
            let daf = parse_calendar(&body);
            if daf.is_none() {
                tracing::warn!("Calendar response had no Daf Yomi entry");
            }
            daf
        }
        Err(e) => {
            tracing::warn!("Daf Yomi lookup failed: {e:#}");
            None
        }
    }
}

async fn fetch_calendar(client: &reqwest::Client, url: &str) -> Result<Value> {
    let resp = client
        .get(url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .context("Failed to call calendar API")?;

    if !resp.status().is_success() {
        anyhow::bail!("Calendar API returned {}", resp.status());
    }

    resp.json().await.context("Calendar API returned invalid JSON")
}

pub fn parse_calendar(body: &Value) -> Option<DafInfo> {
    let item = body
        .get("calendar_items")?
        .as_array()?
        .iter()
        .find(|it| it.pointer("/title/en").and_then(Value::as_str) == Some(DAF_YOMI_TITLE))?;

    let text = |path: &str| item.pointer(path).and_then(Value::as_str).map(str::to_string);
    let display_en = text("/displayValue/en");

    Some(DafInfo {
        reference: text("/ref").or_else(|| display_en.clone()).unwrap_or_default(),
        he_reference: text("/heRef"),
        display_en,
        display_he: text("/displayValue/he"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_daf_item() {
        let body = json!({
            "calendar_items": [
                {"title": {"en": "Parashat Hashavua"}, "ref": "Genesis 1:1-6:8"},
                {
                    "title": {"en": "Daf Yomi", "he": "דף יומי"},
                    "ref": "Horayot 9",
                    "heRef": "הוריות ט׳",
                    "displayValue": {"en": "Horayot 9", "he": "הוריות ט׳"}
                }
            ]
        });
        let daf = parse_calendar(&body).unwrap();
        assert_eq!(daf.reference, "Horayot 9");
        assert_eq!(daf.he_reference.as_deref(), Some("הוריות ט׳"));
        assert_eq!(daf.english(), "Horayot 9");
        assert_eq!(daf.hebrew(), "הוריות ט׳");
    }

    #[test]
    fn test_reference_falls_back_to_display_value() {
        let body = json!({
            "calendar_items": [{"title": {"en": "Daf Yomi"}, "displayValue": {"en": "Zevachim 12"}}]
        });
        let daf = parse_calendar(&body).unwrap();
        assert_eq!(daf.reference, "Zevachim 12");
        assert_eq!(daf.hebrew(), "Zevachim 12");
    }

    #[test]
    fn test_missing_daf_is_none() {
        assert!(parse_calendar(&json!({"calendar_items": []})).is_none());
        assert!(parse_calendar(&json!({"calendar_items": "nope"})).is_none());
        assert!(parse_calendar(&json!({})).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_calendar_is_none() {
        let client = reqwest::Client::new();
        assert!(fetch_todays_daf(&client, "http://127.0.0.1:1/api/calendars").await.is_none());
    }
}
