//! Chabura (study-group) outlines: clarifying questions, template context and
//! the sectioned, Hebrew-only source outline.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::DafInfo;
use crate::llm::json::{extract_array, extract_object, str_field};
use crate::llm::sources::era_distribution;
use crate::llm::{ChatMessage, CompletionOptions, TextCompletion};
use crate::models::{new_id, now_ms, Category, Source, SourceLanguage};

pub const DEFAULT_TOTAL_SOURCES: usize = 12;
const MAX_QUESTIONS: usize = 4;

const DEFAULT_SECTION_TITLE: &str = "קטע";
const DEFAULT_SOURCE_TITLE: &str = "מקור";
const DEFAULT_INTRO_NOTE: &str = "הערה קצרה על אופן בניית החבורה ודרך הניווט בין המקורות.";

const OUTLINE_SYSTEM_PROMPT: &str = "אתה אוסף מקורות הלכתיים תורניים במתכונת שיעור כללי. אינך כותב תשובות, ביאורים או מסקנות. רק מקורות.
מקורות אך ורק ממקורות אורתודוקסיים מוכרים: תלמוד בבלי/ירושלמי, ראשונים, אחרונים, פוסקי זמננו. אין לכלול מקורות שאינם אורתודוקסיים.
ברירת מחדל: חלוקה שווה ככל האפשר לפי תקופות (תלמוד, ראשונים, אחרונים, זמננו). סדר כרונולוגי: תלמוד תחילה, אחריו ראשונים, אחרונים, זמננו; ובתוך כל תקופה – מהקדום לחדש.
יש להחזיר JSON תקין בלבד. כל מקור בעברית מלאה (שם הספר, המחבר, מיקום, הטקסט הקצר) ושדה language תמיד \"hebrew\". אין טקסט לפני או אחרי ה-JSON.";

const OUTLINE_SCHEMA: &str = r#"{
  "introNoteHebrew": "הערה קצרה בעברית שמסבירה כיצד מתוכנן השיעור הכללי וכיצד להשתמש במקורות (בלי ביאור הלכתי).",
  "sections": [
    {
      "titleHebrew": "כותרת קטע (עברית)",
      "sources": [
        {
          "title": "שם הספר (עברית)",
          "location": "ציון מדויק (עברית)",
          "text": "ציטוט קצר או תמצית בעברית",
          "category": "torah|gemara|mishnah|halacha|other",
          "language": "hebrew"
        }
      ]
    }
  ]
}"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChaburaSection {
    pub title: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChaburaOutline {
    /// How the session is structured and how to navigate the sources
    pub intro_note: String,
    pub sections: Vec<ChaburaSection>,
}

impl ChaburaOutline {
    pub fn source_count(&self) -> usize {
        self.sections.iter().map(|s| s.sources.len()).sum()
    }
}

/// Quick-start presets that steer the outline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChaburaTemplate {
    #[default]
    Sources,
    Deep,
    Practical,
    Dispute,
    /// Built around today's Daf Yomi
    Daf,
}

impl ChaburaTemplate {
    pub fn extra_context(self) -> &'static str {
        match self {
            ChaburaTemplate::Deep => "הדגש על סוגיות ושיטות, חיבורים בין מקורות.",
            ChaburaTemplate::Practical => "מיקוד בפוסקים ומעשה בני זמננו.",
            ChaburaTemplate::Dispute => "הדגש על מחלוקות עיקריות וקווי תמיכה/קושיה.",
            ChaburaTemplate::Sources | ChaburaTemplate::Daf => "",
        }
    }

    /// Resolve the topic and extra context to send for this template.
    ///
    /// For [`ChaburaTemplate::Daf`] an empty topic becomes "Sources on the
    /// Daf" in the UI language, and the daf reference is appended to the
    /// context. Returns `None` when there is still no topic.
    pub fn resolve(
        self,
        topic: &str,
        ui_language: SourceLanguage,
        daf: Option<&DafInfo>,
    ) -> Option<(String, String)> {
        let mut topic = topic.trim().to_string();
        let mut extra = self.extra_context().to_string();

        if let (ChaburaTemplate::Daf, Some(daf)) = (self, daf) {
            if topic.is_empty() {
                topic = match ui_language {
                    SourceLanguage::English => format!("Sources on the Daf: {}", daf.english()),
                    SourceLanguage::Hebrew => format!("מקורות על הדף: {}", daf.hebrew()),
                };
            }
            extra.push_str(&format!(
                "\nהתבסס על הדף היומי של היום: {}. הצג מקורות העוסקים בתמות ובנושאים המרכזיים העולים בדף, קשרים לסוגיות מקבילות, וראשונים/אחרונים שמבהירים את התמות.",
                daf.hebrew()
            ));
        }

        (!topic.is_empty()).then_some((topic, extra))
    }
}

/// Two to four short questions that sharpen a chabura topic. Empty on any
/// failure.
pub async fn compile_clarifying_questions(
    llm: &dyn TextCompletion,
    topic: &str,
    ui_language: SourceLanguage,
) -> Vec<String> {
    let (system, user) = match ui_language {
        SourceLanguage::Hebrew => (
            "אתה מסייע לחדד נושא חבורה. החזר רשימת שאלות קצרות (2-4) בלבד, ללא הסברים, בעברית, כדי לדייק את מטרת החבורה. החזר JSON של מערך מחרוזות בלבד.".to_string(),
            format!("נושא: \"{topic}\"\nהחזר רק מערך JSON של שאלות."),
        ),
        SourceLanguage::English => (
            "You help refine a chabura topic. Return a short list (2-4) of concise clarifying questions in English only, with no explanations. Return JSON array of strings only.".to_string(),
            format!("Topic: \"{topic}\"\nReturn JSON array of questions only."),
        ),
    };

    let reply = match llm
        .complete(
            vec![ChatMessage::system(system), ChatMessage::user(user)],
            CompletionOptions {
                temperature: 0.2,
                max_tokens: 600,
            },
        )
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!("Clarifying questions failed: {e:#}");
            return Vec::new();
        }
    };

    extract_array(&reply.content)
        .unwrap_or_default()
        .into_iter()
        .map(|q| match q {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .take(MAX_QUESTIONS)
        .collect()
}

/// A sectioned outline of `total_sources` Hebrew sources on `topic`.
pub async fn compile_chabura_outline(
    llm: &dyn TextCompletion,
    topic: &str,
    total_sources: usize,
    extra_context: &str,
) -> Result<ChaburaOutline> {
    let reply = llm
        .complete(
            vec![
                ChatMessage::system(OUTLINE_SYSTEM_PROMPT),
                ChatMessage::user(build_outline_prompt(topic, total_sources, extra_context)),
            ],
            CompletionOptions {
                temperature: 0.2,
                max_tokens: 3500,
            },
        )
        .await
        .context("Chabura outline request failed")?;

    let outline = parse_outline(&reply.content).context("Chabura outline parsing failed")?;
    if outline.source_count() == 0 {
        bail!("No sources returned for chabura \"{topic}\"");
    }
    tracing::info!(
        "Compiled chabura outline: {} sections, {} sources",
        outline.sections.len(),
        outline.source_count()
    );
    Ok(outline)
}

fn build_outline_prompt(topic: &str, total_sources: usize, extra_context: &str) -> String {
    let [talmud, rishonim, acharonim, contemporary] = era_distribution(total_sources);
    let extra = if extra_context.trim().is_empty() {
        String::new()
    } else {
        format!("מידע משלים מהמשתמש: {extra_context}")
    };
    format!(
        "נושא החבורה: \"{topic}\"\n\
         {extra}\n\
         יש לבנות מתווה שיעור כללי: רק מקורות, בקבוצות (למשל: סוגיות בתלמוד, ראשונים, אחרונים, פוסקים בני זמננו, קושיות ותירוצים – כמקורות בלבד). אין לכתוב הסברים, רק לציין מקורות מדויקים.\n\
         יש לכלול בסך הכל {total_sources} מקורות: תלמוד({talmud}), ראשונים({rishonim}), אחרונים({acharonim}), זמננו({contemporary}).\n\
         יש להחזיר מבנה JSON כזה:\n\
         {OUTLINE_SCHEMA}\n\
         החזר JSON בלבד."
    )
}

fn parse_outline(content: &str) -> Result<ChaburaOutline> {
    let obj = extract_object(content).context("reply is not a JSON object")?;
    let sections = obj
        .get("sections")
        .and_then(Value::as_array)
        .context("reply has no sections array")?;
    let timestamp = now_ms();

    let sections = sections
        .iter()
        .map(|sec| ChaburaSection {
            title: non_empty(str_field(sec, "titleHebrew")).unwrap_or(DEFAULT_SECTION_TITLE).to_string(),
            sources: sec
                .get("sources")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(|s| hebrew_source(s, timestamp)).collect())
                .unwrap_or_default(),
        })
        .collect();

    Ok(ChaburaOutline {
        intro_note: non_empty(obj.get("introNoteHebrew").and_then(Value::as_str))
            .unwrap_or(DEFAULT_INTRO_NOTE)
            .to_string(),
        sections,
    })
}

fn hebrew_source(value: &Value, timestamp: i64) -> Source {
    Source {
        id: new_id(),
        title: non_empty(str_field(value, "title")).unwrap_or(DEFAULT_SOURCE_TITLE).to_string(),
        location: str_field(value, "location").unwrap_or_default().to_string(),
        text: str_field(value, "text").unwrap_or_default().to_string(),
        category: Category::from_label(non_empty(str_field(value, "category")).unwrap_or("halacha")),
        language: SourceLanguage::Hebrew,
        timestamp,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
