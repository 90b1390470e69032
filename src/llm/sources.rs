use anyhow::{bail, Result};
use serde_json::Value;

use crate::llm::json::{extract_array, str_field};
use crate::llm::{ChatMessage, CompletionOptions, TextCompletion};
use crate::models::{new_id, now_ms, Category, Language, Source, SourceLanguage};

const SYSTEM_PROMPT: &str = "You are an Orthodox Torah source navigator. You MUST ONLY return source citations and references. NEVER provide an answer, explanation, ruling, or guidance.
Use Orthodox canonical sources exclusively: Talmud (Bavli/Yerushalmi), Rishonim (e.g., Rashi, Rambam, Rif, Rosh, Tosafot), Acharonim (e.g., Shulchan Aruch and major commentaries, Mishnah Berurah, Shach, Taz, Aruch HaShulchan), and contemporary Orthodox poskim (e.g., Igrot Moshe, Yabia Omer, Shevet HaLevi, Minchat Shlomo, Tzitz Eliezer). Exclude non-Orthodox or purely academic references.
Default behavior unless the user explicitly requests otherwise:
- Provide an equal or near-equal mix across eras (Talmud, Rishonim, Acharonim, Contemporary) according to the target distribution.
- Order sources chronologically across the entire list: Talmud first, then Rishonim, then Acharonim, then Contemporary; within each era, earlier works first.
Output a valid JSON array only. Each item must include: \"title\", \"location\", \"text\", \"category\", \"language\". The \"category\" should be \"gemara\" for Talmud sources and \"halacha\" for Rishonim/Acharonim/Contemporary halachic works (use \"torah\" or \"mishnah\" only if explicitly citing those texts). Do not include any prose before or after the JSON.";

/// Split `total` over (Talmud, Rishonim, Acharonim, Contemporary), giving the
/// remainder to the earliest eras.
pub fn era_distribution(total: usize) -> [usize; 4] {
    let base = total / 4;
    let remainder = total % 4;
    let mut counts = [base; 4];
    for c in counts.iter_mut().take(remainder) {
        *c += 1;
    }
    counts
}

pub fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Hebrew => "Provide all sources and text in Hebrew only. Use Hebrew names for texts and locations.",
        Language::English => "Provide all sources and text in English only. Use English transliterations for Hebrew terms.",
        Language::Both => "Provide sources in both Hebrew and English when possible. Include Hebrew text with English translations.",
    }
}

fn build_user_prompt(query: &str, number_of_sources: usize, language: Language) -> String {
    let [talmud, rishonim, acharonim, contemporary] = era_distribution(number_of_sources);
    format!(
        "For the question: \"{query}\"\n\
         Provide exactly {number_of_sources} sources from Orthodox Torah literature.\n\
         Target distribution by era (unless user explicitly requests otherwise): Talmud (Gemara): {talmud}, Rishonim: {rishonim}, Acharonim: {acharonim}, Contemporary Orthodox poskim: {contemporary}.\n\
         Chronological order across the entire list (earliest first, Talmud first).\n\
         {}\n\
         Return valid JSON only.",
        language_instruction(language)
    )
}

/// Retrieve up to `number_of_sources` citations for `query`.
///
/// Items without a non-empty title and location are dropped; if nothing
/// survives, this is an error so the caller can report it.
pub async fn search_torah_sources(
    llm: &dyn TextCompletion,
    query: &str,
    number_of_sources: usize,
    language: Language,
) -> Result<Vec<Source>> {
    let messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_user_prompt(query, number_of_sources, language)),
    ];
    let reply = llm
        .complete(
            messages,
            CompletionOptions {
                temperature: 0.2,
                max_tokens: 3000,
            },
        )
        .await?;

    let sources = parse_sources(&reply.content, number_of_sources, language);
    if sources.is_empty() {
        bail!("No valid sources returned for \"{query}\"");
    }
    tracing::info!("Retrieved {} sources for \"{}\"", sources.len(), query);
    Ok(sources)
}

fn parse_sources(content: &str, limit: usize, language: Language) -> Vec<Source> {
    let Some(items) = extract_array(content) else {
        tracing::warn!("Source reply contained no JSON array");
        return Vec::new();
    };
    let timestamp = now_ms();

    items
        .iter()
        .take(limit)
        .filter_map(|item| source_from_value(item, language, timestamp))
        .collect()
}

fn source_from_value(item: &Value, language: Language, timestamp: i64) -> Option<Source> {
    let title = str_field(item, "title").map(str::trim).filter(|t| !t.is_empty())?;
    let location = str_field(item, "location").map(str::trim).filter(|l| !l.is_empty())?;
    let language = match str_field(item, "language") {
        Some("hebrew") => SourceLanguage::Hebrew,
        Some("english") => SourceLanguage::English,
        _ => language.source_default(),
    };
    Some(Source {
        id: new_id(),
        title: title.to_string(),
        location: location.to_string(),
        text: str_field(item, "text").unwrap_or_default().to_string(),
        category: Category::from_label(str_field(item, "category").unwrap_or_default()),
        language,
        timestamp,
    })
}
