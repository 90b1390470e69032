use std::collections::{HashMap, HashSet};

use crate::config::SuggestParams;
use crate::models::QueryRecord;
use crate::text::{is_keyword, ngrams, normalize, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// A whole past query
    Full,
    /// A recurring bi/tri-gram that contains a domain keyword
    Phrase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    pub kind: CandidateKind,
    pub count: usize,
    pub last_timestamp: i64,
    pub has_keyword: bool,
    pub tokens: Vec<String>,
}

impl Candidate {
    /// Tokens plus their bigrams, compared against the theme set.
    pub fn signature(&self) -> HashSet<String> {
        let mut set: HashSet<String> = self.tokens.iter().cloned().collect();
        set.extend(ngrams(&self.tokens, 2));
        set
    }
}

/// Group candidates by key, keeping first-seen order.
struct Tally {
    slot: HashMap<String, usize>,
    items: Vec<Candidate>,
}

impl Tally {
    fn new() -> Self {
        Self {
            slot: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn record(&mut self, key: String, timestamp: i64, has_keyword: bool, make: impl FnOnce() -> Candidate) {
        match self.slot.get(&key) {
            Some(&idx) => {
                let c = &mut self.items[idx];
                c.count += 1;
                c.last_timestamp = c.last_timestamp.max(timestamp);
                c.has_keyword |= has_keyword;
            }
            None => {
                self.slot.insert(key, self.items.len());
                self.items.push(make());
            }
        }
    }
}

/// Score and rank full-query and phrase candidates from `history`
/// (most recent first), returning at most `max(pool_size, 6)` of them.
pub fn build_candidates(history: &[QueryRecord], params: &SuggestParams) -> Vec<Candidate> {
    let recent = &history[..history.len().min(params.history_window)];
    if recent.is_empty() {
        return Vec::new();
    }

    let min_ts = recent.iter().map(|h| h.timestamp).min().unwrap_or(0);
    let max_ts = recent.iter().map(|h| h.timestamp).max().unwrap_or(0);

    let mut full = Tally::new();
    for h in recent {
        let raw = h.query.trim();
        if raw.is_empty() {
            continue;
        }
        let tokens = tokenize(raw);
        let has_keyword = tokens.iter().any(|t| is_keyword(t));
        full.record(normalize(raw), h.timestamp, has_keyword, || Candidate {
            text: raw.to_string(),
            kind: CandidateKind::Full,
            count: 1,
            last_timestamp: h.timestamp,
            has_keyword,
            tokens: tokens.clone(),
        });
    }

    let mut phrases = Tally::new();
    for h in recent {
        let toks = tokenize(&h.query);
        for phrase in ngrams(&toks, 2).into_iter().chain(ngrams(&toks, 3)) {
            let phrase_tokens: Vec<String> = phrase.split(' ').map(str::to_string).collect();
            if !phrase_tokens.iter().any(|t| is_keyword(t)) {
                continue;
            }
            phrases.record(phrase.clone(), h.timestamp, true, || Candidate {
                text: phrase.clone(),
                kind: CandidateKind::Phrase,
                count: 1,
                last_timestamp: h.timestamp,
                has_keyword: true,
                tokens: phrase_tokens.clone(),
            });
        }
    }

    let full_list = full.items;
    let phrase_list: Vec<Candidate> = phrases.items.into_iter().filter(|p| p.count >= 2).collect();

    let max_freq_full = full_list.iter().map(|c| c.count).max().unwrap_or(1).max(1);
    let max_freq_phrase = phrase_list.iter().map(|c| c.count).max().unwrap_or(1).max(1);
    let span = (max_ts - min_ts).max(1) as f64;

    let score = |c: &Candidate| -> f64 {
        let recency = (c.last_timestamp - min_ts) as f64 / span;
        let (freq, kind_boost) = match c.kind {
            CandidateKind::Full => (c.count as f64 / max_freq_full as f64, 0.1),
            CandidateKind::Phrase => (c.count as f64 / max_freq_phrase as f64, 0.0),
        };
        let keyword = if c.has_keyword { 0.2 } else { 0.0 };
        recency * 0.5 + freq * 0.4 + keyword + kind_boost
    };

    let mut pool: Vec<(f64, Candidate)> = full_list
        .into_iter()
        .chain(phrase_list)
        .map(|c| (score(&c), c))
        .collect();
    // Stable: equal scores keep full-before-phrase, first-seen order
    pool.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    pool.truncate(params.pool_size.max(6));
    pool.into_iter().map(|(_, c)| c).collect()
}

/// Unigrams and bigrams of the `window` most recent queries.
pub fn build_theme(history: &[QueryRecord], window: usize) -> HashSet<String> {
    let mut theme = HashSet::new();
    for h in history.iter().take(window) {
        let toks = tokenize(&h.query);
        theme.extend(ngrams(&toks, 2));
        theme.extend(toks);
    }
    theme
}

pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        return 0.0;
    }
    inter as f64 / union as f64
}
