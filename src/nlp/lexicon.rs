//! Stop-word and lemmatization resources used by the text normalizer.

use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use tracing::info;

use crate::error::{PipelineError, PipelineResult};

const EMBEDDED_STOPWORDS: &str = include_str!("../../resources/stopwords_en.txt");
const EMBEDDED_LEMMAS: &str = include_str!("../../resources/lemmas_en.txt");

/// WordNet noun detachment rules, tried in order.
const NOUN_SUFFIX_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

/// Fixed English stop-word set.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The bundled English list.
    pub fn english() -> Self {
        Self::parse(EMBEDDED_STOPWORDS)
    }

    /// Load a newline separated list from disk.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::init(path, e))?;
        let words = Self::parse(&raw);
        if words.is_empty() {
            return Err(PipelineError::init(path, "stop-word list is empty"));
        }
        info!(path = %path.display(), count = words.len(), "loaded stop words");
        Ok(words)
    }

    fn parse(raw: &str) -> Self {
        let words = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Dictionary lemmatizer over known base forms and irregular forms.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    lemmas: HashSet<String>,
    irregular: HashMap<String, String>,
}

impl Lemmatizer {
    /// The bundled English resource.
    pub fn english() -> Self {
        Self::parse(EMBEDDED_LEMMAS)
    }

    /// Load a lemma resource from disk.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| PipelineError::init(path, e))?;
        let lemmatizer = Self::parse(&raw);
        if lemmatizer.lemmas.is_empty() {
            return Err(PipelineError::init(path, "lemma resource declares no base forms"));
        }
        info!(
            path = %path.display(),
            lemmas = lemmatizer.lemmas.len(),
            irregular = lemmatizer.irregular.len(),
            "loaded lemma resource"
        );
        Ok(lemmatizer)
    }

    fn parse(raw: &str) -> Self {
        let mut lemmas = HashSet::new();
        let mut irregular = HashMap::new();
        for line in raw.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace().map(str::to_lowercase);
            match (parts.next(), parts.next()) {
                (Some(form), Some(lemma)) => {
                    lemmas.insert(lemma.clone());
                    irregular.insert(form, lemma);
                }
                (Some(lemma), None) => {
                    lemmas.insert(lemma);
                }
                _ => {}
            }
        }
        Self { lemmas, irregular }
    }

    /// Forget base forms the normalizer would strip (stop words, punctuation)
    /// so a lemma never reintroduces a token an earlier step removes.
    pub(crate) fn exclude(mut self, stop_words: &StopWords) -> Self {
        let keep = |lemma: &str| {
            !stop_words.contains(lemma) && !lemma.chars().any(|c| c.is_ascii_punctuation())
        };
        self.lemmas.retain(|lemma| keep(lemma));
        self.irregular.retain(|_, lemma| keep(lemma));
        self
    }

    /// Reduce `word` to its base form; unknown words come back unchanged.
    pub fn lemmatize<'a>(&'a self, word: &'a str) -> &'a str {
        if self.lemmas.contains(word) {
            return word;
        }
        if let Some(lemma) = self.irregular.get(word) {
            return lemma;
        }
        for (suffix, replacement) in NOUN_SUFFIX_RULES {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            let candidate = format!("{stem}{replacement}");
            if let Some(known) = self.lemmas.get(&candidate) {
                return known;
            }
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_stop_words_match_english_list() {
        let stop = StopWords::english();
        assert_eq!(stop.len(), 179);
        assert!(stop.contains("i"));
        assert!(stop.contains("very"));
        assert!(!stop.contains("hello"));
    }

    #[test]
    fn suffix_rules_need_a_known_base_form() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("feelings"), "feeling");
        assert_eq!(lemmatizer.lemmatize("bosses"), "boss");
        assert_eq!(lemmatizer.lemmatize("stories"), "story");
        assert_eq!(lemmatizer.lemmatize("watches"), "watch");
        assert_eq!(lemmatizer.lemmatize("hopeless"), "hopeless");
    }

    #[test]
    fn irregular_forms_resolve() {
        let lemmatizer = Lemmatizer::english();
        assert_eq!(lemmatizer.lemmatize("children"), "child");
        assert_eq!(lemmatizer.lemmatize("lives"), "life");
        assert_eq!(lemmatizer.lemmatize("child"), "child");
    }

    #[test]
    fn excluded_lemmas_are_dropped() {
        let stop = StopWords::parse("friend\n");
        let lemmatizer = Lemmatizer::english().exclude(&stop);
        assert_eq!(lemmatizer.lemmatize("friends"), "friends");
    }
}
