use proptest::prelude::*;
use risk_triage::nlp::TextNormalizer;

#[test]
fn empty_input_normalizes_to_empty() {
    assert_eq!(TextNormalizer::english().normalize(""), "");
}

#[test]
fn greeting_keeps_content_words() {
    assert_eq!(
        TextNormalizer::english().normalize("Hello, World!!!"),
        "hello world"
    );
}

#[test]
fn stop_words_drop_and_spacing_collapses() {
    assert_eq!(
        TextNormalizer::english().normalize("  I feel   very sad\tand hopeless. "),
        "feel sad hopeless"
    );
}

#[test]
fn common_plurals_reduce_to_nouns() {
    assert_eq!(
        TextNormalizer::english().normalize("hours dreams pills moments hands cuts scars nightmares"),
        "hour dream pill moment hand cut scar nightmare"
    );
}

#[test]
fn irregular_and_invariant_nouns() {
    assert_eq!(
        TextNormalizer::english().normalize("wolves geese crises glasses news people"),
        "wolf goose crisis glass news people"
    );
}

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            "Friends", "children", "the", "bosses", "LIVES", "hopeless", "sad,", "don't",
            "stories!", "is", "watches", "feelings.", "leaves", "I", "men", "glasses",
        ]),
        0..16,
    )
    .prop_map(|words| words.join(" "))
}

proptest! {
    #[test]
    fn normalize_is_idempotent(text in "[A-Za-z0-9 ,.!?'\t-]{0,80}") {
        let normalizer = TextNormalizer::english();
        let once = normalizer.normalize(&text);
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn normalize_is_idempotent_on_dictionary_words(text in words()) {
        let normalizer = TextNormalizer::english();
        let once = normalizer.normalize(&text);
        prop_assert!(!once.contains("  "));
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn normalize_never_panics(text in "\\PC{0,64}") {
        let normalized = TextNormalizer::english().normalize(&text);
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_punctuation()));
    }
}
