use std::time::Instant;

use proptest::prelude::*;

use crate::corpus::parse_corpus;
use crate::settings::{ModelMode, Settings};
use crate::store::testutil::store_from;
use crate::store::MemoryStore;
use crate::text::{primary_pronunciation, CharSegmenter, TableTransliterator};
use crate::trainer::Trainer;

use super::*;

fn readings() -> TableTransliterator {
    TableTransliterator::from_pairs([
        ('你', vec!["ni"]),
        ('泥', vec!["ni"]),
        ('好', vec!["hao"]),
        ('号', vec!["hao"]),
        ('我', vec!["wo"]),
        ('爱', vec!["ai"]),
    ])
}

fn trained(corpus: &str) -> MemoryStore {
    let tr = readings();
    let lines = parse_corpus(corpus).unwrap();
    let mut store = MemoryStore::new();
    Trainer::new(&CharSegmenter, &tr)
        .train(&lines, &mut store)
        .unwrap();
    store
}

#[test]
fn test_empty_input() {
    let store = MemoryStore::new();
    let decoder = Decoder::new(&store);
    assert_eq!(decoder.decode("").unwrap(), "");
    assert_eq!(decoder.decode("   \t").unwrap(), "");
    assert!(matches!(
        decoder.decode_segments("", None),
        Err(DecodeError::EmptyInput)
    ));
}

#[test]
fn test_no_initial_candidate_yields_empty() {
    let store = store_from(&[], &[("好", "hao", -0.1)], &[]);
    let decoder = Decoder::new(&store);
    assert_eq!(decoder.decode("hao").unwrap(), "");
    assert!(matches!(
        decoder.decode_segments("hao", None),
        Err(DecodeError::NoViableSegmentation)
    ));
}

#[test]
fn test_single_unit() {
    let store = store_from(&[("你", -0.1)], &[("你", "ni", -0.2)], &[]);
    let path = Decoder::new(&store).decode_segments("ni", None).unwrap();
    assert_eq!(path.text(), "你");
    assert!((path.score - -0.3).abs() < 1e-12);
    assert_eq!(path.units[0].pronunciation, "ni");
}

#[test]
fn test_longer_span_wins_on_score() {
    // Two candidates for the two-syllable span, so shorter spans are also tried.
    let store = store_from(
        &[("你好", -0.5), ("泥号", -3.0), ("你", -0.5), ("好", -0.5)],
        &[
            ("你好", "ni hao", -0.1),
            ("泥号", "ni hao", -0.1),
            ("你", "ni", -0.1),
            ("好", "hao", -0.1),
        ],
        &[("你", "好", -0.1)],
    );
    let path = Decoder::new(&store).decode_segments("ni hao", None).unwrap();
    assert_eq!(path.segmented("/"), "你好");
    assert!((path.score - -0.6).abs() < 1e-12);
}

#[test]
fn test_shorter_spans_win_when_better() {
    let store = store_from(
        &[("你好", -5.0), ("泥号", -6.0), ("你", -0.1)],
        &[
            ("你好", "ni hao", -0.1),
            ("泥号", "ni hao", -0.1),
            ("你", "ni", -0.1),
            ("好", "hao", -0.1),
        ],
        &[("你", "好", -0.1)],
    );
    let path = Decoder::new(&store).decode_segments("ni hao", None).unwrap();
    assert_eq!(path.segmented("/"), "你/好");
}

#[test]
fn test_single_candidate_settles_span() {
    // Only one unit for "ni hao": shorter spans are never explored even
    // though they would score better.
    let store = store_from(
        &[("你好", -5.0), ("你", -0.1)],
        &[
            ("你好", "ni hao", -0.1),
            ("你", "ni", -0.1),
            ("好", "hao", -0.1),
        ],
        &[("你", "好", -0.1)],
    );
    assert_eq!(Decoder::new(&store).decode("ni hao").unwrap(), "你好");
}

#[test]
fn test_zero_score_settles_span() {
    let store = store_from(
        &[("你好", 0.0), ("泥号", -1.0), ("你", 0.0)],
        &[
            ("你好", "ni hao", 0.0),
            ("泥号", "ni hao", -1.0),
            ("你", "ni", 0.0),
            ("好", "hao", 0.0),
        ],
        &[("你", "好", 0.0)],
    );
    let path = Decoder::new(&store).decode_segments("ni hao", None).unwrap();
    assert_eq!(path.units.len(), 1);
    assert_eq!(path.text(), "你好");
}

#[test]
fn test_explores_beyond_best_initial() {
    // 泥 has the better first score but nothing can follow it.
    let store = store_from(
        &[("泥", -0.1), ("你", -1.0)],
        &[("泥", "ni", -0.1), ("你", "ni", -0.1), ("好", "hao", -0.1)],
        &[("你", "好", -0.1)],
    );
    assert_eq!(Decoder::new(&store).decode("ni hao").unwrap(), "你好");
}

#[test]
fn test_chain_break_retries_as_initial() {
    // No transitions at all: every unit after the first starts afresh.
    let store = store_from(
        &[("你", -0.1), ("好", -0.2)],
        &[("你", "ni", -0.1), ("好", "hao", -0.1)],
        &[],
    );
    let path = Decoder::new(&store).decode_segments("ni hao", None).unwrap();
    assert_eq!(path.segmented("/"), "你/好");
    assert!((path.score - -0.5).abs() < 1e-12);
}

#[test]
fn test_chain_break_failure_drops_candidate() {
    // 好 has an emission but can neither follow 你 nor start a sentence.
    let store = store_from(
        &[("你", -0.1)],
        &[("你", "ni", -0.1), ("好", "hao", -0.1)],
        &[],
    );
    assert_eq!(Decoder::new(&store).decode("ni hao").unwrap(), "");
}

#[test]
fn test_successor_found_at_shorter_span() {
    // After 我 there is no two-syllable successor, only single ones.
    let store = store_from(
        &[("我", -0.1)],
        &[
            ("我", "wo", -0.1),
            ("爱你", "ai ni", -0.1),
            ("爱", "ai", -0.1),
            ("你", "ni", -0.1),
        ],
        &[("我", "爱", -0.1), ("爱", "你", -0.1)],
    );
    assert_eq!(Decoder::new(&store).decode("wo ai ni").unwrap(), "我爱你");
}

#[test]
fn test_input_normalization() {
    let store = store_from(&[("你", -0.1)], &[("你", "ni", -0.1)], &[]);
    let decoder = Decoder::new(&store);
    assert_eq!(decoder.decode("  NI3 ").unwrap(), "你");
}

#[test]
fn test_max_unit_len_limits_spans() {
    let store = store_from(
        &[("你好", -0.1), ("你", -1.0)],
        &[
            ("你好", "ni hao", -0.1),
            ("你", "ni", -0.1),
            ("好", "hao", -0.1),
        ],
        &[("你", "好", -0.1)],
    );
    let mut settings = Settings::default();
    settings.model.mode = ModelMode::Char;
    let decoder = Decoder::from_settings(&store, &settings);
    assert_eq!(decoder.max_unit_len(), 1);
    assert_eq!(decoder.decode("ni hao").unwrap(), "你好");
    let path = decoder.decode_segments("ni hao", None).unwrap();
    assert_eq!(path.units.len(), 2);
}

#[test]
fn test_past_deadline_aborts() {
    let store = store_from(&[("你", -0.1)], &[("你", "ni", -0.1)], &[]);
    let decoder = Decoder::new(&store);
    let result = decoder.decode_with_deadline("ni", Some(Instant::now()));
    assert!(matches!(result, Err(DecodeError::DeadlineExceeded)));
    // empty input never reaches the search
    assert_eq!(
        decoder
            .decode_with_deadline("", Some(Instant::now()))
            .unwrap(),
        ""
    );
}

#[test]
fn test_trained_round_trip() {
    let store = trained("你好 S\n你 W\n好 W\n");
    let out = Decoder::new(&store).decode("ni hao").unwrap();
    assert!(!out.is_empty());
    assert_eq!(
        primary_pronunciation(&readings(), &out).as_deref(),
        Some("ni hao")
    );
}

#[test]
fn test_trained_sentence() {
    let store = trained("我爱你 S\n你好 S\n我 W\n爱 W\n你 W\n好 W\n");
    assert_eq!(Decoder::new(&store).decode("wo ai ni").unwrap(), "我爱你");
}

#[test]
fn test_long_input_decodes_without_deep_recursion() {
    let store = trained("你好 S\n你 W\n好 W\n");
    let input = vec!["ni hao"; 4000].join(" ");
    let path = Decoder::new(&store).decode_segments(&input, None).unwrap();
    let text = path.text();
    assert_eq!(text.chars().count(), 8000);
    assert_eq!(
        primary_pronunciation(&readings(), &text).as_deref(),
        Some(input.as_str())
    );
    let covered: usize = path
        .units
        .iter()
        .map(|u| u.pronunciation.split(' ').count())
        .sum();
    assert_eq!(covered, 8000);
}

#[test]
fn test_dyn_store() {
    let store = store_from(&[("你", -0.1)], &[("你", "ni", -0.1)], &[]);
    let dyn_store: &dyn ProbabilityStore = &store;
    assert_eq!(Decoder::new(dyn_store).decode("ni").unwrap(), "你");
}

proptest! {
    #[test]
    fn prop_decode_is_deterministic(
        tokens in prop::collection::vec(
            prop::sample::select(vec!["ni", "hao", "wo", "ai", "xyz"]),
            0..8,
        )
    ) {
        let store = trained("我爱你 S\n你好 S\n我 W\n爱 W\n你 W\n好 W\n泥 W\n号 W\n");
        let decoder = Decoder::new(&store);
        let input = tokens.join(" ");
        let first = decoder.decode(&input).unwrap();
        let second = decoder.decode(&input).unwrap();
        prop_assert_eq!(&first, &second);
        if !first.is_empty() {
            prop_assert_eq!(first.chars().count(), tokens.len());
        }
    }
}
