use super::testutil::store_from;
use super::*;

fn sample_store() -> MemoryStore {
    store_from(
        &[("你", -0.5), ("泥", -2.0), ("你好", -1.0)],
        &[
            ("你", "ni", -0.1),
            ("泥", "ni", -0.2),
            ("你好", "ni hao", 0.0),
            ("好", "hao", -0.05),
            ("号", "hao", -0.3),
        ],
        &[("你", "好", -0.2), ("你", "号", -0.1), ("泥", "好", -1.5)],
    )
}

#[test]
fn test_exact_lookups() {
    let s = sample_store();
    assert_eq!(s.initial("你").unwrap(), Some(-0.5));
    assert_eq!(s.initial("好").unwrap(), None);
    assert_eq!(s.emission("你好", "ni hao").unwrap(), Some(0.0));
    assert_eq!(s.emission("你", "hao").unwrap(), None);
    assert_eq!(s.transition("你", "号").unwrap(), Some(-0.1));
    assert_eq!(s.transition("号", "你").unwrap(), None);
}

#[test]
fn test_best_next_joins_emission_and_transition() {
    let s = sample_store();
    // 好: -0.05 + -0.2 = -0.25; 号: -0.3 + -0.1 = -0.4
    let best = s.best_next("你", "hao").unwrap().unwrap();
    assert_eq!(best.unit, "好");
    assert!((best.score - -0.25).abs() < 1e-12);
}

#[test]
fn test_best_next_requires_both_rows() {
    let s = sample_store();
    // transition exists but no emission for "ni" from 你's successors
    assert!(s.best_next("你", "ni").unwrap().is_none());
    // unknown prev
    assert!(s.best_next("号", "hao").unwrap().is_none());
    // unknown pronunciation
    assert!(s.best_next("你", "xyz").unwrap().is_none());
}

#[test]
fn test_best_next_tie_prefers_smaller_unit() {
    let s = store_from(
        &[],
        &[("乙", "yi", -0.5), ("一", "yi", -0.5)],
        &[("甲", "乙", -0.5), ("甲", "一", -0.5)],
    );
    let best = s.best_next("甲", "yi").unwrap().unwrap();
    assert_eq!(best.unit, "一");
}

#[test]
fn test_top_initial_candidates_sorted_and_limited() {
    let s = sample_store();
    let cands = s.top_initial_candidates("ni", 5).unwrap();
    let units: Vec<&str> = cands.iter().map(|c| c.unit.as_str()).collect();
    assert_eq!(units, vec!["你", "泥"]);
    assert!((cands[0].score - -0.6).abs() < 1e-12);

    let one = s.top_initial_candidates("ni", 1).unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].unit, "你");

    assert!(s.top_initial_candidates("ni", 0).unwrap().is_empty());
}

#[test]
fn test_top_initial_skips_units_without_initial() {
    let s = sample_store();
    // 好 and 号 have emissions for "hao" but no initial rows
    assert!(s.top_initial_candidates("hao", 5).unwrap().is_empty());
}

#[test]
fn test_duplicates_remain_visible() {
    let mut s = MemoryStore::new();
    s.insert(StoreEntry::initial("你", -1.0)).unwrap();
    s.insert(StoreEntry::initial("你", -0.5)).unwrap();
    s.insert(StoreEntry::emission("你", "ni", -0.1)).unwrap();
    assert_eq!(s.stats().unwrap().initial, 2);
    // exact lookup returns the first row
    assert_eq!(s.initial("你").unwrap(), Some(-1.0));
    // the join sees both rows
    let cands = s.top_initial_candidates("ni", 5).unwrap();
    assert_eq!(cands.len(), 2);
    assert!((cands[0].score - -0.6).abs() < 1e-12);
}

#[test]
fn test_invalid_log_prob_rejected() {
    let mut s = MemoryStore::new();
    assert!(matches!(
        s.insert(StoreEntry::initial("你", 0.5)),
        Err(StoreError::InvalidLogProb(_))
    ));
    assert!(matches!(
        s.insert(StoreEntry::initial("你", f64::NEG_INFINITY)),
        Err(StoreError::InvalidLogProb(_))
    ));
    assert!(s.is_empty());
}

#[test]
fn test_rejected_batch_leaves_store_untouched() {
    let mut s = MemoryStore::new();
    let batch = vec![
        StoreEntry::initial("你", -0.1),
        StoreEntry::emission("你", "ni", f64::NAN),
    ];
    assert!(s.insert_batch(batch).is_err());
    assert!(s.is_empty());
}

#[test]
fn test_reset_drops_all_tables() {
    let mut s = sample_store();
    assert!(!s.is_empty());
    s.reset().unwrap();
    assert!(s.is_empty());
    assert_eq!(s.stats().unwrap(), StoreStats::default());
    assert!(s.top_initial_candidates("ni", 5).unwrap().is_empty());
}

#[test]
fn test_entries_keep_insertion_order_and_duplicates() {
    let s = store_from(
        &[("你", -0.5), ("你", -0.7)],
        &[("好", "hao", -0.1)],
        &[("你", "好", -0.2)],
    );
    let initial: Vec<f64> = s.initial_entries().iter().map(|e| e.log_prob).collect();
    assert_eq!(initial, vec![-0.5, -0.7]);
    assert_eq!(s.emission_entries()[0].pronunciation, "hao");
    assert_eq!(s.transition_entries()[0].next, "好");
}

#[test]
fn test_serialize_roundtrip() {
    let s = sample_store();
    let bytes = s.to_bytes().unwrap();
    let s2 = MemoryStore::from_bytes(&bytes).unwrap();
    assert_eq!(s2.stats().unwrap(), s.stats().unwrap());
    assert_eq!(s2.initial_entries(), s.initial_entries());
    assert_eq!(s2.best_next("你", "hao").unwrap(), s.best_next("你", "hao").unwrap());
}

#[test]
fn test_from_bytes_rejects_bad_header() {
    assert!(matches!(
        MemoryStore::from_bytes(b"HZ"),
        Err(StoreError::InvalidHeader)
    ));
    assert!(matches!(
        MemoryStore::from_bytes(b"LXDX\x01\0\0\0\0"),
        Err(StoreError::InvalidMagic)
    ));
    assert!(matches!(
        MemoryStore::from_bytes(b"HZPS\x09\0\0\0\0"),
        Err(StoreError::UnsupportedVersion(9))
    ));
    assert!(matches!(
        MemoryStore::from_bytes(b"HZPS\x01\0"),
        Err(StoreError::InvalidHeader)
    ));
}

#[test]
fn test_from_bytes_detects_corruption() {
    let mut bytes = sample_store().to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        MemoryStore::from_bytes(&bytes),
        Err(StoreError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.hzps");

    let s = sample_store();
    s.save(&path).unwrap();
    assert!(!path.with_extension("tmp").exists());

    let s2 = MemoryStore::open(&path).unwrap();
    assert_eq!(s2.emission_entries(), s.emission_entries());
    assert_eq!(s2.transition_entries(), s.transition_entries());
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        MemoryStore::open(&dir.path().join("missing.hzps")),
        Err(StoreError::Io(_))
    ));
}
