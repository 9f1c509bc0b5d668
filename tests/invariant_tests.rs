//! Integration tests for the invariant-based testing infrastructure
//!
//! Operation histories captured by `InstrumentedIndex` are replayed
//! through the invariant checkers.

use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;
use tweetdex::config::IndexSettings;
use tweetdex::index::{InstrumentedIndex, TweetIndex};
use tweetdex::testing::prelude::*;
use tweetdex::testing::{DenseSequentialIds, PopularOrderRespected};

fn create_instrumented() -> InstrumentedIndex {
    InstrumentedIndex::new(TweetIndex::new(IndexSettings::default()).unwrap())
}

fn assert_no_violations(index: &InstrumentedIndex) {
    let violations = index.check_invariants(&default_invariants());
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("{}", violation);
        }
        panic!("Invariant violations detected!");
    }
}

#[test]
fn test_basic_invariants() {
    let mut index = create_instrumented();

    index.post("@ana", "rust is fun #rust").unwrap();
    index.post("@bob", "#rust vs #go").unwrap();
    index.post("@ana", "@bob agreed #go").unwrap();

    index.favorite(1).unwrap();
    index.favorite(1).unwrap();
    index.favorite(2).unwrap();
    assert!(index.favorite(3).is_err());

    index.search_chronological("#rust", 0).unwrap();
    index.search_popular("#go", 1).unwrap();
    index.search_popular("@bob", 0).unwrap();
    assert!(index.get(2).is_some());
    assert!(index.get(3).is_none());

    assert_no_violations(&index);
    assert_eq!(index.event_log().len(), 12);
}

#[test]
fn test_invariant_violation_detection() {
    // A simulated bug: a favorite counted twice in the reported results
    let log = EventLog::new();

    let op = log.record_invoke(OperationType::Post {
        author: "@ana".to_string(),
        message: "#x".to_string(),
    });
    log.record_return(op, OperationResult::PostSuccess { id: 0 });

    let op = log.record_invoke(OperationType::Favorite { id: 0 });
    log.record_return(op, OperationResult::FavoriteSuccess { id: 0 });

    let op = log.record_invoke(OperationType::Search {
        token: "#x".to_string(),
        order: tweetdex::SearchOrder::Popular,
        limit: 0,
    });
    log.record_return(
        op,
        OperationResult::SearchSuccess {
            ids: vec![0],
            favorites: vec![2],
        },
    );

    let result = PopularOrderRespected.check(&log);
    let violation = result.expect_err("should detect the inflated count");
    assert_eq!(violation.invariant, "PopularOrderRespected");
    assert_eq!(violation.violating_events, vec![2]);
}

#[test]
fn test_event_log_export_import() {
    let mut index = create_instrumented();
    for i in 0..5 {
        index.post("@ana", &format!("note {} #log", i)).unwrap();
    }
    index.favorite(3).unwrap();
    index.search_popular("#log", 2).unwrap();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(index.event_log().to_json().unwrap().as_bytes())
        .unwrap();

    let json = std::fs::read_to_string(file.path()).unwrap();
    let restored = EventLog::from_json(&json).unwrap();
    assert_eq!(restored.len(), 7);
    assert!(DenseSequentialIds.check(&restored).is_ok());
    assert!(check_all_invariants(&restored, &default_invariants()).is_empty());

    // continue recording on top of the restored history
    let mut continued = InstrumentedIndex::with_event_log(index.into_inner(), restored);
    continued.post("@bob", "#log again").unwrap();
    assert_no_violations(&continued);
    assert_eq!(continued.event_log().post_operations().len(), 6);
}

#[derive(Debug, Clone)]
enum Op {
    Post(usize, Vec<usize>),
    Favorite(usize),
    Chronological(usize, usize),
    Popular(usize, usize),
}

const AUTHORS: [&str; 4] = ["@ana", "@bob", "@cid", "@dee"];
const TAGS: [&str; 5] = ["#a", "#b", "#c", "@ana", "@bob"];

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..AUTHORS.len(), prop::collection::vec(0..TAGS.len(), 0..5))
            .prop_map(|(a, tags)| Op::Post(a, tags)),
        3 => (0usize..40).prop_map(Op::Favorite),
        1 => (0..TAGS.len(), 0usize..6).prop_map(|(t, k)| Op::Chronological(t, k)),
        2 => (0..TAGS.len(), 0usize..6).prop_map(|(t, k)| Op::Popular(t, k)),
    ]
}

proptest! {
    #[test]
    fn prop_random_histories_hold_invariants(ops in prop::collection::vec(op_strategy(), 1..120)) {
        let mut index = create_instrumented();

        for op in ops {
            match op {
                Op::Post(author, tags) => {
                    let words: Vec<&str> = tags.iter().map(|&t| TAGS[t]).collect();
                    let message = format!("post {}", words.join(" word "));
                    index.post(AUTHORS[author], &message).unwrap();
                }
                Op::Favorite(id) => {
                    let exists = id < index.inner().len();
                    prop_assert_eq!(index.favorite(id).is_ok(), exists);
                }
                Op::Chronological(tag, limit) => {
                    let results = index.search_chronological(TAGS[tag], limit).unwrap();
                    if limit > 0 {
                        prop_assert!(results.len() <= limit);
                    }
                }
                Op::Popular(tag, limit) => {
                    let top: Vec<(usize, u64)> = index
                        .search_popular(TAGS[tag], limit)
                        .unwrap()
                        .iter()
                        .map(|t| (t.id(), t.favorite_count()))
                        .collect();
                    let everything: Vec<(usize, u64)> = index
                        .search_chronological(TAGS[tag], 0)
                        .unwrap()
                        .iter()
                        .map(|t| (t.id(), t.favorite_count()))
                        .collect();
                    let expected_len = if limit == 0 {
                        everything.len()
                    } else {
                        everything.len().min(limit)
                    };
                    prop_assert_eq!(top.len(), expected_len);

                    // brute force: nothing left out outranks the weakest kept tweet
                    if let Some(weakest) = top.iter().map(|&(_, f)| f).min() {
                        for (id, favorites) in &everything {
                            if !top.iter().any(|(kept, _)| kept == id) {
                                prop_assert!(*favorites <= weakest, "tweet {} excluded", id);
                            }
                        }
                    }
                }
            }
        }

        let violations = index.check_invariants(&default_invariants());
        prop_assert!(violations.is_empty(), "{:?}", violations);
    }
}
