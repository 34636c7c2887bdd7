//! Property-based tests for the local mirror collections

use artline::client::state::{CollectionKind, LocalMirror};
use artline::shared::image::ImageRecord;
use proptest::prelude::*;

fn record(id: &str) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        image_url: format!("https://cdn.example.com/{}.png", id),
        prompt: String::new(),
        created_at: String::new(),
    }
}

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Remove(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // Small id space so adds and removes collide often
    let id = "[a-e]";
    prop_oneof![
        id.prop_map(Op::Add),
        id.prop_map(Op::Remove),
    ]
}

fn ids(mirror: &LocalMirror, kind: CollectionKind) -> Vec<String> {
    mirror.set(kind).ids().map(str::to_string).collect()
}

proptest! {
    #[test]
    fn test_add_is_idempotent(id in "[a-z]{1,8}", kind in prop_oneof![
        Just(CollectionKind::Saved),
        Just(CollectionKind::Loved),
        Just(CollectionKind::History),
    ]) {
        let mut once = LocalMirror::new();
        once.add(kind, record(&id));

        let mut twice = LocalMirror::new();
        twice.add(kind, record(&id));
        twice.add(kind, record(&id));

        prop_assert_eq!(ids(&once, kind), ids(&twice, kind));
    }

    #[test]
    fn test_history_is_unique_and_newest_first(adds in prop::collection::vec("[a-e]", 1..30)) {
        let mut mirror = LocalMirror::new();
        for id in &adds {
            mirror.add(CollectionKind::History, record(id));
        }

        // Model: first-seen ids, most recent first-sighting at the front
        let mut expected: Vec<String> = Vec::new();
        for id in &adds {
            if !expected.contains(id) {
                expected.insert(0, id.clone());
            }
        }
        prop_assert_eq!(ids(&mirror, CollectionKind::History), expected);
    }

    #[test]
    fn test_saved_matches_append_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut mirror = LocalMirror::new();
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Add(id) => {
                    let inserted = mirror.add(CollectionKind::Saved, record(&id));
                    prop_assert_eq!(inserted, !model.contains(&id));
                    if inserted {
                        model.push(id);
                    }
                }
                Op::Remove(id) => {
                    let removed = mirror.remove(CollectionKind::Saved, &id).is_some();
                    prop_assert_eq!(removed, model.contains(&id));
                    model.retain(|existing| existing != &id);
                }
            }
        }
        prop_assert_eq!(ids(&mirror, CollectionKind::Saved), model);
    }

    #[test]
    fn test_removed_history_never_returns(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut mirror = LocalMirror::new();
        let mut retired: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Add(id) => {
                    mirror.add(CollectionKind::History, record(&id));
                }
                Op::Remove(id) => {
                    if mirror.remove(CollectionKind::History, &id).is_some() {
                        retired.push(id);
                    }
                }
            }
        }
        for id in &retired {
            prop_assert!(!mirror.contains(CollectionKind::History, id));
        }
    }
}
