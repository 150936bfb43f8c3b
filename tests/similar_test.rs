mod helpers;

use helpers::{store, test_service};

#[test]
fn similar_excludes_the_target_itself() {
    let service = test_service();
    let seed = store(
        &service,
        "the borrow checker enforces ownership rules",
        &[],
        None,
    );
    store(&service, "ownership rules and the borrow checker", &[], None);
    store(&service, "the borrow checker rules for ownership", &[], None);

    let resp = service.search_similar(&seed, 10);
    assert!(resp.success);
    assert!(resp.results.iter().all(|r| r.memory.content_hash != seed));
    assert_eq!(resp.total_found, 2);
    assert_eq!(resp.search_type, "similar");
    assert!(resp.query.starts_with("Similar to:"));

    let target = resp.target_memory.unwrap();
    assert_eq!(target.content_hash, seed);
}

#[test]
fn limit_caps_the_neighbor_count() {
    let service = test_service();
    let seed = store(&service, "alpha beta gamma delta", &[], None);
    for i in 0..5 {
        store(&service, &format!("alpha beta gamma variant {i}"), &[], None);
    }

    let resp = service.search_similar(&seed, 2);
    assert!(resp.success);
    assert_eq!(resp.total_found, 2);
}

#[test]
fn neighbors_carry_similarity_reasons() {
    let service = test_service();
    let seed = store(&service, "lighthouse on the rocky coast", &[], None);
    store(&service, "a lighthouse stands on the coast", &[], None);

    let resp = service.search_similar(&seed, 5);
    assert!(resp.success);
    assert!(!resp.results.is_empty());
    for r in &resp.results {
        assert!(r.similarity_score.is_some());
        assert!(r
            .relevance_reason
            .as_deref()
            .unwrap()
            .starts_with("Similar to target memory:"));
    }
}

#[test]
fn unknown_hash_is_not_found() {
    let service = test_service();
    let resp = service.search_similar("deadbeef", 5);
    assert!(!resp.success);
    assert!(resp.message.as_deref().unwrap().contains("not found"));
    assert!(resp.target_memory.is_none());
    assert_eq!(resp.total_found, 0);
}

#[test]
fn empty_hash_is_a_validation_error() {
    let service = test_service();
    let resp = service.search_similar("", 5);
    assert!(!resp.success);
    assert!(resp
        .message
        .as_deref()
        .unwrap()
        .contains("Content hash must be specified"));
}
