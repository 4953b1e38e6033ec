//! End-to-end interaction scenarios through the public call surface.

use std::sync::Arc;

use agora_core::{CoreConfig, CoreError, GuardError, PostId, SocialCore};
use agora_types::ManualClock;

fn guard_err(result: Result<(), CoreError>) -> GuardError {
    match result {
        Err(CoreError::Guard(err)) => err,
        other => panic!("expected a guard rejection, got {other:?}"),
    }
}

fn core(names: &[&str]) -> (SocialCore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let core = SocialCore::with_clock(CoreConfig::default(), clock.clone());
    for name in names {
        core.add_user(name, ["general"]).unwrap();
    }
    (core, clock)
}

#[test]
fn alice_bob_carol() {
    let (core, _) = core(&["alice", "bob", "carol"]);
    core.follow("bob", "alice").unwrap();

    let id = core.create_post("alice", "T", "C").unwrap();
    assert_eq!(id, PostId(0));

    core.rate_post("bob", id, 1).unwrap();
    assert!(matches!(
        guard_err(core.rate_post("bob", id, 1)),
        GuardError::DuplicateVote { .. }
    ));
    assert!(matches!(
        guard_err(core.rate_post("alice", id, 1)),
        GuardError::SameAuthor { .. }
    ));
    assert!(matches!(
        guard_err(core.rate_post("carol", id, 1)),
        GuardError::NotInFeed { .. }
    ));

    let post = core.get_post(id).unwrap();
    assert_eq!(post.upvotes(), 1);
    assert_eq!(post.score(), 1);
}

#[test]
fn feed_ordering_p2_p3_p1() {
    let (core, clock) = core(&["alice", "bob"]);
    core.follow("bob", "alice").unwrap();

    clock.set(1);
    let p1 = core.create_post("alice", "P1", "c").unwrap();
    clock.set(3);
    let p2 = core.create_post("alice", "P2", "c").unwrap();
    clock.set(2);
    let p3 = core.create_post("alice", "P3", "c").unwrap();

    let ids: Vec<_> = core.user_feed("bob").unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![p2, p3, p1]);
}

#[test]
fn feed_gating_applies_to_comments() {
    let (core, _) = core(&["alice", "bob", "carol"]);
    core.follow("bob", "alice").unwrap();
    let id = core.create_post("alice", "T", "C").unwrap();

    core.comment_post("bob", id, "hello").unwrap();
    assert!(matches!(
        guard_err(core.comment_post("carol", id, "hi")),
        GuardError::NotInFeed { .. }
    ));
    assert!(matches!(
        guard_err(core.comment_post("alice", id, "me")),
        GuardError::SameAuthor { .. }
    ));
    assert!(matches!(
        guard_err(core.comment_post("bob", PostId(42), "?")),
        GuardError::PostNotFound(_)
    ));
    assert_eq!(core.get_post(id).unwrap().comments.len(), 1);
}

#[test]
fn invalid_vote_value_is_rejected_before_lookup() {
    let (core, _) = core(&["alice", "bob"]);
    assert!(matches!(
        guard_err(core.rate_post("bob", PostId(99), 0)),
        GuardError::InvalidVoteValue(0)
    ));
    assert!(matches!(
        guard_err(core.rate_post("ghost", PostId(99), 1)),
        GuardError::UserNotFound(_)
    ));
}

#[test]
fn deletion_authorization() {
    let (core, _) = core(&["alice", "bob"]);
    let id = core.create_post("alice", "T", "C").unwrap();

    assert!(matches!(
        guard_err(core.delete_post("bob", id)),
        GuardError::InvalidOperation { .. }
    ));
    assert!(core.get_post(id).is_some());

    core.delete_post("alice", id).unwrap();
    assert!(core.get_post(id).is_none());
    assert!(matches!(
        guard_err(core.delete_post("alice", id)),
        GuardError::PostNotFound(_)
    ));
}

#[test]
fn deleted_post_leaves_feed_and_rejects_votes() {
    let (core, _) = core(&["alice", "bob"]);
    core.follow("bob", "alice").unwrap();
    let id = core.create_post("alice", "T", "C").unwrap();
    core.delete_post("alice", id).unwrap();

    assert!(core.user_feed("bob").unwrap().is_empty());
    assert!(matches!(
        guard_err(core.rate_post("bob", id, -1)),
        GuardError::PostNotFound(_)
    ));
}

#[test]
fn unfollow_closes_the_feed() {
    let (core, _) = core(&["alice", "bob"]);
    core.follow("bob", "alice").unwrap();
    let first = core.create_post("alice", "one", "c").unwrap();
    let second = core.create_post("alice", "two", "c").unwrap();
    core.rate_post("bob", first, 1).unwrap();

    core.unfollow("bob", "alice").unwrap();
    assert!(matches!(
        guard_err(core.rate_post("bob", second, 1)),
        GuardError::NotInFeed { .. }
    ));
    // The earlier vote stays.
    assert_eq!(core.get_post(first).unwrap().votes.len(), 1);
}
