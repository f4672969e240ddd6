//! End-to-end dispatch: prefix gating, parsing, coercion, the legacy-pipe
//! aside, typo bookkeeping, and the fault boundary.

mod common;

use bramble::alias::AliasStore;
use bramble::auth::AccessPolicy;
use bramble::commands::{Engine, ReplySink};
use bramble::config::Config;
use bramble::router::Router;
use common::{caller, FailProbe, PanicProbe, Probe, BOOM, FLAKY, OWNER, RANDO, TYPED};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// A router with the stock engines plus probe commands, all open.
fn probe_router() -> (Router, Arc<std::sync::atomic::AtomicUsize>) {
    let (typed, typed_calls) = Probe::new(&TYPED, "typed ran");
    let mut engines = bramble::commands::build_engines(&Config::default());
    engines.push(Arc::new(
        Engine::builder("probes")
            .policy(AccessPolicy::open())
            .command(typed)
            .command(PanicProbe(&BOOM))
            .command(FailProbe(&FLAKY))
            .build(),
    ));
    (
        Router::new(">", engines, AliasStore::in_memory()),
        typed_calls,
    )
}

#[tokio::test]
async fn unprefixed_lines_are_ignored_entirely() {
    let (router, _) = probe_router();
    let (sink, notes) = ReplySink::capturing();
    assert!(router.run("ping", &caller(OWNER, 1), &sink).await.is_none());
    assert!(notes.lock().await.is_empty());
    // Nothing was tokenized, so nothing landed in the typo history either.
    assert!(router.typo_history().is_empty());
}

#[tokio::test]
async fn prefixed_command_round_trips() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router.run(">ping", &caller(OWNER, 1), &sink).await;
    assert_eq!(reply.as_deref(), Some("Pong!"));
}

#[tokio::test]
async fn echo_applies_typed_flags() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router
        .route("echo -l hello there", &caller(OWNER, 1), &sink)
        .await;
    assert_eq!(reply, "HELLO THERE");

    let reply = router
        .route("echo --times=2 hi", &caller(OWNER, 2), &sink)
        .await;
    assert_eq!(reply, "hi\nhi");
}

#[tokio::test]
async fn coercion_failure_aborts_before_the_handler_runs() {
    let (router, typed_calls) = probe_router();
    let (sink, _) = ReplySink::capturing();

    let reply = router
        .route("typed --n=abc", &caller(OWNER, 1), &sink)
        .await;
    assert_eq!(reply, "Option `--n` must be an integer.");
    assert_eq!(typed_calls.load(Ordering::SeqCst), 0);

    let reply = router
        .route("typed --dry=1", &caller(OWNER, 2), &sink)
        .await;
    assert_eq!(reply, "Flag `--dry` does not take a value.");
    assert_eq!(typed_calls.load(Ordering::SeqCst), 0);

    let reply = router
        .route("typed --rate", &caller(OWNER, 3), &sink)
        .await;
    assert_eq!(reply, "Option `--rate` requires a value of type float.");

    // And a well-typed invocation goes through.
    let reply = router
        .route("typed --n=3 --rate=0.5 --dry", &caller(OWNER, 4), &sink)
        .await;
    assert_eq!(reply, "typed ran");
    assert_eq!(typed_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn legacy_pipe_separator_gets_one_aside() {
    let (router, _) = probe_router();
    let (sink, notes) = ReplySink::capturing();
    let reply = router
        .route("echo a | b", &caller(OWNER, 1), &sink)
        .await;
    // The command still runs.
    assert_eq!(reply, "a | b");
    let notes = notes.lock().await;
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("pipe"));
}

#[tokio::test]
async fn unknown_keyword_stays_silent_and_is_remembered() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();

    let reply = router.route("frobnicate", &caller(OWNER, 77), &sink).await;
    assert_eq!(reply, "");
    assert!(router.typo_history().contains(77));

    // The same message id resolving for real is scrubbed from the history.
    let reply = router.route("ping", &caller(OWNER, 77), &sink).await;
    assert_eq!(reply, "Pong!");
    assert!(!router.typo_history().contains(77));
}

#[tokio::test]
async fn denied_command_reports_authentication_failure() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router
        .route("alias list", &caller(RANDO, 1), &sink)
        .await;
    assert!(
        reply.starts_with("Authentication failure: "),
        "got: {reply}"
    );
}

#[tokio::test]
async fn handler_error_becomes_a_single_line_reply() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router.route("flaky", &caller(OWNER, 1), &sink).await;
    assert_eq!(
        reply,
        "Sorry, an exception was raised: `Internal` (`internal error: the backend fell over`)"
    );
}

#[tokio::test]
async fn handler_panic_is_contained() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router.route("boom", &caller(OWNER, 1), &sink).await;
    assert_eq!(
        reply,
        "Sorry, an exception was raised: `Panic` (`probe exploded`)"
    );

    // The dispatcher survives and keeps routing.
    let reply = router.route("ping", &caller(OWNER, 2), &sink).await;
    assert_eq!(reply, "Pong!");
}

#[tokio::test]
async fn comment_hides_the_rest_of_the_line() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    let reply = router
        .route("echo visible ; echo hidden", &caller(OWNER, 1), &sink)
        .await;
    assert_eq!(reply, "visible");
}

#[tokio::test]
async fn sub_engine_commands_use_the_sub_engine_policy() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();

    // `announce` lives in the owner sub-engine of `admin`; an admin-level
    // caller passes the outer gate but not the inner one.
    let reply = router
        .route("announce big news", &caller(common::ADMIN, 1), &sink)
        .await;
    assert_eq!(
        reply,
        "Authentication failure: Only the owner can do that, admin."
    );

    let reply = router
        .route("announce big news", &caller(OWNER, 2), &sink)
        .await;
    assert_eq!(reply, "**Announcement:** big news");
}

#[tokio::test]
async fn blank_line_after_prefix_is_silent() {
    let (router, _) = probe_router();
    let (sink, _) = ReplySink::capturing();
    assert_eq!(router.route("   ", &caller(OWNER, 1), &sink).await, "");
}
