//! Postgres-backed tests. These start a container through testcontainers.
//!
//! Run with: cargo test --test postgres_store_tests -- --ignored

mod common;

use crate::common::{join_err, join_ok, join_request, PgHarness};
use downline_core::common::Side;
use downline_core::domains::member::actions::{audit_counts, authenticate, downline, join};
use downline_core::domains::member::TreeError;
use test_context::test_context;

#[test_context(PgHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn join_places_and_counts_end_to_end(ctx: &PgHarness) {
    let a = join_ok(&ctx.deps, "a", ctx.root, Side::Left).await;
    let b = join_ok(&ctx.deps, "b", ctx.root, Side::Right).await;
    let c = join_ok(&ctx.deps, "c", ctx.root, Side::Left).await;

    let root = ctx.member(ctx.root).await;
    assert_eq!(root.left_child, Some(a));
    assert_eq!(root.right_child, Some(b));
    assert_eq!((root.left_count, root.right_count), (2, 1));
    assert_eq!(ctx.member(a).await.left_child, Some(c));

    let left = downline(ctx.root, Side::Left, &ctx.deps).await.unwrap();
    let codes: Vec<_> = left.iter().map(|p| p.member_code).collect();
    assert_eq!(codes, vec![a, c]);

    let profile = authenticate("c@example.com", common::TEST_PASSWORD, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(profile.sponsor_code, Some(a));

    assert!(audit_counts(&ctx.deps).await.unwrap().is_empty());
}

#[test_context(PgHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn rejected_joins_leave_the_database_untouched(ctx: &PgHarness) {
    join_ok(&ctx.deps, "a", ctx.root, Side::Left).await;
    let root_before = ctx.member(ctx.root).await;

    let err = join_err(&ctx.deps, "a", ctx.root, Side::Left).await;
    assert!(matches!(err, TreeError::DuplicateEmail));

    let err = join_err(&ctx.deps, "ghost", downline_core::common::MemberCode(9_999), Side::Left).await;
    assert!(matches!(err, TreeError::InvalidSponsor));

    assert_eq!(ctx.member_count().await, 2);
    assert_eq!(ctx.member(ctx.root).await, root_before);
}

#[test_context(PgHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn generated_codes_are_not_reused_after_rollback(ctx: &PgHarness) {
    let a = join_ok(&ctx.deps, "a", ctx.root, Side::Left).await;
    join_err(&ctx.deps, "a", ctx.root, Side::Left).await;
    let b = join_ok(&ctx.deps, "b", ctx.root, Side::Right).await;

    assert!(b > a);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires Docker"]
async fn concurrent_joins_under_one_sponsor_serialize_on_row_lock() {
    let ctx = PgHarness::new().await.unwrap();
    let root = ctx.root;

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let deps = ctx.deps.clone();
            tokio::spawn(async move {
                join(join_request(&format!("pg-racer{}", i), root, Side::Right), &deps).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().expect("join should succeed");
    }

    assert_eq!(ctx.member(root).await.right_count, 12);
    assert_eq!(ctx.member_count().await, 13);
    assert!(audit_counts(&ctx.deps).await.unwrap().is_empty());

    ctx.db_pool.close().await;
}

#[test_context(PgHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn email_identity_ignores_case(ctx: &PgHarness) {
    let code = join_ok(&ctx.deps, "ada", ctx.root, Side::Left).await;

    let err = join_err(&ctx.deps, "ADA", ctx.root, Side::Right).await;
    assert!(matches!(err, TreeError::DuplicateEmail));
    assert_eq!(ctx.member_count().await, 2);

    let profile = authenticate("Ada@Example.com", common::TEST_PASSWORD, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(profile.member_code, code);
}
