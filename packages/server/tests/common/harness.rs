//! Test harnesses for integration testing.
//!
//! `TreeHarness` runs against the in-memory store and needs nothing external.
//! `PgHarness` starts a shared Postgres container (testcontainers) once and
//! gives each test its own freshly migrated database, since the schema only
//! allows a single root.

use anyhow::{Context, Result};
use axum::Router;
use downline_core::common::MemberCode;
use downline_core::domains::member::actions::{audit_counts, seed_root};
use downline_core::domains::member::store::{InMemoryMemberStore, MemberStore};
use downline_core::domains::member::Member;
use downline_core::kernel::{ServerDeps, TestDependencies};
use downline_core::server::build_app;
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::{root_member, HttpClient};

fn init_tracing() {
    // Run tests with: RUST_LOG=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// In-memory harness
// =============================================================================

/// Tree with a seeded root, backed by the in-memory store.
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TreeHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TreeHarness) {
///     let code = join_ok(&ctx.deps, "a", ctx.root, Side::Left).await;
/// }
/// ```
pub struct TreeHarness {
    pub deps: ServerDeps,
    /// Same store as inside `deps`, for fault injection and row counts
    pub store: InMemoryMemberStore,
    pub root: MemberCode,
}

impl AsyncTestContext for TreeHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create tree harness")
    }
}

impl TreeHarness {
    pub async fn new() -> Result<Self> {
        Self::with_store(InMemoryMemberStore::new()).await
    }

    pub async fn with_store(store: InMemoryMemberStore) -> Result<Self> {
        init_tracing();

        let test_deps = TestDependencies::new().with_store(store);
        let store = test_deps.store.clone();
        let deps = test_deps.into_server_deps();
        let root = seed_root(root_member(), &deps)
            .await
            .context("Failed to seed root")?;

        Ok(Self { deps, store, root })
    }

    /// Committed member by code (panics if absent)
    pub async fn member(&self, code: MemberCode) -> Member {
        self.deps
            .store
            .find_by_code(code)
            .await
            .expect("store read failed")
            .unwrap_or_else(|| panic!("member {} not found", code))
    }

    /// Every stored side-count matches the tree shape
    pub async fn assert_counts_consistent(&self) {
        let drift = audit_counts(&self.deps).await.expect("audit failed");
        assert!(drift.is_empty(), "side counts drifted: {:?}", drift);
    }

    pub fn http(&self) -> HttpClient {
        HttpClient::new(self.app())
    }

    pub fn app(&self) -> Router {
        build_app(self.deps.clone())
    }
}

// =============================================================================
// Postgres harness
// =============================================================================

/// Shared container; started once and reused by all Postgres tests.
struct SharedTestInfra {
    admin_url: String,
    base_url: String,
    // Keep container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .with_cmd(["-c", "max_connections=200"])
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let base_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);

        Ok(Self {
            admin_url: format!("{}/postgres", base_url),
            base_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh migrated database with a seeded root.
pub struct PgHarness {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
    pub root: MemberCode,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create Postgres harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl PgHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let db_name = format!("tree_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPool::connect(&infra.admin_url)
            .await
            .context("Failed to connect to admin database")?;
        sqlx::query(&format!("CREATE DATABASE {}", db_name))
            .execute(&admin)
            .await
            .context("Failed to create test database")?;
        admin.close().await;

        let db_pool = PgPool::connect(&format!("{}/{}", infra.base_url, db_name))
            .await
            .context("Failed to connect to test database")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run migrations")?;

        let deps = ServerDeps::postgres(db_pool.clone(), 2);
        let root = seed_root(root_member(), &deps)
            .await
            .context("Failed to seed root")?;

        Ok(Self {
            db_pool,
            deps,
            root,
        })
    }

    pub async fn member(&self, code: MemberCode) -> Member {
        self.deps
            .store
            .find_by_code(code)
            .await
            .expect("store read failed")
            .unwrap_or_else(|| panic!("member {} not found", code))
    }

    pub async fn member_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
            .fetch_one(&self.db_pool)
            .await
            .expect("count query failed")
    }
}
