//! Schema conventions the repositories and the HTTP error mapping rely on.
//!
//! Each test asks the catalog for offenders and expects none.

use sqlx::PgPool;

async fn offenders(pool: &PgPool, sql: &str) -> Vec<(String, String)> {
    sqlx::query_as(sql).fetch_all(pool).await.unwrap()
}

/// Entity ids are bigint, lookup ids smallint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn ids_are_bigint_or_smallint(pool: PgPool) {
    let bad = offenders(
        &pool,
        "SELECT table_name::text, data_type::text
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND column_name = 'id'
           AND table_name <> '_sqlx_migrations'
           AND data_type NOT IN ('bigint', 'smallint')",
    )
    .await;

    assert!(bad.is_empty(), "unexpected id types: {bad:?}");
}

/// `created_at`/`updated_at` exist everywhere as timestamptz, and no column
/// uses VARCHAR or a zone-less timestamp.
#[sqlx::test(migrations = "../../db/migrations")]
async fn column_types_follow_conventions(pool: PgPool) {
    let missing = offenders(
        &pool,
        "SELECT t.table_name::text, c.column_name::text
         FROM information_schema.tables t
         CROSS JOIN (VALUES ('created_at'), ('updated_at')) AS c(column_name)
         WHERE t.table_schema = 'public'
           AND t.table_type = 'BASE TABLE'
           AND t.table_name <> '_sqlx_migrations'
           AND NOT EXISTS (
               SELECT 1 FROM information_schema.columns col
               WHERE col.table_schema = 'public'
                 AND col.table_name = t.table_name
                 AND col.column_name = c.column_name
                 AND col.data_type = 'timestamp with time zone'
           )",
    )
    .await;
    assert!(missing.is_empty(), "missing timestamptz columns: {missing:?}");

    let wrong = offenders(
        &pool,
        "SELECT table_name::text, column_name::text
         FROM information_schema.columns
         WHERE table_schema = 'public'
           AND table_name <> '_sqlx_migrations'
           AND data_type IN ('character varying', 'timestamp without time zone')",
    )
    .await;
    assert!(wrong.is_empty(), "use TEXT and TIMESTAMPTZ: {wrong:?}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn every_table_touches_updated_at(pool: PgPool) {
    let bad = offenders(
        &pool,
        "SELECT t.table_name::text, 'trg_' || t.table_name || '_updated_at'
         FROM information_schema.tables t
         WHERE t.table_schema = 'public'
           AND t.table_type = 'BASE TABLE'
           AND t.table_name <> '_sqlx_migrations'
           AND NOT EXISTS (
               SELECT 1 FROM information_schema.triggers tr
               WHERE tr.event_object_table = t.table_name
                 AND tr.trigger_name = 'trg_' || t.table_name || '_updated_at'
           )",
    )
    .await;

    assert!(bad.is_empty(), "tables without an updated_at trigger: {bad:?}");
}

/// Single-column foreign keys must lead some index on their table.
#[sqlx::test(migrations = "../../db/migrations")]
async fn foreign_keys_are_indexed(pool: PgPool) {
    let bad = offenders(
        &pool,
        "SELECT con.conrelid::regclass::text, att.attname::text
         FROM pg_constraint con
         JOIN pg_attribute att
           ON att.attrelid = con.conrelid AND att.attnum = con.conkey[1]
         WHERE con.contype = 'f'
           AND con.connamespace = 'public'::regnamespace
           AND NOT EXISTS (
               SELECT 1 FROM pg_index idx
               WHERE idx.indrelid = con.conrelid
                 AND idx.indkey[0] = con.conkey[1]
           )",
    )
    .await;

    assert!(bad.is_empty(), "unindexed foreign keys: {bad:?}");
}

/// Unique constraints and unique indexes are named `uq_*`; the API maps
/// violations of those names to 409.
#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_guards_use_the_uq_prefix(pool: PgPool) {
    let bad = offenders(
        &pool,
        "SELECT tablename::text, indexname::text
         FROM pg_indexes
         WHERE schemaname = 'public'
           AND indexdef LIKE 'CREATE UNIQUE INDEX%'
           AND indexname NOT LIKE '%_pkey'
           AND indexname NOT LIKE 'uq\\_%'",
    )
    .await;

    assert!(bad.is_empty(), "unique guards without uq_ prefix: {bad:?}");
}

/// Both ledger counters are bounded in the database, not only in code.
#[sqlx::test(migrations = "../../db/migrations")]
async fn ledger_counters_are_checked(pool: PgPool) {
    let names: Vec<(String,)> = sqlx::query_as(
        "SELECT conname::text FROM pg_constraint
         WHERE contype = 'c' AND connamespace = 'public'::regnamespace
         ORDER BY conname",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let names: Vec<&str> = names.iter().map(|(n,)| n.as_str()).collect();

    for expected in ["ck_package_allocations_consumed", "ck_schedule_slots_capacity"] {
        assert!(names.contains(&expected), "missing CHECK {expected}: {names:?}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn one_confirmed_booking_per_package_slot(pool: PgPool) {
    let (def,): (String,) = sqlx::query_as(
        "SELECT indexdef FROM pg_indexes
         WHERE schemaname = 'public' AND indexname = 'uq_bookings_package_schedule_date'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert!(def.starts_with("CREATE UNIQUE INDEX"));
    assert!(def.contains("WHERE"), "index must be partial: {def}");
}
