//! Shared fixtures for the PostgreSQL integration tests
//!
//! Every test gets its own schema: it is created, migrated, handed to the
//! test through a pool whose connections default to it, and dropped again
//! by `TestDb::cleanup`.

#![allow(dead_code)]

use member_store::infrastructure::db::run_migrations;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

/// Set up an isolated schema, or `None` when no database is configured
pub async fn setup_test_db() -> Option<TestDb> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database integration test");
        return None;
    };

    let admin = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    let schema = format!("test_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let search_path = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .after_connect(move |conn, _meta| {
            let sql = format!("SET search_path TO {}", search_path);
            Box::pin(async move {
                sqlx::query(&sql).execute(conn).await?;
                Ok(())
            })
        })
        .connect(&database_url)
        .await
        .expect("Failed to connect test pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestDb {
        pool,
        admin,
        schema,
    })
}

impl TestDb {
    /// Close the pool and drop the schema with everything in it
    pub async fn cleanup(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("Failed to drop test schema");
        self.admin.close().await;
    }
}
