use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{TeamRow, TEAM_COLUMNS};
use crate::domain::repositories::TeamRepository;
use crate::domain::team::Team;
use crate::errors::{RepositoryError, RepositoryResult};

/// PostgreSQL implementation of TeamRepository
#[derive(Clone)]
pub struct PostgresTeamRepository {
    pool: PgPool,
}

impl PostgresTeamRepository {
    /// Creates a new PostgresTeamRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PostgresTeamRepository {
    async fn save(&self, team: Team) -> RepositoryResult<Team> {
        let row = match team.id() {
            None => {
                sqlx::query_as::<_, TeamRow>(
                    r#"
                    INSERT INTO teams (name, created_at, updated_at)
                    VALUES ($1, $2, $3)
                    RETURNING id, name, created_at, updated_at
                    "#,
                )
                .bind(team.name())
                .bind(team.created_at())
                .bind(team.updated_at())
                .fetch_one(&self.pool)
                .await?
            }
            Some(id) => sqlx::query_as::<_, TeamRow>(
                r#"
                UPDATE teams
                SET name = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, name, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(team.name())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "Team", id })?,
        };

        tracing::debug!(team_id = row.id, "Saved team");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Team>> {
        let sql = format!("SELECT {} FROM teams t WHERE t.id = $1", TEAM_COLUMNS);
        let row = sqlx::query_as::<_, TeamRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(team_id = id, found = row.is_some(), "Fetched team by id");
        Ok(row.map(Team::from))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Team>> {
        let sql = format!("SELECT {} FROM teams t ORDER BY t.id", TEAM_COLUMNS);
        let rows = sqlx::query_as::<_, TeamRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(found = rows.len(), "Fetched all teams");
        Ok(rows.into_iter().map(Team::from).collect())
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams")
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(count, "Counted teams");
        Ok(count)
    }

    async fn delete(&self, team: &Team) -> RepositoryResult<()> {
        // Deleting a team that was never saved is a no-op
        let Some(id) = team.id() else {
            return Ok(());
        };

        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(team_id = id, "Deleted team");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "Team", id });
        }

        tracing::debug!(team_id = id, "Deleted team");
        Ok(())
    }
}
