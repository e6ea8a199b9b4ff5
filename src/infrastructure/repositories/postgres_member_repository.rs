use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::rows::{
    MemberRow, MemberWithTeamRow, TeamRow, MEMBER_COLUMNS, MEMBER_SORT_COLUMNS,
    MEMBER_WITH_TEAM_COLUMNS, TEAM_COLUMNS,
};
use crate::domain::member::{Member, MemberDto, TeamLink};
use crate::domain::paging::{Page, PageRequest, Slice};
use crate::domain::repositories::MemberRepository;
use crate::errors::{RepositoryError, RepositoryResult};
use crate::infrastructure::db::begin_read_only;

/// PostgreSQL implementation of MemberRepository
///
/// All statements are plain SQL run through SQLx. Queries that load the
/// team use a LEFT JOIN (every member, team when present) or an INNER JOIN
/// (only members that have a team).
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a new PostgresMemberRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn select_members(filter: &str) -> String {
        format!("SELECT {} FROM members m {}", MEMBER_COLUMNS, filter)
    }

    fn select_members_left_join(filter: &str) -> String {
        format!(
            "SELECT {} FROM members m LEFT JOIN teams t ON t.id = m.team_id {}",
            MEMBER_WITH_TEAM_COLUMNS, filter
        )
    }

    fn select_members_inner_join(filter: &str) -> String {
        format!(
            "SELECT {} FROM members m JOIN teams t ON t.id = m.team_id {}",
            MEMBER_WITH_TEAM_COLUMNS, filter
        )
    }

    async fn fetch_joined(&self, sql: &str) -> RepositoryResult<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberWithTeamRow>(sql)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(found = rows.len(), "Fetched members with teams");
        Ok(rows.into_iter().map(Member::from).collect())
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn save(&self, member: Member) -> RepositoryResult<Member> {
        let row = match member.id() {
            None => {
                sqlx::query_as::<_, MemberRow>(
                    r#"
                    INSERT INTO members (username, age, team_id, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, username, age, team_id, created_at, updated_at
                    "#,
                )
                .bind(member.username())
                .bind(member.age())
                .bind(member.team_id())
                .bind(member.created_at())
                .bind(member.updated_at())
                .fetch_one(&self.pool)
                .await?
            }
            Some(id) => sqlx::query_as::<_, MemberRow>(
                r#"
                UPDATE members
                SET username = $2, age = $3, team_id = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING id, username, age, team_id, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(member.username())
            .bind(member.age())
            .bind(member.team_id())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound {
                entity: "Member",
                id,
            })?,
        };

        tracing::debug!(member_id = row.id, team_id = ?row.team_id, "Saved member");
        Ok(row.into_member_with(member.team_link().clone()))
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Member>> {
        let sql = Self::select_members("WHERE m.id = $1");
        let row = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        tracing::debug!(member_id = id, found = row.is_some(), "Fetched member by id");
        Ok(row.map(Member::from))
    }

    async fn find_all(&self) -> RepositoryResult<Vec<Member>> {
        self.find_member_entity_graph().await
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(count, "Counted members");
        Ok(count)
    }

    async fn delete(&self, member: &Member) -> RepositoryResult<()> {
        // Deleting a member that was never saved is a no-op
        let Some(id) = member.id() else {
            return Ok(());
        };

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(member_id = id, "Deleted member");
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Member",
                id,
            });
        }

        tracing::debug!(member_id = id, "Deleted member");
        Ok(())
    }

    async fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members("WHERE m.username = $1 AND m.age > $2 ORDER BY m.id");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(username)
            .bind(age)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(username, age, found = rows.len(), "Fetched members older than age");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_user(&self, username: &str, age: i32) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members("WHERE m.username = $1 AND m.age = $2 ORDER BY m.id");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(username)
            .bind(age)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(username, age, found = rows.len(), "Fetched members by username and age");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_username_list(&self) -> RepositoryResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT username FROM members ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(found = names.len(), "Fetched usernames");
        Ok(names)
    }

    async fn find_by_names(&self, names: &[String]) -> RepositoryResult<Vec<Member>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let sql = Self::select_members("WHERE m.username = ANY($1) ORDER BY m.id");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(names)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(?names, found = rows.len(), "Fetched members by usernames");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_member_dto(&self) -> RepositoryResult<Vec<MemberDto>> {
        let dtos = sqlx::query_as::<_, MemberDto>(
            r#"
            SELECT m.id, m.username, t.name AS team_name
            FROM members m
            JOIN teams t ON t.id = m.team_id
            ORDER BY m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(found = dtos.len(), "Fetched member projections");
        Ok(dtos)
    }

    async fn find_by_age(&self, age: i32, page: PageRequest) -> RepositoryResult<Page<Member>> {
        let order_by = page.sort().to_order_by(MEMBER_SORT_COLUMNS, "m.id")?;
        let sql = Self::select_members_left_join(&format!("{} LIMIT $1 OFFSET $2", order_by));

        let rows = sqlx::query_as::<_, MemberWithTeamRow>(&sql)
            .bind(i64::from(page.size()))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        // The count query needs no join
        let total = page
            .total_or_count(rows.len(), || {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members").fetch_one(&self.pool)
            })
            .await?;

        tracing::debug!(
            age,
            page = page.page(),
            size = page.size(),
            total,
            "Fetched member page"
        );

        let content = rows.into_iter().map(Member::from).collect();
        Ok(Page::new(content, &page, total))
    }

    async fn find_slice_by_age(
        &self,
        age: i32,
        page: PageRequest,
    ) -> RepositoryResult<Slice<Member>> {
        let order_by = page.sort().to_order_by(MEMBER_SORT_COLUMNS, "m.id")?;
        let sql = Self::select_members_left_join(&format!(
            "WHERE m.age = $1 {} LIMIT $2 OFFSET $3",
            order_by
        ));

        let rows = sqlx::query_as::<_, MemberWithTeamRow>(&sql)
            .bind(age)
            .bind(i64::from(page.size()) + 1)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            age,
            page = page.page(),
            size = page.size(),
            fetched = rows.len(),
            "Fetched member slice"
        );

        let content = rows.into_iter().map(Member::from).collect();
        Ok(Slice::from_overfetched(content, &page))
    }

    async fn bulk_age_plus(&self, age: i32) -> RepositoryResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE members
            SET age = age + 1, updated_at = NOW()
            WHERE age >= $1
            "#,
        )
        .bind(age)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected();
        tracing::info!(age, updated, "Bulk age update applied");
        Ok(updated)
    }

    async fn find_member_fetch_join(&self) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members_inner_join("ORDER BY m.id");
        self.fetch_joined(&sql).await
    }

    async fn find_member_entity_graph(&self) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members_left_join("ORDER BY m.id");
        self.fetch_joined(&sql).await
    }

    async fn find_entity_graph_by_username(
        &self,
        username: &str,
    ) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members_left_join("WHERE m.username = $1 ORDER BY m.id");
        let rows = sqlx::query_as::<_, MemberWithTeamRow>(&sql)
            .bind(username)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(username, found = rows.len(), "Fetched members with teams by username");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn find_read_only_by_username(
        &self,
        username: &str,
    ) -> RepositoryResult<Option<Member>> {
        let mut tx = begin_read_only(&self.pool).await?;

        // Two rows are enough to detect an ambiguous match
        let sql = Self::select_members("WHERE m.username = $1 ORDER BY m.id LIMIT 2");
        let mut rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(username)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(username, found = rows.len(), "Read member in read-only transaction");

        if rows.len() > 1 {
            let actual = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM members WHERE username = $1",
            )
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

            return Err(RepositoryError::NonUniqueResult {
                expected: 1,
                actual: usize::try_from(actual).unwrap_or(usize::MAX),
            });
        }

        Ok(rows.pop().map(Member::from))
    }

    async fn find_lock_by_username(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> RepositoryResult<Vec<Member>> {
        let sql = Self::select_members("WHERE m.username = $1 ORDER BY m.id FOR UPDATE");
        let rows = sqlx::query_as::<_, MemberRow>(&sql)
            .bind(username)
            .fetch_all(&mut *conn)
            .await?;

        tracing::debug!(username, locked = rows.len(), "Acquired member row locks");
        Ok(rows.into_iter().map(Member::from).collect())
    }

    async fn load_team(&self, member: &mut Member) -> RepositoryResult<()> {
        let TeamLink::Unloaded(team_id) = *member.team_link() else {
            return Ok(());
        };

        let sql = format!("SELECT {} FROM teams t WHERE t.id = $1", TEAM_COLUMNS);
        let team = sqlx::query_as::<_, TeamRow>(&sql)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound {
                entity: "Team",
                id: team_id,
            })?;

        tracing::debug!(member_id = ?member.id(), team_id, "Loaded member team");
        member.attach_team(team.into());
        Ok(())
    }
}
