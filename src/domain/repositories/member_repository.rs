use async_trait::async_trait;
use sqlx::PgConnection;

use crate::domain::member::{Member, MemberDto};
use crate::domain::paging::{Page, PageRequest, Slice};
use crate::errors::RepositoryResult;

/// Repository trait for the Member entity
///
/// Besides basic CRUD it exposes the member queries the application needs.
/// Finders that only read the `members` table leave the team association
/// as `TeamLink::Unloaded`; the join finders return it as `TeamLink::Loaded`.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    // ===== CRUD =====

    /// Insert a new member or update an existing one, returning the stored state
    async fn save(&self, member: Member) -> RepositoryResult<Member>;

    /// Find a member by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Member>>;

    /// All members ordered by ID, each with its team loaded
    async fn find_all(&self) -> RepositoryResult<Vec<Member>>;

    async fn count(&self) -> RepositoryResult<i64>;

    /// Delete a saved member
    async fn delete(&self, member: &Member) -> RepositoryResult<()>;

    /// Delete a member by ID, failing with `NotFound` when nothing was removed
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()>;

    // ===== Queries =====

    /// Members with the given username and an age strictly greater than `age`
    async fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepositoryResult<Vec<Member>>;

    /// Members matching both username and age exactly
    async fn find_user(&self, username: &str, age: i32) -> RepositoryResult<Vec<Member>>;

    /// Every username, in member ID order
    async fn find_username_list(&self) -> RepositoryResult<Vec<String>>;

    /// Members whose username is one of `names`
    async fn find_by_names(&self, names: &[String]) -> RepositoryResult<Vec<Member>>;

    /// Member/team-name projection; members without a team are left out
    async fn find_member_dto(&self) -> RepositoryResult<Vec<MemberDto>>;

    /// One page over all members, team loaded, with the total member count.
    ///
    /// `age` is only recorded in the logs; neither the content nor the count
    /// query filters by it.
    async fn find_by_age(&self, age: i32, page: PageRequest) -> RepositoryResult<Page<Member>>;

    /// One slice of members of the given age, without a count query
    async fn find_slice_by_age(
        &self,
        age: i32,
        page: PageRequest,
    ) -> RepositoryResult<Slice<Member>>;

    /// Add one year to every member at least `age` years old.
    ///
    /// Returns the number of updated rows. `Member` values loaded before the
    /// call keep their old age and must be reloaded.
    async fn bulk_age_plus(&self, age: i32) -> RepositoryResult<u64>;

    /// Members that have a team, fetched together with it
    async fn find_member_fetch_join(&self) -> RepositoryResult<Vec<Member>>;

    /// All members with their team loaded when they have one
    async fn find_member_entity_graph(&self) -> RepositoryResult<Vec<Member>>;

    /// Members with the given username, team loaded when present
    async fn find_entity_graph_by_username(&self, username: &str)
        -> RepositoryResult<Vec<Member>>;

    /// Single member by username, read inside a read-only transaction.
    ///
    /// More than one match is a `NonUniqueResult` error.
    async fn find_read_only_by_username(&self, username: &str)
        -> RepositoryResult<Option<Member>>;

    /// Members with the given username, row-locked with `FOR UPDATE`.
    ///
    /// `conn` must belong to an open transaction; the locks are held until
    /// that transaction commits or rolls back. A wait cut short by the
    /// session's `lock_timeout` surfaces as `RepositoryError::LockTimeout`.
    async fn find_lock_by_username(
        &self,
        conn: &mut PgConnection,
        username: &str,
    ) -> RepositoryResult<Vec<Member>>;

    /// Resolve an unloaded team association in place
    async fn load_team(&self, member: &mut Member) -> RepositoryResult<()>;
}
