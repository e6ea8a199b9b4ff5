use async_trait::async_trait;

use crate::domain::team::Team;
use crate::errors::RepositoryResult;

/// Repository trait for the Team entity
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a new team or update an existing one, returning the stored state
    async fn save(&self, team: Team) -> RepositoryResult<Team>;

    /// Find a team by its ID
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Team>>;

    /// All teams ordered by ID
    async fn find_all(&self) -> RepositoryResult<Vec<Team>>;

    async fn count(&self) -> RepositoryResult<i64>;

    /// Delete a saved team
    async fn delete(&self, team: &Team) -> RepositoryResult<()>;

    /// Delete a team by ID, failing with `NotFound` when nothing was removed
    async fn delete_by_id(&self, id: i64) -> RepositoryResult<()>;
}
