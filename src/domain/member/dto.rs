use serde::{Deserialize, Serialize};

use super::member::Member;

/// Read-model joining a member with its team name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberDto {
    pub id: i64,
    pub username: String,
    pub team_name: Option<String>,
}

impl MemberDto {
    pub fn new(id: i64, username: impl Into<String>, team_name: Option<String>) -> Self {
        Self {
            id,
            username: username.into(),
            team_name,
        }
    }

    /// Projects a member; the team name is only known when the team was loaded.
    ///
    /// Returns `None` for a member that has not been saved.
    pub fn from_member(member: &Member) -> Option<Self> {
        member.id().map(|id| Self {
            id,
            username: member.username().to_string(),
            team_name: member.team().map(|team| team.name().to_string()),
        })
    }
}

impl std::fmt::Display for MemberDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemberDto(id={}, username={}, team_name={})",
            self.id,
            self.username,
            self.team_name.as_deref().unwrap_or("-")
        )
    }
}
