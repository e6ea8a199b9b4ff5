use chrono::{DateTime, Utc};

use crate::domain::member::{Member, TeamLink};
use crate::domain::team::Team;

pub(super) const TEAM_COLUMNS: &str = "t.id, t.name, t.created_at, t.updated_at";

pub(super) const MEMBER_COLUMNS: &str =
    "m.id, m.username, m.age, m.team_id, m.created_at, m.updated_at";

// Team columns are aliased so they can share a row with the member columns.
pub(super) const MEMBER_WITH_TEAM_COLUMNS: &str = "m.id, m.username, m.age, m.team_id, \
     m.created_at, m.updated_at, \
     t.id AS t_id, t.name AS t_name, \
     t.created_at AS t_created_at, t.updated_at AS t_updated_at";

/// Properties a member query may be sorted by
pub(super) const MEMBER_SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "m.id"),
    ("username", "m.username"),
    ("age", "m.age"),
    ("createdAt", "m.created_at"),
];

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TeamRow {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamRow> for Team {
    fn from(r: TeamRow) -> Self {
        Team::from_persistence(r.id, r.name, r.created_at, r.updated_at)
    }
}

/// A `members` row on its own; the team stays unloaded
#[derive(Debug, sqlx::FromRow)]
pub(super) struct MemberRow {
    pub id: i64,
    pub username: String,
    pub age: i32,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberRow {
    /// Rebuilds the member, keeping `link` when it still matches the stored team id
    pub fn into_member_with(self, link: TeamLink) -> Member {
        let team = if link.team_id() == self.team_id {
            link
        } else {
            unloaded(self.team_id)
        };
        Member::from_persistence(
            self.id,
            self.username,
            self.age,
            team,
            self.created_at,
            self.updated_at,
        )
    }
}

impl From<MemberRow> for Member {
    fn from(r: MemberRow) -> Self {
        Member::from_persistence(
            r.id,
            r.username,
            r.age,
            unloaded(r.team_id),
            r.created_at,
            r.updated_at,
        )
    }
}

/// A `members` row joined with its team
#[derive(Debug, sqlx::FromRow)]
pub(super) struct MemberWithTeamRow {
    pub id: i64,
    pub username: String,
    pub age: i32,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub t_id: Option<i64>,
    pub t_name: Option<String>,
    pub t_created_at: Option<DateTime<Utc>>,
    pub t_updated_at: Option<DateTime<Utc>>,
}

impl From<MemberWithTeamRow> for Member {
    fn from(r: MemberWithTeamRow) -> Self {
        let team = match (r.t_id, r.t_name, r.t_created_at, r.t_updated_at) {
            (Some(id), Some(name), Some(created_at), Some(updated_at)) => {
                TeamLink::Loaded(Team::from_persistence(id, name, created_at, updated_at))
            }
            _ => unloaded(r.team_id),
        };

        Member::from_persistence(
            r.id,
            r.username,
            r.age,
            team,
            r.created_at,
            r.updated_at,
        )
    }
}

fn unloaded(team_id: Option<i64>) -> TeamLink {
    match team_id {
        Some(id) => TeamLink::Unloaded(id),
        None => TeamLink::None,
    }
}
