use chrono::{DateTime, Utc};

use crate::domain::team::Team;
use crate::errors::DomainError;

/// State of a member's team association
///
/// Queries decide how much of the association they read: plain finders only
/// carry the foreign key, join queries carry the whole team.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamLink {
    /// Member does not belong to a team
    None,
    /// Only the team id was read; call `MemberRepository::load_team` to resolve it
    Unloaded(i64),
    /// Team was fetched together with the member
    Loaded(Team),
}

impl TeamLink {
    pub fn team_id(&self) -> Option<i64> {
        match self {
            TeamLink::None => None,
            TeamLink::Unloaded(id) => Some(*id),
            TeamLink::Loaded(team) => team.id(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, TeamLink::Loaded(_))
    }
}

/// Member entity
///
/// # Invariants
/// - Username cannot be blank
/// - Age is never negative
/// - A referenced team has already been saved
///
/// # Example
/// ```
/// use member_store::domain::member::Member;
///
/// let member = Member::with_age("member1", 10).expect("valid member");
/// assert_eq!(member.username(), "member1");
/// assert_eq!(member.age(), 10);
/// assert!(member.team_id().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Member {
    id: Option<i64>,
    username: String,
    age: i32,
    team: TeamLink,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Member {
    /// Creates a member with age 0 and no team
    pub fn new(username: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_age(username, 0)
    }

    /// Creates a member with the given age and no team
    pub fn with_age(username: impl Into<String>, age: i32) -> Result<Self, DomainError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::EmptyUsername);
        }
        if age < 0 {
            return Err(DomainError::NegativeAge(age));
        }

        let now = Utc::now();
        Ok(Self {
            id: None,
            username,
            age,
            team: TeamLink::None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a member that belongs to `team`
    ///
    /// # Errors
    /// `DomainError::UnsavedTeam` when the team has no id yet.
    pub fn with_team(
        username: impl Into<String>,
        age: i32,
        team: &Team,
    ) -> Result<Self, DomainError> {
        let mut member = Self::with_age(username, age)?;
        member.change_team(team)?;
        Ok(member)
    }

    /// Rebuilds a member from a stored row
    pub fn from_persistence(
        id: i64,
        username: String,
        age: i32,
        team: TeamLink,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team,
            created_at,
            updated_at,
        }
    }

    /// Moves the member into `team`
    pub fn change_team(&mut self, team: &Team) -> Result<(), DomainError> {
        if !team.is_persisted() {
            return Err(DomainError::UnsavedTeam);
        }
        self.team = TeamLink::Loaded(team.clone());
        Ok(())
    }

    /// Removes the member from its team
    pub fn leave_team(&mut self) {
        self.team = TeamLink::None;
    }

    pub fn change_username(&mut self, username: impl Into<String>) -> Result<(), DomainError> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::EmptyUsername);
        }
        self.username = username;
        Ok(())
    }

    pub fn change_age(&mut self, age: i32) -> Result<(), DomainError> {
        if age < 0 {
            return Err(DomainError::NegativeAge(age));
        }
        self.age = age;
        Ok(())
    }

    /// Replaces the association with a resolved team
    pub(crate) fn attach_team(&mut self, team: Team) {
        self.team = TeamLink::Loaded(team);
    }

    // ===== Getters =====

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn team_link(&self) -> &TeamLink {
        &self.team
    }

    /// Returns the team id whether or not the team itself was loaded
    pub fn team_id(&self) -> Option<i64> {
        self.team.team_id()
    }

    /// Returns the team only when it was loaded with the member
    pub fn team(&self) -> Option<&Team> {
        match &self.team {
            TeamLink::Loaded(team) => Some(team),
            _ => None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.username == other.username
                    && self.age == other.age
                    && self.team_id() == other.team_id()
                    && self.created_at == other.created_at
            }
        }
    }
}

// The team is left out so printing never needs the association.
impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "Member(id={}, username={}, age={})",
                id, self.username, self.age
            ),
            None => write!(
                f,
                "Member(id=unsaved, username={}, age={})",
                self.username, self.age
            ),
        }
    }
}
