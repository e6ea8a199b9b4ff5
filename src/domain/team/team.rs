use chrono::{DateTime, Utc};

use crate::errors::DomainError;

/// Team entity
///
/// A named group members can belong to. The identifier is assigned by the
/// database, so a freshly constructed team has no id until it is saved.
///
/// # Example
/// ```
/// use member_store::domain::team::Team;
///
/// let team = Team::new("teamA").expect("valid team");
/// assert_eq!(team.name(), "teamA");
/// assert!(team.id().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Team {
    id: Option<i64>,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Team {
    /// Creates a new, unsaved team
    ///
    /// # Errors
    /// Returns `DomainError::EmptyTeamName` when `name` is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = Self::validate_name(name.into())?;
        let now = Utc::now();

        Ok(Self {
            id: None,
            name,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a team from a stored row
    pub fn from_persistence(
        id: i64,
        name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            name,
            created_at,
            updated_at,
        }
    }

    /// Changes the team name
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.name = Self::validate_name(name.into())?;
        Ok(())
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::EmptyTeamName);
        }
        Ok(name)
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
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

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.name == other.name && self.created_at == other.created_at,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "Team(id={}, name={})", id, self.name),
            None => write!(f, "Team(id=unsaved, name={})", self.name),
        }
    }
}
