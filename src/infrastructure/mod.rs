// Infrastructure layer module
// Contains the PostgreSQL pool setup and repository adapters

pub mod db;
pub mod repositories;
