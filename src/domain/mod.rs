// Domain layer module exports
// Entities and value types are independent of the database adapters

pub mod member;
pub mod paging;
pub mod repositories;
pub mod team;
