// Member domain module
// Contains the member entity, its team association and the DTO projection

#![allow(clippy::module_inception)]

pub mod dto;
pub mod member;

pub use dto::MemberDto;
pub use member::{Member, TeamLink};
