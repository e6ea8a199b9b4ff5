// Repository interfaces (ports)
// Implemented by the adapters in crate::infrastructure::repositories

pub mod member_repository;
pub mod team_repository;

pub use member_repository::MemberRepository;
pub use team_repository::TeamRepository;
