//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod auth_token;
pub mod message;
pub mod rating;
pub mod session;
pub mod skill;
pub mod user;

pub use auth_token::{AuthTokenRepository, SqlxAuthTokenRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use rating::{RatingRepository, SqlxRatingRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use skill::{SkillRepository, SqlxSkillRepository};
pub use user::{SqlxUserRepository, UserRepository};
