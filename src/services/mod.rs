//! Services layer - Business logic
//!
//! This module contains all business logic services for the SkillSync
//! backend. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories
//! - Handling validation, authorization and error cases

pub mod mentor;
pub mod message;
pub mod password;
pub mod rating;
pub mod session;
pub mod skill;
pub mod user;

pub use mentor::{MentorService, MentorServiceError};
pub use message::{MessageService, MessageServiceError};
pub use password::{hash_password, verify_password};
pub use rating::{RatingService, RatingServiceError};
pub use session::{parse_scheduled_time, SessionService, SessionServiceError};
pub use skill::{generate_skill_slug, SkillService, SkillServiceError};
pub use user::{LoginInput, UserService, UserServiceError};
