//! Data models
//!
//! This module contains all data structures used throughout the SkillSync
//! service. Models represent:
//! - Database entities (User, Profile, Skill, Session, Rating, Message, AuthToken)
//! - Input types consumed by the services
//! - Internal data transfer objects

mod auth_token;
mod message;
mod profile;
mod rating;
mod session;
mod skill;
mod user;

pub use auth_token::AuthToken;
pub use message::Message;
pub use profile::{
    parse_availability, AvailabilitySlot, MentorFilter, Profile, UpdateProfileInput,
};
pub use rating::{score_in_range, CreateRatingInput, Rating, MAX_SCORE, MIN_SCORE};
pub use session::{
    CreateSessionInput, Session, SessionDuration, SessionStatus, SessionWindow,
    UpdateSessionInput,
};
pub use skill::Skill;
pub use user::{CreateUserInput, UpdateUserInput, User, UserWithProfile};
