//! Demo seed data
//!
//! Compiled only with the `demo` feature. Ensures a small skill catalog
//! and two demo accounts exist so a fresh instance can be explored
//! without any manual setup. Seeding is idempotent: rows that already
//! exist are left alone.

use anyhow::Result;

use crate::models::{AvailabilitySlot, CreateUserInput, UpdateProfileInput, UpdateUserInput};
use crate::services::{SkillService, SkillServiceError, UserService, UserServiceError};

/// Skills every demo instance starts with
const DEMO_SKILLS: [&str; 8] = [
    "Rust",
    "Python",
    "JavaScript",
    "SQL",
    "Machine Learning",
    "System Design",
    "Data Structures",
    "Public Speaking",
];

/// Seed the skill catalog and the demo mentor/learner accounts
pub async fn seed(user_service: &UserService, skill_service: &SkillService) -> Result<()> {
    let mut skill_ids = Vec::with_capacity(DEMO_SKILLS.len());
    for name in DEMO_SKILLS {
        match skill_service.create(name).await {
            Ok(skill) => skill_ids.push(skill.id),
            Err(SkillServiceError::ValidationError(_)) => {
                // Already present, look up its ID for the mentor profile
                if let Some(skill) = skill_service.get_by_name(name).await? {
                    skill_ids.push(skill.id);
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    seed_mentor(user_service, &skill_ids).await?;
    seed_learner(user_service).await?;

    Ok(())
}

async fn seed_mentor(user_service: &UserService, skill_ids: &[i64]) -> Result<()> {
    let input = CreateUserInput {
        username: "demo_mentor".to_string(),
        email: "mentor@skillsync.local".to_string(),
        password: "demo123".to_string(),
        first_name: "Dana".to_string(),
        last_name: "Mentor".to_string(),
    };

    match user_service.register(input).await {
        Ok(created) => {
            let profile_input = UpdateProfileInput {
                bio: Some("Demo mentor account. Happy to chat about anything in the catalog.".to_string()),
                is_mentor: Some(true),
                availability: Some(vec![
                    AvailabilitySlot {
                        day: 1,
                        start: "18:00".to_string(),
                        end: "20:00".to_string(),
                    },
                    AvailabilitySlot {
                        day: 4,
                        start: "10:00".to_string(),
                        end: "12:00".to_string(),
                    },
                ]),
                skill_ids: Some(skill_ids.to_vec()),
            };
            user_service
                .update_current(created.user.id, UpdateUserInput::default(), profile_input)
                .await?;
            tracing::info!("Demo mode: created mentor account (demo_mentor/demo123)");
        }
        Err(UserServiceError::ValidationError(_)) => {
            tracing::debug!("Demo mode: mentor account already exists");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

async fn seed_learner(user_service: &UserService) -> Result<()> {
    let input = CreateUserInput {
        username: "demo_learner".to_string(),
        email: "learner@skillsync.local".to_string(),
        password: "demo123".to_string(),
        first_name: "Lee".to_string(),
        last_name: "Learner".to_string(),
    };

    match user_service.register(input).await {
        Ok(_) => {
            tracing::info!("Demo mode: created learner account (demo_learner/demo123)");
        }
        Err(UserServiceError::ValidationError(_)) => {
            tracing::debug!("Demo mode: learner account already exists");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
