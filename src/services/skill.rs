//! Skill service
//!
//! Implements business logic for the skills catalog:
//! - Skill creation with generated slugs (seeding and administrative use)
//! - Listing and substring search
//!
//! Skills have no update path once created; profiles and sessions only
//! reference them.

use crate::db::repositories::SkillRepository;
use crate::models::Skill;
use anyhow::Context;
use std::sync::Arc;

/// Error types for skill service operations
#[derive(Debug, thiserror::Error)]
pub enum SkillServiceError {
    /// Skill not found
    #[error("Skill not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Skill service for the skills catalog
pub struct SkillService {
    repo: Arc<dyn SkillRepository>,
}

impl SkillService {
    /// Create a new skill service
    pub fn new(repo: Arc<dyn SkillRepository>) -> Self {
        Self { repo }
    }

    /// Create a new skill
    ///
    /// The slug is generated from the name. Duplicate names or slugs are
    /// rejected.
    ///
    /// # Errors
    /// - `ValidationError` if the name is empty or already taken
    pub async fn create(&self, name: &str) -> Result<Skill, SkillServiceError> {
        let trimmed_name = name.trim();
        if trimmed_name.is_empty() {
            return Err(SkillServiceError::ValidationError(
                "Skill name cannot be empty".to_string(),
            ));
        }

        if self
            .repo
            .get_by_name(trimmed_name)
            .await
            .context("Failed to check existing skill")?
            .is_some()
        {
            return Err(SkillServiceError::ValidationError(format!(
                "Skill '{}' already exists",
                trimmed_name
            )));
        }

        let slug = generate_skill_slug(trimmed_name);
        if self
            .repo
            .get_by_slug(&slug)
            .await
            .context("Failed to check existing slug")?
            .is_some()
        {
            return Err(SkillServiceError::ValidationError(format!(
                "Skill slug '{}' already exists",
                slug
            )));
        }

        let skill = Skill::new(trimmed_name.to_string(), slug);
        let created = self
            .repo
            .create(&skill)
            .await
            .context("Failed to create skill")?;

        Ok(created)
    }

    /// Get skill by ID
    ///
    /// # Errors
    /// - `NotFound` if no skill has this ID
    pub async fn get(&self, id: i64) -> Result<Skill, SkillServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get skill by ID")?
            .ok_or_else(|| SkillServiceError::NotFound(format!("Skill with ID {} not found", id)))
    }

    /// Get skill by name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Skill>, SkillServiceError> {
        self.repo
            .get_by_name(name)
            .await
            .context("Failed to get skill by name")
            .map_err(Into::into)
    }

    /// List skills ordered by name
    ///
    /// `search` filters by case-insensitive substring on the name.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Skill>, SkillServiceError> {
        self.repo
            .list(search)
            .await
            .context("Failed to list skills")
            .map_err(Into::into)
    }
}

/// Generate a URL-friendly slug from a skill name
///
/// Converts the name to lowercase, replaces runs of spaces and special
/// characters with single hyphens, and trims hyphens from the ends.
pub fn generate_skill_slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();

    // Collapse consecutive hyphens and drop leading/trailing ones
    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}
