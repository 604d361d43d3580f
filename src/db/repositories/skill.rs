//! Skill repository
//!
//! Database operations for the skill catalog.
//!
//! This module provides:
//! - `SkillRepository` trait defining the interface for skill data access
//! - `SqlxSkillRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Skill;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Skill repository trait
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Create a new skill
    async fn create(&self, skill: &Skill) -> Result<Skill>;

    /// Get skill by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>>;

    /// Get skill by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>>;

    /// Get skill by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Skill>>;

    /// List skills ordered by name, optionally filtered by a name substring
    async fn list(&self, search: Option<&str>) -> Result<Vec<Skill>>;
}

/// SQLx-based skill repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSkillRepository {
    pool: DynDatabasePool,
}

impl SqlxSkillRepository {
    /// Create a new SQLx skill repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SkillRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SkillRepository for SqlxSkillRepository {
    async fn create(&self, skill: &Skill) -> Result<Skill> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_skill_sqlite(self.pool.as_sqlite().unwrap(), skill).await,
            DatabaseDriver::Mysql => create_skill_mysql(self.pool.as_mysql().unwrap(), skill).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Skill>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_skill_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_skill_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Skill>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_skill_by_name_sqlite(self.pool.as_sqlite().unwrap(), name).await
            }
            DatabaseDriver::Mysql => {
                get_skill_by_name_mysql(self.pool.as_mysql().unwrap(), name).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Skill>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_skill_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_skill_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Skill>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_skills_sqlite(self.pool.as_sqlite().unwrap(), search).await,
            DatabaseDriver::Mysql => list_skills_mysql(self.pool.as_mysql().unwrap(), search).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_skill_sqlite(pool: &SqlitePool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO skills (name, slug, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&skill.name)
    .bind(&skill.slug)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create skill")?;

    let id = result.last_insert_rowid();

    Ok(Skill {
        id,
        name: skill.name.clone(),
        slug: skill.slug.clone(),
        created_at: now,
    })
}

async fn get_skill_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_skill_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by name")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_skill_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_sqlite(&row))),
        None => Ok(None),
    }
}

async fn list_skills_sqlite(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<Skill>> {
    let rows = match search {
        Some(search) => {
            let pattern = format!("%{}%", search);
            sqlx::query(
                r#"
                SELECT id, name, slug, created_at
                FROM skills
                WHERE name LIKE ?
                ORDER BY name
                "#,
            )
            .bind(pattern)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, name, slug, created_at
                FROM skills
                ORDER BY name
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list skills")?;

    let mut skills = Vec::new();
    for row in rows {
        skills.push(row_to_skill_sqlite(&row));
    }

    Ok(skills)
}

fn row_to_skill_sqlite(row: &sqlx::sqlite::SqliteRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_skill_mysql(pool: &MySqlPool, skill: &Skill) -> Result<Skill> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO skills (name, slug, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&skill.name)
    .bind(&skill.slug)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create skill")?;

    let id = result.last_insert_id() as i64;

    Ok(Skill {
        id,
        name: skill.name.clone(),
        slug: skill.slug.clone(),
        created_at: now,
    })
}

async fn get_skill_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_skill_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by name")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_skill_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Skill>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, created_at
        FROM skills
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get skill by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_skill_mysql(&row))),
        None => Ok(None),
    }
}

async fn list_skills_mysql(pool: &MySqlPool, search: Option<&str>) -> Result<Vec<Skill>> {
    let rows = match search {
        Some(search) => {
            let pattern = format!("%{}%", search);
            sqlx::query(
                r#"
                SELECT id, name, slug, created_at
                FROM skills
                WHERE name LIKE ?
                ORDER BY name
                "#,
            )
            .bind(pattern)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, name, slug, created_at
                FROM skills
                ORDER BY name
                "#,
            )
            .fetch_all(pool)
            .await
        }
    }
    .context("Failed to list skills")?;

    let mut skills = Vec::new();
    for row in rows {
        skills.push(row_to_skill_mysql(&row));
    }

    Ok(skills)
}

fn row_to_skill_mysql(row: &sqlx::mysql::MySqlRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    }
}
