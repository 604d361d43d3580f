//! User repository
//!
//! Database operations for users, their profiles, and the profile-skill
//! links behind the mentor directory.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{parse_availability, MentorFilter, Profile, Skill, User, UserWithProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user together with an empty profile in one transaction
    async fn create_with_profile(&self, user: &User) -> Result<(User, Profile)>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user's account fields
    async fn update(&self, user: &User) -> Result<User>;

    /// Get the profile owned by a user
    async fn get_profile_by_user_id(&self, user_id: i64) -> Result<Option<Profile>>;

    /// Update a profile
    async fn update_profile(&self, profile: &Profile) -> Result<Profile>;

    /// Replace the declared skill set of a profile
    async fn set_profile_skills(&self, profile_id: i64, skill_ids: &[i64]) -> Result<()>;

    /// Get the skills declared on a profile, ordered by name
    async fn get_skills_for_profile(&self, profile_id: i64) -> Result<Vec<Skill>>;

    /// Get a user with their profile and declared skills
    async fn get_with_profile(&self, user_id: i64) -> Result<Option<UserWithProfile>>;

    /// List mentors matching the given filters.
    ///
    /// Ordered by rating average (descending), then username.
    async fn list_mentors(&self, filter: &MentorFilter) -> Result<Vec<UserWithProfile>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_with_profile(&self, user: &User) -> Result<(User, Profile)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_user_with_profile_sqlite(self.pool.as_sqlite().unwrap(), user).await
            }
            DatabaseDriver::Mysql => {
                create_user_with_profile_mysql(self.pool.as_mysql().unwrap(), user).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_username_sqlite(self.pool.as_sqlite().unwrap(), username).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_username_mysql(self.pool.as_mysql().unwrap(), username).await
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn get_profile_by_user_id(&self, user_id: i64) -> Result<Option<Profile>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_profile_by_user_id_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                get_profile_by_user_id_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }

    async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_profile_sqlite(self.pool.as_sqlite().unwrap(), profile).await
            }
            DatabaseDriver::Mysql => {
                update_profile_mysql(self.pool.as_mysql().unwrap(), profile).await
            }
        }
    }

    async fn set_profile_skills(&self, profile_id: i64, skill_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_profile_skills_sqlite(self.pool.as_sqlite().unwrap(), profile_id, skill_ids)
                    .await
            }
            DatabaseDriver::Mysql => {
                set_profile_skills_mysql(self.pool.as_mysql().unwrap(), profile_id, skill_ids).await
            }
        }
    }

    async fn get_skills_for_profile(&self, profile_id: i64) -> Result<Vec<Skill>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_skills_for_profile_sqlite(self.pool.as_sqlite().unwrap(), profile_id).await
            }
            DatabaseDriver::Mysql => {
                get_skills_for_profile_mysql(self.pool.as_mysql().unwrap(), profile_id).await
            }
        }
    }

    async fn get_with_profile(&self, user_id: i64) -> Result<Option<UserWithProfile>> {
        let user = match self.get_by_id(user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        let profile = match self.get_profile_by_user_id(user_id).await? {
            Some(profile) => profile,
            None => return Ok(None),
        };
        let skills = self.get_skills_for_profile(profile.id).await?;

        Ok(Some(UserWithProfile {
            user,
            profile,
            skills,
        }))
    }

    async fn list_mentors(&self, filter: &MentorFilter) -> Result<Vec<UserWithProfile>> {
        let pairs = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_mentors_sqlite(self.pool.as_sqlite().unwrap(), filter).await?
            }
            DatabaseDriver::Mysql => {
                list_mentors_mysql(self.pool.as_mysql().unwrap(), filter).await?
            }
        };

        let mut mentors = Vec::with_capacity(pairs.len());
        for (user, profile) in pairs {
            let skills = self.get_skills_for_profile(profile.id).await?;
            mentors.push(UserWithProfile {
                user,
                profile,
                skills,
            });
        }

        Ok(mentors)
    }
}

/// Build the mentor directory query for the given filters.
///
/// Placeholders appear in a fixed order: skill pattern, skill ID, then the
/// three search patterns. Callers must bind in the same order.
fn build_mentor_query(filter: &MentorFilter) -> String {
    let mut sql = String::from(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
               u.created_at, u.updated_at,
               p.id AS profile_id, p.bio, p.is_mentor, p.rating_avg, p.rating_count,
               p.availability, p.created_at AS profile_created_at, p.updated_at AS profile_updated_at
        FROM users u
        INNER JOIN profiles p ON p.user_id = u.id
        WHERE p.is_mentor = 1
        "#,
    );

    if filter.skill.is_some() {
        sql.push_str(
            "AND EXISTS (SELECT 1 FROM profile_skills ps INNER JOIN skills s ON s.id = ps.skill_id WHERE ps.profile_id = p.id AND s.name LIKE ?)\n",
        );
    }
    if filter.skill_id.is_some() {
        sql.push_str(
            "AND EXISTS (SELECT 1 FROM profile_skills ps WHERE ps.profile_id = p.id AND ps.skill_id = ?)\n",
        );
    }
    if filter.available {
        sql.push_str("AND p.availability != '[]' AND p.availability != ''\n");
    }
    if filter.search.is_some() {
        sql.push_str("AND (u.username LIKE ? OR u.first_name LIKE ? OR u.last_name LIKE ?)\n");
    }

    sql.push_str("ORDER BY p.rating_avg DESC, u.username ASC");
    sql
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_with_profile_sqlite(pool: &SqlitePool, user: &User) -> Result<(User, Profile)> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, first_name, last_name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create user")?;

    let user_id = result.last_insert_rowid();

    let result = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, bio, is_mentor, rating_avg, rating_count, availability, created_at, updated_at)
        VALUES (?, '', 0, 0.0, 0, '[]', ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create profile")?;

    let profile_id = result.last_insert_rowid();

    tx.commit().await.context("Failed to commit user creation")?;

    let created = User {
        id: user_id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: now,
        updated_at: now,
    };

    let profile = Profile {
        id: profile_id,
        user_id,
        bio: String::new(),
        is_mentor: false,
        rating_avg: 0.0,
        rating_count: 0,
        availability: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    Ok((created, profile))
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_user_by_username_sqlite(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row))),
        None => Ok(None),
    }
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, first_name = ?, last_name = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    // Return the updated user
    get_user_by_id_sqlite(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn get_profile_by_user_id_sqlite(pool: &SqlitePool, user_id: i64) -> Result<Option<Profile>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, bio, is_mentor, rating_avg, rating_count, availability, created_at, updated_at
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile by user ID")?;

    match row {
        Some(row) => Ok(Some(row_to_profile_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_profile_sqlite(pool: &SqlitePool, profile: &Profile) -> Result<Profile> {
    let now = Utc::now();
    let availability_json = profile.availability_json()?;

    sqlx::query(
        r#"
        UPDATE profiles
        SET bio = ?, is_mentor = ?, rating_avg = ?, rating_count = ?, availability = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.bio)
    .bind(profile.is_mentor)
    .bind(profile.rating_avg)
    .bind(profile.rating_count)
    .bind(&availability_json)
    .bind(now)
    .bind(profile.id)
    .execute(pool)
    .await
    .context("Failed to update profile")?;

    // Return the updated profile
    get_profile_by_user_id_sqlite(pool, profile.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Profile not found after update"))
}

async fn set_profile_skills_sqlite(
    pool: &SqlitePool,
    profile_id: i64,
    skill_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM profile_skills WHERE profile_id = ?")
        .bind(profile_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear profile skills")?;

    for skill_id in skill_ids {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO profile_skills (profile_id, skill_id)
            VALUES (?, ?)
            "#,
        )
        .bind(profile_id)
        .bind(skill_id)
        .execute(&mut *tx)
        .await
        .context("Failed to add skill to profile")?;
    }

    tx.commit().await.context("Failed to commit profile skills")?;

    Ok(())
}

async fn get_skills_for_profile_sqlite(pool: &SqlitePool, profile_id: i64) -> Result<Vec<Skill>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.name, s.slug, s.created_at
        FROM skills s
        INNER JOIN profile_skills ps ON s.id = ps.skill_id
        WHERE ps.profile_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await
    .context("Failed to get skills for profile")?;

    let mut skills = Vec::new();
    for row in rows {
        skills.push(row_to_skill_sqlite(&row));
    }

    Ok(skills)
}

async fn list_mentors_sqlite(
    pool: &SqlitePool,
    filter: &MentorFilter,
) -> Result<Vec<(User, Profile)>> {
    let sql = build_mentor_query(filter);
    let mut query = sqlx::query(&sql);

    if let Some(skill) = &filter.skill {
        query = query.bind(format!("%{}%", skill));
    }
    if let Some(skill_id) = filter.skill_id {
        query = query.bind(skill_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list mentors")?;

    let mut mentors = Vec::new();
    for row in rows {
        mentors.push(row_to_mentor_sqlite(&row)?);
    }

    Ok(mentors)
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_profile_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Profile> {
    let availability_json: String = row.get("availability");
    let availability = parse_availability(&availability_json)
        .with_context(|| format!("Invalid availability in database: {}", availability_json))?;

    Ok(Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        bio: row.get("bio"),
        is_mentor: row.get("is_mentor"),
        rating_avg: row.get("rating_avg"),
        rating_count: row.get("rating_count"),
        availability,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_skill_sqlite(row: &sqlx::sqlite::SqliteRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    }
}

fn row_to_mentor_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<(User, Profile)> {
    let user = row_to_user_sqlite(row);

    let availability_json: String = row.get("availability");
    let availability = parse_availability(&availability_json)
        .with_context(|| format!("Invalid availability in database: {}", availability_json))?;

    let profile = Profile {
        id: row.get("profile_id"),
        user_id: user.id,
        bio: row.get("bio"),
        is_mentor: row.get("is_mentor"),
        rating_avg: row.get("rating_avg"),
        rating_count: row.get("rating_count"),
        availability,
        created_at: row.get("profile_created_at"),
        updated_at: row.get("profile_updated_at"),
    };

    Ok((user, profile))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_with_profile_mysql(pool: &MySqlPool, user: &User) -> Result<(User, Profile)> {
    let now = Utc::now();
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, first_name, last_name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create user")?;

    let user_id = result.last_insert_id() as i64;

    let result = sqlx::query(
        r#"
        INSERT INTO profiles (user_id, bio, is_mentor, rating_avg, rating_count, availability, created_at, updated_at)
        VALUES (?, '', 0, 0.0, 0, '[]', ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create profile")?;

    let profile_id = result.last_insert_id() as i64;

    tx.commit().await.context("Failed to commit user creation")?;

    let created = User {
        id: user_id,
        username: user.username.clone(),
        email: user.email.clone(),
        password_hash: user.password_hash.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        created_at: now,
        updated_at: now,
    };

    let profile = Profile {
        id: profile_id,
        user_id,
        bio: String::new(),
        is_mentor: false,
        rating_avg: 0.0,
        rating_count: 0,
        availability: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    Ok((created, profile))
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_user_by_username_mysql(pool: &MySqlPool, username: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by username")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, email, password_hash, first_name, last_name, created_at, updated_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row))),
        None => Ok(None),
    }
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, first_name = ?, last_name = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    // Return the updated user
    get_user_by_id_mysql(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn get_profile_by_user_id_mysql(pool: &MySqlPool, user_id: i64) -> Result<Option<Profile>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, bio, is_mentor, rating_avg, rating_count, availability, created_at, updated_at
        FROM profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get profile by user ID")?;

    match row {
        Some(row) => Ok(Some(row_to_profile_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_profile_mysql(pool: &MySqlPool, profile: &Profile) -> Result<Profile> {
    let now = Utc::now();
    let availability_json = profile.availability_json()?;

    sqlx::query(
        r#"
        UPDATE profiles
        SET bio = ?, is_mentor = ?, rating_avg = ?, rating_count = ?, availability = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.bio)
    .bind(profile.is_mentor)
    .bind(profile.rating_avg)
    .bind(profile.rating_count)
    .bind(&availability_json)
    .bind(now)
    .bind(profile.id)
    .execute(pool)
    .await
    .context("Failed to update profile")?;

    // Return the updated profile
    get_profile_by_user_id_mysql(pool, profile.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Profile not found after update"))
}

async fn set_profile_skills_mysql(
    pool: &MySqlPool,
    profile_id: i64,
    skill_ids: &[i64],
) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM profile_skills WHERE profile_id = ?")
        .bind(profile_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear profile skills")?;

    for skill_id in skill_ids {
        sqlx::query(
            r#"
            INSERT IGNORE INTO profile_skills (profile_id, skill_id)
            VALUES (?, ?)
            "#,
        )
        .bind(profile_id)
        .bind(skill_id)
        .execute(&mut *tx)
        .await
        .context("Failed to add skill to profile")?;
    }

    tx.commit().await.context("Failed to commit profile skills")?;

    Ok(())
}

async fn get_skills_for_profile_mysql(pool: &MySqlPool, profile_id: i64) -> Result<Vec<Skill>> {
    let rows = sqlx::query(
        r#"
        SELECT s.id, s.name, s.slug, s.created_at
        FROM skills s
        INNER JOIN profile_skills ps ON s.id = ps.skill_id
        WHERE ps.profile_id = ?
        ORDER BY s.name
        "#,
    )
    .bind(profile_id)
    .fetch_all(pool)
    .await
    .context("Failed to get skills for profile")?;

    let mut skills = Vec::new();
    for row in rows {
        skills.push(row_to_skill_mysql(&row));
    }

    Ok(skills)
}

async fn list_mentors_mysql(
    pool: &MySqlPool,
    filter: &MentorFilter,
) -> Result<Vec<(User, Profile)>> {
    let sql = build_mentor_query(filter);
    let mut query = sqlx::query(&sql);

    if let Some(skill) = &filter.skill {
        query = query.bind(format!("%{}%", skill));
    }
    if let Some(skill_id) = filter.skill_id {
        query = query.bind(skill_id);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list mentors")?;

    let mut mentors = Vec::new();
    for row in rows {
        mentors.push(row_to_mentor_mysql(&row)?);
    }

    Ok(mentors)
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_profile_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Profile> {
    let availability_json: String = row.get("availability");
    let availability = parse_availability(&availability_json)
        .with_context(|| format!("Invalid availability in database: {}", availability_json))?;

    Ok(Profile {
        id: row.get("id"),
        user_id: row.get("user_id"),
        bio: row.get("bio"),
        is_mentor: row.get("is_mentor"),
        rating_avg: row.get("rating_avg"),
        rating_count: row.get("rating_count"),
        availability,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_skill_mysql(row: &sqlx::mysql::MySqlRow) -> Skill {
    Skill {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        created_at: row.get("created_at"),
    }
}

fn row_to_mentor_mysql(row: &sqlx::mysql::MySqlRow) -> Result<(User, Profile)> {
    let user = row_to_user_mysql(row);

    let availability_json: String = row.get("availability");
    let availability = parse_availability(&availability_json)
        .with_context(|| format!("Invalid availability in database: {}", availability_json))?;

    let profile = Profile {
        id: row.get("profile_id"),
        user_id: user.id,
        bio: row.get("bio"),
        is_mentor: row.get("is_mentor"),
        rating_avg: row.get("rating_avg"),
        rating_count: row.get("rating_count"),
        availability,
        created_at: row.get("profile_created_at"),
        updated_at: row.get("profile_updated_at"),
    };

    Ok((user, profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::skill::{SkillRepository, SqlxSkillRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::AvailabilitySlot;
    use crate::services::password::hash_password;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn create_test_user(username: &str, email: &str) -> User {
        User::new(
            username.to_string(),
            email.to_string(),
            hash_password("test_password").expect("Failed to hash password"),
            String::new(),
            String::new(),
        )
    }

    async fn create_mentor(
        repo: &SqlxUserRepository,
        username: &str,
        rating_avg: f64,
    ) -> (User, Profile) {
        let user = create_test_user(username, &format!("{}@example.com", username));
        let (user, mut profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");
        profile.is_mentor = true;
        profile.rating_avg = rating_avg;
        let profile = repo
            .update_profile(&profile)
            .await
            .expect("Failed to update profile");
        (user, profile)
    }

    #[tokio::test]
    async fn test_create_user_with_profile() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("testuser", "test@example.com");

        let (created, profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.username, "testuser");
        assert_eq!(created.email, "test@example.com");
        assert!(profile.id > 0);
        assert_eq!(profile.user_id, created.id);
        assert!(!profile.is_mentor);
        assert_eq!(profile.rating_avg, 0.0);
        assert_eq!(profile.rating_count, 0);
        assert!(profile.availability.is_empty());
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("testuser", "test@example.com");
        let (created, _) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.username, "testuser");
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_username() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("findme", "findme@example.com");
        repo.create_with_profile(&user)
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_username("findme")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.username, "findme");
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("emailuser", "unique@example.com");
        repo.create_with_profile(&user)
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("unique@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "unique@example.com");
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        let user1 = create_test_user("duplicate", "user1@example.com");
        let user2 = create_test_user("duplicate", "user2@example.com");

        repo.create_with_profile(&user1)
            .await
            .expect("Failed to create first user");
        let result = repo.create_with_profile(&user2).await;

        assert!(result.is_err(), "Should fail due to duplicate username");
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (_pool, repo) = setup_test_repo().await;
        let user1 = create_test_user("user1", "duplicate@example.com");
        let user2 = create_test_user("user2", "duplicate@example.com");

        repo.create_with_profile(&user1)
            .await
            .expect("Failed to create first user");
        let result = repo.create_with_profile(&user2).await;

        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_update_user() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("updateme", "update@example.com");
        let (mut created, _) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        created.email = "changed@example.com".to_string();
        created.first_name = "Grace".to_string();
        created.last_name = "Hopper".to_string();

        let updated = repo.update(&created).await.expect("Failed to update user");

        assert_eq!(updated.email, "changed@example.com");
        assert_eq!(updated.first_name, "Grace");
        assert_eq!(updated.last_name, "Hopper");
        assert!(updated.updated_at >= created.created_at);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (_pool, repo) = setup_test_repo().await;
        let user = create_test_user("mentor", "mentor@example.com");
        let (_, mut profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        profile.bio = "Systems programming mentor".to_string();
        profile.is_mentor = true;
        profile.availability = vec![AvailabilitySlot {
            day: 2,
            start: "18:00".to_string(),
            end: "20:00".to_string(),
        }];

        let updated = repo
            .update_profile(&profile)
            .await
            .expect("Failed to update profile");

        assert_eq!(updated.bio, "Systems programming mentor");
        assert!(updated.is_mentor);
        assert_eq!(updated.availability.len(), 1);
        assert_eq!(updated.availability[0].day, 2);
    }

    #[tokio::test]
    async fn test_set_profile_skills_replaces_existing() {
        let (pool, repo) = setup_test_repo().await;
        let skill_repo = SqlxSkillRepository::new(pool.clone());

        let rust = skill_repo
            .create(&Skill::new("Rust".to_string(), "rust".to_string()))
            .await
            .expect("Failed to create skill");
        let sql = skill_repo
            .create(&Skill::new("SQL".to_string(), "sql".to_string()))
            .await
            .expect("Failed to create skill");
        let go = skill_repo
            .create(&Skill::new("Go".to_string(), "go".to_string()))
            .await
            .expect("Failed to create skill");

        let user = create_test_user("skilled", "skilled@example.com");
        let (_, profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");

        repo.set_profile_skills(profile.id, &[rust.id, sql.id])
            .await
            .expect("Failed to set skills");

        let skills = repo
            .get_skills_for_profile(profile.id)
            .await
            .expect("Failed to get skills");
        assert_eq!(skills.len(), 2);

        // Replacing drops skills not in the new set
        repo.set_profile_skills(profile.id, &[go.id])
            .await
            .expect("Failed to replace skills");

        let skills = repo
            .get_skills_for_profile(profile.id)
            .await
            .expect("Failed to get skills");
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "Go");
    }

    #[tokio::test]
    async fn test_get_skills_ordered_by_name() {
        let (pool, repo) = setup_test_repo().await;
        let skill_repo = SqlxSkillRepository::new(pool.clone());

        let zig = skill_repo
            .create(&Skill::new("Zig".to_string(), "zig".to_string()))
            .await
            .expect("Failed to create skill");
        let ada = skill_repo
            .create(&Skill::new("Ada".to_string(), "ada".to_string()))
            .await
            .expect("Failed to create skill");

        let user = create_test_user("sorted", "sorted@example.com");
        let (_, profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");
        repo.set_profile_skills(profile.id, &[zig.id, ada.id])
            .await
            .expect("Failed to set skills");

        let skills = repo
            .get_skills_for_profile(profile.id)
            .await
            .expect("Failed to get skills");

        assert_eq!(skills[0].name, "Ada");
        assert_eq!(skills[1].name, "Zig");
    }

    #[tokio::test]
    async fn test_get_with_profile() {
        let (pool, repo) = setup_test_repo().await;
        let skill_repo = SqlxSkillRepository::new(pool.clone());
        let rust = skill_repo
            .create(&Skill::new("Rust".to_string(), "rust".to_string()))
            .await
            .expect("Failed to create skill");

        let user = create_test_user("complete", "complete@example.com");
        let (created, profile) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");
        repo.set_profile_skills(profile.id, &[rust.id])
            .await
            .expect("Failed to set skills");

        let found = repo
            .get_with_profile(created.id)
            .await
            .expect("Failed to get user with profile")
            .expect("User not found");

        assert_eq!(found.user.id, created.id);
        assert_eq!(found.profile.id, profile.id);
        assert_eq!(found.skills.len(), 1);
        assert_eq!(found.skills[0].name, "Rust");
    }

    #[tokio::test]
    async fn test_get_with_profile_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo
            .get_with_profile(999)
            .await
            .expect("Failed to query user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_mentors_only_mentors() {
        let (_pool, repo) = setup_test_repo().await;

        create_mentor(&repo, "mentor1", 4.0).await;
        let learner = create_test_user("learner", "learner@example.com");
        repo.create_with_profile(&learner)
            .await
            .expect("Failed to create user");

        let mentors = repo
            .list_mentors(&MentorFilter::default())
            .await
            .expect("Failed to list mentors");

        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].user.username, "mentor1");
    }

    #[tokio::test]
    async fn test_list_mentors_ordered_by_rating() {
        let (_pool, repo) = setup_test_repo().await;

        create_mentor(&repo, "bronze", 2.5).await;
        create_mentor(&repo, "gold", 4.8).await;
        create_mentor(&repo, "silver", 3.9).await;

        let mentors = repo
            .list_mentors(&MentorFilter::default())
            .await
            .expect("Failed to list mentors");

        let names: Vec<&str> = mentors.iter().map(|m| m.user.username.as_str()).collect();
        assert_eq!(names, vec!["gold", "silver", "bronze"]);
    }

    #[tokio::test]
    async fn test_list_mentors_filter_by_skill_name() {
        let (pool, repo) = setup_test_repo().await;
        let skill_repo = SqlxSkillRepository::new(pool.clone());
        let rust = skill_repo
            .create(&Skill::new("Rust".to_string(), "rust".to_string()))
            .await
            .expect("Failed to create skill");

        let (_, rust_profile) = create_mentor(&repo, "rustacean", 4.0).await;
        create_mentor(&repo, "generalist", 4.5).await;
        repo.set_profile_skills(rust_profile.id, &[rust.id])
            .await
            .expect("Failed to set skills");

        let filter = MentorFilter {
            skill: Some("rust".to_string()),
            ..Default::default()
        };
        let mentors = repo
            .list_mentors(&filter)
            .await
            .expect("Failed to list mentors");

        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].user.username, "rustacean");
        assert_eq!(mentors[0].skills.len(), 1);
    }

    #[tokio::test]
    async fn test_list_mentors_filter_by_skill_id() {
        let (pool, repo) = setup_test_repo().await;
        let skill_repo = SqlxSkillRepository::new(pool.clone());
        let rust = skill_repo
            .create(&Skill::new("Rust".to_string(), "rust".to_string()))
            .await
            .expect("Failed to create skill");
        let sql = skill_repo
            .create(&Skill::new("SQL".to_string(), "sql".to_string()))
            .await
            .expect("Failed to create skill");

        let (_, rust_profile) = create_mentor(&repo, "rustacean", 4.0).await;
        let (_, sql_profile) = create_mentor(&repo, "dba", 4.5).await;
        repo.set_profile_skills(rust_profile.id, &[rust.id])
            .await
            .expect("Failed to set skills");
        repo.set_profile_skills(sql_profile.id, &[sql.id])
            .await
            .expect("Failed to set skills");

        let filter = MentorFilter {
            skill_id: Some(sql.id),
            ..Default::default()
        };
        let mentors = repo
            .list_mentors(&filter)
            .await
            .expect("Failed to list mentors");

        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].user.username, "dba");
    }

    #[tokio::test]
    async fn test_list_mentors_filter_available() {
        let (_pool, repo) = setup_test_repo().await;

        let (_, mut available_profile) = create_mentor(&repo, "hasslots", 4.0).await;
        create_mentor(&repo, "noslots", 4.5).await;

        available_profile.availability = vec![AvailabilitySlot {
            day: 0,
            start: "09:00".to_string(),
            end: "12:00".to_string(),
        }];
        repo.update_profile(&available_profile)
            .await
            .expect("Failed to update profile");

        let filter = MentorFilter {
            available: true,
            ..Default::default()
        };
        let mentors = repo
            .list_mentors(&filter)
            .await
            .expect("Failed to list mentors");

        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].user.username, "hasslots");
    }

    #[tokio::test]
    async fn test_list_mentors_search_by_name() {
        let (_pool, repo) = setup_test_repo().await;

        let (mut ada, _) = create_mentor(&repo, "ada", 4.0).await;
        ada.first_name = "Ada".to_string();
        ada.last_name = "Lovelace".to_string();
        repo.update(&ada).await.expect("Failed to update user");
        create_mentor(&repo, "grace", 4.5).await;

        let filter = MentorFilter {
            search: Some("lovelace".to_string()),
            ..Default::default()
        };
        let mentors = repo
            .list_mentors(&filter)
            .await
            .expect("Failed to list mentors");

        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].user.username, "ada");
    }

    #[tokio::test]
    async fn test_password_hash_stored_correctly() {
        let (_pool, repo) = setup_test_repo().await;
        let password = "my_secure_password";
        let hash = hash_password(password).expect("Failed to hash password");
        let user = User::new(
            "hashtest".to_string(),
            "hashtest@example.com".to_string(),
            hash.clone(),
            String::new(),
            String::new(),
        );

        let (created, _) = repo
            .create_with_profile(&user)
            .await
            .expect("Failed to create user");
        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.password_hash, hash);
        assert!(found.password_hash.starts_with("$argon2id$"));
    }
}
