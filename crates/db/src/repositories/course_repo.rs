//! Repository for the `courses` table.

use academy_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::course::{Course, CreateCourse};

const COLUMNS: &str = "id, name, is_active, created_at, updated_at";

pub struct CourseRepo;

impl CourseRepo {
    pub async fn create(pool: &PgPool, input: &CreateCourse) -> Result<Course, sqlx::Error> {
        let query = format!("INSERT INTO courses (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Course>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
    ) -> Result<Option<Course>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }
}
