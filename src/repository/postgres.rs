use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};

use super::{CourseRepository, StoreResult, UserRepository};
use crate::error::StorageError;
use crate::models::{Course, Difficulty, Module, NewCourse, NewUser, User};

pub type Db = Pool<Postgres>;

const COURSE_COLUMNS: &str =
    "id, title, topic, difficulty, duration, module_count, lesson_count, modules, created_at";

pub async fn connect(url: &str, max_connections: u32) -> Result<Db, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

#[derive(sqlx::FromRow, Debug)]
struct CourseRow {
    id: i32,
    title: String,
    topic: String,
    difficulty: String,
    duration: String,
    module_count: i32,
    lesson_count: i32,
    modules: Json<Vec<Module>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CourseRow> for Course {
    type Error = StorageError;

    fn try_from(row: CourseRow) -> Result<Self, Self::Error> {
        let difficulty =
            row.difficulty
                .parse::<Difficulty>()
                .map_err(|e| StorageError::Corrupt {
                    id: row.id,
                    reason: e.to_string(),
                })?;
        Ok(Course {
            id: row.id,
            title: row.title,
            topic: row.topic,
            difficulty,
            duration: row.duration,
            module_count: row.module_count,
            lesson_count: row.lesson_count,
            modules: row.modules.0,
            created_at: row.created_at,
        })
    }
}

fn into_courses(rows: Vec<CourseRow>) -> StoreResult<Vec<Course>> {
    rows.into_iter().map(Course::try_from).collect()
}

#[derive(sqlx::FromRow, Debug)]
struct UserRow {
    id: i32,
    username: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password: row.password,
        }
    }
}

/// Escapes `LIKE` metacharacters and wraps the query as `%query%`.
fn like_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for ch in query.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Postgres-backed store. Ids come from `SERIAL` primary keys and
/// `created_at` from the column default, so concurrent writers are safe.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Applies the bundled migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.db).await
    }

    pub async fn course_count(&self) -> StoreResult<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    /// Inserts a course with an explicit creation time. Used for seeding.
    pub async fn insert_course_at(
        &self,
        course: NewCourse,
        created_at: DateTime<Utc>,
    ) -> StoreResult<Course> {
        let sql = format!(
            "INSERT INTO courses (title, topic, difficulty, duration, module_count, lesson_count, modules, created_at) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8) RETURNING {COURSE_COLUMNS}"
        );
        let row: CourseRow = sqlx::query_as(&sql)
            .bind(course.title)
            .bind(course.topic)
            .bind(course.difficulty.as_str())
            .bind(course.duration)
            .bind(course.module_count)
            .bind(course.lesson_count)
            .bind(Json(course.modules))
            .bind(created_at)
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        let sql = format!(
            "INSERT INTO courses (title, topic, difficulty, duration, module_count, lesson_count, modules) \
             VALUES ($1,$2,$3,$4,$5,$6,$7) RETURNING {COURSE_COLUMNS}"
        );
        let row: CourseRow = sqlx::query_as(&sql)
            .bind(course.title)
            .bind(course.topic)
            .bind(course.difficulty.as_str())
            .bind(course.duration)
            .bind(course.module_count)
            .bind(course.lesson_count)
            .bind(Json(course.modules))
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }

    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        let row: Option<CourseRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        row.map(Course::try_from).transpose()
    }

    async fn get_all_courses(&self) -> StoreResult<Vec<Course>> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC, id ASC");
        let rows: Vec<CourseRow> = sqlx::query_as(&sql).fetch_all(&self.db).await?;
        into_courses(rows)
    }

    async fn search_courses(&self, query: &str) -> StoreResult<Vec<Course>> {
        // Word initials mirror Course::matches_query, so "ml" finds "Machine Learning".
        let sql = format!(
            r#"
            SELECT {COURSE_COLUMNS} FROM courses
            WHERE title ILIKE $1 OR topic ILIKE $1
               OR lower(array_to_string(ARRAY(
                    SELECT left(w, 1) FROM regexp_split_to_table(btrim(title), '\s+') AS w), '')) LIKE $1
               OR lower(array_to_string(ARRAY(
                    SELECT left(w, 1) FROM regexp_split_to_table(btrim(topic), '\s+') AS w), '')) LIKE $1
            ORDER BY created_at DESC, id ASC
            "#
        );
        let rows: Vec<CourseRow> = sqlx::query_as(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.db)
            .await?;
        into_courses(rows)
    }

    async fn get_courses_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> StoreResult<Vec<Course>> {
        let sql = format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE difficulty = $1 ORDER BY created_at DESC, id ASC"
        );
        let rows: Vec<CourseRow> = sqlx::query_as(&sql)
            .bind(difficulty.as_str())
            .fetch_all(&self.db)
            .await?;
        into_courses(rows)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let res = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password) VALUES ($1,$2) RETURNING id, username, password",
        )
        .bind(&user.username)
        .bind(&user.password)
        .fetch_one(&self.db)
        .await;
        match res {
            Ok(row) => Ok(row.into()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StorageError::Conflict(format!("username `{}`", user.username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user(&self, id: i32) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, username, password FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.db)
                .await?;
        Ok(row.map(User::from))
    }
}
