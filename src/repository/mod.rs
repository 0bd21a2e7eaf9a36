//! Course and user persistence behind backend-agnostic traits.
//!
//! Two backends implement the same contract: [`PgStore`] for durable
//! storage and [`MemoryStore`] for tests and zero-dependency runs. The
//! concrete backend is chosen once at startup (see [`crate::config`]) and
//! handed to the router as a [`SharedStore`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{Course, Difficulty, NewCourse, NewUser, User};

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Stores a validated course, assigning `id` and `createdAt`.
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course>;
    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>>;
    /// All courses, newest first.
    async fn get_all_courses(&self) -> StoreResult<Vec<Course>>;
    /// Courses whose title or topic matches `query`, newest first.
    async fn search_courses(&self, query: &str) -> StoreResult<Vec<Course>>;
    async fn get_courses_by_difficulty(&self, difficulty: Difficulty)
        -> StoreResult<Vec<Course>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: i32) -> StoreResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

pub trait Store: CourseRepository + UserRepository {}

impl<T: CourseRepository + UserRepository> Store for T {}

pub type SharedStore = Arc<dyn Store>;

/// Newest first; equal timestamps keep insertion (id) order.
pub(crate) fn sort_newest_first(courses: &mut [Course]) {
    courses.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}
