use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{seed, sort_newest_first, CourseRepository, StoreResult, UserRepository};
use crate::error::StorageError;
use crate::models::{Course, Difficulty, NewCourse, NewUser, User};

#[derive(Debug)]
struct Tables {
    courses: BTreeMap<i32, Course>,
    users: BTreeMap<i32, User>,
    next_course_id: i32,
    next_user_id: i32,
}

/// Process-local store. Ids come from counters held under the same write
/// lock as the tables, so concurrent creates never collide.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_tables(Tables {
            courses: BTreeMap::new(),
            users: BTreeMap::new(),
            next_course_id: 1,
            next_user_id: 1,
        })
    }

    /// A store pre-populated with [`seed::sample_courses`], so a fresh
    /// process has something to browse.
    pub fn with_samples() -> Self {
        let mut courses = BTreeMap::new();
        let mut next_course_id = 1;
        for (new, created_at) in seed::sample_courses_with_dates(Utc::now()) {
            courses.insert(next_course_id, Course::from_new(next_course_id, created_at, new));
            next_course_id += 1;
        }
        Self::from_tables(Tables {
            courses,
            users: BTreeMap::new(),
            next_course_id,
            next_user_id: 1,
        })
    }

    fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    async fn filtered(&self, keep: impl Fn(&Course) -> bool) -> Vec<Course> {
        let t = self.tables.read().await;
        let mut out: Vec<Course> = t.courses.values().filter(|c| keep(c)).cloned().collect();
        sort_newest_first(&mut out);
        out
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        let mut t = self.tables.write().await;
        let id = t.next_course_id;
        t.next_course_id += 1;
        let course = Course::from_new(id, Utc::now(), course);
        t.courses.insert(id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn get_all_courses(&self) -> StoreResult<Vec<Course>> {
        Ok(self.filtered(|_| true).await)
    }

    async fn search_courses(&self, query: &str) -> StoreResult<Vec<Course>> {
        Ok(self.filtered(|c| c.matches_query(query)).await)
    }

    async fn get_courses_by_difficulty(
        &self,
        difficulty: Difficulty,
    ) -> StoreResult<Vec<Course>> {
        Ok(self.filtered(|c| c.difficulty == difficulty).await)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict(format!("username `{}`", user.username)));
        }
        let id = t.next_user_id;
        t.next_user_id += 1;
        let user = User {
            id,
            username: user.username,
            password: user.password,
        };
        t.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i32) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::models::{Lesson, Module};

    fn new_course(title: &str, topic: &str, difficulty: Difficulty) -> NewCourse {
        NewCourse {
            title: title.into(),
            topic: topic.into(),
            difficulty,
            duration: "3 hours".into(),
            module_count: 1,
            lesson_count: 1,
            modules: vec![Module {
                id: 1,
                title: "Basics".into(),
                lessons: vec![Lesson {
                    id: 1,
                    title: "First steps".into(),
                    duration: "10 minutes".into(),
                    content: "...".into(),
                    objectives: vec!["start".into()],
                    exercises: None,
                }],
            }],
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_input_plus_identity() {
        let store = MemoryStore::new();
        let input = new_course("Rust in Action", "Rust", Difficulty::Advanced);
        let before = Utc::now();
        let created = store.create_course(input.clone()).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(created.created_at >= before);

        let fetched = store.get_course(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.title, input.title);
        assert_eq!(fetched.modules, input.modules);
        assert_eq!(fetched.module_count, input.module_count);
    }

    #[tokio::test]
    async fn missing_course_is_none_not_error() {
        let store = MemoryStore::new();
        assert!(store.get_course(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ids_increase_monotonically() {
        let store = MemoryStore::new();
        let a = store.create_course(new_course("A", "a", Difficulty::Beginner)).await.unwrap();
        let b = store.create_course(new_course("B", "b", Difficulty::Beginner)).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn concurrent_creates_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_course(new_course(&format!("C{i}"), "t", Difficulty::Beginner))
                        .await
                        .unwrap()
                        .id
                })
            })
            .collect();
        let mut ids = HashSet::new();
        for h in handles {
            assert!(ids.insert(h.await.unwrap()));
        }
        assert_eq!(ids.len(), 32);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let store = MemoryStore::with_samples();
        store.create_course(new_course("Fresh", "New", Difficulty::Advanced)).await.unwrap();
        let all = store.get_all_courses().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].title, "Fresh");
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn search_matches_title_topic_and_initials() {
        let store = MemoryStore::with_samples();
        let hits = store.search_courses("ML").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Introduction to Machine Learning");

        let hits = store.search_courses("photo").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].topic, "Photography");

        assert!(store.search_courses("quantum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn difficulty_filter_is_exact() {
        let store = MemoryStore::with_samples();
        let beginner = store.get_courses_by_difficulty(Difficulty::Beginner).await.unwrap();
        assert_eq!(beginner.len(), 2);
        assert!(beginner.iter().all(|c| c.difficulty == Difficulty::Beginner));
        assert!(store
            .get_courses_by_difficulty(Difficulty::Advanced)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser { username: "ada".into(), password: "pw".into() })
            .await
            .unwrap();
        assert_eq!(store.get_user(user.id).await.unwrap(), Some(user.clone()));
        assert_eq!(store.get_user_by_username("ada").await.unwrap(), Some(user));
        assert!(store.get_user_by_username("bob").await.unwrap().is_none());

        let dup = store
            .create_user(NewUser { username: "ada".into(), password: "other".into() })
            .await;
        assert!(matches!(dup, Err(StorageError::Conflict(_))));
    }
}
