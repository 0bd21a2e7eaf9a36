//! Structural contract for courses and request bodies.
//!
//! Everything here operates on untrusted `serde_json::Value`s and either
//! produces a fully typed value or a `ValidationError` naming the first
//! offending path. Nothing partially decoded escapes.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{
    Difficulty, Exercise, GenerationRequest, Lesson, LessonContentRequest, Module, NewCourse,
};

type Result<T> = std::result::Result<T, ValidationError>;

pub fn validate_course(raw: &Value) -> Result<NewCourse> {
    let obj = object(raw, "")?;

    let course = NewCourse {
        title: non_empty_str(obj, "", "title")?,
        topic: non_empty_str(obj, "", "topic")?,
        difficulty: difficulty(obj, "", "difficulty")?,
        duration: string(obj, "", "duration")?,
        module_count: count(obj, "", "moduleCount")?,
        lesson_count: count(obj, "", "lessonCount")?,
        modules: modules(obj)?,
    };

    let actual_lessons = course.actual_lesson_count();
    if course.module_count as usize != course.modules.len()
        || course.lesson_count as usize != actual_lessons
    {
        tracing::warn!(
            title = %course.title,
            declared_modules = course.module_count,
            actual_modules = course.modules.len(),
            declared_lessons = course.lesson_count,
            actual_lessons,
            "declared counts disagree with course contents"
        );
    }

    Ok(course)
}

pub fn validate_generation_request(raw: &Value) -> Result<GenerationRequest> {
    let obj = object(raw, "")?;
    let topic = string(obj, "", "topic")?;
    if topic.trim().is_empty() {
        return Err(ValidationError::new("topic", "Topic is required"));
    }
    Ok(GenerationRequest {
        topic,
        difficulty: difficulty(obj, "", "difficulty")?,
    })
}

pub fn validate_lesson_content_request(raw: &Value) -> Result<LessonContentRequest> {
    let obj = object(raw, "")?;
    Ok(LessonContentRequest {
        lesson_title: non_empty_str(obj, "", "lessonTitle")?,
        module_title: non_empty_str(obj, "", "moduleTitle")?,
        difficulty: difficulty(obj, "", "difficulty")?,
    })
}

fn modules(course: &Map<String, Value>) -> Result<Vec<Module>> {
    let items = array(course, "", "modules")?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("modules[{i}]");
        let obj = object(item, &path)?;
        let id = integer(obj, &path, "id")?;
        if !seen.insert(id) {
            return Err(ValidationError::new(
                join(&path, "id"),
                format!("duplicate module id {id}"),
            ));
        }
        out.push(Module {
            id,
            title: string(obj, &path, "title")?,
            lessons: lessons(obj, &path)?,
        });
    }
    Ok(out)
}

fn lessons(module: &Map<String, Value>, parent: &str) -> Result<Vec<Lesson>> {
    let items = array(module, parent, "lessons")?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{parent}.lessons[{i}]");
        let obj = object(item, &path)?;
        let id = integer(obj, &path, "id")?;
        if !seen.insert(id) {
            return Err(ValidationError::new(
                join(&path, "id"),
                format!("duplicate lesson id {id}"),
            ));
        }
        out.push(Lesson {
            id,
            title: string(obj, &path, "title")?,
            duration: string(obj, &path, "duration")?,
            content: string(obj, &path, "content")?,
            objectives: objectives(obj, &path)?,
            exercises: exercises(obj, &path)?,
        });
    }
    Ok(out)
}

fn objectives(lesson: &Map<String, Value>, parent: &str) -> Result<Vec<String>> {
    array(lesson, parent, "objectives")?
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| expected(&format!("{parent}.objectives[{i}]"), "a string", v))
        })
        .collect()
}

fn exercises(lesson: &Map<String, Value>, parent: &str) -> Result<Option<Vec<Exercise>>> {
    if !lesson.contains_key("exercises") {
        return Ok(None);
    }
    let items = array(lesson, parent, "exercises")?;
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let path = format!("{parent}.exercises[{i}]");
        let obj = object(item, &path)?;
        out.push(Exercise {
            question: string(obj, &path, "question")?,
            answer: string(obj, &path, "answer")?,
        });
    }
    Ok(Some(out))
}

// --- field helpers ---

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn expected(path: &str, what: &str, got: &Value) -> ValidationError {
    let path = if path.is_empty() { "$" } else { path };
    ValidationError::new(path, format!("expected {what}, got {}", type_name(got)))
}

fn required<'a>(obj: &'a Map<String, Value>, parent: &str, key: &str) -> Result<&'a Value> {
    obj.get(key)
        .ok_or_else(|| ValidationError::new(join(parent, key), "required"))
}

fn object<'a>(v: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    v.as_object().ok_or_else(|| expected(path, "an object", v))
}

fn array<'a>(obj: &'a Map<String, Value>, parent: &str, key: &str) -> Result<&'a Vec<Value>> {
    let v = required(obj, parent, key)?;
    v.as_array()
        .ok_or_else(|| expected(&join(parent, key), "an array", v))
}

fn string(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<String> {
    let v = required(obj, parent, key)?;
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| expected(&join(parent, key), "a string", v))
}

fn non_empty_str(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<String> {
    let s = string(obj, parent, key)?;
    if s.is_empty() {
        return Err(ValidationError::new(join(parent, key), "must not be empty"));
    }
    Ok(s)
}

fn integer(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<i32> {
    let v = required(obj, parent, key)?;
    let path = join(parent, key);
    let n = v.as_i64().ok_or_else(|| expected(&path, "an integer", v))?;
    i32::try_from(n).map_err(|_| ValidationError::new(path, format!("{n} is out of range")))
}

fn count(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<i32> {
    let n = integer(obj, parent, key)?;
    if n < 0 {
        return Err(ValidationError::new(join(parent, key), "must not be negative"));
    }
    Ok(n)
}

fn difficulty(obj: &Map<String, Value>, parent: &str, key: &str) -> Result<Difficulty> {
    let s = string(obj, parent, key)?;
    s.parse().map_err(|_| {
        ValidationError::new(
            join(parent, key),
            format!("must be one of beginner, intermediate, advanced; got `{s}`"),
        )
    })
}
