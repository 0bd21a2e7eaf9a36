//! Sample courses shipped with the service.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Difficulty, Exercise, Lesson, Module, NewCourse};

fn lesson(id: i32, title: &str, duration: &str, content: &str, objectives: &[&str]) -> Lesson {
    Lesson {
        id,
        title: title.into(),
        duration: duration.into(),
        content: content.into(),
        objectives: objectives.iter().map(|s| s.to_string()).collect(),
        exercises: None,
    }
}

fn with_exercise(mut lesson: Lesson, question: &str, answer: &str) -> Lesson {
    lesson
        .exercises
        .get_or_insert_with(Vec::new)
        .push(Exercise {
            question: question.into(),
            answer: answer.into(),
        });
    lesson
}

pub fn sample_courses() -> Vec<NewCourse> {
    vec![
        NewCourse {
            title: "Introduction to Machine Learning".into(),
            topic: "Machine Learning".into(),
            difficulty: Difficulty::Beginner,
            duration: "8 hours".into(),
            module_count: 4,
            lesson_count: 12,
            modules: vec![Module {
                id: 1,
                title: "What is Machine Learning?".into(),
                lessons: vec![
                    lesson(
                        1,
                        "Understanding AI and ML",
                        "30 minutes",
                        "Machine Learning is a subset of artificial intelligence that enables computers to learn and improve from experience without being explicitly programmed. In this lesson, we'll explore the fundamental concepts that make ML so powerful.\n\n\
                         Key Concepts:\n\
                         • Supervised Learning: Learning with labeled examples\n\
                         • Unsupervised Learning: Finding patterns in unlabeled data\n\
                         • Reinforcement Learning: Learning through trial and error\n\n\
                         Real-world applications include recommendation systems, image recognition, and natural language processing.",
                        &[
                            "Understand what machine learning is",
                            "Distinguish between AI and ML",
                            "Identify common ML applications",
                        ],
                    ),
                    with_exercise(
                        lesson(
                            2,
                            "Types of Machine Learning",
                            "25 minutes",
                            "There are three main types of machine learning, each suited for different types of problems.\n\n\
                             1. Supervised Learning:\n\
                             - Uses labeled training data\n\
                             - Examples: Email spam detection, medical diagnosis\n\
                             - Common algorithms: Linear regression, decision trees\n\n\
                             2. Unsupervised Learning:\n\
                             - Finds hidden patterns in unlabeled data\n\
                             - Examples: Customer segmentation, anomaly detection\n\
                             - Common algorithms: K-means clustering, PCA\n\n\
                             3. Reinforcement Learning:\n\
                             - Learns through interaction with environment\n\
                             - Examples: Game playing, robotics\n\
                             - Common algorithms: Q-learning, policy gradients",
                            &[
                                "Classify problems by ML type",
                                "Choose appropriate learning approach",
                                "Understand algorithm categories",
                            ],
                        ),
                        "A company wants to group customers based on purchasing behavior without knowing predefined categories. What type of ML should they use?",
                        "Unsupervised Learning - specifically clustering algorithms like K-means, since they want to discover hidden patterns in customer data without predefined labels.",
                    ),
                ],
            }],
        },
        NewCourse {
            title: "Digital Photography Masterclass".into(),
            topic: "Photography".into(),
            difficulty: Difficulty::Intermediate,
            duration: "12 hours".into(),
            module_count: 6,
            lesson_count: 18,
            modules: vec![Module {
                id: 1,
                title: "Camera Fundamentals".into(),
                lessons: vec![lesson(
                    1,
                    "Understanding Exposure Triangle",
                    "40 minutes",
                    "The exposure triangle is the foundation of photography, consisting of three key elements that control how light enters your camera.\n\n\
                     Aperture (f-stop):\n\
                     • Controls depth of field\n\
                     • Lower f-numbers = wider aperture = shallower depth of field\n\
                     • Higher f-numbers = narrower aperture = deeper depth of field\n\n\
                     Shutter Speed:\n\
                     • Controls motion blur and camera shake\n\
                     • Fast speeds freeze motion\n\
                     • Slow speeds create motion blur\n\n\
                     ISO:\n\
                     • Controls sensor sensitivity to light\n\
                     • Lower ISO = less noise, better image quality\n\
                     • Higher ISO = more noise, but allows shooting in darker conditions\n\n\
                     Mastering these three settings allows you to take creative control of your photography.",
                    &[
                        "Master the exposure triangle",
                        "Control depth of field with aperture",
                        "Freeze or blur motion with shutter speed",
                        "Balance ISO for optimal image quality",
                    ],
                )],
            }],
        },
        NewCourse {
            title: "Personal Finance Management".into(),
            topic: "Finance".into(),
            difficulty: Difficulty::Beginner,
            duration: "6 hours".into(),
            module_count: 5,
            lesson_count: 15,
            modules: vec![Module {
                id: 1,
                title: "Budgeting Basics".into(),
                lessons: vec![with_exercise(
                    lesson(
                        1,
                        "Creating Your First Budget",
                        "35 minutes",
                        "A budget is your financial roadmap - it tells your money where to go instead of wondering where it went.\n\n\
                         Step 1: Calculate Your Income\n\
                         • Include all sources: salary, freelance, side hustles\n\
                         • Use net income (after taxes)\n\
                         • Be conservative with variable income\n\n\
                         Step 2: List Your Expenses\n\
                         • Fixed expenses: rent, insurance, loans\n\
                         • Variable expenses: groceries, utilities, entertainment\n\
                         • Don't forget irregular expenses: car maintenance, gifts\n\n\
                         Step 3: Apply the 50/30/20 Rule\n\
                         • 50% for needs (housing, food, utilities)\n\
                         • 30% for wants (entertainment, dining out)\n\
                         • 20% for savings and debt repayment\n\n\
                         Step 4: Track and Adjust\n\
                         • Monitor spending weekly\n\
                         • Adjust categories as needed\n\
                         • Celebrate small wins",
                        &[
                            "Calculate total monthly income",
                            "Categorize all expenses",
                            "Apply budgeting frameworks",
                            "Set up tracking systems",
                        ],
                    ),
                    "If your monthly take-home pay is $4,000, how much should you allocate to each category using the 50/30/20 rule?",
                    "Needs: $2,000 (50%), Wants: $1,200 (30%), Savings/Debt: $800 (20%)",
                )],
            }],
        },
    ]
}

/// Sample courses paired with creation times one day apart, newest first.
pub fn sample_courses_with_dates(now: DateTime<Utc>) -> Vec<(NewCourse, DateTime<Utc>)> {
    sample_courses()
        .into_iter()
        .enumerate()
        .map(|(i, c)| (c, now - Duration::days(i as i64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_course;

    #[test]
    fn samples_pass_the_validator() {
        for course in sample_courses() {
            let raw = serde_json::to_value(&course).unwrap();
            assert_eq!(validate_course(&raw).unwrap(), course);
        }
    }

    #[test]
    fn sample_dates_are_staggered_newest_first() {
        let now = Utc::now();
        let dated = sample_courses_with_dates(now);
        assert_eq!(dated[0].1, now);
        assert_eq!(dated[2].1, now - Duration::days(2));
    }
}
