//! Rule-based support chatbot. Each message is classified on its own by
//! ordered keyword matching; nothing is remembered between calls.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Greeting,
    Courses,
    Enrollment,
    Payment,
    Certificates,
    Technical,
    Default,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Greeting => "greeting",
            Category::Courses => "courses",
            Category::Enrollment => "enrollment",
            Category::Payment => "payment",
            Category::Certificates => "certificates",
            Category::Technical => "technical",
            Category::Default => "default",
        }
    }

    pub fn responses(&self) -> &'static [&'static str] {
        match self {
            Category::Greeting => GREETING,
            Category::Courses => COURSES,
            Category::Enrollment => ENROLLMENT,
            Category::Payment => PAYMENT,
            Category::Certificates => CERTIFICATES,
            Category::Technical => TECHNICAL,
            Category::Default => DEFAULT,
        }
    }
}

/// Checked top to bottom; the first category with a keyword at the start of
/// a word wins.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Greeting,
        &["hello", "hey", "greetings", "good morning", "good afternoon", "good evening", "howdy"],
    ),
    (
        Category::Courses,
        &["what courses", "which course", "available", "recommend", "catalog", "learn", "topics", "subjects"],
    ),
    (
        Category::Enrollment,
        &["enroll", "register", "sign up", "signup", "join", "start a course"],
    ),
    (
        Category::Payment,
        &["price", "cost", "pay", "premium", "refund", "subscription", "buy", "purchase", "free"],
    ),
    (
        Category::Certificates,
        &["certificate", "certification", "credential", "diploma", "completion"],
    ),
    (
        Category::Technical,
        &["error", "bug", "not working", "problem", "issue", "login", "password", "video", "loading", "crash"],
    ),
];

const GREETING: &[&str] = &[
    "Hello! Welcome to LearnHub. How can I help you today?",
    "Hi there! Ask me about courses, enrollment, payments or certificates.",
    "Hey! Looking for a course or need help with your account?",
];

const COURSES: &[&str] = &[
    "We offer courses in web development, data science, design, DevOps, marketing and security. Browse the catalog to filter by category and level.",
    "Not sure where to start? Web Development Fundamentals and Python for Data Analysis are free and beginner friendly.",
    "You can sort the catalog by popularity, rating, newest or price to find the right course.",
];

const ENROLLMENT: &[&str] = &[
    "To enroll, open a course and click Enroll. Free courses start right away.",
    "Premium courses need a one-time payment before enrollment. Free courses only need a click.",
    "Your enrolled courses and progress appear on your dashboard.",
];

const PAYMENT: &[&str] = &[
    "Many courses are free. Premium courses are a one-time payment with lifetime access.",
    "We accept all major cards through our secure checkout.",
    "Prices are shown on each course page. Filter the catalog by Free or Premium to compare.",
];

const CERTIFICATES: &[&str] = &[
    "Complete every lesson in a course to earn a certificate of completion.",
    "Certificates carry a verification code employers can check.",
    "Your earned certificates are listed under My Certificates.",
];

const TECHNICAL: &[&str] = &[
    "Sorry about that! Try refreshing the page or clearing your browser cache.",
    "If videos won't load, check your connection and try another browser.",
    "For login problems, use Forgot Password. If it persists, contact support.",
];

const DEFAULT: &[&str] = &[
    "I'm not sure I understood. You can ask about courses, enrollment, payments or certificates.",
    "Could you rephrase that? I can help with courses, enrollment, payments and certificates.",
    "I didn't catch that. Try one of the suggested questions.",
];

const SUGGESTIONS: &[&str] = &[
    "What courses do you offer?",
    "How do I enroll in a course?",
    "What is the price of premium courses?",
    "How do I get a certificate?",
    "The video is not loading",
];

const HELP_TOPICS: &[&str] = &["Courses", "Enrollment", "Payments", "Certificates", "Technical support"];

const HELP_TIPS: &[&str] = &[
    "Ask short questions with a keyword like 'enroll', 'price' or 'certificate'.",
    "Use the catalog filters to narrow courses by category, level and price.",
    "Progress is saved automatically as you complete lessons.",
];

/// Never treated as a keyword hit ("learnhub" would otherwise match "learn").
const BRAND: &str = "learnhub";

/// True if `keyword` occurs at the start of a word, so "hey" matches
/// "hey there" but not "they", while "enroll" still matches "enrollment".
fn has_keyword(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(i, _)| {
        text[..i]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

pub fn classify(message: &str) -> Category {
    let m = message.to_lowercase().replace(BRAND, " ");
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| has_keyword(&m, k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Default)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HelpInfo {
    pub topics: Vec<String>,
    pub tips: Vec<String>,
}

pub fn respond_with<R: Rng + ?Sized>(message: &str, rng: &mut R) -> ChatReply {
    let category = classify(message);
    let response = category
        .responses()
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT[0]);
    ChatReply {
        response: response.to_string(),
        category,
        timestamp: Utc::now(),
    }
}

pub fn respond(message: &str) -> ChatReply {
    respond_with(message, &mut rand::thread_rng())
}

pub fn suggestions() -> Vec<String> {
    SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

pub fn help() -> HelpInfo {
    HelpInfo {
        topics: HELP_TOPICS.iter().map(|s| s.to_string()).collect(),
        tips: HELP_TIPS.iter().map(|s| s.to_string()).collect(),
    }
}
