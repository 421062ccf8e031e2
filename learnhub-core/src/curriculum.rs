//! Built-in curriculum metadata. Seeds the mock database and backs the
//! catalog fallback when no provider is reachable.

use crate::{Course, CourseSource, PlaceholderGenerator};
use chrono::{DateTime, NaiveDate, Utc};

pub const PREMIUM_CATEGORY: &str = "premium";
pub const FREE_CATEGORY: &str = "free";

#[derive(Clone, Copy, Debug)]
pub struct CurriculumEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub level: &'static str,
    pub instructor: &'static str,
    pub premium: bool,
    pub price: u64,
    pub rating: f32,
    pub enrolled: u64,
    pub published: (i32, u32, u32),
}

pub const CURRICULUM: &[CurriculumEntry] = &[
    CurriculumEntry {
        id: "web-dev-fundamentals",
        title: "Web Development Fundamentals",
        description: "HTML, CSS and JavaScript from first principles to a deployed site.",
        category: "web-development",
        level: "Beginner",
        instructor: "Sarah Johnson",
        premium: false,
        price: 0,
        rating: 4.7,
        enrolled: 12_840,
        published: (2024, 1, 15),
    },
    CurriculumEntry {
        id: "python-for-data",
        title: "Python for Data Analysis",
        description: "Pandas, NumPy and plotting for everyday data work.",
        category: "data-science",
        level: "Beginner to Intermediate",
        instructor: "Michael Chen",
        premium: false,
        price: 0,
        rating: 4.6,
        enrolled: 9_310,
        published: (2024, 3, 2),
    },
    CurriculumEntry {
        id: "react-masterclass",
        title: "React Masterclass",
        description: "Hooks, state management and testing for production React apps.",
        category: "web-development",
        level: "Intermediate",
        instructor: "Emily Rodriguez",
        premium: true,
        price: 4_999,
        rating: 4.9,
        enrolled: 6_120,
        published: (2024, 5, 20),
    },
    CurriculumEntry {
        id: "machine-learning-a-z",
        title: "Machine Learning A-Z",
        description: "Regression, classification and neural networks with hands-on projects.",
        category: "data-science",
        level: "Advanced",
        instructor: "David Kim",
        premium: true,
        price: 7_999,
        rating: 4.8,
        enrolled: 7_455,
        published: (2024, 2, 10),
    },
    CurriculumEntry {
        id: "ui-ux-design",
        title: "UI/UX Design Principles",
        description: "Wireframes, prototyping and usability testing for digital products.",
        category: "design",
        level: "Beginner",
        instructor: "Lisa Thompson",
        premium: false,
        price: 0,
        rating: 4.5,
        enrolled: 5_230,
        published: (2023, 11, 8),
    },
    CurriculumEntry {
        id: "cloud-devops",
        title: "Cloud and DevOps Engineering",
        description: "Containers, CI/CD pipelines and infrastructure as code.",
        category: "devops",
        level: "Intermediate to Advanced",
        instructor: "James Wilson",
        premium: true,
        price: 6_499,
        rating: 4.7,
        enrolled: 3_980,
        published: (2024, 7, 1),
    },
    CurriculumEntry {
        id: "digital-marketing",
        title: "Digital Marketing Essentials",
        description: "SEO, social media and analytics for growing an audience.",
        category: "marketing",
        level: "Beginner",
        instructor: "Anna Martinez",
        premium: false,
        price: 0,
        rating: 4.3,
        enrolled: 4_410,
        published: (2023, 9, 14),
    },
    CurriculumEntry {
        id: "cybersecurity-basics",
        title: "Cybersecurity Basics",
        description: "Threat models, secure passwords and network defense fundamentals.",
        category: "security",
        level: "Beginner",
        instructor: "Robert Taylor",
        premium: true,
        price: 3_999,
        rating: 4.6,
        enrolled: 2_760,
        published: (2024, 4, 18),
    },
];

impl CurriculumEntry {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let (y, m, d) = self.published;
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Full provider-side record, as the mock database stores it.
    pub fn to_course(&self) -> Course {
        Course {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: self.category.to_string(),
            price: self.price,
            level: self.level.to_string(),
            instructor: self.instructor.to_string(),
            rating: Some(self.rating),
            enrolled_count: Some(self.enrolled),
            is_premium: self.premium,
            created_at: self.created_at(),
            source: CourseSource::Provider,
        }
    }

    /// Locally synthesized record. Only the static metadata is trusted; the
    /// category follows the premium flag and the student count is a
    /// placeholder.
    pub fn to_fallback(&self, placeholders: &dyn PlaceholderGenerator) -> Course {
        Course {
            id: self.id.to_string(),
            title: self.title.to_string(),
            description: self.description.to_string(),
            category: if self.premium { PREMIUM_CATEGORY } else { FREE_CATEGORY }.to_string(),
            price: self.price,
            level: self.level.to_string(),
            instructor: self.instructor.to_string(),
            rating: None,
            enrolled_count: Some(placeholders.student_count(self.id)),
            is_premium: self.premium,
            created_at: None,
            source: CourseSource::Fallback,
        }
    }
}

pub fn find(id: &str) -> Option<&'static CurriculumEntry> {
    CURRICULUM.iter().find(|e| e.id == id)
}

pub fn seed_courses() -> Vec<Course> {
    CURRICULUM.iter().map(CurriculumEntry::to_course).collect()
}

pub fn fallback_courses(placeholders: &dyn PlaceholderGenerator) -> Vec<Course> {
    CURRICULUM.iter().map(|e| e.to_fallback(placeholders)).collect()
}
