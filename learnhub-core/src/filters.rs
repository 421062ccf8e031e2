use crate::{Course, CoursePage, Criteria, Pagination, PricingMode, SortKey, ALL};
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: u32 = 12;

pub fn filter_by_text(courses: &[Course], query: &str) -> Vec<Course> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return courses.to_vec();
    }
    courses
        .iter()
        .filter(|c| {
            c.title.to_lowercase().contains(&q)
                || c.description.to_lowercase().contains(&q)
                || c.instructor.to_lowercase().contains(&q)
        })
        .cloned()
        .collect()
}

pub fn filter_by_category(courses: &[Course], category: &str) -> Vec<Course> {
    let q = category.trim();
    if q.is_empty() || q.eq_ignore_ascii_case(ALL) {
        return courses.to_vec();
    }
    courses
        .iter()
        .filter(|c| c.category.eq_ignore_ascii_case(q))
        .cloned()
        .collect()
}

/// "Beginner to Intermediate" matches both "beginner" and "intermediate".
pub fn filter_by_level(courses: &[Course], level: &str) -> Vec<Course> {
    let q = level.trim().to_lowercase();
    if q.is_empty() || q == ALL {
        return courses.to_vec();
    }
    courses
        .iter()
        .filter(|c| {
            let l = c.level.to_lowercase();
            l == q || l.contains(&q)
        })
        .cloned()
        .collect()
}

pub fn filter_by_pricing(courses: &[Course], mode: PricingMode) -> Vec<Course> {
    courses
        .iter()
        .filter(|c| match mode {
            PricingMode::All => true,
            PricingMode::Free => c.price == 0,
            PricingMode::Premium => c.price > 0,
        })
        .cloned()
        .collect()
}

/// Stable: courses with equal keys keep their relative order.
pub fn sort_courses(courses: &mut [Course], key: SortKey) {
    match key {
        SortKey::Popular => {
            courses.sort_by(|a, b| b.enrolled_count.unwrap_or(0).cmp(&a.enrolled_count.unwrap_or(0)))
        }
        SortKey::Rating => courses.sort_by(|a, b| {
            let (ra, rb) = (a.rating.unwrap_or(0.0), b.rating.unwrap_or(0.0));
            rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
        }),
        SortKey::Newest => courses.sort_by(|a, b| {
            let ta = a.created_at.map(|t| t.timestamp_millis()).unwrap_or(0);
            let tb = b.created_at.map(|t| t.timestamp_millis()).unwrap_or(0);
            tb.cmp(&ta)
        }),
        SortKey::PriceLow => courses.sort_by_key(|c| c.price),
        SortKey::PriceHigh => courses.sort_by(|a, b| b.price.cmp(&a.price)),
    }
}

/// The filtered, sorted catalog for `criteria`. Pure: the same inputs always
/// produce the same output in the same order.
pub fn derived_view(courses: &[Course], criteria: &Criteria) -> Vec<Course> {
    let mut v = filter_by_text(courses, &criteria.search);
    v = filter_by_category(&v, &criteria.category);
    v = filter_by_level(&v, &criteria.level);
    v = filter_by_pricing(&v, criteria.pricing);
    sort_courses(&mut v, criteria.sort);
    v
}

pub fn paginate(courses: Vec<Course>, page: Option<u32>, limit: Option<u32>) -> CoursePage {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let page = page.unwrap_or(1).max(1);
    let total = courses.len() as u64;
    let pages = total.div_ceil(u64::from(limit)) as u32;
    let skip = ((page - 1) as usize).saturating_mul(limit as usize);
    let courses = courses.into_iter().skip(skip).take(limit as usize).collect();
    CoursePage {
        courses,
        pagination: Some(Pagination {
            page,
            limit,
            total,
            pages,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str, price: u64, rating: Option<f32>) -> Course {
        let mut c = Course::new(id, format!("Course {id}"));
        c.price = price;
        c.rating = rating;
        c
    }

    #[test]
    fn rating_sort_treats_missing_as_zero() {
        let mut v = vec![course("a", 0, None), course("b", 0, Some(4.2)), course("c", 0, Some(0.0))];
        sort_courses(&mut v, SortKey::Rating);
        let ids: Vec<_> = v.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn price_sorts_are_stable() {
        let mut v = vec![course("a", 500, None), course("b", 0, None), course("c", 500, None)];
        sort_courses(&mut v, SortKey::PriceHigh);
        let ids: Vec<_> = v.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);

        sort_courses(&mut v, SortKey::PriceLow);
        let ids: Vec<_> = v.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn level_matches_substring() {
        let mut a = course("a", 0, None);
        a.level = "Beginner to Intermediate".into();
        let mut b = course("b", 0, None);
        b.level = "Advanced".into();
        let v = filter_by_level(&[a, b], "intermediate");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].id, "a");
    }
}
