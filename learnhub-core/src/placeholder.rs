use rand::Rng;

const MIN_STUDENTS: u64 = 100;
const SPAN: u64 = 1_000;

/// Supplies cosmetic values for courses synthesized without a provider.
pub trait PlaceholderGenerator: Send + Sync {
    fn student_count(&self, course_id: &str) -> u64;
}

/// Deterministic counts derived from an FNV-1a hash of the course id.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashedPlaceholders;

impl PlaceholderGenerator for HashedPlaceholders {
    fn student_count(&self, course_id: &str) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in course_id.bytes() {
            h ^= u64::from(b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        MIN_STUDENTS + h % SPAN
    }
}

/// Fresh random counts on every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPlaceholders;

impl PlaceholderGenerator for RandomPlaceholders {
    fn student_count(&self, _course_id: &str) -> u64 {
        rand::thread_rng().gen_range(MIN_STUDENTS..MIN_STUDENTS + SPAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_is_stable_and_in_range() {
        let g = HashedPlaceholders;
        let a = g.student_count("react-masterclass");
        assert_eq!(a, g.student_count("react-masterclass"));
        assert!((MIN_STUDENTS..MIN_STUDENTS + SPAN).contains(&a));
    }

    #[test]
    fn random_is_in_range() {
        let n = RandomPlaceholders.student_count("x");
        assert!((MIN_STUDENTS..MIN_STUDENTS + SPAN).contains(&n));
    }
}
