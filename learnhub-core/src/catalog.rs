use crate::{
    curriculum, derived_view, provider::CourseProvider, CoreError, Course, CoursePage,
    CourseQuery, Criteria, CriteriaPatch, HashedPlaceholders, Pagination, PlaceholderGenerator,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Page size requested while walking the provider's catalog.
pub const FETCH_PAGE_SIZE: u32 = 50;
const MAX_FETCH_PAGES: u32 = 200;

#[derive(Default)]
struct CatalogState {
    courses: Vec<Course>,
    criteria: Criteria,
    pagination: Option<Pagination>,
    fallback: bool,
}

/// Counts outstanding fetches. The count drops when the guard does, so
/// success, failure and cancellation all clear it.
#[derive(Default)]
pub(crate) struct InFlight(AtomicUsize);

impl InFlight {
    pub(crate) fn enter(&self) -> InFlightGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(&self.0)
    }

    pub(crate) fn active(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

pub(crate) struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Course list, browse criteria and the view derived from them.
pub struct CatalogStore {
    provider: Arc<dyn CourseProvider>,
    placeholders: Arc<dyn PlaceholderGenerator>,
    state: RwLock<CatalogState>,
    loading: InFlight,
}

impl CatalogStore {
    pub fn new(provider: Arc<dyn CourseProvider>) -> Self {
        Self::with_placeholders(provider, Arc::new(HashedPlaceholders))
    }

    pub fn with_placeholders(
        provider: Arc<dyn CourseProvider>,
        placeholders: Arc<dyn PlaceholderGenerator>,
    ) -> Self {
        Self {
            provider,
            placeholders,
            state: RwLock::new(CatalogState::default()),
            loading: InFlight::default(),
        }
    }

    /// Fetches every page of courses for `criteria` and replaces the stored
    /// list. A provider failure never escapes: the list is rebuilt from the
    /// built-in curriculum and every course in it is marked as fallback.
    pub async fn load_courses(&self, criteria: &Criteria) -> Vec<Course> {
        let _loading = self.loading.enter();
        let query = CourseQuery::from_criteria(criteria);
        match self.fetch_all(query).await {
            Ok(page) => {
                tracing::debug!(count = page.courses.len(), "catalog loaded");
                let mut s = self.state.write();
                s.courses = page.courses;
                s.pagination = page.pagination;
                s.fallback = false;
                s.courses.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog load failed, using built-in curriculum");
                let courses = curriculum::fallback_courses(self.placeholders.as_ref());
                let mut s = self.state.write();
                s.courses = courses;
                s.pagination = None;
                s.fallback = true;
                s.courses.clone()
            }
        }
    }

    /// Walks the provider's pages until its reported page count is reached.
    /// The returned pagination is the provider's, with `page` left at 1.
    async fn fetch_all(&self, mut query: CourseQuery) -> Result<CoursePage, CoreError> {
        query.page = Some(1);
        query.limit = Some(FETCH_PAGE_SIZE);
        let first = self.provider.get_courses(&query).await?;
        let pages = first.pagination.as_ref().map_or(1, |p| p.pages);
        let mut courses = first.courses;
        for page in 2..=pages.min(MAX_FETCH_PAGES) {
            query.page = Some(page);
            let next = self.provider.get_courses(&query).await?;
            if next.courses.is_empty() {
                break;
            }
            courses.extend(next.courses);
        }
        if pages > MAX_FETCH_PAGES {
            tracing::warn!(pages, max = MAX_FETCH_PAGES, "catalog truncated");
        }
        Ok(CoursePage {
            courses,
            pagination: first.pagination,
        })
    }

    /// Reloads using the current criteria.
    pub async fn refresh(&self) -> Vec<Course> {
        let criteria = self.criteria();
        self.load_courses(&criteria).await
    }

    pub fn set_criteria(&self, patch: CriteriaPatch) {
        self.state.write().criteria.merge(patch);
    }

    pub fn clear_filters(&self) {
        self.state.write().criteria = Criteria::default();
    }

    pub fn derived_view(&self) -> Vec<Course> {
        let s = self.state.read();
        derived_view(&s.courses, &s.criteria)
    }

    pub fn courses(&self) -> Vec<Course> {
        self.state.read().courses.clone()
    }

    pub fn criteria(&self) -> Criteria {
        self.state.read().criteria.clone()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.state.read().pagination.clone()
    }

    pub fn is_fallback(&self) -> bool {
        self.state.read().fallback
    }

    pub fn is_loading(&self) -> bool {
        self.loading.active()
    }

    pub fn find(&self, id: &str) -> Option<Course> {
        self.state.read().courses.iter().find(|c| c.id == id).cloned()
    }
}
