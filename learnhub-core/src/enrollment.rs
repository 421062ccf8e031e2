use crate::catalog::InFlight;
use crate::{
    provider::CourseProvider, Certificate, CertificateGenerator, CoreError, Enrollment,
    EnrollmentStatus, ProgressUpdate, SessionLedger,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

/// The current learner's enrollments, keyed by course id.
pub struct EnrollmentStore {
    provider: Arc<dyn CourseProvider>,
    ledger: Arc<SessionLedger>,
    certificates: CertificateGenerator,
    enrollments: RwLock<Vec<Enrollment>>,
    loading: InFlight,
}

impl EnrollmentStore {
    pub fn new(
        provider: Arc<dyn CourseProvider>,
        ledger: Arc<SessionLedger>,
        certificates: CertificateGenerator,
    ) -> Self {
        Self {
            provider,
            ledger,
            certificates,
            enrollments: RwLock::new(Vec::new()),
            loading: InFlight::default(),
        }
    }

    pub fn ledger(&self) -> &Arc<SessionLedger> {
        &self.ledger
    }

    /// Enrolls in `course_id`. Premium courses need a recorded payment first.
    /// Enrolling twice leaves a single record.
    pub async fn enroll(&self, course_id: &str) -> Result<Enrollment, CoreError> {
        let _loading = self.loading.enter();
        let course = self.provider.get_course(course_id).await?;
        if course.is_premium && !self.ledger.has_paid(&course.id) {
            tracing::info!(course = %course.id, "enrollment refused, payment required");
            return Err(CoreError::PaymentRequired(course.id));
        }

        let ack = self.provider.enroll_course(&course.id).await?;
        let now = Utc::now();
        let mut record = ack
            .enrollment
            .map(|r| r.normalize(now))
            .unwrap_or_else(|| Enrollment::new(course.id.clone(), now));
        record.course_id = course.id.clone();
        {
            let mut m = self.enrollments.write();
            if !m.iter().any(|e| e.course_id == record.course_id) {
                m.push(record.clone());
            }
        }
        tracing::info!(course = %course.id, message = %ack.message, "enrolled");

        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "enrollment refresh failed, keeping local list");
        }
        Ok(self.get_enrollment(&course.id).unwrap_or(record))
    }

    /// Replaces the local list with the provider's. Duplicate course ids in
    /// the response collapse to the first occurrence.
    pub async fn refresh(&self) -> Result<Vec<Enrollment>, CoreError> {
        let _loading = self.loading.enter();
        let records = self.provider.get_enrolled_courses().await?;
        let now = Utc::now();
        let mut list: Vec<Enrollment> = Vec::with_capacity(records.len());
        for r in records {
            let e = r.normalize(now);
            if !list.iter().any(|x| x.course_id == e.course_id) {
                list.push(e);
            }
        }
        *self.enrollments.write() = list.clone();
        Ok(list)
    }

    /// Sends `update` for an existing enrollment and keeps the provider's
    /// resulting record. Reaching 100% completes the course and earns its
    /// certificate.
    pub async fn update_progress(
        &self,
        course_id: &str,
        update: ProgressUpdate,
    ) -> Result<Enrollment, CoreError> {
        let current = self
            .get_enrollment(course_id)
            .ok_or(CoreError::NotFound("enrollment"))?;
        // validated locally so an out-of-range value never reaches the provider
        current.merged(&update, Utc::now())?;

        let record = {
            let _loading = self.loading.enter();
            self.provider.update_progress(course_id, &update).await?
        };
        let mut stored = record.normalize(Utc::now());
        stored.course_id = course_id.to_string();
        {
            let mut m = self.enrollments.write();
            if let Some(e) = m.iter_mut().find(|e| e.course_id == course_id) {
                *e = stored.clone();
            }
        }

        if stored.completed && self.ledger.certificate_for(course_id).is_none() {
            match self.issue_certificate(&stored).await {
                Ok(cert) => tracing::info!(course = %course_id, code = %cert.verification_code, "certificate issued"),
                Err(e) => tracing::warn!(course = %course_id, error = %e, "certificate not issued"),
            }
        }
        Ok(stored)
    }

    /// Returns the stored certificate for a completed course, issuing it if
    /// needed.
    pub async fn certificate(&self, course_id: &str) -> Result<Certificate, CoreError> {
        if let Some(cert) = self.ledger.certificate_for(course_id) {
            return Ok(cert);
        }
        let enrollment = self
            .get_enrollment(course_id)
            .ok_or(CoreError::NotFound("enrollment"))?;
        self.issue_certificate(&enrollment).await
    }

    async fn issue_certificate(&self, enrollment: &Enrollment) -> Result<Certificate, CoreError> {
        let course = self.provider.get_course(&enrollment.course_id).await?;
        let issued_at = enrollment.completed_at.unwrap_or_else(Utc::now);
        let cert = self.certificates.issue(&course, enrollment, issued_at)?;
        self.ledger.award(cert).await
    }

    /// Provider-side lookup. Errors degrade to "not enrolled".
    pub async fn check_enrollment(&self, course_id: &str) -> EnrollmentStatus {
        let _loading = self.loading.enter();
        match self.provider.check_enrollment(course_id).await {
            Ok(check) => EnrollmentStatus {
                is_enrolled: check.is_enrolled,
                enrollment: check.enrollment.map(|r| r.normalize(Utc::now())),
            },
            Err(e) => {
                tracing::warn!(course = %course_id, error = %e, "enrollment check failed");
                EnrollmentStatus::default()
            }
        }
    }

    pub fn is_enrolled_in_course(&self, course_id: &str) -> bool {
        self.enrollments.read().iter().any(|e| e.course_id == course_id)
    }

    pub fn get_enrollment(&self, course_id: &str) -> Option<Enrollment> {
        self.enrollments
            .read()
            .iter()
            .find(|e| e.course_id == course_id)
            .cloned()
    }

    pub fn enrollments(&self) -> Vec<Enrollment> {
        self.enrollments.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.active()
    }
}
