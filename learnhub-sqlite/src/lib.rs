use chrono::{DateTime, Utc};
use learnhub_core::{
    curriculum, derived_view, paginate, CoreError, Course, CourseId, CoursePage, CourseProvider,
    CourseQuery, CourseSource, EnrollAck, Enrollment, EnrollmentCheck, EnrollmentRecord,
    ProgressUpdate,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use std::time::Duration;

pub struct SqliteProvider {
    pool: SqlitePool,
}

const COURSE_COLUMNS: &str = "id,title,description,category,price,level,instructor,rating,\
                              enrolled_count,is_premium,created_at";
const ENROLLMENT_COLUMNS: &str =
    "course_id,progress,enrolled_at,completed,completed_at,completed_lessons,last_accessed_at";

impl SqliteProvider {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let provider = Self { pool };
        provider.ensure_schema().await?;
        Ok(provider)
    }

    /// A private in-memory database. One connection, since every SQLite
    /// memory connection is its own database.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let provider = Self { pool };
        provider.ensure_schema().await?;
        Ok(provider)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS courses (
          id              TEXT PRIMARY KEY,
          title           TEXT NOT NULL,
          description     TEXT NOT NULL DEFAULT '',
          category        TEXT NOT NULL DEFAULT '',
          price           INTEGER NOT NULL DEFAULT 0,
          level           TEXT NOT NULL DEFAULT '',
          instructor      TEXT NOT NULL DEFAULT '',
          rating          REAL,
          enrolled_count  INTEGER,
          is_premium      INTEGER NOT NULL DEFAULT 0,
          created_at      TEXT
        );

        CREATE TABLE IF NOT EXISTS enrollments (
          course_id          TEXT PRIMARY KEY,
          progress           INTEGER NOT NULL DEFAULT 0,
          enrolled_at        TEXT NOT NULL,
          completed          INTEGER NOT NULL DEFAULT 0,
          completed_at       TEXT,
          completed_lessons  TEXT NOT NULL DEFAULT '[]',
          last_accessed_at   TEXT,
          FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_courses_category ON courses (category);
        "#;

        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }

    /// Loads the built-in curriculum into an empty database. Returns the
    /// number of courses inserted.
    pub async fn seed_if_empty(&self) -> Result<usize, CoreError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM courses")
            .fetch_one(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("count courses"))?
            .get("n");
        if count > 0 {
            return Ok(0);
        }
        let courses = curriculum::seed_courses();
        for c in &courses {
            self.insert_course(c).await?;
        }
        tracing::info!(count = courses.len(), "seeded course catalog");
        Ok(courses.len())
    }

    pub async fn insert_course(&self, c: &Course) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO courses (
                 id, title, description, category, price, level, instructor, rating,
                 enrolled_count, is_premium, created_at
               )
               VALUES (?,?,?,?,?,?,?,?,?,?,?)"#,
        )
        .bind(&c.id)
        .bind(&c.title)
        .bind(&c.description)
        .bind(&c.category)
        .bind(c.price as i64)
        .bind(&c.level)
        .bind(&c.instructor)
        .bind(c.rating.map(f64::from))
        .bind(c.enrolled_count.map(|n| n as i64))
        .bind(bool_to_i(c.is_premium))
        .bind(c.created_at.map(dt_to_str))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Conflict("course already exists"))?;
        Ok(())
    }

    async fn find_enrollment(&self, id: &str) -> Result<Option<Enrollment>, CoreError> {
        let sql = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE course_id=?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read enrollment"))?;
        row.map(row_into_enrollment).transpose()
    }
}

#[async_trait::async_trait]
impl CourseProvider for SqliteProvider {
    // ===== Catalog =====
    async fn get_courses(&self, query: &CourseQuery) -> Result<CoursePage, CoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY rowid ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("list courses"))?;
        let mut all = Vec::with_capacity(rows.len());
        for row in rows {
            all.push(row_into_course(row)?);
        }
        let view = derived_view(&all, &query.to_criteria());
        Ok(paginate(view, query.page, query.limit))
    }

    async fn get_course(&self, id: &str) -> Result<Course, CoreError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id=?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read course"))?;
        let row = row.ok_or(CoreError::NotFound("course"))?;
        row_into_course(row)
    }

    // ===== Enrollment =====
    async fn enroll_course(&self, id: &str) -> Result<EnrollAck, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let exists = sqlx::query("SELECT 1 FROM courses WHERE id=? LIMIT 1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("read course"))?
            .is_some();
        if !exists {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("course"));
        }

        let res = sqlx::query(
            "INSERT OR IGNORE INTO enrollments (course_id, progress, enrolled_at) VALUES (?,0,?)",
        )
        .bind(id)
        .bind(dt_to_str(Utc::now()))
        .execute(&mut *tx)
        .await
        .map_err(|_| CoreError::Storage("insert enrollment"))?;
        let created = res.rows_affected() > 0;
        if created {
            sqlx::query("UPDATE courses SET enrolled_count = COALESCE(enrolled_count, 0) + 1 WHERE id=?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|_| CoreError::Storage("update course"))?;
        }
        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;

        let course = self.get_course(id).await?;
        let enrollment = self.find_enrollment(id).await?;
        Ok(EnrollAck {
            message: if created {
                "Successfully enrolled in course".to_string()
            } else {
                "Already enrolled in this course".to_string()
            },
            course: Some(course),
            enrollment: enrollment.as_ref().map(EnrollmentRecord::from),
        })
    }

    async fn get_enrolled_courses(&self) -> Result<Vec<EnrollmentRecord>, CoreError> {
        let sql = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments ORDER BY enrolled_at ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("list enrollments"))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(EnrollmentRecord::from(&row_into_enrollment(row)?));
        }
        Ok(v)
    }

    async fn check_enrollment(&self, id: &str) -> Result<EnrollmentCheck, CoreError> {
        let found = self.find_enrollment(id).await?;
        Ok(EnrollmentCheck {
            is_enrolled: found.is_some(),
            enrollment: found.as_ref().map(EnrollmentRecord::from),
        })
    }

    async fn update_progress(
        &self,
        id: &str,
        data: &ProgressUpdate,
    ) -> Result<EnrollmentRecord, CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        // no-op write first: takes the write lock before the read, so
        // concurrent updates serialize instead of overwriting each other
        let touched = sqlx::query("UPDATE enrollments SET progress=progress WHERE course_id=?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("lock enrollment"))?
            .rows_affected();
        if touched == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("enrollment"));
        }

        let sql = format!("SELECT {ENROLLMENT_COLUMNS} FROM enrollments WHERE course_id=?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("read enrollment"))?;
        let current = row_into_enrollment(row)?;
        let next = match current.merged(data, Utc::now()) {
            Ok(next) => next,
            Err(e) => {
                tx.rollback().await.ok();
                return Err(e);
            }
        };
        let lessons = serde_json::to_string(&next.completed_lessons)
            .map_err(|_| CoreError::Invalid("completed lessons"))?;
        sqlx::query(
            r#"UPDATE enrollments SET
                 progress=?, completed=?, completed_at=?, completed_lessons=?, last_accessed_at=?
               WHERE course_id=?"#,
        )
        .bind(i64::from(next.progress))
        .bind(bool_to_i(next.completed))
        .bind(next.completed_at.map(dt_to_str))
        .bind(lessons)
        .bind(next.last_accessed_at.map(dt_to_str))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|_| CoreError::Storage("update enrollment"))?;
        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))?;
        Ok(EnrollmentRecord::from(&next))
    }
}

// ===== Helpers =====
fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|_| CoreError::Invalid("datetime"))
        .map(|dt| dt.with_timezone(&Utc))
}

fn bool_to_i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn row_into_course(row: sqlx::sqlite::SqliteRow) -> Result<Course, CoreError> {
    Ok(Course {
        id: row.get::<String, _>("id"),
        title: row.get::<String, _>("title"),
        description: row.get::<String, _>("description"),
        category: row.get::<String, _>("category"),
        price: row.get::<i64, _>("price").max(0) as u64,
        level: row.get::<String, _>("level"),
        instructor: row.get::<String, _>("instructor"),
        rating: row.get::<Option<f64>, _>("rating").map(|r| r as f32),
        enrolled_count: row
            .get::<Option<i64>, _>("enrolled_count")
            .map(|n| n.max(0) as u64),
        is_premium: row.get::<i64, _>("is_premium") != 0,
        created_at: row
            .get::<Option<String>, _>("created_at")
            .map(dt_from_str)
            .transpose()?,
        source: CourseSource::Provider,
    })
}

fn row_into_enrollment(row: sqlx::sqlite::SqliteRow) -> Result<Enrollment, CoreError> {
    let lessons_json: String = row.get("completed_lessons");
    let completed_lessons: Vec<String> = serde_json::from_str(&lessons_json).unwrap_or_default();
    let course_id: CourseId = row.get("course_id");
    Ok(Enrollment {
        course_id,
        progress: row.get::<i64, _>("progress").clamp(0, 100) as u8,
        enrolled_at: dt_from_str(row.get::<String, _>("enrolled_at"))?,
        completed: row.get::<i64, _>("completed") != 0,
        completed_at: row
            .get::<Option<String>, _>("completed_at")
            .map(dt_from_str)
            .transpose()?,
        completed_lessons,
        last_accessed_at: row
            .get::<Option<String>, _>("last_accessed_at")
            .map(dt_from_str)
            .transpose()?,
    })
}
