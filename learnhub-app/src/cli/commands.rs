use crate::api::server as api_server;
use crate::cli::opts::*;
use crate::config::AppConfig;
use crate::context::AppContext;

use anyhow::{bail, Result};
use chrono::Utc;
use learnhub_core::{
    chatbot, paginate, purchase, race_with_timeout, CoreError, Course, Criteria, ProgressUpdate,
    PurchaseOutcome, Raced,
};
use std::path::Path;

pub async fn run_cli(args: Cli, config: AppConfig) -> Result<()> {
    if let Command::Chat { message } = &args.cmd {
        return chat_cmd(&message.join(" "));
    }

    let ctx = AppContext::open(&config).await?;
    match args.cmd {
        Command::Serve(s) => {
            let addr = match s.addr {
                Some(a) => a.parse::<std::net::SocketAddr>()?,
                None => config.http_addr,
            };
            api_server::run(ctx.provider.clone(), addr).await
        }
        Command::Courses(CoursesCmd::List(f)) => list_courses(&ctx, f).await,
        Command::Courses(CoursesCmd::Show { course_id }) => show_course(&ctx, &course_id).await,
        Command::Enroll { course_id } => enroll_cmd(&ctx, &course_id).await,
        Command::Enrollments => enrollments_cmd(&ctx).await,
        Command::Check { course_id } => {
            let status = ctx.enrollments.check_enrollment(&course_id).await;
            match status.enrollment {
                Some(e) if status.is_enrolled => {
                    println!("enrolled\tprogress={}%\tcompleted={}", e.progress, e.completed)
                }
                _ if status.is_enrolled => println!("enrolled"),
                _ => println!("not enrolled"),
            }
            Ok(())
        }
        Command::Progress(p) => progress_cmd(&ctx, p).await,
        Command::Pay { course_id } => pay_cmd(&ctx, &course_id).await,
        Command::Certificates(c) => certificates_cmd(&ctx, c).await,
        Command::Export(e) => export_cmd(&ctx, e).await,
        Command::Chat { message } => chat_cmd(&message.join(" ")),
    }
}

/// Loads the catalog for `filters`. A slow provider is reported once the
/// deadline passes, then awaited to completion.
async fn load_catalog(ctx: &AppContext, filters: &FilterArgs) -> Result<Vec<Course>> {
    ctx.catalog.set_criteria(filters.patch());
    let criteria: Criteria = ctx.catalog.criteria();
    let catalog = ctx.catalog.clone();
    let task = async move { catalog.load_courses(&criteria).await };

    match race_with_timeout(task, ctx.timeout).await? {
        Raced::Done(_) => {}
        Raced::TimedOut(pending) => {
            eprintln!(
                "courses are still loading after {} ms, waiting...",
                ctx.timeout.as_millis()
            );
            pending.wait().await?;
        }
    }
    if ctx.catalog.is_fallback() {
        eprintln!("(course service unavailable, showing the built-in catalog)");
    }
    Ok(ctx.catalog.derived_view())
}

async fn list_courses(ctx: &AppContext, f: FilterArgs) -> Result<()> {
    let view = load_catalog(ctx, &f).await?;
    let page = paginate(view, f.page, f.limit);
    if page.courses.is_empty() {
        println!("no courses match");
        return Ok(());
    }
    for c in &page.courses {
        println!(
            "{}\t{}\t{}\t{}\t{}\trating={}\tstudents={}{}",
            c.id,
            c.title,
            c.category,
            c.level,
            fmt_price(c.price),
            c.rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".into()),
            c.enrolled_count.unwrap_or(0),
            if c.is_premium { "\tpremium" } else { "" },
        );
    }
    if let Some(p) = page.pagination {
        println!("page {}/{} ({} courses)", p.page, p.pages.max(1), p.total);
    }
    Ok(())
}

async fn show_course(ctx: &AppContext, course_id: &str) -> Result<()> {
    let c = ctx.provider.get_course(course_id).await?;
    println!("{}  [{}]", c.title, c.id);
    println!("{}", c.description);
    println!("category: {}\tlevel: {}\tinstructor: {}", c.category, c.level, c.instructor);
    println!("price: {}{}", fmt_price(c.price), if c.is_premium { " (premium)" } else { "" });
    if let Some(r) = c.rating {
        println!("rating: {r:.1}");
    }
    let status = ctx.enrollments.check_enrollment(&c.id).await;
    if let Some(e) = status.enrollment.filter(|_| status.is_enrolled) {
        println!("enrolled: {}% complete", e.progress);
    } else if c.is_premium && !ctx.ledger.has_paid(&c.id) {
        println!("not enrolled (payment required: `learnhub pay {}`)", c.id);
    } else {
        println!("not enrolled");
    }
    Ok(())
}

async fn enroll_cmd(ctx: &AppContext, course_id: &str) -> Result<()> {
    match ctx.enrollments.enroll(course_id).await {
        Ok(e) => {
            println!("enrolled in {} ({}% complete)", e.course_id, e.progress);
            Ok(())
        }
        Err(CoreError::PaymentRequired(id)) => {
            bail!("{id} is a premium course; run `learnhub pay {id}` first")
        }
        Err(e) => Err(e.into()),
    }
}

async fn enrollments_cmd(ctx: &AppContext) -> Result<()> {
    let list = ctx.enrollments.refresh().await?;
    if list.is_empty() {
        println!("no enrollments");
        return Ok(());
    }
    for e in list {
        println!(
            "{}\t{}%\tlessons={}\tenrolled={}{}",
            e.course_id,
            e.progress,
            e.completed_lessons.len(),
            e.enrolled_at.format("%Y-%m-%d"),
            if e.completed { "\tcompleted" } else { "" },
        );
    }
    Ok(())
}

async fn progress_cmd(ctx: &AppContext, p: ProgressCmd) -> Result<()> {
    if p.percent.is_none() && p.lesson.is_none() {
        bail!("nothing to record: pass --percent and/or --lesson");
    }
    if let Err(e) = ctx.enrollments.refresh().await {
        tracing::warn!(error = %e, "could not refresh enrollments before progress update");
    }
    let update = ProgressUpdate {
        progress: p.percent,
        completed_lesson: p.lesson,
    };
    let e = match ctx.enrollments.update_progress(&p.course_id, update).await {
        Ok(e) => e,
        Err(CoreError::NotFound(_)) => bail!("not enrolled in {}", p.course_id),
        Err(e) => return Err(e.into()),
    };
    println!("{}: {}% complete", e.course_id, e.progress);
    if e.completed {
        if let Some(cert) = ctx.ledger.certificate_for(&e.course_id) {
            println!("certificate earned: {}", cert.verification_code);
        }
    }
    Ok(())
}

async fn pay_cmd(ctx: &AppContext, course_id: &str) -> Result<()> {
    let course = ctx.provider.get_course(course_id).await?;
    match purchase(ctx.gateway.as_ref(), &ctx.ledger, &course).await? {
        PurchaseOutcome::Paid(r) => println!(
            "paid {} for {} (receipt {})",
            fmt_price(r.amount),
            course.title,
            r.checkout_id
        ),
        PurchaseOutcome::AlreadyPaid => println!("{} is already paid for", course.title),
    }
    Ok(())
}

async fn certificates_cmd(ctx: &AppContext, cmd: CertificatesCmd) -> Result<()> {
    match cmd {
        CertificatesCmd::List => {
            let certs = ctx.ledger.certificates();
            if certs.is_empty() {
                println!("no certificates yet");
            }
            for c in certs {
                println!(
                    "{}\t{}\t{}\t{}",
                    c.course_id,
                    c.course_title,
                    c.issued_at.format("%Y-%m-%d"),
                    c.verification_code
                );
            }
        }
        CertificatesCmd::Show { course_id } => {
            if ctx.ledger.certificate_for(&course_id).is_none() {
                ctx.enrollments.refresh().await?;
            }
            let cert = ctx.enrollments.certificate(&course_id).await?;
            print!("{}", cert.render_text());
        }
    }
    Ok(())
}

fn chat_cmd(message: &str) -> Result<()> {
    let reply = chatbot::respond(message);
    println!("[{}] {}", reply.category.as_str(), reply.response);
    Ok(())
}

async fn export_cmd(ctx: &AppContext, cmd: ExportCmd) -> Result<()> {
    match cmd {
        ExportCmd::Json { path, filters } => {
            let courses = load_catalog(ctx, &filters).await?;
            let bundle = ExportBundle {
                version: 1,
                exported_at: Utc::now(),
                criteria: ctx.catalog.criteria(),
                fallback: ctx.catalog.is_fallback(),
                courses,
            };
            std::fs::write(&path, serde_json::to_string_pretty(&bundle)?)?;
            report_written(&path, bundle.courses.len());
        }
        ExportCmd::Csv { path, filters } => {
            let courses = load_catalog(ctx, &filters).await?;
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record([
                "id", "title", "category", "level", "instructor", "price", "rating",
                "enrolled_count", "is_premium", "source",
            ])?;
            for c in &courses {
                wtr.write_record([
                    c.id.clone(),
                    c.title.clone(),
                    c.category.clone(),
                    c.level.clone(),
                    c.instructor.clone(),
                    c.price.to_string(),
                    c.rating.map(|r| r.to_string()).unwrap_or_default(),
                    c.enrolled_count.map(|n| n.to_string()).unwrap_or_default(),
                    if c.is_premium { "1".to_string() } else { "0".to_string() },
                    if c.is_fallback() { "fallback".to_string() } else { "provider".to_string() },
                ])?;
            }
            wtr.flush()?;
            report_written(&path, courses.len());
        }
    }
    Ok(())
}

// ===== Helpers =====
fn fmt_price(minor: u64) -> String {
    if minor == 0 {
        "Free".to_string()
    } else {
        format!("${}.{:02}", minor / 100, minor % 100)
    }
}

fn report_written(path: &Path, count: usize) {
    println!("wrote {} courses to {}", count, path.display());
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportBundle {
    version: u32,
    exported_at: chrono::DateTime<Utc>,
    criteria: Criteria,
    fallback: bool,
    courses: Vec<Course>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_render_in_dollars() {
        assert_eq!(fmt_price(0), "Free");
        assert_eq!(fmt_price(4999), "$49.99");
        assert_eq!(fmt_price(100), "$1.00");
    }
}
