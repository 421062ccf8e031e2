use clap::{Args, Parser, Subcommand};
use learnhub_core::{CriteriaPatch, PricingMode, SortKey};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "learnhub", version, about = "LearnHub course marketplace CLI/API")]
pub struct Cli {
    /// SQLite database file (defaults to the built-in mock database)
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Session ledger file holding payments and certificates
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Base URL of a remote LearnHub API to use as the provider
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Milliseconds before a slow provider call is reported
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Name printed on certificates
    #[arg(long, global = true)]
    pub student: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Browse the course catalog
    #[command(subcommand)]
    Courses(CoursesCmd),
    /// Enroll in a course
    Enroll { course_id: String },
    /// List enrolled courses and progress
    Enrollments,
    /// Ask the provider whether you are enrolled in a course
    Check { course_id: String },
    /// Record course progress
    Progress(ProgressCmd),
    /// Pay for a premium course
    Pay { course_id: String },
    /// Earned certificates
    #[command(subcommand)]
    Certificates(CertificatesCmd),
    /// Ask the support chatbot
    Chat {
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Export the filtered catalog
    #[command(subcommand)]
    Export(ExportCmd),
    /// Launch Axum HTTP API
    Serve(ServeCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum CoursesCmd {
    List(FilterArgs),
    Show { course_id: String },
}

#[derive(Debug, Args, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub level: Option<String>,
    /// all, free or premium
    #[arg(long)]
    pub pricing: Option<PricingMode>,
    #[arg(long)]
    pub search: Option<String>,
    /// popular, rating, newest, price-low or price-high
    #[arg(long)]
    pub sort: Option<SortKey>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

impl FilterArgs {
    pub fn patch(&self) -> CriteriaPatch {
        CriteriaPatch {
            category: self.category.clone(),
            level: self.level.clone(),
            pricing: self.pricing,
            search: self.search.clone(),
            sort: self.sort,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct ProgressCmd {
    pub course_id: String,
    /// Overall completion, 0-100
    #[arg(long, allow_negative_numbers = true)]
    pub percent: Option<i64>,
    /// Mark a lesson as completed
    #[arg(long)]
    pub lesson: Option<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CertificatesCmd {
    List,
    Show { course_id: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json {
        path: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    Csv {
        path: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port); defaults to LEARNHUB_HTTP_ADDR
    #[arg(long)]
    pub addr: Option<String>,
}
