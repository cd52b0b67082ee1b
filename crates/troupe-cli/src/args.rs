use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use troupe_core::models::{PlanFilter, PlanStatus};

/// Command-line access to troupe collaboration plans
///
/// Plans are created, analysed and executed by a service embedding the
/// troupe engine. This tool reads and maintains the plan database that the
/// engine writes through to.
#[derive(Parser)]
#[command(version, about, name = "troupe")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/troupe/troupe.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage collaboration plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show plan counts
    Stats(StatsArgs),
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a draft plan for a goal
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// List stored plans, newest first
    #[command(aliases = ["l", "ls"])]
    List(ListPlansArgs),
    /// Show a plan with its analysis and modes
    #[command(alias = "s")]
    Show(PlanIdArgs),
    /// Show the outcome of a plan's last execution
    #[command(alias = "r")]
    Result(PlanIdArgs),
    /// Delete a plan owned by a user
    #[command(aliases = ["d", "rm"])]
    Delete(DeletePlanArgs),
}

#[derive(ClapArgs)]
pub struct CreatePlanArgs {
    /// Owner of the plan
    pub user: String,
    /// What the collaboration should achieve
    pub goal: String,
    /// Project to scope the plan to
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(ClapArgs)]
pub struct ListPlansArgs {
    /// Only plans owned by this user
    #[arg(short, long)]
    pub user: Option<String>,
    /// Only plans in this status (draft, ready, executing, completed, failed)
    #[arg(short, long)]
    pub status: Option<PlanStatus>,
    /// Maximum number of plans to show
    #[arg(long)]
    pub limit: Option<u32>,
    /// Number of plans to skip
    #[arg(long)]
    pub offset: Option<u32>,
}

impl From<ListPlansArgs> for PlanFilter {
    fn from(val: ListPlansArgs) -> Self {
        PlanFilter {
            user_id: val.user,
            status: val.status,
            limit: val.limit,
            offset: val.offset,
        }
    }
}

#[derive(ClapArgs)]
pub struct PlanIdArgs {
    /// Plan identifier, e.g. collab_5f0c…
    pub id: String,
}

#[derive(ClapArgs)]
pub struct DeletePlanArgs {
    /// Plan identifier
    pub id: String,
    /// Owner of the plan; plans owned by others are left alone
    #[arg(short, long)]
    pub user: String,
}

#[derive(ClapArgs)]
pub struct StatsArgs {
    /// Show counts for one user instead of the whole database
    #[arg(short, long)]
    pub user: Option<String>,
}
