use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use deskboard_core::VERSION;

use crate::ui::FormatFlag;

/// Deskboard - an encrypted, single-file business dashboard for the terminal
#[derive(Parser)]
#[command(name = "deskboard")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the store file
    #[arg(short, long, global = true, env = "DESKBOARD_PATH")]
    pub store: Option<String>,

    /// Act as this user (defaults to [session] user in the config)
    #[arg(short, long, global = true, env = "DESKBOARD_USER")]
    pub user: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, value_name = "DATE")]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Never prompt; fail instead
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Output flags shared by read commands.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatFlag>,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the store will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// IANA timezone used to decide what "today" is
    #[arg(long)]
    pub timezone: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user
    Add {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List users
    List(OutputArgs),
}

#[derive(Args)]
pub struct MatterAddArgs {
    /// Matter reference, e.g. a case number
    #[arg(value_name = "REFERENCE")]
    pub reference: String,

    /// Client name
    #[arg(value_name = "CLIENT")]
    pub client: String,

    #[arg(long, default_value = "")]
    pub category: String,

    /// Starting stage
    #[arg(long, default_value = "intake")]
    pub stage: String,

    #[arg(long, default_value = "normal")]
    pub priority: String,

    /// Date the matter was opened (default: today)
    #[arg(long, value_name = "DATE")]
    pub opened: Option<String>,

    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct MatterListArgs {
    /// Only matters in this stage
    #[arg(long)]
    pub stage: Option<String>,

    /// Only matters with this SLA status (e.g. at_risk, overdue)
    #[arg(long)]
    pub status: Option<String>,

    /// Hide completed matters
    #[arg(long)]
    pub open: bool,

    #[arg(long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct MatterUpdateArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub client: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Move to this stage
    #[arg(long)]
    pub stage: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    #[arg(long)]
    pub assignee: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Date of the stage change (default: today)
    #[arg(long, value_name = "DATE")]
    pub on: Option<String>,
}

#[derive(Subcommand)]
pub enum MatterCommand {
    /// Open a new matter
    Add(MatterAddArgs),
    /// List matters with their SLA status
    List(MatterListArgs),
    /// Show one matter
    Show {
        #[arg(value_name = "ID")]
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change a matter's details or stage
    Update(MatterUpdateArgs),
    /// Mark a matter completed
    Complete {
        #[arg(value_name = "ID")]
        id: String,
        /// Completion date (default: today)
        #[arg(long, value_name = "DATE")]
        on: Option<String>,
    },
    /// Delete a matter
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// SLA status counts and thresholds
    Sla(OutputArgs),
}

#[derive(Args)]
pub struct LeaveAddArgs {
    /// Leave type (annual, sick, compassionate, unpaid, other)
    #[arg(value_name = "TYPE")]
    pub leave_type: String,

    /// First day
    #[arg(value_name = "START")]
    pub start: String,

    /// Last day (default: same as start)
    #[arg(value_name = "END")]
    pub end: Option<String>,

    /// Half a day (start and end must match)
    #[arg(long)]
    pub half_day: bool,

    #[arg(long, default_value = "pending")]
    pub status: String,

    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct LeaveUpdateArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long = "type")]
    pub leave_type: Option<String>,

    #[arg(long)]
    pub start: Option<String>,

    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Subcommand)]
pub enum LeaveCommand {
    /// Record leave
    Add(LeaveAddArgs),
    /// List leave
    List {
        /// Only leave touching this year
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Change status, dates or reason
    Update(LeaveUpdateArgs),
    /// Delete leave
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Days taken, pending and remaining per type
    Summary {
        #[arg(long)]
        year: Option<i32>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
pub struct MeetingAddArgs {
    #[arg(value_name = "TITLE")]
    pub title: String,

    /// Start time (RFC 3339 or "YYYY-MM-DD HH:MM" in the configured timezone)
    #[arg(long, value_name = "WHEN")]
    pub at: String,

    /// Length (e.g. 30m, 1h, 1h30m)
    #[arg(long, default_value = "30m")]
    pub duration: String,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long = "attendee", value_name = "NAME")]
    pub attendees: Vec<String>,

    #[arg(long)]
    pub agenda: Option<String>,
}

#[derive(Subcommand)]
pub enum MeetingCommand {
    /// Schedule a meeting
    Add(MeetingAddArgs),
    /// List meetings
    List {
        /// Include past and cancelled meetings
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Meetings starting soon
    Upcoming {
        /// Look-ahead window (e.g. 7d, 2w)
        #[arg(long, default_value = "7d")]
        within: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Cancel a meeting (kept for the record)
    Cancel {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Delete a meeting
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Write a note (body from --body or stdin)
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long)]
        body: Option<String>,
        #[arg(short, long, value_name = "TAG")]
        tag: Vec<String>,
        #[arg(long)]
        pin: bool,
    },
    /// List notes, pinned first
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        pinned: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a note
    Show {
        #[arg(value_name = "ID")]
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Full-text search over notes
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a note
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum NetWorthCommand {
    /// Log a balance
    Add {
        /// asset, loan or saving
        #[arg(value_name = "TYPE")]
        entry_type: String,
        #[arg(value_name = "LABEL")]
        label: String,
        #[arg(value_name = "AMOUNT", allow_hyphen_values = true)]
        amount: String,
        /// Date of the balance (default: today)
        #[arg(long, value_name = "DATE")]
        on: Option<String>,
    },
    /// List logged balances, newest first
    List {
        #[arg(long = "type")]
        entry_type: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Latest balance per label and the totals
    Summary {
        /// Ignore entries logged after this date
        #[arg(long, value_name = "DATE")]
        as_of: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Month-end totals
    History {
        #[arg(long, default_value_t = 6)]
        months: u32,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a logged balance
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectTaskCommand {
    /// Add a task to a project
    Add {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Set a task's status (todo, in_progress, done)
    Status {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TASK")]
        task: String,
        #[arg(value_name = "STATUS")]
        status: String,
    },
    /// Remove a task
    Remove {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TASK")]
        task: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// List projects
    List {
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a project with tasks, notes and blockers
    Show {
        #[arg(value_name = "ID")]
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Projects grouped by status
    Board(OutputArgs),
    /// Change a project's name, status or due date
    Update {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Manage project tasks
    #[command(subcommand)]
    Task(ProjectTaskCommand),
    /// Add a note to a project
    Note {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "TEXT")]
        body: String,
    },
    /// Raise a blocker
    Block {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "DESCRIPTION")]
        description: String,
        #[arg(long, value_name = "DATE")]
        on: Option<String>,
    },
    /// Resolve a blocker
    Unblock {
        #[arg(value_name = "PROJECT")]
        project: String,
        #[arg(value_name = "BLOCKER")]
        blocker: String,
        #[arg(long, value_name = "DATE")]
        on: Option<String>,
    },
    /// Delete a project
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum WorkflowStepCommand {
    /// Add a step (column)
    Add {
        #[arg(value_name = "NAME")]
        name: String,
        /// Sort position (default: after the last step)
        #[arg(long, allow_hyphen_values = true)]
        position: Option<i32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List steps in board order
    List(OutputArgs),
    /// Delete a step
    Delete {
        #[arg(value_name = "ID")]
        id: String,
        /// Also delete the step's tasks
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum WorkflowTaskCommand {
    /// Add a task to a step
    Add {
        #[arg(value_name = "STEP")]
        step: String,
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },
    /// Mark a task done
    Done {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Move a task to another step
    Move {
        #[arg(value_name = "ID")]
        id: String,
        /// Target step (default: the next step on the board)
        #[arg(long, value_name = "STEP")]
        to: Option<String>,
    },
    /// Delete a task
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommand {
    /// Manage steps
    #[command(subcommand)]
    Step(WorkflowStepCommand),
    /// Manage tasks
    #[command(subcommand)]
    Task(WorkflowTaskCommand),
    /// Steps with their tasks
    Board(OutputArgs),
}

#[derive(Subcommand)]
pub enum GtciCommand {
    /// Import scores from a JSON file
    Import {
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Ranked report for one year
    Report {
        /// Report year (default: latest imported)
        #[arg(long)]
        year: Option<i32>,
        /// Only the top N countries
        #[arg(long)]
        top: Option<usize>,
        /// Detail for one country
        #[arg(long)]
        country: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Portable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Jsonl,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new encrypted store and its first user (named by --user)
    Init(InitArgs),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Matters and SLA tracking
    #[command(subcommand)]
    Matter(MatterCommand),

    /// Leave tracking
    #[command(subcommand)]
    Leave(LeaveCommand),

    /// Meeting schedule
    #[command(subcommand)]
    Meeting(MeetingCommand),

    /// Notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Net-worth tracking
    #[command(subcommand, name = "networth")]
    NetWorth(NetWorthCommand),

    /// Project board
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Workflow board
    #[command(subcommand)]
    Workflow(WorkflowCommand),

    /// Global Talent Competitiveness Index report
    #[command(subcommand)]
    Gtci(GtciCommand),

    /// Overview across every view
    Dashboard(OutputArgs),

    /// Full-text search across all records
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
        /// Only this record kind (e.g. matter, note)
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Export your records (portable formats, you own your data)
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
        /// Only this record kind
        #[arg(long)]
        kind: Option<String>,
    },

    /// Check store integrity
    Check,

    /// Back up the store file
    Backup {
        /// Destination path
        #[arg(value_name = "DEST")]
        destination: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_nested_project_task() {
        let cli = Cli::try_parse_from([
            "deskboard", "project", "task", "status", "abcd", "ef01", "done",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Project(ProjectCommand::Task(ProjectTaskCommand::Status {
                status,
                ..
            }))) => assert_eq!(status, "done"),
            _ => panic!("unexpected parse"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "deskboard", "dashboard", "--json", "--today", "2025-01-02", "--user", "alice",
        ])
        .unwrap();
        assert_eq!(cli.today.as_deref(), Some("2025-01-02"));
        assert_eq!(cli.user.as_deref(), Some("alice"));
        match cli.command {
            Some(Commands::Dashboard(output)) => assert!(output.json),
            _ => panic!("unexpected parse"),
        }
    }

    #[test]
    fn test_negative_amount_is_accepted() {
        let cli =
            Cli::try_parse_from(["deskboard", "networth", "add", "asset", "Broker", "-5.00"]);
        assert!(cli.is_ok());
    }
}
