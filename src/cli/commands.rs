use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bsync", about = concat!("bsync v", env!("CARGO_PKG_VERSION"), " - boards that stay put while you drag"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different board directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create boardsync.toml and an empty board in the current directory
    Init(InitArgs),
    /// Print the board, or one calendar day
    Show(ShowArgs),
    /// Validate board structure
    Check,
    /// Drag a card (or a list) and drop it somewhere
    Drag(DragArgs),
    /// Add a card to the bottom of a list
    Add(AddArgs),
    /// Add a list to the end of the board
    AddList(AddListArgs),
    /// Change card fields, or rename a list
    Set(SetArgs),
    /// Delete a card or a list
    Rm(RmArgs),
    /// Show logged failure notices
    Notices(NoticesArgs),
    /// Follow the board file and print it whenever it changes
    Watch,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Board title (default: inferred from directory name)
    #[arg(long)]
    pub title: Option<String>,
    /// Create an initial list: --list <id> "title" (repeatable)
    #[arg(long, num_args = 2, value_names = ["ID", "TITLE"], action = clap::ArgAction::Append)]
    pub list: Vec<String>,
    /// Overwrite an existing board
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Show one calendar bucket instead: YYYY-MM-DD or "unscheduled"
    #[arg(long)]
    pub calendar: Option<String>,
}

#[derive(Args)]
pub struct NoticesArgs {
    /// Show only the N most recent
    #[arg(long)]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DragArgs {
    /// Card id (or list id with --list)
    pub id: String,
    /// Droppable to drop on: a list id, "board", "calendar:YYYY-MM-DD" or
    /// "calendar:unscheduled". Omit to drop outside any droppable.
    #[arg(long)]
    pub to: Option<String>,
    /// Position inside the droppable
    #[arg(long, default_value = "0")]
    pub index: usize,
    /// Drag a list instead of a card
    #[arg(long)]
    pub list: bool,
    /// Select these cards before dragging (repeatable)
    #[arg(long)]
    pub select: Vec<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// List to add to
    pub list: String,
    /// Card title
    pub title: String,
    /// Card id (default: next free c<N>)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct AddListArgs {
    pub id: String,
    pub title: String,
}

#[derive(Args)]
pub struct SetArgs {
    /// Card id (or list id with --list)
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    /// Description; empty string clears it
    #[arg(long)]
    pub description: Option<String>,
    /// Calendar day YYYY-MM-DD, or "none" to unschedule
    #[arg(long)]
    pub date: Option<String>,
    /// Rename a list instead of editing a card
    #[arg(long)]
    pub list: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Card id (or list id with --list)
    pub id: String,
    /// Delete a list and every card in it
    #[arg(long)]
    pub list: bool,
}
