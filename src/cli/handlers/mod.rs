mod init;
pub use init::cmd_init;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::board_io::{read_board, FileStore};
use crate::io::config_io;
use crate::io::notice_log;
use crate::io::watcher::BoardWatcher;
use crate::model::board::Board;
use crate::model::card::CardPatch;
use crate::model::config::SyncConfig;
use crate::model::mutation::Mutation;
use crate::ops::{calendar_ops, check};
use crate::sync::drop_target::{DragEvent, DragKind, DragStart, DropLocation, Droppable};
use crate::sync::{DragOutcome, SyncEngine};

type CmdResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = start_dir(cli.board_dir.as_deref())?;

    match cli.command {
        Commands::Init(args) => cmd_init(&start, args),

        // Read commands
        Commands::Show(args) => cmd_show(&load_context(&start)?, args, json),
        Commands::Check => cmd_check(&load_context(&start)?, json),
        Commands::Notices(args) => cmd_notices(&load_context(&start)?, args, json),
        Commands::Watch => cmd_watch(&load_context(&start)?, json),

        // Write commands
        Commands::Drag(args) => cmd_drag(&load_context(&start)?, args, json),
        Commands::Add(args) => cmd_add(&load_context(&start)?, args, json),
        Commands::AddList(args) => cmd_add_list(&load_context(&start)?, args, json),
        Commands::Set(args) => cmd_set(&load_context(&start)?, args, json),
        Commands::Rm(args) => cmd_rm(&load_context(&start)?, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A discovered board directory and its configuration
struct BoardContext {
    root: PathBuf,
    config: SyncConfig,
    board_path: PathBuf,
}

impl BoardContext {
    fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.config.sync.settle_timeout_ms)
    }
}

fn start_dir(board_dir: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    match board_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn load_context(start: &Path) -> Result<BoardContext, Box<dyn Error>> {
    let root = config_io::discover_root(start)?;
    let config = config_io::load_config(&root)?;
    let board_path = config_io::board_path(&root, &config);
    debug!(root = %root.display(), board = %board_path.display(), "board directory found");
    Ok(BoardContext {
        root,
        config,
        board_path,
    })
}

/// Start an engine on the board file and wait for the first fetch.
fn open_engine(ctx: &BoardContext) -> Result<SyncEngine, Box<dyn Error>> {
    let store = FileStore::new(&ctx.board_path);
    let mut engine = SyncEngine::new(store, ctx.config.calendar);
    engine.wait_idle(ctx.settle_timeout())?;
    if let Some(notice) = engine.take_notices().into_iter().next() {
        return Err(notice.message.into());
    }
    if engine.current().is_none() {
        return Err(format!("could not load {}", ctx.board_path.display()).into());
    }
    Ok(engine)
}

fn current_board(engine: &SyncEngine) -> Result<Board, Box<dyn Error>> {
    engine
        .current()
        .cloned()
        .ok_or_else(|| "no board loaded".into())
}

fn print_board(board: &Board) {
    for line in format_board(board) {
        println!("{}", line);
    }
}

/// Wait for remote calls to settle, log and print what happened.
///
/// Returns an error when any mutation was rolled back.
fn settle(ctx: &BoardContext, engine: &mut SyncEngine, json: bool, drag: Option<&DragOutcome>) -> CmdResult {
    engine.wait_idle(ctx.settle_timeout())?;
    let notices = engine.take_notices();
    if ctx.config.sync.log_notices {
        notice_log::log_notices(&ctx.root, &notices);
    }

    let result = WriteJson {
        board: engine.current(),
        notices: &notices,
    };
    if json {
        match drag {
            Some(outcome) => {
                let (mutation_id, reason) = match outcome {
                    DragOutcome::Dispatched(id) => (Some(*id), None),
                    DragOutcome::Ignored(reason) => (None, Some(reason.as_str())),
                    _ => (None, None),
                };
                let out = DragJson {
                    outcome: outcome_name(outcome),
                    mutation_id,
                    reason,
                    result,
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
            None => println!("{}", serde_json::to_string_pretty(&result)?),
        }
    } else {
        if let Some(outcome) = drag
            && !matches!(outcome, DragOutcome::Dispatched(_))
        {
            match outcome {
                DragOutcome::Ignored(reason) => println!("drop ignored: {}", reason),
                other => println!("drop {}", outcome_name(other)),
            }
        }
        if let Some(board) = engine.current() {
            print_board(board);
        }
    }

    if notices.is_empty() {
        Ok(())
    } else {
        for notice in &notices {
            eprintln!("{}", notice);
        }
        Err(format!("{} change(s) rolled back", notices.len()).into())
    }
}

fn run_mutation(ctx: &BoardContext, mutation: Mutation, json: bool) -> CmdResult {
    let mut engine = open_engine(ctx)?;
    engine.mutate(mutation);
    settle(ctx, &mut engine, json, None)
}

/// "YYYY-MM-DD" or "unscheduled"/"none"
fn parse_bucket(s: &str) -> Result<Option<NaiveDate>, Box<dyn Error>> {
    match s {
        "unscheduled" | "none" => Ok(None),
        _ => Ok(Some(
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("invalid date: {}", s))?,
        )),
    }
}

/// First `c<N>` id not on the board, counting up from the card count
fn next_card_id(board: &Board) -> String {
    (board.card_count() + 1..)
        .map(|n| format!("c{}", n))
        .find(|id| board.card(id).is_none())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_show(ctx: &BoardContext, args: ShowArgs, json: bool) -> CmdResult {
    let board = read_board(&ctx.board_path)?;
    match args.calendar {
        Some(bucket) => {
            let date = parse_bucket(&bucket)?;
            let cards = calendar_ops::bucket_view(&board, date);
            if json {
                println!("{}", serde_json::to_string_pretty(&BucketJson { date, cards })?);
            } else {
                for line in format_bucket(date, &cards) {
                    println!("{}", line);
                }
            }
        }
        None => {
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(&board);
            }
        }
    }
    Ok(())
}

fn cmd_check(ctx: &BoardContext, json: bool) -> CmdResult {
    let board = read_board(&ctx.board_path)?;
    let result = check::check(&board);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            println!("  {}", format_check_error(err));
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  {}", format_check_warning(warn));
        }
    }
    if result.valid {
        println!("✓ board is valid");
    } else {
        println!("✗ board has errors");
    }
    Ok(())
}

fn cmd_notices(ctx: &BoardContext, args: NoticesArgs, json: bool) -> CmdResult {
    let notices = notice_log::read_notices(&ctx.root, args.limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&notices)?);
    } else if notices.is_empty() {
        println!("no notices");
    } else {
        for notice in &notices {
            println!("{}", format_notice(notice));
        }
    }
    Ok(())
}

fn cmd_watch(ctx: &BoardContext, json: bool) -> CmdResult {
    let watcher = BoardWatcher::start(&ctx.board_path)?;
    let mut engine = open_engine(ctx)?;
    let mut shown: Option<Board> = None;
    loop {
        if !watcher.poll().is_empty() {
            engine.invalidate();
        }
        engine.poll();
        for notice in engine.take_notices() {
            eprintln!("{}", notice);
        }
        if let Some(board) = engine.current()
            && shown.as_ref() != Some(board)
        {
            if json {
                println!("{}", serde_json::to_string(board)?);
            } else {
                print_board(board);
                println!();
            }
            shown = Some(board.clone());
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_drag(ctx: &BoardContext, args: DragArgs, json: bool) -> CmdResult {
    let mut engine = open_engine(ctx)?;
    let board = current_board(&engine)?;

    let kind = if args.list { DragKind::List } else { DragKind::Card };
    let source = match kind {
        DragKind::List => {
            let index = board
                .list_position(&args.id)
                .ok_or_else(|| format!("list not found: {}", args.id))?;
            DropLocation::new(Droppable::Board, index)
        }
        DragKind::Card => {
            let loc = board
                .locate_card(&args.id)
                .ok_or_else(|| format!("card not found: {}", args.id))?;
            DropLocation::new(Droppable::List(loc.list_id), loc.index)
        }
    };
    let destination = match args.to {
        Some(to) => Some(DropLocation::new(to.parse()?, args.index)),
        None => None,
    };

    for id in &args.select {
        if !engine.selection().contains(id) {
            engine.toggle_selection(id);
        }
    }
    engine.on_drag_start(DragStart {
        dragged_id: args.id.clone(),
        kind,
    })?;
    let outcome = engine.on_drag_end(DragEvent {
        dragged_id: args.id,
        kind,
        source,
        destination,
    })?;
    settle(ctx, &mut engine, json, Some(&outcome))?;
    match outcome {
        DragOutcome::Ignored(reason) => Err(reason.into()),
        _ => Ok(()),
    }
}

fn cmd_add(ctx: &BoardContext, args: AddArgs, json: bool) -> CmdResult {
    let mut engine = open_engine(ctx)?;
    let board = current_board(&engine)?;
    let card_id = args.id.unwrap_or_else(|| next_card_id(&board));
    engine.mutate(Mutation::AddCard {
        list_id: args.list,
        card_id,
        title: args.title,
    });
    settle(ctx, &mut engine, json, None)
}

fn cmd_add_list(ctx: &BoardContext, args: AddListArgs, json: bool) -> CmdResult {
    run_mutation(
        ctx,
        Mutation::AddList {
            list_id: args.id,
            title: args.title,
        },
        json,
    )
}

fn cmd_set(ctx: &BoardContext, args: SetArgs, json: bool) -> CmdResult {
    if args.list {
        let title = args.title.ok_or("--title is required with --list")?;
        return run_mutation(
            ctx,
            Mutation::RenameList {
                list_id: args.id,
                title,
            },
            json,
        );
    }

    let mut engine = open_engine(ctx)?;
    let board = current_board(&engine)?;
    let mut patch = CardPatch {
        title: args.title,
        description: args
            .description
            .map(|d| if d.is_empty() { None } else { Some(d) }),
        ..Default::default()
    };
    if let Some(date) = args.date {
        // rescheduled cards go to the end of their new day
        let bucket = parse_bucket(&date)?;
        let (_, updates) = calendar_ops::place_on_calendar(
            &board,
            std::slice::from_ref(&args.id),
            bucket,
            usize::MAX,
            &ctx.config.calendar,
        )?;
        if let Some(update) = updates.into_iter().next() {
            patch.calendar_date = update.patch.calendar_date;
            patch.calendar_order = update.patch.calendar_order;
        }
    }
    if patch.is_empty() {
        return Err("nothing to set: pass --title, --description or --date".into());
    }
    engine.mutate(Mutation::UpdateCard {
        card_id: args.id,
        patch,
    });
    settle(ctx, &mut engine, json, None)
}

fn cmd_rm(ctx: &BoardContext, args: RmArgs, json: bool) -> CmdResult {
    let mutation = if args.list {
        Mutation::DeleteList { list_id: args.id }
    } else {
        Mutation::DeleteCard { card_id: args.id }
    };
    run_mutation(ctx, mutation, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::Card;
    use crate::model::list::List;

    #[test]
    fn next_card_id_skips_taken_ids() {
        let board = Board::new("b", "x").with_lists(vec![List::new("A", "A").with_cards(vec![
            Card::new("c2", "two"),
            Card::new("c3", "three"),
        ])]);
        assert_eq!(next_card_id(&board), "c4");
        assert_eq!(next_card_id(&Board::new("b", "x")), "c1");
    }

    #[test]
    fn bucket_arguments() {
        assert_eq!(parse_bucket("unscheduled").unwrap(), None);
        assert_eq!(parse_bucket("none").unwrap(), None);
        assert_eq!(
            parse_bucket("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert!(parse_bucket("May 1").is_err());
    }
}
