use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::board_io::write_board;
use crate::io::config_io::{self, CONFIG_FILE};
use crate::model::board::Board;
use crate::model::list::List;

const CONFIG_TEMPLATE: &str = r##"# bsync board configuration

[board]
# board file, relative to this directory
file = "board.json"

[calendar]
# key distance to a missing neighbour at the edge of a day
step = 1024.0
# key of the first card placed on an empty day
origin = 0.0

[sync]
# how long write commands wait for the board file to settle
settle_timeout_ms = 5000
# append rolled-back changes to .notices.log
log_notices = true
"##;

/// Validate that a list id is lowercase alphanumeric with hyphens only.
fn validate_list_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("list id cannot be empty".to_string());
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "invalid list id \"{}\": use lowercase letters, digits and hyphens",
            id
        ));
    }
    Ok(())
}

/// Turn a directory name into a board id.
fn slugify(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() { "board".to_string() } else { slug }
}

/// Parse --list pairs from the flat Vec<String> produced by clap.
fn parse_list_pairs(args: &[String]) -> Vec<(&str, &str)> {
    args.chunks_exact(2)
        .map(|chunk| (chunk[0].as_str(), chunk[1].as_str()))
        .collect()
}

pub fn cmd_init(dir: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if dir.join(CONFIG_FILE).exists() && !args.force {
        return Err(config_io::ConfigError::AlreadyInitialized(dir.to_path_buf()).into());
    }

    let pairs = parse_list_pairs(&args.list);
    let mut seen = std::collections::HashSet::new();
    for (id, _) in &pairs {
        validate_list_id(id)?;
        if !seen.insert(*id) {
            return Err(format!("duplicate list id \"{}\"", id).into());
        }
    }

    let dir_name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("board");
    let title = args.title.unwrap_or_else(|| dir_name.to_string());
    let board = Board::new(slugify(dir_name), title).with_lists(
        pairs
            .iter()
            .map(|(id, title)| List::new(*id, *title))
            .collect(),
    );

    fs::create_dir_all(dir)?;
    fs::write(dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    let config = config_io::load_config(dir)?;
    write_board(&config_io::board_path(dir, &config), &board)?;

    println!("Initialized board \"{}\" in {}", board.title, dir.display());
    Ok(())
}
