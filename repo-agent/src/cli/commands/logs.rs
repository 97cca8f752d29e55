//! `logs`: print recorded activity

use crate::cli::app::LogsArgs;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use repo_agent_core::activity::LogStore;
use std::path::Path;

pub fn execute(root: &Path, args: LogsArgs) -> Result<()> {
    let paths = super::agent_paths(root);
    let store = LogStore::new(&paths.logs_dir);

    let dates = store.dates().context("Failed to list logs")?;
    let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
        println!("No logs found.");
        return Ok(());
    };

    if let Some(date) = args.date {
        match store.read_day(date)? {
            Some(text) => print!("{}", text),
            None => println!("No logs for {}", date),
        }
        return Ok(());
    }

    if args.from.is_some() || args.to.is_some() {
        let from = args.from.unwrap_or(first);
        let to = args.to.unwrap_or_else(|| Local::now().date_naive());
        print_range(&store, from, to)?;
        return Ok(());
    }

    // Most recent day
    println!("--- {}.log ---", last);
    if let Some(text) = store.read_day(last)? {
        print!("{}", text);
    }
    Ok(())
}

fn print_range(store: &LogStore, from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        println!("Empty range: {} is after {}", from, to);
        return Ok(());
    }

    let text = store.read_range(from, to)?;
    if text.is_empty() {
        println!("No logs between {} and {}", from, to);
    } else {
        print!("{}", text);
    }
    Ok(())
}
