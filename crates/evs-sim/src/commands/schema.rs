use std::error::Error;

use clap::Args;
use evs_pipeline::OutputRecord;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Emit the column list as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ColumnEntry {
    name: &'static str,
    level: &'static str,
}

pub fn run(args: &SchemaArgs) -> Result<(), Box<dyn Error>> {
    let columns: Vec<ColumnEntry> = OutputRecord::COLUMNS
        .iter()
        .map(|column| ColumnEntry {
            name: column.name,
            level: column.level.as_str(),
        })
        .collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }
    for (index, column) in columns.iter().enumerate() {
        println!("{index:>2}  {:<4}  {}", column.level, column.name);
    }
    Ok(())
}
