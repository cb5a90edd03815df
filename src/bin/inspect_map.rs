//! Inspector for exported parking maps
//!
//! Reads a file holding either a map save payload (`map_rows`, `map_cols`,
//! `cell_size`, `map_data`, as copied from the editor) or a bare `map_data`
//! object, and prints the layout as a text grid with a per-kind summary.

use parkmap::api::MapResponse;
use parkmap::{GridConfig, MapData};
use serde_json::Value;
use std::env;
use std::fs;
use std::process;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <map.json>", args[0]);
        eprintln!("Prints an exported parking map as a text grid");
        process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let filename = &args[1];
    let value: Value = serde_json::from_str(&fs::read_to_string(filename)?)?;
    let (cfg, map) = read_map(value)?;

    println!("=== Parking map: {} ===", filename);
    println!("Grid: {} rows x {} cols, cell size {}px\n", cfg.rows, cfg.cols, cfg.cell_size);
    print!("{}", map.to_ascii(&cfg));

    println!("\n=== Summary ===");
    for (kind, count) in map.kind_counts() {
        println!("{} {:<18} {}", kind.glyph(), kind.label(), count);
    }
    let outside = map
        .cells
        .keys()
        .filter(|key| !cfg.contains(key.row, key.col))
        .count();
    println!("Painted cells: {} ({} outside the grid)", map.cells.len(), outside);
    println!("Paths: {}", map.paths.len());

    Ok(())
}

fn read_map(value: Value) -> Result<(GridConfig, MapData), serde_json::Error> {
    if value.get("map_data").is_some() {
        let response: MapResponse = serde_json::from_value(value)?;
        let cfg = GridConfig::from_backend(response.map_rows, response.map_cols, response.cell_size);
        return Ok((cfg, MapData::from_value(&response.map_data)));
    }

    // Bare map_data: size the grid to fit the painted cells
    let map = MapData::from_value(&value);
    let rows = map.cells.keys().map(|key| key.row as i64 + 1).max().unwrap_or(0);
    let cols = map.cells.keys().map(|key| key.col as i64 + 1).max().unwrap_or(0);
    Ok((GridConfig::from_backend(Some(rows), Some(cols), None), map))
}
