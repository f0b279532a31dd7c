//! Scan command implementation.

use kosync_engine::Library;
use serde::Serialize;
use std::error::Error;
use std::path::Path;

/// What the scanner found in the library.
#[derive(Debug, Serialize)]
pub struct ScanResult {
    /// Library directory.
    pub path: String,
    /// Ids of the books found, sorted.
    pub books: Vec<String>,
}

/// Scans `path` without contacting the server.
pub fn scan(path: &Path) -> Result<ScanResult, Box<dyn Error>> {
    let books = Library::new(path).scan()?;
    Ok(ScanResult {
        path: path.display().to_string(),
        books: books.iter().map(ToString::to_string).collect(),
    })
}

/// Runs the scan command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn Error>> {
    let result = scan(path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => {
            println!("Library: {}", result.path);
            println!("Books:   {}", result.books.len());
            for id in &result.books {
                println!("  {id}");
            }
        }
        other => return Err(format!("unknown format: {other}").into()),
    }
    Ok(())
}
