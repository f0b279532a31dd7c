//! Config command implementation.

use crate::config::Settings;
use std::error::Error;
use std::path::Path;

/// Prints the effective settings, with the token masked.
pub fn run(path: &Path, settings: &Settings) -> Result<(), Box<dyn Error>> {
    println!("Config file:     {}", path.display());
    println!("Endpoint:        {}", or_unset(&settings.endpoint));
    println!("Token:           {}", mask(&settings.token));
    println!("Books directory: {}", settings.books_directory.display());
    if let Some(secs) = settings.timeout_secs {
        println!("Timeout:         {secs}s");
    }

    if let Err(e) = settings.validate() {
        println!();
        println!("warning: {e}");
    }
    Ok(())
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

/// Shows at most the last four characters of a token.
fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 4 => "*".repeat(n),
        n => {
            let tail: String = chars[n - 4..].iter().collect();
            format!("{}{tail}", "*".repeat(n - 4))
        }
    }
}
