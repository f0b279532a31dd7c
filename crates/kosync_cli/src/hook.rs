//! Post-sync notification hook.

use std::io;
use std::process::{Command, ExitStatus};

/// Environment variable carrying the number of new books.
pub const NEW_BOOKS_ENV: &str = "KOSYNC_NEW_BOOKS";

/// Runs `command` (program followed by its arguments) and waits for it.
///
/// The hook sees the number of new books in [`NEW_BOOKS_ENV`].
pub fn run(command: &[String], new_books: usize) -> io::Result<ExitStatus> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty hook command"))?;

    tracing::debug!(%program, new_books, "running on-change hook");
    Command::new(program)
        .args(args)
        .env(NEW_BOOKS_ENV, new_books.to_string())
        .status()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let err = run(&[], 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn hook_sees_book_count() {
        let command = vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("test \"${NEW_BOOKS_ENV}\" = 3"),
        ];
        assert!(run(&command, 3).unwrap().success());
        assert!(!run(&command, 4).unwrap().success());
    }
}
