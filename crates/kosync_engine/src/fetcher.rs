//! Content fetcher: materializes one download instruction as a local file.

use crate::error::{SyncError, SyncResult};
use crate::library::Library;
use crate::transport::SyncTransport;
use kosync_protocol::{BookId, DownloadInstruction};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Size of the copy buffer used while streaming a download.
const CHUNK_SIZE: usize = 64 * 1024;

/// Downloads books into a [`Library`].
///
/// The body is streamed to a hidden partial file, synced, then renamed over
/// `{id}.epub`. On any failure the partial file is removed, so a failed
/// download never leaves a file the scanner would count as a book.
#[derive(Debug, Clone, Copy)]
pub struct Fetcher<'a> {
    library: &'a Library,
}

impl<'a> Fetcher<'a> {
    /// Creates a fetcher writing into `library`.
    pub fn new(library: &'a Library) -> Self {
        Self { library }
    }

    /// Downloads one book and returns the number of bytes written.
    ///
    /// The local file name is derived from `instruction.id` only.
    pub fn fetch<T: SyncTransport + ?Sized>(
        &self,
        transport: &T,
        instruction: &DownloadInstruction,
    ) -> SyncResult<u64> {
        let id = instruction.id;
        let mut body = transport.fetch(instruction)?;

        let result = self
            .write_partial(&id, &mut body)
            .and_then(|written| self.library.publish(&id).map(|_| written));

        if result.is_err() {
            self.library.discard_partial(&id);
        }
        result
    }

    fn write_partial(&self, id: &BookId, body: &mut dyn Read) -> SyncResult<u64> {
        let path = self.library.partial_path(id);
        let local_write = |source| SyncError::LocalWrite {
            path: path.clone(),
            source,
        };

        let mut file = File::create(&path).map_err(local_write)?;
        let written = copy_body(id, body, &mut file, &path)?;
        file.sync_all().map_err(local_write)?;
        Ok(written)
    }
}

/// Copies the response body, keeping read (network) and write (disk) errors apart.
fn copy_body(id: &BookId, body: &mut dyn Read, file: &mut File, path: &Path) -> SyncResult<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = match body.read(&mut buf) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SyncError::transport(
                    format!("download of book {id} interrupted"),
                    true,
                    e,
                ))
            }
        };

        file.write_all(&buf[..n])
            .map_err(|source| SyncError::LocalWrite {
                path: path.to_path_buf(),
                source,
            })?;
        written += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ContentStream, MockTransport};
    use kosync_protocol::{SyncRequest, SyncResponse};
    use std::fs;
    use tempfile::TempDir;
    use url::Url;

    fn instruction(id: BookId) -> DownloadInstruction {
        let url = Url::parse(&format!("http://books.test/{id}")).unwrap();
        DownloadInstruction::new(id, url)
    }

    /// Yields some bytes, then fails like a dropped connection.
    struct BrokenBody {
        sent: bool,
    }

    impl Read for BrokenBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
            }
            self.sent = true;
            let chunk = b"PK\x03\x04partial";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    struct BrokenTransport;

    impl SyncTransport for BrokenTransport {
        fn reconcile(&self, _request: &SyncRequest) -> SyncResult<SyncResponse> {
            Ok(SyncResponse::default())
        }

        fn fetch(&self, _instruction: &DownloadInstruction) -> SyncResult<ContentStream> {
            Ok(Box::new(BrokenBody { sent: false }))
        }
    }

    #[test]
    fn fetch_writes_book_under_its_id() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());
        let transport = MockTransport::new();
        let id = BookId::new();
        transport.set_content(id, b"epub content".to_vec());

        let written = Fetcher::new(&library)
            .fetch(&transport, &instruction(id))
            .unwrap();

        assert_eq!(written, 12);
        assert_eq!(fs::read(library.book_path(&id)).unwrap(), b"epub content");
        assert!(!library.partial_path(&id).exists());
    }

    #[test]
    fn fetch_streams_large_bodies() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());
        let transport = MockTransport::new();
        let id = BookId::new();
        let content: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        transport.set_content(id, content.clone());

        let written = Fetcher::new(&library)
            .fetch(&transport, &instruction(id))
            .unwrap();

        assert_eq!(written, content.len() as u64);
        assert_eq!(fs::read(library.book_path(&id)).unwrap(), content);
    }

    #[test]
    fn fetch_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());
        let transport = MockTransport::new();
        let id = BookId::new();
        fs::write(library.book_path(&id), b"old").unwrap();
        transport.set_content(id, b"new".to_vec());

        Fetcher::new(&library)
            .fetch(&transport, &instruction(id))
            .unwrap();
        assert_eq!(fs::read(library.book_path(&id)).unwrap(), b"new");
    }

    #[test]
    fn non_200_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());
        let transport = MockTransport::new();
        let id = BookId::new();
        transport.set_download_status(id, 404);

        let err = Fetcher::new(&library)
            .fetch(&transport, &instruction(id))
            .unwrap_err();

        assert!(matches!(err, SyncError::DownloadFailed { status: 404, .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn interrupted_body_leaves_no_residue() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());
        let id = BookId::new();

        let err = Fetcher::new(&library)
            .fetch(&BrokenTransport, &instruction(id))
            .unwrap_err();

        assert!(matches!(err, SyncError::Transport { retryable: true, .. }));
        assert!(!library.book_path(&id).exists());
        assert!(!library.partial_path(&id).exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_library_is_local_write_error() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path().join("missing"));
        let transport = MockTransport::new();
        let id = BookId::new();
        transport.set_content(id, b"epub".to_vec());

        let err = Fetcher::new(&library)
            .fetch(&transport, &instruction(id))
            .unwrap_err();
        assert!(matches!(err, SyncError::LocalWrite { .. }));
    }
}
