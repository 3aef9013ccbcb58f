//! services/client/src/adapters/local_file.rs
//!
//! Reads files from disk into the `UploadFile` the document store sends.

use rag_client_core::UploadFile;
use std::io;
use std::path::Path;

/// Loads `path` for upload, guessing its MIME type from the extension.
pub async fn read_upload(path: &Path) -> io::Result<UploadFile> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no usable file name", path.display()),
            )
        })?
        .to_string();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Ok(UploadFile::new(file_name, bytes).with_content_type(content_type.essence_str()))
}
