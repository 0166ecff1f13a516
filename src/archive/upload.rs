//! Turns staged archive files into channel uploads.

use serenity::all::ChannelId;

use super::backend::ArchiveBackend;
use super::staging::{page_filename, Staging, METADATA_FILENAME, PARTICIPANTS_FILENAME};
use crate::error::MagiResult;

/// What an archive run left in its staging directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Staged {
    pub metadata: bool,
    pub participants: bool,
    /// Number of `messages_N.json` pages, numbered from 0.
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upload {
    /// Sent uncompressed.
    Plain(String),
    /// Tarred together, gzipped and sent as `archive.tar.gz`.
    Bundle(Vec<String>),
    /// Gzipped and sent.
    Compressed(String),
}

/// A file that made it to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub size: usize,
}

/// Decides how the staged files are sent.
///
/// A lone metadata or participants document goes out as plain JSON. Otherwise
/// metadata, participants and the first page travel together in one tarball
/// and every other page is gzipped on its own.
pub fn plan(staged: &Staged) -> Vec<Upload> {
    let mut uploads = Vec::new();

    if staged.pages == 0 && staged.metadata != staged.participants {
        let file = if staged.metadata {
            METADATA_FILENAME
        } else {
            PARTICIPANTS_FILENAME
        };
        uploads.push(Upload::Plain(file.to_string()));
        return uploads;
    }

    let mut first_page = 0;
    if staged.metadata || staged.participants {
        let mut files = Vec::new();
        if staged.metadata {
            files.push(METADATA_FILENAME.to_string());
        }
        if staged.participants {
            files.push(PARTICIPANTS_FILENAME.to_string());
        }
        if staged.pages > 0 {
            files.push(page_filename(0));
            first_page = 1;
        }
        uploads.push(Upload::Bundle(files));
    }

    uploads.extend((first_page..staged.pages).map(|page| Upload::Compressed(page_filename(page))));
    uploads
}

/// Carries out `uploads` in order, deleting each file once it is sent.
#[tracing::instrument(skip(backend, staging, uploads), fields(uploads = uploads.len()))]
pub async fn send(
    backend: &dyn ArchiveBackend,
    staging: &Staging,
    channel: ChannelId,
    uploads: Vec<Upload>,
) -> MagiResult<Vec<UploadedFile>> {
    let mut sent = Vec::with_capacity(uploads.len());

    for upload in uploads {
        let filename = match upload {
            Upload::Plain(file) => file,
            Upload::Bundle(files) => {
                let tar = staging.bundle(files).await?;
                staging.compress(&tar).await?
            }
            Upload::Compressed(file) => staging.compress(&file).await?,
        };

        let data = staging.read(&filename).await?;
        let size = data.len();
        backend.upload(channel, &filename, data).await?;
        staging.remove(&filename).await?;

        tracing::info!(%channel, filename, size = %format_bytes(size), "Uploaded archive file");
        sent.push(UploadedFile { filename, size });
    }

    Ok(sent)
}

/// Rounds down to the largest whole binary unit.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    let mut value = bytes;
    let mut unit = "bytes";
    for next in UNITS {
        if value < 1024 {
            break;
        }
        value /= 1024;
        unit = next;
    }
    format!("{value} {unit}")
}
