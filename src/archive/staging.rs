//! Per-channel working directory for an archive run.
//!
//! The directory doubles as the channel's lock: it is created with
//! `create_dir`, so a second run on the same channel fails until the first one
//! drops its [`Staging`].

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serenity::all::ChannelId;

use crate::error::{MagiError, MagiErrorKind, MagiResult};

pub const METADATA_FILENAME: &str = "metadata.json";
pub const PARTICIPANTS_FILENAME: &str = "participants.json";
pub const TAR_FILENAME: &str = "archive.tar";

pub fn page_filename(page: usize) -> String {
    format!("messages_{page}.json")
}

#[derive(Debug)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Claims `{root}/{channel}`.
    ///
    /// # Errors
    ///
    /// [`MagiErrorKind::ArchiveInProgress`] if another run holds the directory.
    #[tracing::instrument(skip(root), fields(root = %root.display()))]
    pub async fn acquire(root: &Path, channel: ChannelId) -> MagiResult<Self> {
        tokio::fs::create_dir_all(root).await?;
        let dir = root.join(channel.to_string());

        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {
                tracing::debug!(dir = %dir.display(), "Claimed staging directory");
                Ok(Self { dir })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::info!(%channel, "Archive already running for channel");
                Err(MagiError::new(MagiErrorKind::ArchiveInProgress))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub async fn write(&self, filename: &str, data: &[u8]) -> MagiResult<()> {
        tracing::debug!(filename, bytes = data.len(), "Writing staged file");
        tokio::fs::write(self.path(filename), data).await?;
        Ok(())
    }

    pub async fn read(&self, filename: &str) -> MagiResult<Vec<u8>> {
        Ok(tokio::fs::read(self.path(filename)).await?)
    }

    pub async fn remove(&self, filename: &str) -> MagiResult<()> {
        tokio::fs::remove_file(self.path(filename)).await?;
        Ok(())
    }

    /// Gzips `filename` into `filename.gz` and removes the original.
    /// Returns the name of the compressed file.
    pub async fn compress(&self, filename: &str) -> MagiResult<String> {
        let source = self.path(filename);
        let gz_name = format!("{filename}.gz");
        let target = self.path(&gz_name);

        tokio::task::spawn_blocking(move || gzip_file(&source, &target))
            .await
            .map_err(|e| MagiError::new(MagiErrorKind::Io(e.to_string())))??;

        self.remove(filename).await?;
        Ok(gz_name)
    }

    /// Tars `files` into [`TAR_FILENAME`] and removes them.
    pub async fn bundle(&self, files: Vec<String>) -> MagiResult<String> {
        let dir = self.dir.clone();
        let entries = files.clone();

        tokio::task::spawn_blocking(move || tar_files(&dir, &entries))
            .await
            .map_err(|e| MagiError::new(MagiErrorKind::Io(e.to_string())))??;

        for file in &files {
            self.remove(file).await?;
        }
        Ok(TAR_FILENAME.to_string())
    }
}

/// Releases the channel. Removal is blocking; by the time a run finishes the
/// directory only holds files that were never uploaded.
impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

fn gzip_file(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(source)?);
    let writer = BufWriter::new(File::create(target)?);
    let mut encoder = GzEncoder::new(writer, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()
}

fn tar_files(dir: &Path, files: &[String]) -> io::Result<()> {
    let writer = BufWriter::new(File::create(dir.join(TAR_FILENAME))?);
    let mut builder = tar::Builder::new(writer);
    for file in files {
        builder.append_path_with_name(dir.join(file), file)?;
    }
    builder.into_inner()?.flush()
}
