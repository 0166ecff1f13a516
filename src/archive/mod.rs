//! Channel archives: JSON snapshots of a channel uploaded back to it.
//!
//! A run claims the channel's staging directory, stages the requested
//! documents ([`collect::stage`]), then uploads them ([`upload::plan`],
//! [`upload::send`]). The staging directory is removed when the run ends,
//! whether it succeeded or not.

mod backend;
mod collect;
mod discord;
mod pager;
mod records;
mod request;
mod staging;
mod upload;

#[cfg(test)]
pub mod testing;

use std::path::Path;

use serenity::all::ChannelId;

pub use backend::ArchiveBackend;
pub use discord::DiscordBackend;
pub use request::{ArchiveRequest, USAGE_ARGS};
pub use upload::UploadedFile;

use crate::error::MagiResult;

/// Archives `channel` as `request` describes, staging under `root`.
///
/// Returns the files uploaded to the channel, which is empty when there was
/// nothing to archive.
#[tracing::instrument(skip(backend, root), fields(root = %root.display()))]
pub async fn archive(
    backend: &dyn ArchiveBackend,
    root: &Path,
    channel: ChannelId,
    request: ArchiveRequest,
) -> MagiResult<Vec<UploadedFile>> {
    let staging = staging::Staging::acquire(root, channel).await?;
    let staged =
        collect::stage(backend, &staging, channel, &request, pager::FILE_UPLOAD_SIZE_LIMIT).await?;
    let uploads = upload::plan(&staged);
    upload::send(backend, &staging, channel, uploads).await
}
