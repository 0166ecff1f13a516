use tracing::info;

use super::{arguments, CommandInfo, CommandType, Rejection};
use crate::archive::{self, ArchiveRequest, DiscordBackend, USAGE_ARGS};
use crate::error::MagiError;
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "archive",
    args: USAGE_ARGS,
    description: "Creates a .json representation of what you choose to archive and uploads it to the \
same channel that the command was executed in.

metadata - only captures guild and channel information.
participants - only captures information about who has ever participated in the channel.
complete - captures everything (see Capture Selection).

Capture Selection:
text - will capture only the textual content for each message. Follow up with \"reactions\", \
\"stickers\", \"attachments\", and/or \"threads\" to choose what else to capture.
whole-messages - captures everything.
messages-only - used to ignore metadata and participants since they are captured by default.

Only the server owner can execute this command.",
    kind: CommandType::Admin,
};

/// Archives the current channel and uploads the result to it.
#[poise::command(prefix_command, guild_only, check = "server_owner")]
pub async fn archive(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    let data = ctx.data();
    let args = arguments(args)?;
    let request = ArchiveRequest::parse(&args)
        .map_err(|e| Rejection::usage(e.to_string()).into_error(&INFO, &data.config.prefix))?;

    let http = ctx.serenity_context().http.clone();
    let _typing = ctx.channel_id().start_typing(&http);
    let backend = DiscordBackend::new(http);

    let uploaded =
        archive::archive(&backend, &data.config.archive_dir, ctx.channel_id(), request).await?;
    if uploaded.is_empty() {
        ctx.say(">>> Nothing to archive.").await?;
        return Ok(());
    }

    let files: Vec<&str> = uploaded.iter().map(|file| file.filename.as_str()).collect();
    info!(
        channel = %ctx.channel_id(),
        ?files,
        bytes = uploaded.iter().map(|file| file.size).sum::<usize>(),
        "Archive uploaded"
    );
    Ok(())
}

async fn server_owner(ctx: Context<'_>) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };

    let guild = guild_id.to_partial_guild(ctx).await?;
    if guild.owner_id != ctx.author().id {
        return Err(MagiError::usage("Only the server owner can archive channels."));
    }
    Ok(true)
}
