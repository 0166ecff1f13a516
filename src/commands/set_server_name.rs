use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedAuthor, EditGuild};
use tracing::info;

use super::{arguments, CommandInfo, CommandType, Rejection, EMBED_COLOUR};
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "set-server-name",
    args: "<new server name>",
    description: "Changes the server name.",
    kind: CommandType::Admin,
};

#[poise::command(
    prefix_command,
    rename = "set-server-name",
    guild_only,
    required_permissions = "MANAGE_GUILD",
    required_bot_permissions = "MANAGE_GUILD"
)]
pub async fn set_server_name(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    let prefix = ctx.data().config.prefix.as_str();
    let args = arguments(args)?;
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let guild = guild_id.to_partial_guild(ctx).await?;
    let name = validate(&args, &guild.name).map_err(|rejection| rejection.into_error(&INFO, prefix))?;

    guild_id.edit(ctx, EditGuild::new().name(&name)).await?;
    info!(guild = %guild_id, old = %guild.name, new = %name, "Renamed server");

    let author = match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => ctx.author().name.clone(),
    };
    let mut embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&author).icon_url(ctx.author().face()))
        .colour(EMBED_COLOUR)
        .title("Server Name Changed")
        .description(format!(
            "**{author}** changed the server name from **{}** to **{name}**.",
            guild.name
        ));
    if let Some(icon) = guild.icon_url() {
        embed = embed.thumbnail(icon);
    }
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

/// The trimmed new name, if it's acceptable in place of `current`.
fn validate(args: &[String], current: &str) -> Result<String, Rejection> {
    let name = match args {
        [] => return Err(Rejection::usage("You must provide a server name.")),
        [name] => name.trim(),
        _ => return Err(Rejection::usage("You must provide only one argument.")),
    };

    if name == current {
        Err(Rejection::plain("Server name is unchanged."))
    } else if name.contains('\n') {
        Err(Rejection::plain("Server names cannot contain a newline."))
    } else if !(2..=100).contains(&name.chars().count()) {
        Err(Rejection::plain("Server names must be 2-100 characters long."))
    } else {
        Ok(name.to_string())
    }
}
