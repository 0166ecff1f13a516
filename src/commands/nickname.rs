use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedAuthor, EditMember, UserId};
use serenity::utils::parse_user_mention;
use tracing::{debug, info, warn};

use super::{arguments, CommandInfo, CommandType, Rejection, EMBED_COLOUR};
use crate::error::MagiError;
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "nickname",
    args: "<userId | user mention> [nickname]",
    description: "Changes the nickname of a user. Removes the current nickname from a user if none is provided.",
    kind: CommandType::Admin,
};

const MAX_NICKNAME_LENGTH: usize = 32;

/// Sets or removes a member's nickname.
#[poise::command(
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_NICKNAMES",
    required_bot_permissions = "MANAGE_NICKNAMES"
)]
pub async fn nickname(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    let prefix = ctx.data().config.prefix.as_str();
    let args = arguments(args)?;
    check_arity(&args).map_err(|rejection| rejection.into_error(&INFO, prefix))?;
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };

    let target = &args[0];
    let user_id = parse_target(target)
        .ok_or_else(|| MagiError::usage(format!("{target} is not a userId or user mention.")))?;
    let member = match guild_id.member(ctx, user_id).await {
        Ok(member) => member,
        Err(e) => {
            debug!(user = %user_id, error = %e, "Member lookup failed");
            return Err(MagiError::usage("Invalid userId."));
        }
    };

    let old = member.display_name().to_string();
    let new = plan(&old, member.nick.is_some(), args.get(1).map(String::as_str))
        .map_err(|rejection| rejection.into_error(&INFO, prefix))?;

    if let Err(e) = guild_id
        .edit_member(ctx, user_id, EditMember::new().nickname(&new))
        .await
    {
        warn!(user = %user_id, error = %e, "Nickname change refused");
        return Err(MagiError::usage(
            "Cannot change the nickname of a user with a higher role than me.",
        ));
    }
    info!(guild = %guild_id, user = %user_id, %old, %new, "Changed nickname");

    let author = match ctx.author_member().await {
        Some(member) => member.display_name().to_string(),
        None => ctx.author().name.clone(),
    };
    let (title, description) = summary(&author, &member.user.name, &old, &new);
    let embed = CreateEmbed::new()
        .author(CreateEmbedAuthor::new(&author).icon_url(ctx.author().face()))
        .colour(EMBED_COLOUR)
        .thumbnail(member.user.face())
        .title(title)
        .description(description);
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn check_arity(args: &[String]) -> Result<(), Rejection> {
    match args.len() {
        0 => Err(Rejection::usage("No user specified.")),
        1 | 2 => Ok(()),
        _ => Err(Rejection::usage("Too many arguments supplied.")),
    }
}

/// A user mention (`<@id>` or `<@!id>`) or a bare user id.
fn parse_target(arg: &str) -> Option<UserId> {
    if arg.starts_with("<@") {
        return parse_user_mention(arg);
    }
    arg.parse::<u64>().ok().filter(|&id| id != 0).map(UserId::new)
}

/// The nickname to set; empty removes it.
fn plan(current: &str, has_nickname: bool, requested: Option<&str>) -> Result<String, Rejection> {
    let Some(requested) = requested else {
        if !has_nickname {
            return Err(Rejection::plain("User does not have a nickname to remove."));
        }
        return Ok(String::new());
    };

    let nickname = requested.trim();
    if nickname == current {
        Err(Rejection::plain("Nickname is the same as before."))
    } else if nickname.chars().count() > MAX_NICKNAME_LENGTH {
        Err(Rejection::plain("Nickname must be 32 characters or less."))
    } else {
        Ok(nickname.to_string())
    }
}

/// Embed title and description for a completed change.
fn summary(author: &str, username: &str, old: &str, new: &str) -> (String, String) {
    let old = old.replace('\\', "\\\\");
    let new = new.replace('\\', "\\\\");

    if new.is_empty() {
        (
            "Nickname Removed".to_string(),
            format!("**{author}** removed **{username}**'s nickname, **{old}**."),
        )
    } else {
        (
            "Nickname Updated".to_string(),
            format!("**{author}** updated **{username}**'s nickname from **{old}** to **{new}**."),
        )
    }
}
