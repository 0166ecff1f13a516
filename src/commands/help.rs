use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedAuthor};

use super::{arguments, bot_identity, find, CommandInfo, CommandType, Rejection, COMMANDS, EMBED_COLOUR};
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "help",
    args: "[command]",
    description: "Lists all commands. Prints the usage and description for a command if present.",
    kind: CommandType::Misc,
};

/// Lists all commands, or describes one.
#[poise::command(prefix_command)]
pub async fn help(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    let prefix = ctx.data().config.prefix.as_str();
    let args = arguments(args)?;

    match lookup(&args).map_err(|rejection| rejection.into_error(&INFO, prefix))? {
        Some(info) => {
            ctx.say(format!(">>> {}\n{}", info.usage(prefix), info.description))
                .await?;
        }
        None => {
            let (name, icon) = bot_identity(ctx).await;
            let mut embed = CreateEmbed::new()
                .colour(EMBED_COLOUR)
                .author(CreateEmbedAuthor::new(&name).icon_url(&icon))
                .title(format!("{name}'s Commands"))
                .thumbnail(&icon)
                .description(format!("Use {prefix}{} <command> for more.", INFO.name));
            for kind in CommandType::ALL {
                embed = embed.field(kind.title(), command_list(kind, prefix), true);
            }
            ctx.send(CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// `None` asks for the full list.
fn lookup(args: &[String]) -> Result<Option<&'static CommandInfo>, Rejection> {
    match args {
        [] => Ok(None),
        [name] => find(name)
            .map(Some)
            .ok_or_else(|| Rejection::usage(format!("{name} is not a recognized command."))),
        _ => Err(Rejection::usage("Too many arguments passed.")),
    }
}

/// Prefixed command names of one category, one per line, or `-` when empty.
fn command_list(kind: CommandType, prefix: &str) -> String {
    let names: Vec<String> = COMMANDS
        .iter()
        .filter(|info| info.kind == kind)
        .map(|info| format!("{prefix}{}", info.name))
        .collect();

    if names.is_empty() {
        "-".to_string()
    } else {
        names.join("\n")
    }
}
