use serenity::all::UserId;
use tracing::debug;

use super::{arguments, CommandInfo, CommandType, Rejection};
use crate::error::{MagiError, INVALID_FORM_BODY, UNKNOWN_USER};
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "pfp",
    args: "<userId>",
    description: "Posts the specified user's profile picture to the channel.",
    kind: CommandType::Misc,
};

/// Posts a user's profile picture.
#[poise::command(prefix_command)]
pub async fn pfp(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    let prefix = ctx.data().config.prefix.as_str();
    let args = arguments(args)?;
    let user_id = parse_user_id(&args).map_err(|rejection| rejection.into_error(&INFO, prefix))?;

    match user_id.to_user(ctx).await {
        Ok(user) => {
            ctx.say(user.face()).await?;
        }
        Err(e) => {
            let err = MagiError::from(e);
            let message = match err.discord_code() {
                Some(UNKNOWN_USER) => "A user with that userId could not be found.",
                Some(INVALID_FORM_BODY) => "userId given is not a snowflake.",
                _ => return Err(err),
            };
            debug!(user = %user_id, error = %err, "User lookup failed");
            return Err(MagiError::usage(message));
        }
    }

    Ok(())
}

fn parse_user_id(args: &[String]) -> Result<UserId, Rejection> {
    let [arg] = args else {
        return Err(Rejection::usage("You must provide a userId and nothing else."));
    };

    arg.parse::<u64>()
        .ok()
        .filter(|&id| id != 0)
        .map(UserId::new)
        .ok_or_else(|| Rejection::usage("Argument is not a userId."))
}
