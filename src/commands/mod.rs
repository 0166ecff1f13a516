//! Prefix commands and the registry `help` reads from.

mod archive;
mod help;
mod nickname;
mod pfp;
mod set_server_name;
mod tokenizer_info;

use serenity::all::Colour;

use crate::error::MagiError;
use crate::tokenizer::tokenize;
use crate::{Context, Data, Error};

pub const EMBED_COLOUR: Colour = Colour(0x385028);

/// Help categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Admin,
    Chat,
    Misc,
}

impl CommandType {
    pub const ALL: [CommandType; 3] = [CommandType::Admin, CommandType::Chat, CommandType::Misc];

    pub fn title(self) -> &'static str {
        match self {
            CommandType::Admin => "Administrative",
            CommandType::Chat => "Chat",
            CommandType::Misc => "Miscellaneous",
        }
    }
}

/// What `help` knows about a command.
#[derive(Debug)]
pub struct CommandInfo {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
    pub kind: CommandType,
}

impl CommandInfo {
    pub fn usage(&self, prefix: &str) -> String {
        if self.args.is_empty() {
            format!("Usage: {prefix}{}", self.name)
        } else {
            format!("Usage: {prefix}{} {}", self.name, self.args)
        }
    }
}

pub const COMMANDS: &[CommandInfo] = &[
    archive::INFO,
    nickname::INFO,
    set_server_name::INFO,
    help::INFO,
    pfp::INFO,
    tokenizer_info::INFO,
];

pub fn find(name: &str) -> Option<&'static CommandInfo> {
    COMMANDS
        .iter()
        .find(|info| info.name.eq_ignore_ascii_case(name))
}

pub fn list() -> Vec<poise::Command<Data, Error>> {
    vec![
        archive::archive(),
        nickname::nickname(),
        set_server_name::set_server_name(),
        help::help(),
        pfp::pfp(),
        tokenizer_info::tokenizer_info(),
    ]
}

/// A refused invocation, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
    /// Follow the message with the command's usage line.
    pub show_usage: bool,
}

impl Rejection {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            show_usage: true,
        }
    }

    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            show_usage: false,
        }
    }

    #[track_caller]
    pub fn into_error(self, info: &CommandInfo, prefix: &str) -> MagiError {
        if self.show_usage {
            MagiError::usage(format!("{}\n{}", self.message, info.usage(prefix)))
        } else {
            MagiError::usage(self.message)
        }
    }
}

/// Tokenizes the text that followed the command name.
fn arguments(raw: Option<String>) -> Result<Vec<String>, Error> {
    Ok(tokenize(raw.as_deref().unwrap_or_default())?)
}

/// The bot's name in the current guild and its avatar URL.
async fn bot_identity(ctx: Context<'_>) -> (String, String) {
    let (id, name, icon) = {
        let me = ctx.cache().current_user();
        (me.id, me.name.clone(), me.face())
    };

    let name = match ctx.guild_id() {
        Some(guild_id) => match guild_id.member(ctx, id).await {
            Ok(member) => member.display_name().to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "Falling back to the bot's user name");
                name
            }
        },
        None => name,
    };

    (name, icon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_lines_carry_the_prefix() {
        let info = find("pfp").unwrap();
        assert_eq!(info.usage("!"), "Usage: !pfp <userId>");
        let info = find("tokenizer-info").unwrap();
        assert_eq!(info.usage("$"), "Usage: $tokenizer-info");
    }

    #[test]
    fn registry_matches_framework_commands() {
        let names: Vec<String> = list().into_iter().map(|command| command.name).collect();
        let registered: Vec<&str> = COMMANDS.iter().map(|info| info.name).collect();
        assert_eq!(names, registered);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(find("ARCHIVE").unwrap().name, "archive");
        assert!(find("ban").is_none());
    }

    #[test]
    fn rejections_append_usage_on_request() {
        let info = find("set-server-name").unwrap();
        let err = Rejection::usage("You must provide a server name.").into_error(info, "!");
        assert_eq!(
            err.user_message().unwrap(),
            ">>> You must provide a server name.\nUsage: !set-server-name <new server name>"
        );

        let err = Rejection::plain("Server name is unchanged.").into_error(info, "!");
        assert_eq!(err.user_message().unwrap(), ">>> Server name is unchanged.");
    }
}
