use poise::CreateReply;
use serenity::all::{CreateEmbed, CreateEmbedAuthor};

use super::{arguments, bot_identity, CommandInfo, CommandType, EMBED_COLOUR};
use crate::{Context, Error};

pub const INFO: CommandInfo = CommandInfo {
    name: "tokenizer-info",
    args: "",
    description: "Provides information about how arguments are tokenized.",
    kind: CommandType::Misc,
};

#[poise::command(prefix_command, rename = "tokenizer-info")]
pub async fn tokenizer_info(ctx: Context<'_>, #[rest] args: Option<String>) -> Result<(), Error> {
    // Extra arguments are ignored, but malformed quoting is still reported.
    arguments(args)?;

    let (name, icon) = bot_identity(ctx).await;
    let embed = CreateEmbed::new()
        .colour(EMBED_COLOUR)
        .author(CreateEmbedAuthor::new(&name).icon_url(&icon))
        .title(format!("{name}'s Tokenizer"))
        .thumbnail(&icon)
        .description(rules(&ctx.data().config.prefix));
    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn rules(prefix: &str) -> String {
    format!(
        "For a command to be detected it must directly follow a \"{prefix}\" with no whitespace \
         separation. If arguments are given then there has to be one space following the command \
         name. Any amount of whitespace can follow. Whitespace separates each argument after the \
         command except when double quotes are used. Double quotes are used to preserve whitespace \
         in an argument as everything within a pair of double quotes is considered one argument. \
         To use double quotes within an argument you can escape it with a backslash (\"\\\\\") and \
         you can escape a backslash with another backslash.\n\n\
         There are a few rules to how you can use double quotes:\n\n\
         1) An opening, unescaped double quote must be preceded by whitespace.\n\
         2) A closing, unescaped double quote must be followed by whitespace.\n\
         3) If an unescaped double quote is used, it must be closed by another unescaped double quote.\n\
         4) A backslash must be followed by a \" or \\\\.\n\n\
         If there are no non-whitespace characters in double quotes then that argument is ignored."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn rules_name_the_prefix() {
        assert!(rules("~").starts_with("For a command to be detected it must directly follow a \"~\""));
    }

    #[test]
    fn rules_render_escaped_backslashes_for_markdown() {
        let text = rules("!");
        assert!(text.contains("(\"\\\\\")"));
        assert!(text.contains("4) A backslash must be followed by a \" or \\\\."));
    }

    #[test]
    fn rules_describe_the_tokenizer() {
        // Rule 3 and the blank-quote rule, as implemented.
        assert!(tokenize("\"open").is_err());
        assert_eq!(tokenize("a \"  \" b").unwrap(), ["a", "b"]);
        assert!(rules("!").contains("that argument is ignored"));
    }
}
