mod archive;
mod commands;
mod config;
mod error;
mod tokenizer;

use poise::FrameworkError;
use serenity::all::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{MagiError, MagiErrorKind};

type Error = MagiError;
type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Debug)]
pub struct Data {
    pub config: Config,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("magi=info,serenity=warn,poise=warn")
            }),
        )
        .init();

    let config = Config::from_env()?;
    let token = config.token.clone();
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::list(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                case_insensitive_commands: true,
                ignore_bots: true,
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        command = %ctx.command().qualified_name,
                        author = %ctx.author().tag(),
                        channel = %ctx.channel_id(),
                        "Running command"
                    );
                })
            },
            on_error: |why| Box::pin(on_error(why)),
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!(user = %ready.user.tag(), guilds = ready.guilds.len(), "Connected");
                Ok(Data { config })
            })
        })
        .build();

    let mut client = Client::builder(&token, intents).framework(framework).await?;
    client.start().await?;
    Ok(())
}

async fn on_error(why: FrameworkError<'_, Data, Error>) {
    match why {
        FrameworkError::Command { error, ctx, .. }
        | FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => {
            let name = &ctx.command().name;
            let reply = match error.user_message() {
                Some(mut message) => {
                    if let MagiErrorKind::Tokenize(_) = error.kind() {
                        if let Some(info) = commands::find(name) {
                            message.push('\n');
                            message.push_str(&info.usage(&ctx.data().config.prefix));
                        }
                    }
                    message
                }
                None => {
                    error!(command = %name, error = %error, "Command failed");
                    format!(">>> Something went wrong while running {name}.")
                }
            };

            if let Err(e) = ctx.say(reply).await {
                warn!(command = %name, error = %e, "Could not report command failure");
            }
        }
        why => {
            if let Err(e) = poise::builtins::on_error(why).await {
                error!(error = %e, "Error while handling error");
            }
        }
    }
}
