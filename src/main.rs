mod audit;
mod command;
mod lang;
mod purge;

use eyre::WrapErr;
use log::info;
use serenity::model::application::command::Command;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::env;
use std::sync::Arc;

use crate::audit::LogAudit;
use crate::lang::Lang;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    env_logger::init();

    // Configure the client with your Discord bot token in the environment.
    let token = env::var("DISCORD_TOKEN")
        .wrap_err("Expected a token in the environment variable DISCORD_TOKEN")?;
    let app_id: u64 = env::var("DISCORD_APPLICATION_ID")
        .map_err(eyre::Report::new)
        .and_then(|s| s.parse().map_err(eyre::Report::new))
        .wrap_err("Expected an application ID in the environment variable DISCORD_APPLICATION_ID")?;
    let command_guild_id = match env::var("COMMAND_GUILD_ID") {
        Ok(raw) => Some(
            raw.parse()
                .map_err(eyre::Report::new)
                .wrap_err("Expected a guild ID in the environment variable COMMAND_GUILD_ID")
                .map(GuildId)?,
        ),
        Err(_) => None,
    };
    let language =
        env::var("BOT_LANGUAGE").unwrap_or_else(|_| lang::DEFAULT_LANGUAGE.to_owned());

    // Build our client.
    let data = command::Data {
        lang: Lang::load(&language)?,
        audit: Arc::new(LogAudit),
    };
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: command::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".to_owned()),
                mention_as_prefix: true,
                case_insensitive_commands: true,
                ..Default::default()
            },
            ..Default::default()
        })
        .token(token)
        .client_settings(move |client| client.application_id(app_id))
        .intents(
            GatewayIntents::GUILDS
                | GatewayIntents::GUILD_MESSAGES
                | GatewayIntents::MESSAGE_CONTENT,
        )
        .user_data_setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                match command_guild_id {
                    Some(guild_id) => {
                        guild_id
                            .set_application_commands(&ctx.http, |b| {
                                *b = poise::builtins::create_application_commands(
                                    &*framework.options().commands,
                                );
                                b
                            })
                            .await?;
                        info!("Set application commands for guild {}", guild_id.0);
                    }
                    None => {
                        Command::set_global_application_commands(&ctx.http, |b| {
                            *b = poise::builtins::create_application_commands(
                                &*framework.options().commands,
                            );
                            b
                        })
                        .await?;
                        info!("Set global application commands");
                    }
                }
                Ok(data)
            })
        });

    framework.run().await?;
    Ok(())
}
