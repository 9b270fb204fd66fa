use std::future::IntoFuture;
use std::time::Instant;

use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use crate::CommandMeta;
use crate::config::session::{PanelDenial, PanelOutcome, PanelSession};
use crate::config::view::{
    PanelIds, closed_embed, denial_message, details_embed, expired_embed, panel_components,
    panel_embed, superseded_embed, toggle_feedback, unknown_feature_message,
};
use crate::moderation::embeds::guild_only_message;
use sentinel_core::{Context, Error};
use sentinel_store::Feature;
use sentinel_utils::embed::denied_embed;
use sentinel_utils::permissions::has_user_permission;

pub const META: CommandMeta = CommandMeta {
    name: "panel",
    desc: "Open the feature control panel for this server.",
    category: "config",
    usage: "!panel",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Config",
    aliases("control", "config", "configure", "settings")
)]
pub async fn panel(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    if !has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::ADMINISTRATOR,
    )
    .await?
    {
        ctx.send(
            poise::CreateReply::default().ephemeral(true).embed(denied_embed(
                "Access Denied",
                "You need the **Administrator** permission to open the control panel.",
            )),
        )
        .await?;
        return Ok(());
    }

    let data = ctx.data();
    let owner_id = ctx.author().id;
    let flags = data.store.load(guild_id.get()).await;
    let lease = data.panels.claim(guild_id.get(), owner_id.get());
    let mut session = PanelSession::open(guild_id.get(), owner_id.get(), Instant::now());
    let ids = PanelIds::new(ctx.id());

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(panel_embed(&flags, &session))
                .components(panel_components(&ids, &flags)),
        )
        .await?;
    let message = reply.message().await?;
    let message_id = message.id;
    let channel_id = message.channel_id;

    if flags.is_enabled(Feature::Logs) {
        info!(
            guild_id = guild_id.get(),
            user_id = owner_id.get(),
            user = %ctx.author().tag(),
            "control panel opened"
        );
    }

    let superseded = lease.superseded();
    tokio::pin!(superseded);

    loop {
        let collector = serenity::collector::ComponentInteractionCollector::new(ctx)
            .filter({
                let prefix = ids.prefix().to_owned();
                move |interaction| {
                    interaction.message.id == message_id
                        && interaction.data.custom_id.starts_with(&prefix)
                }
            })
            .timeout(session.remaining(Instant::now()));

        let press = tokio::select! {
            press = collector.into_future() => press,
            () = &mut superseded => {
                session.close();
                debug!(guild_id = guild_id.get(), user_id = owner_id.get(), "control panel superseded");
                let _ = channel_id
                    .edit_message(
                        ctx.http(),
                        message_id,
                        serenity::EditMessage::new()
                            .embed(superseded_embed())
                            .components(vec![]),
                    )
                    .await;
                return Ok(());
            }
        };

        let Some(press) = press else {
            session.expire();
            break;
        };

        let Some(action) = ids.parse(&press.data.custom_id) else {
            continue;
        };

        let outcome = session
            .handle(&data.store, press.user.id.get(), action, Instant::now())
            .await;

        match outcome {
            PanelOutcome::Denied(denial) => {
                press
                    .create_response(ctx.http(), ephemeral_text(denial_message(denial)))
                    .await?;
                if denial == PanelDenial::Expired {
                    break;
                }
            }
            PanelOutcome::Toggled {
                feature,
                enabled,
                flags,
            } => {
                press
                    .create_response(
                        ctx.http(),
                        serenity::CreateInteractionResponse::UpdateMessage(
                            serenity::CreateInteractionResponseMessage::new()
                                .embed(panel_embed(&flags, &session))
                                .components(panel_components(&ids, &flags)),
                        ),
                    )
                    .await?;
                press
                    .create_followup(
                        ctx.http(),
                        serenity::CreateInteractionResponseFollowup::new()
                            .content(toggle_feedback(feature, enabled))
                            .ephemeral(true),
                    )
                    .await?;

                if flags.is_enabled(Feature::Logs) || feature == Feature::Logs {
                    info!(
                        guild_id = guild_id.get(),
                        user_id = owner_id.get(),
                        feature = feature.key(),
                        enabled,
                        "feature toggled"
                    );
                }
            }
            PanelOutcome::UnknownFeature(name) => {
                press
                    .create_response(ctx.http(), ephemeral_text(&unknown_feature_message(&name)))
                    .await?;
            }
            PanelOutcome::Details(flags) => {
                press
                    .create_response(
                        ctx.http(),
                        serenity::CreateInteractionResponse::Message(
                            serenity::CreateInteractionResponseMessage::new()
                                .embed(details_embed(&flags))
                                .ephemeral(true),
                        ),
                    )
                    .await?;
            }
            PanelOutcome::Refreshed(flags) => {
                press
                    .create_response(
                        ctx.http(),
                        serenity::CreateInteractionResponse::UpdateMessage(
                            serenity::CreateInteractionResponseMessage::new()
                                .embed(panel_embed(&flags, &session))
                                .components(panel_components(&ids, &flags)),
                        ),
                    )
                    .await?;
                press
                    .create_followup(
                        ctx.http(),
                        serenity::CreateInteractionResponseFollowup::new()
                            .content("Panel refreshed.")
                            .ephemeral(true),
                    )
                    .await?;
            }
            PanelOutcome::Closed => {
                press
                    .create_response(
                        ctx.http(),
                        serenity::CreateInteractionResponse::UpdateMessage(
                            serenity::CreateInteractionResponseMessage::new()
                                .embed(closed_embed())
                                .components(vec![]),
                        ),
                    )
                    .await?;
                return Ok(());
            }
        }
    }

    // Expired: strip the controls so no further input is possible.
    let _ = channel_id
        .edit_message(
            ctx.http(),
            message_id,
            serenity::EditMessage::new()
                .embed(expired_embed(&session))
                .components(vec![]),
        )
        .await;

    Ok(())
}

fn ephemeral_text(content: &str) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}
