use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use poise::serenity_prelude as serenity;

use crate::CommandMeta;
use crate::moderation::embeds::{
    ban_announcement_embed, ban_notice_embed, feature_disabled_embed, guild_only_message,
    is_forbidden_error, usage_message,
};
use crate::moderation::gate::{
    BAN_DELETE_MESSAGE_DAYS, BanBackend, BanDenial, BanError, BanRequest, DEFAULT_BAN_REASON,
    Notification, run_ban,
};
use sentinel_core::{Context, Error};
use sentinel_store::Feature;
use sentinel_utils::permissions::{MemberAuthority, member_authority_in};
use sentinel_utils::time::now_unix_secs;

pub const META: CommandMeta = CommandMeta {
    name: "ban",
    desc: "Ban a member from the server.",
    category: "moderation",
    usage: "!ban <user> [reason]",
};

#[poise::command(
    prefix_command,
    slash_command,
    category = "Moderation",
    aliases("banir")
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "The member to ban"] user: Option<serenity::User>,
    #[description = "Reason for the ban"]
    #[rest]
    reason: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(());
    };

    let Some(user) = user else {
        ctx.say(usage_message(META.usage)).await?;
        return Ok(());
    };

    let flags = ctx.data().store.load(guild_id.get()).await;
    let logs_enabled = flags.is_enabled(Feature::Logs);

    let reason = reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or(DEFAULT_BAN_REASON)
        .to_owned();
    let request = BanRequest {
        actor_id: ctx.author().id.get(),
        actor_tag: ctx.author().tag(),
        target_id: user.id.get(),
        service_id: ctx.framework().bot_id.get(),
        reason,
    };
    let banned_at = now_unix_secs();
    let backend = DiscordBanBackend::new(ctx.http(), guild_id, &user, banned_at);

    match run_ban(&flags, &request, &backend).await {
        Ok(report) => {
            if report.notification == Notification::Undeliverable && logs_enabled {
                warn!(
                    guild_id = guild_id.get(),
                    target_id = request.target_id,
                    "could not send ban notice by DM"
                );
            }

            ctx.send(poise::CreateReply::default().embed(ban_announcement_embed(
                &user,
                ctx.author(),
                &request.reason,
                banned_at,
                report.notification,
            )))
            .await?;

            if logs_enabled {
                info!(
                    guild_id = guild_id.get(),
                    target_id = request.target_id,
                    target = %user.tag(),
                    moderator_id = request.actor_id,
                    reason = %request.reason,
                    "member banned"
                );
            }
        }
        Err(BanError::Denied(BanDenial::FeatureDisabled)) => {
            ctx.send(poise::CreateReply::default().embed(feature_disabled_embed()))
                .await?;
        }
        Err(BanError::Denied(denial)) => {
            ctx.say(denial.message()).await?;
        }
        Err(BanError::Lookup(source)) => {
            warn!(?source, guild_id = guild_id.get(), "ban member lookup failed");
            ctx.say("I couldn't find that member in this server.").await?;
        }
        Err(BanError::Removal(source)) => {
            error!(?source, guild_id = guild_id.get(), "ban request failed");
            let forbidden = source
                .downcast_ref::<serenity::Error>()
                .is_some_and(is_forbidden_error);
            if forbidden {
                ctx.say("I don't have permission to ban this member.").await?;
            } else {
                ctx.say(format!("Failed to ban the member: {source}")).await?;
            }
        }
    }

    Ok(())
}

/// Ban pipeline backed by the Discord HTTP API.
///
/// The guild is fetched on first use so a disabled feature never costs a
/// request.
struct DiscordBanBackend<'a> {
    http: &'a serenity::Http,
    guild_id: serenity::GuildId,
    guild: OnceCell<serenity::PartialGuild>,
    target: &'a serenity::User,
    banned_at: u64,
}

impl<'a> DiscordBanBackend<'a> {
    fn new(
        http: &'a serenity::Http,
        guild_id: serenity::GuildId,
        target: &'a serenity::User,
        banned_at: u64,
    ) -> Self {
        Self {
            http,
            guild_id,
            guild: OnceCell::new(),
            target,
            banned_at,
        }
    }

    async fn guild(&self) -> Result<&serenity::PartialGuild, serenity::Error> {
        self.guild
            .get_or_try_init(|| self.guild_id.to_partial_guild(self.http))
            .await
    }

    async fn send_notice(&self, request: &BanRequest) -> Result<(), serenity::Error> {
        let guild_name = match self.guild().await {
            Ok(guild) => guild.name.clone(),
            Err(_) => format!("Server {}", self.guild_id.get()),
        };

        let dm_channel = self.target.create_dm_channel(self.http).await?;
        dm_channel
            .send_message(
                self.http,
                serenity::CreateMessage::new().embed(ban_notice_embed(
                    &guild_name,
                    &request.reason,
                    &request.actor_tag,
                    self.banned_at,
                )),
            )
            .await?;

        Ok(())
    }
}

impl BanBackend for DiscordBanBackend<'_> {
    async fn authority(&self, user_id: u64) -> anyhow::Result<MemberAuthority> {
        let guild = self.guild().await?;
        member_authority_in(self.http, guild, serenity::UserId::new(user_id)).await
    }

    async fn notify_target(&self, request: &BanRequest) -> Notification {
        match self.send_notice(request).await {
            Ok(()) => Notification::Delivered,
            Err(source) if is_forbidden_error(&source) => Notification::Undeliverable,
            Err(source) => {
                warn!(?source, target_id = request.target_id, "ban notice failed");
                Notification::Unknown
            }
        }
    }

    async fn remove_target(&self, request: &BanRequest, audit_reason: &str) -> anyhow::Result<()> {
        self.guild_id
            .ban_with_reason(
                self.http,
                serenity::UserId::new(request.target_id),
                BAN_DELETE_MESSAGE_DAYS,
                audit_reason,
            )
            .await?;
        Ok(())
    }
}
