use std::fmt;
use std::future::Future;

use poise::serenity_prelude as serenity;

use sentinel_store::{Feature, FeatureFlags};
use sentinel_utils::formatting::truncate_chars;
use sentinel_utils::permissions::MemberAuthority;

pub const DEFAULT_BAN_REASON: &str = "Unspecified";
/// Discord rejects audit log reasons longer than this.
pub const AUDIT_REASON_MAX_CHARS: usize = 512;
pub const BAN_DELETE_MESSAGE_DAYS: u8 = 1;

/// Everything the gate needs to know about one ban attempt.
#[derive(Clone, Debug)]
pub struct BanRequest {
    pub actor_id: u64,
    pub actor_tag: String,
    pub target_id: u64,
    /// The bot's own user id.
    pub service_id: u64,
    pub reason: String,
}

impl BanRequest {
    /// Audit log annotation: the reason followed by who issued the ban.
    pub fn audit_reason(&self) -> String {
        let full = format!(
            "{} | Banned by: {} | ID: {}",
            self.reason, self.actor_tag, self.actor_id
        );
        truncate_chars(&full, AUDIT_REASON_MAX_CHARS).to_owned()
    }
}

/// Why a ban was refused before anything was sent to Discord.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BanDenial {
    FeatureDisabled,
    ActorMissingPermission,
    ServiceMissingPermission,
    SelfTarget,
    ServiceTarget,
    InsufficientAuthority,
    ServiceInsufficientAuthority,
}

impl BanDenial {
    pub fn message(self) -> &'static str {
        match self {
            BanDenial::FeatureDisabled => "The ban system is disabled for this server.",
            BanDenial::ActorMissingPermission => "You don't have permission to ban members.",
            BanDenial::ServiceMissingPermission => "I don't have permission to ban members.",
            BanDenial::SelfTarget => "You can't ban yourself.",
            BanDenial::ServiceTarget => "I can't ban myself.",
            BanDenial::InsufficientAuthority => {
                "You can't ban someone whose highest role is equal to or above yours."
            }
            BanDenial::ServiceInsufficientAuthority => {
                "I can't ban someone whose highest role is equal to or above mine."
            }
        }
    }
}

/// Outcome of the best-effort notice sent to the target before the ban.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    Delivered,
    /// Discord refused delivery, typically because the target closed their DMs.
    Undeliverable,
    /// The attempt failed for some other reason.
    Unknown,
    /// DM notifications are turned off for the guild.
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BanReport {
    pub notification: Notification,
}

#[derive(Debug)]
pub enum BanError {
    Denied(BanDenial),
    /// A member or guild lookup needed for the checks failed.
    Lookup(anyhow::Error),
    /// Every check passed but the ban request itself failed.
    Removal(anyhow::Error),
}

impl fmt::Display for BanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BanError::Denied(denial) => f.write_str(denial.message()),
            BanError::Lookup(source) => write!(f, "member lookup failed: {source}"),
            BanError::Removal(source) => write!(f, "ban request failed: {source}"),
        }
    }
}

/// Side of the ban pipeline that talks to the platform.
pub trait BanBackend {
    fn authority(&self, user_id: u64)
    -> impl Future<Output = anyhow::Result<MemberAuthority>> + Send;

    fn notify_target(&self, request: &BanRequest) -> impl Future<Output = Notification> + Send;

    fn remove_target(
        &self,
        request: &BanRequest,
        audit_reason: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Run every check in order, stopping at the first failure, then notify the
/// target and ban. Nothing is retried.
pub async fn run_ban<B>(
    flags: &FeatureFlags,
    request: &BanRequest,
    backend: &B,
) -> Result<BanReport, BanError>
where
    B: BanBackend,
{
    if !flags.is_enabled(Feature::BanFunction) {
        return Err(BanError::Denied(BanDenial::FeatureDisabled));
    }

    let actor = backend
        .authority(request.actor_id)
        .await
        .map_err(BanError::Lookup)?;
    if !actor.has(serenity::Permissions::BAN_MEMBERS) {
        return Err(BanError::Denied(BanDenial::ActorMissingPermission));
    }

    let service = backend
        .authority(request.service_id)
        .await
        .map_err(BanError::Lookup)?;
    if !service.has(serenity::Permissions::BAN_MEMBERS) {
        return Err(BanError::Denied(BanDenial::ServiceMissingPermission));
    }

    if request.target_id == request.actor_id {
        return Err(BanError::Denied(BanDenial::SelfTarget));
    }
    if request.target_id == request.service_id {
        return Err(BanError::Denied(BanDenial::ServiceTarget));
    }

    let target = backend
        .authority(request.target_id)
        .await
        .map_err(BanError::Lookup)?;
    if target.rank >= actor.rank {
        return Err(BanError::Denied(BanDenial::InsufficientAuthority));
    }
    if target.rank >= service.rank {
        return Err(BanError::Denied(BanDenial::ServiceInsufficientAuthority));
    }

    let notification = if flags.is_enabled(Feature::DmNotifications) {
        backend.notify_target(request).await
    } else {
        Notification::Skipped
    };

    backend
        .remove_target(request, &request.audit_reason())
        .await
        .map_err(BanError::Removal)?;

    Ok(BanReport { notification })
}
