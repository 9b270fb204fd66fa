use poise::serenity_prelude as serenity;

/// Position of a member in the guild's role hierarchy.
///
/// Ordinary members rank by the position of their highest role. The guild
/// owner outranks every role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AuthorityRank(u32);

impl AuthorityRank {
    pub const OWNER: AuthorityRank = AuthorityRank(u32::MAX);

    pub const fn from_role_position(position: u16) -> Self {
        Self(position as u32)
    }
}

/// Effective guild permissions plus hierarchy rank for one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberAuthority {
    pub permissions: serenity::Permissions,
    pub rank: AuthorityRank,
}

impl MemberAuthority {
    pub fn owner() -> Self {
        Self {
            permissions: serenity::Permissions::all(),
            rank: AuthorityRank::OWNER,
        }
    }

    /// Combine the `(permissions, position)` pairs of every role a member holds,
    /// `@everyone` included.
    pub fn from_roles(roles: impl IntoIterator<Item = (serenity::Permissions, u16)>) -> Self {
        let mut permissions = serenity::Permissions::empty();
        let mut highest = 0_u16;

        for (role_permissions, position) in roles {
            permissions |= role_permissions;
            highest = highest.max(position);
        }

        Self {
            permissions,
            rank: AuthorityRank::from_role_position(highest),
        }
    }

    /// `ADMINISTRATOR` implies every other permission.
    pub fn has(&self, required: serenity::Permissions) -> bool {
        self.permissions.contains(serenity::Permissions::ADMINISTRATOR)
            || self.permissions.contains(required)
    }
}

/// Resolve a member's authority against an already fetched guild.
pub async fn member_authority_in(
    http: &serenity::Http,
    guild: &serenity::PartialGuild,
    user_id: serenity::UserId,
) -> anyhow::Result<MemberAuthority> {
    if guild.owner_id == user_id {
        return Ok(MemberAuthority::owner());
    }

    let member = guild.id.member(http, user_id).await?;
    let everyone_role_id = serenity::RoleId::new(guild.id.get());

    Ok(MemberAuthority::from_roles(
        guild
            .roles
            .values()
            .filter(|role| role.id == everyone_role_id || member.roles.contains(&role.id))
            .map(|role| (role.permissions, role.position)),
    ))
}

/// Resolve a member's effective guild permissions and rank.
pub async fn resolve_member_authority(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> anyhow::Result<MemberAuthority> {
    let guild = guild_id.to_partial_guild(http).await?;
    member_authority_in(http, &guild, user_id).await
}

pub async fn has_user_permission(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    required: serenity::Permissions,
) -> anyhow::Result<bool> {
    let authority = resolve_member_authority(http, guild_id, user_id).await?;
    Ok(authority.has(required))
}

#[cfg(test)]
mod tests {
    use poise::serenity_prelude as serenity;

    use super::{AuthorityRank, MemberAuthority};

    #[test]
    fn roles_merge_permissions_and_take_highest_position() {
        let authority = MemberAuthority::from_roles([
            (serenity::Permissions::SEND_MESSAGES, 0),
            (serenity::Permissions::BAN_MEMBERS, 7),
            (serenity::Permissions::KICK_MEMBERS, 3),
        ]);

        assert!(authority.has(serenity::Permissions::BAN_MEMBERS));
        assert!(authority.has(serenity::Permissions::KICK_MEMBERS));
        assert!(!authority.has(serenity::Permissions::MANAGE_GUILD));
        assert_eq!(authority.rank, AuthorityRank::from_role_position(7));
    }

    #[test]
    fn administrator_implies_everything() {
        let authority = MemberAuthority::from_roles([(serenity::Permissions::ADMINISTRATOR, 1)]);
        assert!(authority.has(serenity::Permissions::BAN_MEMBERS));
    }

    #[test]
    fn owner_outranks_any_role() {
        assert!(MemberAuthority::owner().rank > AuthorityRank::from_role_position(u16::MAX));
    }

    #[test]
    fn no_roles_means_bottom_rank() {
        let authority = MemberAuthority::from_roles(std::iter::empty());
        assert_eq!(authority.rank, AuthorityRank::from_role_position(0));
        assert!(!authority.has(serenity::Permissions::BAN_MEMBERS));
    }
}
