//! Bucket scopes, invocation identities, and bucket key derivation.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::PolicyError;

/// Set of identity components that partition callers into buckets.
///
/// The empty set is [`BucketScope::GLOBAL`]: every caller shares one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BucketScope(u8);

impl BucketScope {
    /// One bucket shared by every caller.
    pub const GLOBAL: Self = Self(0);
    /// Separate buckets per user.
    pub const USER: Self = Self(1);
    /// Separate buckets per channel.
    pub const CHANNEL: Self = Self(2);
    /// Separate buckets per guild; contexts without a guild fall back to per-channel.
    pub const GUILD: Self = Self(4);

    const ALL: u8 = 1 | 2 | 4;

    /// Raw flag bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build a scope from raw bits, rejecting unknown flags.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::ALL == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Whether every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flags are set.
    pub const fn is_global(self) -> bool {
        self.0 == 0
    }

    /// Parse a single scope name (`user`, `channel`, `guild`, `global`), case-insensitive.
    pub fn parse_name(name: &str) -> Result<Self, PolicyError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::USER),
            "channel" => Ok(Self::CHANNEL),
            "guild" => Ok(Self::GUILD),
            "global" => Ok(Self::GLOBAL),
            _ => Err(PolicyError::UnknownScope(name.to_string())),
        }
    }
}

impl BitOr for BucketScope {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BucketScope {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for BucketScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            return f.write_str("global");
        }
        let names = [(Self::USER, "user"), (Self::CHANNEL, "channel"), (Self::GUILD, "guild")];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Who is invoking the action, and where.
///
/// Each component is an opaque id; `0` means "not applicable here" (a direct
/// message has no guild, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identity {
    /// Invoking user.
    pub user_id: u64,
    /// Channel the invocation happened in.
    pub channel_id: u64,
    /// Guild (group) the channel belongs to, or `0` outside of guilds.
    pub guild_id: u64,
}

impl Identity {
    /// Identity from all three components.
    pub const fn new(user_id: u64, channel_id: u64, guild_id: u64) -> Self {
        Self { user_id, channel_id, guild_id }
    }

    /// Invocation inside a guild channel.
    pub const fn in_guild(user_id: u64, channel_id: u64, guild_id: u64) -> Self {
        Self::new(user_id, channel_id, guild_id)
    }

    /// Invocation in a context with no guild (direct messages).
    pub const fn direct(user_id: u64, channel_id: u64) -> Self {
        Self::new(user_id, channel_id, 0)
    }

    /// Whether the invocation carries a guild.
    pub const fn has_guild(&self) -> bool {
        self.guild_id != 0
    }
}

/// Canonical key of a bucket: `"{user}:{channel}:{guild}"` in decimal.
///
/// Decimal digits never contain `:`, so distinct component triples never collide.
/// The key remembers the components it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    text: String,
    identity: Identity,
}

impl BucketKey {
    /// Key for an already-effective identity.
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            text: format!("{}:{}:{}", identity.user_id, identity.channel_id, identity.guild_id),
            identity: *identity,
        }
    }

    /// Derive the bucket key for `identity` under `scope`.
    ///
    /// Returns the key together with the effective identity (components outside the
    /// scope zeroed). A guild-scoped invocation without a guild is keyed by its
    /// channel instead, whether or not the channel flag was requested.
    pub fn derive(scope: BucketScope, identity: &Identity) -> (Self, Identity) {
        let effective = effective_identity(scope, identity);
        (Self::from_identity(&effective), effective)
    }

    /// The key text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// User component, `0` when outside the scope.
    pub fn user_id(&self) -> u64 {
        self.identity.user_id
    }

    /// Channel component, `0` when outside the scope.
    pub fn channel_id(&self) -> u64 {
        self.identity.channel_id
    }

    /// Guild component, `0` when outside the scope or absent.
    pub fn guild_id(&self) -> u64 {
        self.identity.guild_id
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn effective_identity(scope: BucketScope, identity: &Identity) -> Identity {
    let user_id = if scope.contains(BucketScope::USER) { identity.user_id } else { 0 };

    let guild_scoped = scope.contains(BucketScope::GUILD);
    let channel_id = if scope.contains(BucketScope::CHANNEL) || (guild_scoped && !identity.has_guild())
    {
        identity.channel_id
    } else {
        0
    };

    let guild_id = if guild_scoped { identity.guild_id } else { 0 };

    Identity { user_id, channel_id, guild_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(scope: BucketScope, identity: Identity) -> String {
        BucketKey::derive(scope, &identity).0.as_str().to_owned()
    }

    #[test]
    fn global_collapses_every_identity() {
        assert_eq!(key(BucketScope::GLOBAL, Identity::new(1, 1, 1)), "0:0:0");
        assert_eq!(key(BucketScope::GLOBAL, Identity::new(2, 2, 2)), "0:0:0");
        assert_eq!(key(BucketScope::GLOBAL, Identity::direct(3, 9)), "0:0:0");
    }

    #[test]
    fn user_scope_keeps_only_user() {
        assert_eq!(key(BucketScope::USER, Identity::new(9, 42, 7)), "9:0:0");
    }

    #[test]
    fn channel_scope_keeps_only_channel() {
        assert_eq!(key(BucketScope::CHANNEL, Identity::new(9, 42, 7)), "0:42:0");
    }

    #[test]
    fn guild_scope_in_guild_ignores_channel() {
        assert_eq!(key(BucketScope::GUILD, Identity::in_guild(9, 42, 7)), "0:0:7");
    }

    #[test]
    fn guild_scope_without_guild_falls_back_to_channel() {
        let guild = key(BucketScope::GUILD, Identity::direct(7, 42));
        let channel = key(BucketScope::CHANNEL, Identity::new(0, 42, 0));
        assert_eq!(guild, "0:42:0");
        assert_eq!(guild, channel);
    }

    #[test]
    fn channel_and_guild_keeps_channel_in_guild() {
        let scope = BucketScope::CHANNEL | BucketScope::GUILD;
        assert_eq!(key(scope, Identity::in_guild(1, 42, 7)), "0:42:7");
        assert_eq!(key(scope, Identity::direct(1, 42)), "0:42:0");
    }

    #[test]
    fn user_and_guild_without_guild_includes_channel() {
        let scope = BucketScope::USER | BucketScope::GUILD;
        assert_eq!(key(scope, Identity::direct(5, 42)), "5:42:0");
    }

    #[test]
    fn key_components_follow_guild_fallback() {
        let scope = BucketScope::CHANNEL | BucketScope::GUILD;
        let (key, _) = BucketKey::derive(scope, &Identity::direct(7, 42));
        assert_eq!(key.as_str(), "0:42:0");
        assert_eq!((key.user_id(), key.channel_id(), key.guild_id()), (0, 42, 0));

        let scope = BucketScope::USER | BucketScope::GUILD;
        let (key, _) = BucketKey::derive(scope, &Identity::in_guild(5, 42, 7));
        assert_eq!((key.user_id(), key.channel_id(), key.guild_id()), (5, 0, 7));
    }

    #[test]
    fn derive_returns_effective_identity() {
        let (_, effective) = BucketKey::derive(BucketScope::USER, &Identity::new(9, 42, 7));
        assert_eq!(effective, Identity::new(9, 0, 0));
    }

    #[test]
    fn distinct_triples_do_not_collide() {
        let all = BucketScope::USER | BucketScope::CHANNEL | BucketScope::GUILD;
        assert_ne!(key(all, Identity::new(1, 23, 4)), key(all, Identity::new(12, 3, 4)));
        assert_eq!(key(all, Identity::new(u64::MAX, 0, 1)), format!("{}:0:1", u64::MAX));
    }

    #[test]
    fn scope_flags_compose_and_render() {
        let mut scope = BucketScope::USER;
        scope |= BucketScope::GUILD;
        assert!(scope.contains(BucketScope::USER));
        assert!(!scope.contains(BucketScope::CHANNEL));
        assert_eq!(scope.bits(), 5);
        assert_eq!(scope.to_string(), "user|guild");
        assert_eq!(BucketScope::GLOBAL.to_string(), "global");
        assert!(BucketScope::GLOBAL.is_global());
        assert_eq!(BucketScope::from_bits(8), None);
        assert_eq!(BucketScope::from_bits(6), Some(BucketScope::CHANNEL | BucketScope::GUILD));
    }

    #[test]
    fn parse_scope_names() {
        assert_eq!(BucketScope::parse_name("User").unwrap(), BucketScope::USER);
        assert_eq!(BucketScope::parse_name(" global ").unwrap(), BucketScope::GLOBAL);
        assert!(matches!(
            BucketScope::parse_name("team"),
            Err(PolicyError::UnknownScope(name)) if name == "team"
        ));
    }
}
