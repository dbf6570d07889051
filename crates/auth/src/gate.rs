use serde::{Deserialize, Serialize};

use topup_core::{ChannelId, ExternalId};

/// Context of the caller attempting a gated operation.
///
/// Construction is decoupled from transport: adapters derive this from the
/// inbound event, and the gate only ever sees typed identities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    /// Platform identity of the acting human.
    pub actor: ExternalId,
    /// Channel the action arrived from.
    pub channel: ChannelId,
}

impl ActorContext {
    pub fn new(actor: ExternalId, channel: ChannelId) -> Self {
        Self { actor, channel }
    }
}

/// Authorization policy for ticket decisions.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
///
/// A `false` is an expected deny outcome, not a fault.
pub trait AuditGate: Send + Sync {
    fn authorize(&self, ctx: &ActorContext) -> bool;
}

/// Static configuration for the shipped audit policy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// The one channel whose members may decide tickets.
    pub admin_channel: ChannelId,
}

/// Allow-list of exactly one admin channel.
#[derive(Debug, Clone)]
pub struct SingleChannelGate {
    config: AuditConfig,
}

impl SingleChannelGate {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }
}

impl AuditGate for SingleChannelGate {
    fn authorize(&self, ctx: &ActorContext) -> bool {
        ctx.channel == self.config.admin_channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SingleChannelGate {
        SingleChannelGate::new(AuditConfig {
            admin_channel: ChannelId::new(-100_500),
        })
    }

    #[test]
    fn allows_the_configured_channel() {
        let ctx = ActorContext::new(ExternalId::new(1), ChannelId::new(-100_500));
        assert!(gate().authorize(&ctx));
    }

    #[test]
    fn denies_every_other_channel() {
        for channel in [0, 1, -100_501] {
            let ctx = ActorContext::new(ExternalId::new(1), ChannelId::new(channel));
            assert!(!gate().authorize(&ctx), "channel {channel} should be denied");
        }
    }

    #[test]
    fn actor_identity_alone_grants_nothing() {
        // Same human, wrong channel: still denied.
        let ctx = ActorContext::new(ExternalId::new(999), ChannelId::new(42));
        assert!(!gate().authorize(&ctx));
    }
}
