use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};

use crate::purge::model::{CaptureLog, CapturedUser};

/// Record of one completed purge, emitted before the success reply.
#[derive(Debug, Serialize)]
pub struct PurgeEvent {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub moderator: CapturedUser,
    pub reason: Option<String>,
    pub capture: CaptureLog,
    pub at: DateTime<Utc>,
}

/// Receives purge records. Injected into the command data so a different
/// sink can stand in during tests or when a guild log channel exists.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn purge(&self, event: PurgeEvent);
}

/// Default sink: writes purge records to the process log.
pub struct LogAudit;

#[async_trait]
impl AuditSink for LogAudit {
    async fn purge(&self, event: PurgeEvent) {
        let capture = match serde_json::to_string(&event.capture) {
            Ok(json) => json,
            Err(err) => {
                warn!("could not serialize purge capture: {}", err);
                format!("{:?}", event.capture)
            }
        };
        info!(
            target: "audit",
            "purge in channel {} by {} ({}), reason: {}, capture: {}",
            event.channel_id,
            event.moderator.tag,
            event.moderator.id,
            event.reason.as_deref().unwrap_or("none"),
            capture,
        );
    }
}
