use std::time::Duration;

use chrono::Utc;
use log::{debug, warn};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::MessageId;

use crate::audit::PurgeEvent;
use crate::command::Context;
use crate::lang::LangKey;
use crate::purge::model::{CaptureLog, CapturedMessage, CapturedUser, FilterArgs, MessageFilter};

/// How long the success reply stays up before deleting itself.
const REPLY_TTL: Duration = Duration::from_secs(5);

/// Bulk-delete recent messages, optionally filtered
///
/// Without filters the most recent `amount` messages are deleted outright.
/// With filters, only the messages within that window matching every
/// requested condition are deleted.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Moderation",
    required_permissions = "MANAGE_MESSAGES",
    required_bot_permissions = "SEND_MESSAGES | MANAGE_MESSAGES"
)]
#[allow(clippy::too_many_arguments)]
pub async fn purge(
    ctx: Context<'_>,
    #[description = "How many recent messages to inspect (2-100)"] amount: i64,
    #[description = "Only messages from this user"] user: Option<serenity::User>,
    #[rename = "match"]
    #[description = "Only messages containing this text"]
    matching: Option<String>,
    #[description = "Skip messages containing this text"] nomatch: Option<String>,
    #[flag]
    #[description = "Search embed text as well"]
    include_embeds: bool,
    #[description = "Only messages starting with this text"] startswith: Option<String>,
    #[description = "Only messages ending with this text"] endswith: Option<String>,
    #[flag]
    #[description = "Only messages with at least one attachment"]
    attachments: bool,
    #[flag]
    #[description = "Only messages sent by bots"]
    bot: bool,
    #[rest]
    #[description = "Reason recorded in the audit log"]
    reason: Option<String>,
) -> eyre::Result<()> {
    if !valid_amount(amount) {
        ctx.say(ctx.data().lang.get(LangKey::PurgeAmountInvalid))
            .await?;
        return Ok(());
    }

    // The triggering message is removed up front, best-effort, and never
    // counts toward the window. Slash invocations have no message.
    let invocation = match ctx {
        poise::Context::Prefix(prefix) => {
            let _ = prefix.msg.delete(ctx.discord()).await;
            Some(prefix.msg.id)
        }
        poise::Context::Application(_) => None,
    };

    let args = FilterArgs {
        user: user.map(|user| user.id),
        matching,
        not_matching: nomatch,
        include_embeds,
        starts_with: startswith,
        ends_with: endswith,
        attachments,
        bots: bot,
    };
    match MessageFilter::new(args) {
        Some(filter) => flag_purge(ctx, amount, invocation, filter, reason).await,
        None => basic_purge(ctx, amount, invocation).await,
    }
}

fn valid_amount(amount: i64) -> bool {
    (2..=100).contains(&amount)
}

/// Unconditional purge of the `amount` most recent messages.
async fn basic_purge(
    ctx: Context<'_>,
    amount: i64,
    invocation: Option<MessageId>,
) -> eyre::Result<()> {
    let capture = match super::fetch_recent(&ctx, amount, invocation).await {
        Ok(messages) => CaptureLog::Messages(
            messages
                .iter()
                .map(|message| CapturedMessage::capture(message, &ctx.discord().cache))
                .collect(),
        ),
        Err(err) => {
            warn!("purge: history fetch failed: {}", err);
            CaptureLog::Failed {
                error: ctx.data().lang.get(LangKey::PurgeHistoryFail),
            }
        }
    };

    // Count-based deletion runs off its own fetch, like the platform's
    // bulk delete; a failed capture above does not stop it.
    match bulk_delete_recent(&ctx, amount, invocation).await {
        Ok(deleted) => finish(ctx, deleted, None, capture).await,
        Err(err) => {
            warn!("purge: bulk delete failed: {}", err);
            ctx.say(ctx.data().lang.get(LangKey::PurgeFail)).await?;
            Ok(())
        }
    }
}

/// Deletes up to `limit` of the channel's most recent messages and returns
/// how many deletions were requested.
async fn bulk_delete_recent(
    ctx: &Context<'_>,
    limit: i64,
    invocation: Option<MessageId>,
) -> eyre::Result<usize> {
    let targets: Vec<MessageId> = super::fetch_recent(ctx, limit, invocation)
        .await?
        .iter()
        .map(|message| message.id)
        .collect();
    if !targets.is_empty() {
        ctx.channel_id()
            .delete_messages(&ctx.discord().http, &targets)
            .await?;
    }
    Ok(targets.len())
}

/// Filtered purge: delete only the recent messages matching every
/// requested criterion.
async fn flag_purge(
    ctx: Context<'_>,
    amount: i64,
    invocation: Option<MessageId>,
    filter: MessageFilter,
    reason: Option<String>,
) -> eyre::Result<()> {
    debug!("purge: filtering with criteria [{}]", filter.describe());
    let (targets, capture) = match super::fetch_recent(&ctx, amount, invocation).await {
        Ok(messages) => {
            let survivors: Vec<_> = messages
                .iter()
                .filter(|message| filter.matches(&filter.candidate(message)))
                .collect();
            let capture = survivors
                .iter()
                .map(|message| CapturedMessage::capture(message, &ctx.discord().cache))
                .collect();
            (
                survivors
                    .iter()
                    .map(|message| message.id)
                    .collect::<Vec<_>>(),
                CaptureLog::Messages(capture),
            )
        }
        Err(err) => {
            warn!("purge: history fetch failed: {}", err);
            (
                Vec::new(),
                CaptureLog::Failed {
                    error: ctx.data().lang.get(LangKey::PurgeHistoryFail),
                },
            )
        }
    };

    // Nothing matched, or nothing could be captured: quiet no-op.
    if capture.is_empty() || targets.is_empty() {
        return Ok(());
    }

    match ctx
        .channel_id()
        .delete_messages(&ctx.discord().http, &targets)
        .await
    {
        Ok(()) => finish(ctx, targets.len(), reason, capture).await,
        Err(err) => {
            warn!("purge: bulk delete failed: {}", err);
            ctx.say(ctx.data().lang.get(LangKey::PurgeFail)).await?;
            Ok(())
        }
    }
}

/// Deletion succeeded: emit the audit event, then post the transient
/// success reply.
async fn finish(
    ctx: Context<'_>,
    deleted: usize,
    reason: Option<String>,
    capture: CaptureLog,
) -> eyre::Result<()> {
    ctx.data()
        .audit
        .purge(PurgeEvent {
            guild_id: ctx.guild_id(),
            channel_id: ctx.channel_id(),
            moderator: CapturedUser::from(ctx.author()),
            reason,
            capture,
            at: Utc::now(),
        })
        .await;

    let text = ctx
        .data()
        .lang
        .format(LangKey::PurgeSuccess, &[&deleted.to_string()]);
    let reply = ctx.say(text).await?.into_message().await?;
    let http = ctx.discord().http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(REPLY_TTL).await;
        let _ = http.delete_message(reply.channel_id.0, reply.id.0).await;
    });
    Ok(())
}
