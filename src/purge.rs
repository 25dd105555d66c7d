pub mod command;
pub mod model;

use serenity::model::channel::Message;
use serenity::model::id::MessageId;

use crate::command::Context;

/// Fetches up to `limit` of the most recent messages in the invoking
/// channel, newest first, excluding the invocation itself.
pub(crate) async fn fetch_recent(
    ctx: &Context<'_>,
    limit: i64,
    invocation: Option<MessageId>,
) -> serenity::Result<Vec<Message>> {
    let mut messages = ctx
        .channel_id()
        .messages(&ctx.discord().http, |b| b.limit(limit as u64))
        .await?;
    messages.retain(|message| Some(message.id) != invocation);
    Ok(messages)
}
