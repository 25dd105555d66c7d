use std::fmt::Write as _;

use serde::Serialize;
use serenity::model::channel::{Attachment, Embed, Message};
use serenity::model::id::UserId;
use serenity::model::user::User;

/// Author identity recorded alongside purged content.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedUser {
    pub id: UserId,
    pub tag: String,
    pub bot: bool,
}

impl From<&User> for CapturedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tag: user.tag(),
            bot: user.bot,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedField {
    pub name: String,
    pub value: String,
}

/// Embed snapshot reduced to the parts that matter for audit records and
/// content search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapturedEmbed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<CapturedField>,
    pub footer_text: Option<String>,
    pub author_name: Option<String>,
}

impl CapturedEmbed {
    /// Searchable text of the embed: title, description, each field as
    /// "name value", footer text and author name, concatenated without
    /// separators between the parts.
    pub fn searchable_text(&self) -> String {
        let mut text = String::new();
        if let Some(title) = &self.title {
            text.push_str(title);
        }
        if let Some(description) = &self.description {
            text.push_str(description);
        }
        for field in &self.fields {
            let _ = write!(text, "{} {}", field.name, field.value);
        }
        if let Some(footer) = &self.footer_text {
            text.push_str(footer);
        }
        if let Some(author) = &self.author_name {
            text.push_str(author);
        }
        text
    }
}

impl From<&Embed> for CapturedEmbed {
    fn from(embed: &Embed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            fields: embed
                .fields
                .iter()
                .map(|field| CapturedField {
                    name: field.name.clone(),
                    value: field.value.clone(),
                })
                .collect(),
            footer_text: embed.footer.as_ref().map(|footer| footer.text.clone()),
            author_name: embed.author.as_ref().map(|author| author.name.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CapturedAttachment {
    pub filename: String,
    pub url: String,
    pub size: u64,
}

impl From<&Attachment> for CapturedAttachment {
    fn from(attachment: &Attachment) -> Self {
        Self {
            filename: attachment.filename.clone(),
            url: attachment.url.clone(),
            size: attachment.size,
        }
    }
}

/// Snapshot of one message slated for deletion. Collected only for the
/// audit event payload, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedMessage {
    pub author: CapturedUser,
    pub content: String,
    pub embeds: Vec<CapturedEmbed>,
    pub attachments: Vec<CapturedAttachment>,
    pub sent_at: i64,
}

impl CapturedMessage {
    /// Snapshots `message` with mentions resolved to plain names.
    pub fn capture(message: &Message, cache: impl AsRef<serenity::cache::Cache>) -> Self {
        Self {
            author: CapturedUser::from(&message.author),
            content: message.content_safe(cache),
            embeds: message.embeds.iter().map(CapturedEmbed::from).collect(),
            attachments: message
                .attachments
                .iter()
                .map(CapturedAttachment::from)
                .collect(),
            sent_at: message.timestamp.unix_timestamp(),
        }
    }
}

/// What the audit event records about the deleted window: the snapshots
/// themselves, or the reason they could not be collected.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CaptureLog {
    Messages(Vec<CapturedMessage>),
    Failed { error: String },
}

impl CaptureLog {
    /// `Failed` still carries information for the audit trail, so only an
    /// empty snapshot list counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Messages(messages) => messages.is_empty(),
            Self::Failed { .. } => false,
        }
    }
}

/// Optional criteria of a purge invocation. Presence of any field routes
/// the command through the filtered path.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub user: Option<UserId>,
    pub matching: Option<String>,
    pub not_matching: Option<String>,
    pub include_embeds: bool,
    pub starts_with: Option<String>,
    pub ends_with: Option<String>,
    pub attachments: bool,
    pub bots: bool,
}

impl FilterArgs {
    pub fn is_active(&self) -> bool {
        self.user.is_some()
            || self.matching.is_some()
            || self.not_matching.is_some()
            || self.include_embeds
            || self.starts_with.is_some()
            || self.ends_with.is_some()
            || self.attachments
            || self.bots
    }
}

/// The filter's view of one fetched message.
#[derive(Debug, Clone)]
pub struct Candidate {
    author_id: UserId,
    author_is_bot: bool,
    attachment_count: usize,
    text: String,
}

impl Candidate {
    /// `text` becomes the lowercased body, widened with each embed's
    /// searchable text when `include_embeds` is set.
    pub fn new(
        author_id: UserId,
        author_is_bot: bool,
        attachment_count: usize,
        content: &str,
        embeds: &[CapturedEmbed],
        include_embeds: bool,
    ) -> Self {
        let mut text = content.to_lowercase();
        if include_embeds {
            for embed in embeds {
                text.push_str(&embed.searchable_text().to_lowercase());
            }
        }
        Self {
            author_id,
            author_is_bot,
            attachment_count,
            text,
        }
    }
}

/// One named condition a candidate must satisfy.
struct Criterion {
    name: &'static str,
    test: Box<dyn Fn(&Candidate) -> bool + Send + Sync>,
}

impl Criterion {
    fn new(name: &'static str, test: impl Fn(&Candidate) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name,
            test: Box::new(test),
        }
    }
}

/// Conjunction of the requested criteria; a message is deleted only when
/// every one of them holds.
pub struct MessageFilter {
    include_embeds: bool,
    criteria: Vec<Criterion>,
}

impl MessageFilter {
    /// Builds the filter, or `None` when no criterion was requested and
    /// the basic purge applies.
    pub fn new(args: FilterArgs) -> Option<Self> {
        if !args.is_active() {
            return None;
        }
        let mut criteria = Vec::new();
        if let Some(user) = args.user {
            criteria.push(Criterion::new("author", move |c: &Candidate| {
                c.author_id == user
            }));
        }
        if let Some(needle) = args.matching {
            let needle = needle.to_lowercase();
            criteria.push(Criterion::new("match", move |c: &Candidate| {
                c.text.contains(&needle)
            }));
        }
        if let Some(needle) = args.not_matching {
            let needle = needle.to_lowercase();
            criteria.push(Criterion::new("nomatch", move |c: &Candidate| {
                !c.text.contains(&needle)
            }));
        }
        if let Some(prefix) = args.starts_with {
            let prefix = prefix.to_lowercase();
            criteria.push(Criterion::new("startswith", move |c: &Candidate| {
                c.text.starts_with(&prefix)
            }));
        }
        if let Some(suffix) = args.ends_with {
            let suffix = suffix.to_lowercase();
            criteria.push(Criterion::new("endswith", move |c: &Candidate| {
                c.text.ends_with(&suffix)
            }));
        }
        if args.attachments {
            criteria.push(Criterion::new("attachments", |c: &Candidate| {
                c.attachment_count >= 1
            }));
        }
        if args.bots {
            criteria.push(Criterion::new("bot", |c: &Candidate| c.author_is_bot));
        }
        Some(Self {
            include_embeds: args.include_embeds,
            criteria,
        })
    }

    pub fn candidate(&self, message: &Message) -> Candidate {
        let embeds: Vec<CapturedEmbed> = message.embeds.iter().map(CapturedEmbed::from).collect();
        Candidate::new(
            message.author.id,
            message.author.bot,
            message.attachments.len(),
            &message.content,
            &embeds,
            self.include_embeds,
        )
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        self.criteria
            .iter()
            .all(|criterion| (criterion.test)(candidate))
    }

    /// Names of the active criteria, for logging.
    pub fn describe(&self) -> String {
        self.criteria
            .iter()
            .map(|criterion| criterion.name)
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(content: &str) -> Candidate {
        Candidate::new(UserId(1), false, 0, content, &[], false)
    }

    fn filter(args: FilterArgs) -> MessageFilter {
        MessageFilter::new(args).expect("filter should be active")
    }

    #[test]
    fn no_criteria_means_basic_purge() {
        assert!(MessageFilter::new(FilterArgs::default()).is_none());
    }

    #[test]
    fn include_embeds_alone_activates_the_filter() {
        let filter = filter(FilterArgs {
            include_embeds: true,
            ..Default::default()
        });
        assert!(filter.matches(&candidate("anything at all")));
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let filter = filter(FilterArgs {
            matching: Some("SALE".to_owned()),
            ..Default::default()
        });
        assert!(filter.matches(&candidate("Flash Sale today")));
        assert!(!filter.matches(&candidate("nothing to see")));
    }

    #[test]
    fn nomatch_excludes_matching_messages() {
        let filter = filter(FilterArgs {
            not_matching: Some("keep".to_owned()),
            ..Default::default()
        });
        assert!(!filter.matches(&candidate("please KEEP this")));
        assert!(filter.matches(&candidate("delete this")));
    }

    #[test]
    fn prefix_and_suffix_are_case_insensitive() {
        let starts = filter(FilterArgs {
            starts_with: Some("HELLO".to_owned()),
            ..Default::default()
        });
        assert!(starts.matches(&candidate("hello world")));
        assert!(!starts.matches(&candidate("world hello")));

        let ends = filter(FilterArgs {
            ends_with: Some("BYE".to_owned()),
            ..Default::default()
        });
        assert!(ends.matches(&candidate("ok bye")));
        assert!(!ends.matches(&candidate("bye ok")));
    }

    #[test]
    fn all_requested_criteria_must_hold() {
        let filter = filter(FilterArgs {
            matching: Some("sale".to_owned()),
            bots: true,
            ..Default::default()
        });
        let bot_sale = Candidate::new(UserId(2), true, 0, "BIG SALE", &[], false);
        let human_sale = Candidate::new(UserId(3), false, 0, "BIG SALE", &[], false);
        let bot_other = Candidate::new(UserId(2), true, 0, "hello", &[], false);
        assert!(filter.matches(&bot_sale));
        assert!(!filter.matches(&human_sale));
        assert!(!filter.matches(&bot_other));
    }

    #[test]
    fn author_and_attachment_criteria() {
        let filter = filter(FilterArgs {
            user: Some(UserId(9)),
            attachments: true,
            ..Default::default()
        });
        let hit = Candidate::new(UserId(9), false, 2, "file", &[], false);
        let wrong_author = Candidate::new(UserId(8), false, 2, "file", &[], false);
        let no_attachment = Candidate::new(UserId(9), false, 0, "file", &[], false);
        assert!(filter.matches(&hit));
        assert!(!filter.matches(&wrong_author));
        assert!(!filter.matches(&no_attachment));
    }

    #[test]
    fn embed_text_only_counts_when_requested() {
        let embeds = [CapturedEmbed {
            title: Some("Weekend SALE".to_owned()),
            ..Default::default()
        }];
        let body_only = filter(FilterArgs {
            matching: Some("sale".to_owned()),
            ..Default::default()
        });
        let widened = filter(FilterArgs {
            matching: Some("sale".to_owned()),
            include_embeds: true,
            ..Default::default()
        });
        let plain = Candidate::new(UserId(1), true, 0, "look at this", &embeds, false);
        let searched = Candidate::new(UserId(1), true, 0, "look at this", &embeds, true);
        assert!(!body_only.matches(&plain));
        assert!(widened.matches(&searched));
    }

    #[test]
    fn embed_searchable_text_concatenates_in_order() {
        let embed = CapturedEmbed {
            title: Some("A".to_owned()),
            description: Some("B".to_owned()),
            fields: vec![CapturedField {
                name: "n".to_owned(),
                value: "v".to_owned(),
            }],
            footer_text: Some("F".to_owned()),
            author_name: Some("X".to_owned()),
        };
        assert_eq!(embed.searchable_text(), "ABn vFX");
    }

    #[test]
    fn describe_lists_active_criteria() {
        let filter = filter(FilterArgs {
            matching: Some("x".to_owned()),
            bots: true,
            ..Default::default()
        });
        assert_eq!(filter.describe(), "match+bot");
    }

    #[test]
    fn failed_capture_is_not_empty() {
        assert!(CaptureLog::Messages(Vec::new()).is_empty());
        assert!(!CaptureLog::Failed {
            error: "nope".to_owned()
        }
        .is_empty());
    }

    #[test]
    fn capture_log_serializes_flat() {
        let failed = serde_json::to_value(CaptureLog::Failed {
            error: "nope".to_owned(),
        })
        .unwrap();
        assert_eq!(failed, serde_json::json!({ "error": "nope" }));

        let empty = serde_json::to_value(CaptureLog::Messages(Vec::new())).unwrap();
        assert_eq!(empty, serde_json::json!([]));
    }
}
