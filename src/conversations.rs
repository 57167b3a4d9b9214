use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::directory::{Directory, UserProfile};
use crate::model::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: i64,
    pub sender_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub counterpart_id: String,
    /// `None` until profiles are attached, or when the id is unknown.
    pub counterpart: Option<UserProfile>,
    pub last_message: LastMessage,
    pub unread_count: usize,
}

/// The participant of `msg` who is not `actor_id`.
fn counterpart_of<'a>(actor_id: &str, msg: &'a Message) -> &'a str {
    if msg.sender_id == actor_id {
        &msg.recipient_id
    } else {
        &msg.sender_id
    }
}

// Newest first; equal timestamps fall back to the higher id.
fn is_newer(a: &Message, b: &Message) -> bool {
    (a.sent_at, a.id) > (b.sent_at, b.id)
}

/// One summary per counterpart, most recently active conversation first.
///
/// Messages in which `actor_id` takes no part are skipped.
pub fn group(actor_id: &str, messages: &[Message]) -> Vec<ConversationSummary> {
    let mut latest: HashMap<&str, &Message> = HashMap::new();
    let mut unread: HashMap<&str, usize> = HashMap::new();

    for msg in messages.iter().filter(|m| m.involves(actor_id)) {
        let other = counterpart_of(actor_id, msg);

        latest
            .entry(other)
            .and_modify(|cur| {
                if is_newer(msg, *cur) {
                    *cur = msg;
                }
            })
            .or_insert(msg);

        let count = unread.entry(other).or_insert(0);
        if msg.recipient_id == actor_id && msg.sender_id == other && !msg.read {
            *count += 1;
        }
    }

    let mut out: Vec<ConversationSummary> = latest
        .into_iter()
        .map(|(other, last)| ConversationSummary {
            counterpart_id: other.to_string(),
            counterpart: None,
            last_message: LastMessage {
                id: last.id,
                sender_id: last.sender_id.clone(),
                content: last.content.clone(),
                sent_at: last.sent_at,
            },
            unread_count: unread.get(other).copied().unwrap_or(0),
        })
        .collect();

    out.sort_by(|a, b| {
        (b.last_message.sent_at, b.last_message.id)
            .cmp(&(a.last_message.sent_at, a.last_message.id))
            .then_with(|| a.counterpart_id.cmp(&b.counterpart_id))
    });
    out
}

/// Fills counterpart profiles from the directory; unknown ids stay `None`.
pub fn attach_profiles(summaries: &mut [ConversationSummary], directory: &Directory) {
    for s in summaries.iter_mut() {
        s.counterpart = directory.profile(&s.counterpart_id);
    }
}

/// Messages exchanged between `actor_id` and `counterpart_id`, oldest first.
pub fn thread(actor_id: &str, counterpart_id: &str, messages: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = messages
        .iter()
        .filter(|m| {
            (m.sender_id == actor_id && m.recipient_id == counterpart_id)
                || (m.sender_id == counterpart_id && m.recipient_id == actor_id)
        })
        .cloned()
        .collect();
    out.sort_by_key(|m| (m.sent_at, m.id));
    out
}

/// Unread messages addressed to `actor_id` across every conversation.
pub fn unread_total(actor_id: &str, messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| m.recipient_id == actor_id && !m.read)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::UserRecord;
    use chrono::TimeZone;

    fn msg(id: i64, from: &str, to: &str, t: i64, read: bool) -> Message {
        Message {
            id,
            sender_id: from.into(),
            recipient_id: to.into(),
            content: format!("m{id}"),
            sent_at: Utc.timestamp_opt(t, 0).single().expect("valid timestamp"),
            read,
        }
    }

    #[test]
    fn empty_input_gives_no_conversations() {
        assert!(group("1", &[]).is_empty());
    }

    #[test]
    fn groups_by_counterpart_newest_first() {
        let messages = vec![
            msg(1, "1", "2", 10, false),
            msg(2, "2", "1", 20, false),
            msg(3, "1", "3", 5, true),
        ];
        let out = group("1", &messages);
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].counterpart_id, "2");
        assert_eq!(out[0].last_message.sent_at.timestamp(), 20);
        assert_eq!(out[0].unread_count, 1);

        assert_eq!(out[1].counterpart_id, "3");
        assert_eq!(out[1].last_message.sent_at.timestamp(), 5);
        assert_eq!(out[1].unread_count, 0);
    }

    #[test]
    fn own_unread_messages_are_not_counted() {
        // Messages the actor sent are unread from the other side only.
        let out = group("1", &[msg(1, "1", "2", 10, false)]);
        assert_eq!(out[0].unread_count, 0);
    }

    #[test]
    fn equal_timestamps_pick_higher_id() {
        let messages = vec![msg(7, "2", "1", 10, true), msg(9, "1", "2", 10, true)];
        let out = group("1", &messages);
        assert_eq!(out[0].last_message.id, 9);

        let reversed: Vec<Message> = messages.into_iter().rev().collect();
        assert_eq!(group("1", &reversed)[0].last_message.id, 9);
    }

    #[test]
    fn unrelated_messages_are_ignored() {
        let out = group("1", &[msg(1, "2", "3", 10, false)]);
        assert!(out.is_empty());
    }

    #[test]
    fn grouping_is_idempotent() {
        let messages = vec![
            msg(1, "1", "2", 10, false),
            msg(2, "4", "1", 10, false),
            msg(3, "1", "3", 30, true),
            msg(4, "2", "1", 15, false),
        ];
        let first = group("1", &messages);
        let second = group("1", &messages);
        assert_eq!(first, second);
        let order: Vec<&str> = first.iter().map(|s| s.counterpart_id.as_str()).collect();
        assert_eq!(order, vec!["3", "2", "4"]);
    }

    #[test]
    fn profiles_attach_for_known_users_only() {
        let dir = Directory::from_records(vec![UserRecord {
            id: "2".into(),
            role: "teacher".into(),
            name: "Ms Rivera".into(),
            class_id: None,
            parent_id: None,
        }])
        .expect("directory");
        let mut out = group(
            "1",
            &[msg(1, "2", "1", 10, false), msg(2, "9", "1", 5, false)],
        );
        attach_profiles(&mut out, &dir);
        assert_eq!(
            out[0].counterpart.as_ref().map(|p| p.name.as_str()),
            Some("Ms Rivera")
        );
        assert!(out[1].counterpart.is_none());
    }

    #[test]
    fn thread_is_chronological_and_two_party() {
        let messages = vec![
            msg(3, "2", "1", 30, false),
            msg(1, "1", "2", 10, true),
            msg(2, "1", "3", 20, true),
            msg(4, "1", "2", 30, false),
        ];
        let ids: Vec<i64> = thread("1", "2", &messages).iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn unread_total_counts_inbound_only() {
        let messages = vec![
            msg(1, "2", "1", 10, false),
            msg(2, "3", "1", 11, false),
            msg(3, "3", "1", 12, true),
            msg(4, "1", "2", 13, false),
        ];
        assert_eq!(unread_total("1", &messages), 2);
    }
}
