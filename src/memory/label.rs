use super::MemoryStore;
use chrono::{DateTime, Utc};

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S%.6f%:z").to_string()
}

/// Human-readable names for rows whose label depends on the rows they hang off.
impl MemoryStore {
    pub fn role_label(&self, id: i32) -> Option<String> {
        let role = self.roles.get(id)?;
        let club = self.clubs.get(role.club_id)?;
        Some(format!("{} {}", club, role.name))
    }

    pub fn channel_label(&self, id: i32) -> Option<String> {
        let channel = self.channels.get(id)?;
        let club = self.clubs.get(channel.club_id)?;
        Some(format!("{} {}", club, channel.name))
    }

    pub fn post_label(&self, id: i32) -> Option<String> {
        let post = self.posts.get(id)?;
        Some(format!(
            "{} {}",
            self.channel_label(post.channel_id)?,
            stamp(post.created)
        ))
    }

    pub fn conversation_label(&self, id: i32) -> Option<String> {
        let conversation = self.conversations.get(id)?;
        Some(format!(
            "{} {}",
            self.channel_label(conversation.channel_id)?,
            stamp(conversation.created)
        ))
    }

    pub fn feedback_label(&self, id: i32) -> Option<String> {
        let feedback = self.feedback.get(id)?;
        let club = self.clubs.get(feedback.club_id)?;
        Some(format!("{} {}", club, stamp(feedback.created)))
    }

    pub fn feedback_reply_label(&self, id: i32) -> Option<String> {
        let reply = self.feedback_replies.get(id)?;
        Some(format!(
            "{} {}",
            self.feedback_label(reply.parent_id)?,
            stamp(reply.created)
        ))
    }
}
