use super::MemoryStore;
use crate::error::{ModelError, ModelResult};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Rows removed by one delete, counted per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deleted(BTreeMap<&'static str, usize>);

impl Deleted {
    fn add(&mut self, table: &'static str, count: usize) {
        if count > 0 {
            *self.0.entry(table).or_default() += count;
        }
    }

    pub fn count(&self, table: &str) -> usize {
        self.0.get(table).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn tables(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.0.iter().map(|(table, count)| (*table, *count))
    }
}

impl MemoryStore {
    pub fn delete_user(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.users.contains(id) {
            return Err(ModelError::not_found("user", id));
        }
        if let Some(project) = self.projects.values().find(|p| p.leader_id == id) {
            return Err(ModelError::Protected {
                user_id: id,
                project_id: project.id,
            });
        }

        let mut deleted = Deleted::default();
        let n = self.requests.remove_where(|r| r.user_id == id).len();
        deleted.add("club_membership_requests", n);
        let n = self.memberships.remove_where(|m| m.user_id == id).len();
        deleted.add("club_memberships", n);
        let n = self.project_memberships.remove_where(|m| m.user_id == id).len();
        deleted.add("project_memberships", n);
        let n = self.subscriptions.remove_where(|s| s.user_id == id).len();
        deleted.add("channel_subscriptions", n);

        let authored: Vec<i32> = self
            .conversations
            .values()
            .filter(|c| c.author_id == id)
            .map(|c| c.id)
            .collect();
        self.remove_threads(authored, &mut deleted);

        let feedback: Vec<i32> = self
            .feedback
            .values()
            .filter(|f| f.author_id == id)
            .map(|f| f.id)
            .collect();
        self.remove_feedback(feedback, &mut deleted);

        self.users.remove(id);
        deleted.add("users", 1);
        debug!(user_id = id, rows = deleted.total(), "deleted user");
        Ok(deleted)
    }

    pub fn delete_club(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.clubs.contains(id) {
            return Err(ModelError::not_found("club", id));
        }

        let mut deleted = Deleted::default();
        let roles: Vec<i32> = self.club_roles(id).iter().map(|r| r.id).collect();
        for role_id in roles {
            self.remove_role(role_id, &mut deleted);
        }
        let n = self.requests.remove_where(|r| r.club_id == id).len();
        deleted.add("club_membership_requests", n);
        if let Some(channel_id) = self.channel_for_club(id).map(|c| c.id) {
            self.remove_channel(channel_id, &mut deleted);
        }
        let n = self.club_projects.remove_where(|cp| cp.club_id == id).len();
        deleted.add("club_projects", n);
        let feedback: Vec<i32> = self.club_feedback(id).iter().map(|f| f.id).collect();
        self.remove_feedback(feedback, &mut deleted);

        self.clubs.remove(id);
        deleted.add("clubs", 1);
        debug!(club_id = id, rows = deleted.total(), "deleted club");
        Ok(deleted)
    }

    pub fn delete_request(&mut self, id: i32) -> ModelResult<Deleted> {
        self.requests
            .remove(id)
            .ok_or_else(|| ModelError::not_found("club membership request", id))?;
        let mut deleted = Deleted::default();
        deleted.add("club_membership_requests", 1);
        Ok(deleted)
    }

    pub fn delete_role(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.roles.contains(id) {
            return Err(ModelError::not_found("club role", id));
        }
        let mut deleted = Deleted::default();
        self.remove_role(id, &mut deleted);
        Ok(deleted)
    }

    pub fn delete_membership(&mut self, id: i32) -> ModelResult<Deleted> {
        self.memberships
            .remove(id)
            .ok_or_else(|| ModelError::not_found("club membership", id))?;
        let mut deleted = Deleted::default();
        deleted.add("club_memberships", 1);
        Ok(deleted)
    }

    /// Removes the project with its club links and memberships. Clubs and users stay.
    pub fn delete_project(&mut self, id: i32) -> ModelResult<Deleted> {
        self.projects
            .remove(id)
            .ok_or_else(|| ModelError::not_found("project", id))?;

        let mut deleted = Deleted::default();
        let n = self.club_projects.remove_where(|cp| cp.project_id == id).len();
        deleted.add("club_projects", n);
        let n = self
            .project_memberships
            .remove_where(|m| m.project_id == id)
            .len();
        deleted.add("project_memberships", n);
        deleted.add("projects", 1);
        debug!(project_id = id, rows = deleted.total(), "deleted project");
        Ok(deleted)
    }

    pub fn unlink_project(&mut self, id: i32) -> ModelResult<Deleted> {
        self.club_projects
            .remove(id)
            .ok_or_else(|| ModelError::not_found("club project", id))?;
        let mut deleted = Deleted::default();
        deleted.add("club_projects", 1);
        Ok(deleted)
    }

    pub fn leave_project(&mut self, id: i32) -> ModelResult<Deleted> {
        self.project_memberships
            .remove(id)
            .ok_or_else(|| ModelError::not_found("project membership", id))?;
        let mut deleted = Deleted::default();
        deleted.add("project_memberships", 1);
        Ok(deleted)
    }

    pub fn unsubscribe(&mut self, id: i32) -> ModelResult<Deleted> {
        self.subscriptions
            .remove(id)
            .ok_or_else(|| ModelError::not_found("channel subscription", id))?;
        let mut deleted = Deleted::default();
        deleted.add("channel_subscriptions", 1);
        Ok(deleted)
    }

    pub fn delete_channel(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.channels.contains(id) {
            return Err(ModelError::not_found("channel", id));
        }
        let mut deleted = Deleted::default();
        self.remove_channel(id, &mut deleted);
        Ok(deleted)
    }

    pub fn delete_post(&mut self, id: i32) -> ModelResult<Deleted> {
        self.posts
            .remove(id)
            .ok_or_else(|| ModelError::not_found("post", id))?;
        let mut deleted = Deleted::default();
        deleted.add("posts", 1);
        Ok(deleted)
    }

    /// Removes the conversation and every reply beneath it.
    pub fn delete_conversation(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.conversations.contains(id) {
            return Err(ModelError::not_found("conversation", id));
        }
        let mut deleted = Deleted::default();
        self.remove_threads(vec![id], &mut deleted);
        Ok(deleted)
    }

    pub fn delete_feedback(&mut self, id: i32) -> ModelResult<Deleted> {
        if !self.feedback.contains(id) {
            return Err(ModelError::not_found("feedback", id));
        }
        let mut deleted = Deleted::default();
        self.remove_feedback(vec![id], &mut deleted);
        Ok(deleted)
    }

    pub fn delete_feedback_reply(&mut self, id: i32) -> ModelResult<Deleted> {
        self.feedback_replies
            .remove(id)
            .ok_or_else(|| ModelError::not_found("feedback reply", id))?;
        let mut deleted = Deleted::default();
        deleted.add("feedback_replies", 1);
        Ok(deleted)
    }

    fn remove_role(&mut self, id: i32, deleted: &mut Deleted) {
        let n = self.memberships.remove_where(|m| m.club_role_id == id).len();
        deleted.add("club_memberships", n);
        if self.roles.remove(id).is_some() {
            deleted.add("club_roles", 1);
        }
    }

    fn remove_channel(&mut self, id: i32, deleted: &mut Deleted) {
        let n = self.subscriptions.remove_where(|s| s.channel_id == id).len();
        deleted.add("channel_subscriptions", n);
        let n = self.posts.remove_where(|p| p.channel_id == id).len();
        deleted.add("posts", n);
        let conversations: Vec<i32> = self
            .conversations
            .values()
            .filter(|c| c.channel_id == id)
            .map(|c| c.id)
            .collect();
        self.remove_threads(conversations, deleted);
        if self.channels.remove(id).is_some() {
            deleted.add("channels", 1);
        }
    }

    /// Walks the parent links breadth first from `roots`, removing each
    /// conversation and everything that replies to it.
    fn remove_threads(&mut self, roots: Vec<i32>, deleted: &mut Deleted) {
        let mut queue: VecDeque<i32> = roots.into();
        while let Some(id) = queue.pop_front() {
            // already taken out as part of an earlier subtree
            if self.conversations.remove(id).is_none() {
                continue;
            }
            deleted.add("conversations", 1);
            queue.extend(
                self.conversations
                    .values()
                    .filter(|c| c.parent_id == Some(id))
                    .map(|c| c.id),
            );
        }
    }

    fn remove_feedback(&mut self, ids: Vec<i32>, deleted: &mut Deleted) {
        for id in ids {
            let n = self.feedback_replies.remove_where(|r| r.parent_id == id).len();
            deleted.add("feedback_replies", n);
            if self.feedback.remove(id).is_some() {
                deleted.add("feedback", 1);
            }
        }
    }
}
