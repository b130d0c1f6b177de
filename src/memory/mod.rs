//! An in-process copy of the club hub tables.
//!
//! [`MemoryStore`] keeps every table as an arena of rows keyed by serial id and
//! applies the same referential rules as the PostgreSQL schema: references must
//! point at live rows when a row is inserted, one-to-one keys are unique, and
//! deletes cascade along the foreign keys. Deleting a user who still leads a
//! project is refused. Conversation threads are stored as `parent_id` indices
//! into the conversation arena rather than nested values.

use crate::{
    error::{ModelError, ModelResult},
    models::*,
};
use chrono::Utc;
use itertools::Itertools;
use tracing::debug;

mod delete;
mod label;
mod table;

pub use delete::Deleted;
use table::Table;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Table<User>,
    clubs: Table<Club>,
    requests: Table<ClubMembershipRequest>,
    roles: Table<ClubRole>,
    memberships: Table<ClubMembership>,
    projects: Table<Project>,
    club_projects: Table<ClubProject>,
    project_memberships: Table<ProjectMembership>,
    channels: Table<Channel>,
    subscriptions: Table<ChannelSubscription>,
    posts: Table<Post>,
    conversations: Table<Conversation>,
    feedback: Table<Feedback>,
    feedback_replies: Table<FeedbackReply>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_user(&self, id: i32) -> ModelResult<()> {
        if !self.users.contains(id) {
            return Err(ModelError::missing("user", id));
        }
        Ok(())
    }

    fn require_club(&self, id: i32) -> ModelResult<()> {
        if !self.clubs.contains(id) {
            return Err(ModelError::missing("club", id));
        }
        Ok(())
    }

    fn require_channel(&self, id: i32) -> ModelResult<()> {
        if !self.channels.contains(id) {
            return Err(ModelError::missing("channel", id));
        }
        Ok(())
    }

    fn require_project(&self, id: i32) -> ModelResult<()> {
        if !self.projects.contains(id) {
            return Err(ModelError::missing("project", id));
        }
        Ok(())
    }

    pub fn create_user(&mut self, new: NewUser) -> ModelResult<User> {
        new.validate()?;
        if self.users.values().any(|u| u.username == new.username) {
            return Err(ModelError::Duplicate(format!(
                "username {} is already taken",
                new.username
            )));
        }

        Ok(self
            .users
            .insert_with(|id| User {
                id,
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                first_name: new.first_name,
                last_name: new.last_name,
                is_staff: new.is_staff,
                is_active: new.is_active,
                is_superuser: new.is_superuser,
                date_joined: Utc::now(),
                last_login: None,
            })
            .clone())
    }

    pub fn create_club(&mut self, new: NewClub) -> ModelResult<Club> {
        new.validate()?;
        Ok(self
            .clubs
            .insert_with(|id| Club {
                id,
                name: new.name,
                description: new.description,
            })
            .clone())
    }

    pub fn request_membership(
        &mut self,
        new: NewClubMembershipRequest,
    ) -> ModelResult<ClubMembershipRequest> {
        self.require_user(new.user_id)?;
        self.require_club(new.club_id)?;

        Ok(self
            .requests
            .insert_with(|id| ClubMembershipRequest {
                id,
                user_id: new.user_id,
                club_id: new.club_id,
                initiated: Utc::now(),
                status: new.status.unwrap_or_default(),
                closed: None,
            })
            .clone())
    }

    /// Moves a pending request to a terminal status and stamps `closed`.
    pub fn close_request(
        &mut self,
        id: i32,
        status: RequestStatus,
    ) -> ModelResult<ClubMembershipRequest> {
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| ModelError::not_found("club membership request", id))?;

        if !status.is_terminal() {
            return Err(ModelError::InvalidTransition {
                from: request.status,
                to: status,
            });
        }
        if !request.is_open() {
            return Err(ModelError::AlreadyClosed {
                entity: "club membership request",
                id,
            });
        }

        request.status = status;
        request.closed = Some(Utc::now());
        debug!(request_id = id, %status, "closed membership request");
        Ok(request.clone())
    }

    pub fn create_role(&mut self, new: NewClubRole) -> ModelResult<ClubRole> {
        new.validate()?;
        self.require_club(new.club_id)?;
        Ok(self
            .roles
            .insert_with(|id| ClubRole {
                id,
                name: new.name,
                description: new.description,
                club_id: new.club_id,
                privilege: new.privilege.unwrap_or_default(),
            })
            .clone())
    }

    pub fn add_membership(&mut self, new: NewClubMembership) -> ModelResult<ClubMembership> {
        self.require_user(new.user_id)?;
        if !self.roles.contains(new.club_role_id) {
            return Err(ModelError::missing("club role", new.club_role_id));
        }
        Ok(self
            .memberships
            .insert_with(|id| ClubMembership {
                id,
                user_id: new.user_id,
                club_role_id: new.club_role_id,
                joined: Utc::now(),
            })
            .clone())
    }

    pub fn create_project(&mut self, new: NewProject) -> ModelResult<Project> {
        new.validate()?;
        self.require_user(new.leader_id)?;
        Ok(self
            .projects
            .insert_with(|id| Project {
                id,
                name: new.name,
                description: new.description,
                started: Utc::now(),
                closed: None,
                leader_id: new.leader_id,
            })
            .clone())
    }

    pub fn close_project(&mut self, id: i32) -> ModelResult<Project> {
        let project = self
            .projects
            .get_mut(id)
            .ok_or_else(|| ModelError::not_found("project", id))?;
        if !project.is_open() {
            return Err(ModelError::AlreadyClosed {
                entity: "project",
                id,
            });
        }

        project.closed = Some(Utc::now());
        debug!(project_id = id, "closed project");
        Ok(project.clone())
    }

    pub fn link_project(&mut self, new: NewClubProject) -> ModelResult<ClubProject> {
        self.require_club(new.club_id)?;
        self.require_project(new.project_id)?;
        Ok(self
            .club_projects
            .insert_with(|id| ClubProject {
                id,
                club_id: new.club_id,
                project_id: new.project_id,
            })
            .clone())
    }

    pub fn join_project(&mut self, new: NewProjectMembership) -> ModelResult<ProjectMembership> {
        self.require_user(new.user_id)?;
        self.require_project(new.project_id)?;
        Ok(self
            .project_memberships
            .insert_with(|id| ProjectMembership {
                id,
                user_id: new.user_id,
                project_id: new.project_id,
                joined: Utc::now(),
            })
            .clone())
    }

    pub fn create_channel(&mut self, new: NewChannel) -> ModelResult<Channel> {
        new.validate()?;
        self.require_club(new.club_id)?;
        if self.channel_for_club(new.club_id).is_some() {
            return Err(ModelError::Duplicate(format!(
                "club {} already has a channel",
                new.club_id
            )));
        }

        Ok(self
            .channels
            .insert_with(|id| Channel {
                id,
                name: new.name,
                description: new.description,
                club_id: new.club_id,
            })
            .clone())
    }

    pub fn subscribe(&mut self, new: NewChannelSubscription) -> ModelResult<ChannelSubscription> {
        self.require_user(new.user_id)?;
        self.require_channel(new.channel_id)?;
        Ok(self
            .subscriptions
            .insert_with(|id| ChannelSubscription {
                id,
                user_id: new.user_id,
                channel_id: new.channel_id,
                joined: Utc::now(),
            })
            .clone())
    }

    pub fn create_post(&mut self, new: NewPost) -> ModelResult<Post> {
        new.validate()?;
        self.require_channel(new.channel_id)?;
        Ok(self
            .posts
            .insert_with(|id| Post {
                id,
                content: new.content,
                created: Utc::now(),
                channel_id: new.channel_id,
            })
            .clone())
    }

    pub fn start_conversation(&mut self, new: NewConversation) -> ModelResult<Conversation> {
        new.validate()?;
        self.require_channel(new.channel_id)?;
        self.require_user(new.author_id)?;
        if let Some(parent_id) = new.parent_id {
            let parent = self
                .conversations
                .get(parent_id)
                .ok_or_else(|| ModelError::missing("conversation", parent_id))?;
            if parent.channel_id != new.channel_id {
                return Err(ModelError::ChannelMismatch {
                    parent_id,
                    channel_id: new.channel_id,
                });
            }
        }

        Ok(self
            .conversations
            .insert_with(|id| Conversation {
                id,
                content: new.content,
                created: Utc::now(),
                channel_id: new.channel_id,
                author_id: new.author_id,
                parent_id: new.parent_id,
            })
            .clone())
    }

    pub fn leave_feedback(&mut self, new: NewFeedback) -> ModelResult<Feedback> {
        new.validate()?;
        self.require_club(new.club_id)?;
        self.require_user(new.author_id)?;
        Ok(self
            .feedback
            .insert_with(|id| Feedback {
                id,
                content: new.content,
                created: Utc::now(),
                club_id: new.club_id,
                author_id: new.author_id,
            })
            .clone())
    }

    pub fn reply_to_feedback(&mut self, new: NewFeedbackReply) -> ModelResult<FeedbackReply> {
        new.validate()?;
        if !self.feedback.contains(new.parent_id) {
            return Err(ModelError::missing("feedback", new.parent_id));
        }
        if self.feedback_reply(new.parent_id).is_some() {
            return Err(ModelError::Duplicate(format!(
                "feedback {} already has a reply",
                new.parent_id
            )));
        }

        Ok(self
            .feedback_replies
            .insert_with(|id| FeedbackReply {
                id,
                content: new.content,
                created: Utc::now(),
                parent_id: new.parent_id,
            })
            .clone())
    }

    pub fn user(&self, id: i32) -> Option<&User> {
        self.users.get(id)
    }

    pub fn club(&self, id: i32) -> Option<&Club> {
        self.clubs.get(id)
    }

    pub fn request(&self, id: i32) -> Option<&ClubMembershipRequest> {
        self.requests.get(id)
    }

    pub fn role(&self, id: i32) -> Option<&ClubRole> {
        self.roles.get(id)
    }

    pub fn membership(&self, id: i32) -> Option<&ClubMembership> {
        self.memberships.get(id)
    }

    pub fn project(&self, id: i32) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn channel(&self, id: i32) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn post(&self, id: i32) -> Option<&Post> {
        self.posts.get(id)
    }

    pub fn conversation(&self, id: i32) -> Option<&Conversation> {
        self.conversations.get(id)
    }

    pub fn feedback(&self, id: i32) -> Option<&Feedback> {
        self.feedback.get(id)
    }

    pub fn club_roles(&self, club_id: i32) -> Vec<&ClubRole> {
        self.roles.values().filter(|r| r.club_id == club_id).collect()
    }

    /// Distinct users holding any role in the club, in user id order.
    pub fn club_members(&self, club_id: i32) -> Vec<&User> {
        self.memberships
            .values()
            .filter(|m| {
                self.roles
                    .get(m.club_role_id)
                    .map_or(false, |r| r.club_id == club_id)
            })
            .map(|m| m.user_id)
            .sorted()
            .dedup()
            .filter_map(|id| self.users.get(id))
            .collect()
    }

    pub fn role_members(&self, role_id: i32) -> Vec<&User> {
        self.memberships
            .values()
            .filter(|m| m.club_role_id == role_id)
            .filter_map(|m| self.users.get(m.user_id))
            .collect()
    }

    pub fn pending_requests(&self, club_id: i32) -> Vec<&ClubMembershipRequest> {
        self.requests
            .values()
            .filter(|r| r.club_id == club_id && r.is_open())
            .collect()
    }

    pub fn channel_for_club(&self, club_id: i32) -> Option<&Channel> {
        self.channels.values().find(|c| c.club_id == club_id)
    }

    pub fn club_projects(&self, club_id: i32) -> Vec<&Project> {
        self.club_projects
            .values()
            .filter(|cp| cp.club_id == club_id)
            .filter_map(|cp| self.projects.get(cp.project_id))
            .collect()
    }

    pub fn club_feedback(&self, club_id: i32) -> Vec<&Feedback> {
        self.feedback
            .values()
            .filter(|f| f.club_id == club_id)
            .collect()
    }

    pub fn channel_posts(&self, channel_id: i32) -> Vec<&Post> {
        self.posts
            .values()
            .filter(|p| p.channel_id == channel_id)
            .collect()
    }

    /// Conversations in the channel that do not reply to another conversation.
    pub fn channel_threads(&self, channel_id: i32) -> Vec<&Conversation> {
        self.conversations
            .values()
            .filter(|c| c.channel_id == channel_id && c.parent_id.is_none())
            .collect()
    }

    pub fn channel_subscribers(&self, channel_id: i32) -> Vec<&User> {
        self.subscriptions
            .values()
            .filter(|s| s.channel_id == channel_id)
            .filter_map(|s| self.users.get(s.user_id))
            .collect()
    }

    pub fn replies(&self, conversation_id: i32) -> Vec<&Conversation> {
        self.conversations
            .values()
            .filter(|c| c.parent_id == Some(conversation_id))
            .collect()
    }

    pub fn feedback_reply(&self, feedback_id: i32) -> Option<&FeedbackReply> {
        self.feedback_replies
            .values()
            .find(|r| r.parent_id == feedback_id)
    }

    pub fn lead_projects(&self, user_id: i32) -> Vec<&Project> {
        self.projects
            .values()
            .filter(|p| p.leader_id == user_id)
            .collect()
    }

    pub fn project_members(&self, project_id: i32) -> Vec<&User> {
        self.project_memberships
            .values()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| self.users.get(m.user_id))
            .collect()
    }

    pub fn project_clubs(&self, project_id: i32) -> Vec<&Club> {
        self.club_projects
            .values()
            .filter(|cp| cp.project_id == project_id)
            .filter_map(|cp| self.clubs.get(cp.club_id))
            .collect()
    }

    /// Clubs in which the user holds at least one role, in club id order.
    pub fn user_clubs(&self, user_id: i32) -> Vec<&Club> {
        self.memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| self.roles.get(m.club_role_id))
            .map(|r| r.club_id)
            .sorted()
            .dedup()
            .filter_map(|id| self.clubs.get(id))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn user(store: &mut MemoryStore, username: &str) -> User {
        store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "not-a-real-hash".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                is_staff: false,
                is_active: true,
                is_superuser: false,
            })
            .unwrap()
    }

    pub(crate) fn club(store: &mut MemoryStore, name: &str) -> Club {
        store
            .create_club(NewClub {
                name: name.to_string(),
                description: format!("the {name} club"),
            })
            .unwrap()
    }

    pub(crate) fn channel(store: &mut MemoryStore, club_id: i32) -> Channel {
        store
            .create_channel(NewChannel {
                name: "general".to_string(),
                description: String::new(),
                club_id,
            })
            .unwrap()
    }

    pub(crate) fn say(
        store: &mut MemoryStore,
        channel_id: i32,
        author_id: i32,
        parent_id: Option<i32>,
    ) -> Conversation {
        store
            .start_conversation(NewConversation {
                content: "hello".to_string(),
                channel_id,
                author_id,
                parent_id,
            })
            .unwrap()
    }

    #[test]
    fn request_defaults_to_pending() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let chess = club(&mut store, "chess");

        let request = store
            .request_membership(NewClubMembershipRequest {
                user_id: ada.id,
                club_id: chess.id,
                status: None,
            })
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.closed.is_none());
        assert_eq!(store.pending_requests(chess.id), vec![&request]);
    }

    #[test]
    fn closing_a_request_is_final() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let chess = club(&mut store, "chess");
        let request = store
            .request_membership(NewClubMembershipRequest {
                user_id: ada.id,
                club_id: chess.id,
                status: None,
            })
            .unwrap();

        assert!(matches!(
            store.close_request(request.id, RequestStatus::Pending),
            Err(ModelError::InvalidTransition { .. })
        ));

        let accepted = store
            .close_request(request.id, RequestStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        let closed = accepted.closed.unwrap();
        assert!(closed >= accepted.initiated);

        assert!(matches!(
            store.close_request(request.id, RequestStatus::Rejected),
            Err(ModelError::AlreadyClosed { .. })
        ));
        assert_eq!(store.request(request.id).unwrap().closed, Some(closed));
        assert!(store.pending_requests(chess.id).is_empty());

        assert!(matches!(
            store.close_request(999, RequestStatus::Accepted),
            Err(ModelError::NotFound { id: 999, .. })
        ));
    }

    #[test]
    fn references_must_exist() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");

        assert!(matches!(
            store.request_membership(NewClubMembershipRequest {
                user_id: ada.id,
                club_id: 42,
                status: None,
            }),
            Err(ModelError::MissingReference { entity: "club", id: 42 })
        ));
        assert!(matches!(
            store.create_project(NewProject {
                name: "robot".to_string(),
                description: String::new(),
                leader_id: 7,
            }),
            Err(ModelError::MissingReference { entity: "user", id: 7 })
        ));
        assert!(matches!(
            store.add_membership(NewClubMembership {
                user_id: ada.id,
                club_role_id: 3,
            }),
            Err(ModelError::MissingReference { entity: "club role", id: 3 })
        ));
        assert!(matches!(
            store.reply_to_feedback(NewFeedbackReply {
                content: "thanks".to_string(),
                parent_id: 1,
            }),
            Err(ModelError::MissingReference { entity: "feedback", id: 1 })
        ));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            store.create_club(NewClub {
                name: String::new(),
                description: String::new(),
            }),
            Err(ModelError::Blank { field: "name" })
        ));

        let chess = club(&mut store, "chess");
        let general = channel(&mut store, chess.id);
        assert!(matches!(
            store.create_post(NewPost {
                content: " \n".to_string(),
                channel_id: general.id,
            }),
            Err(ModelError::Blank { field: "content" })
        ));
        assert!(store.channel_posts(general.id).is_empty());
    }

    #[test]
    fn usernames_are_unique() {
        let mut store = MemoryStore::new();
        user(&mut store, "ada");
        let again = store.create_user(NewUser::with_password("ada", "", "pw").unwrap());
        assert!(matches!(again, Err(ModelError::Duplicate(_))));
    }

    #[test]
    fn role_privilege_defaults_to_member() {
        let mut store = MemoryStore::new();
        let chess = club(&mut store, "chess");
        let role = store
            .create_role(NewClubRole {
                name: "player".to_string(),
                description: String::new(),
                club_id: chess.id,
                privilege: None,
            })
            .unwrap();
        assert_eq!(role.privilege, Privilege::Member);
    }

    #[test]
    fn club_has_one_channel() {
        let mut store = MemoryStore::new();
        let chess = club(&mut store, "chess");
        let general = channel(&mut store, chess.id);

        let second = store.create_channel(NewChannel {
            name: "random".to_string(),
            description: String::new(),
            club_id: chess.id,
        });
        assert!(matches!(second, Err(ModelError::Duplicate(_))));
        assert_eq!(store.channel_for_club(chess.id), Some(&general));
    }

    #[test]
    fn feedback_has_one_reply() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let chess = club(&mut store, "chess");
        let feedback = store
            .leave_feedback(NewFeedback {
                content: "more blitz please".to_string(),
                club_id: chess.id,
                author_id: ada.id,
            })
            .unwrap();

        let reply = store
            .reply_to_feedback(NewFeedbackReply {
                content: "noted".to_string(),
                parent_id: feedback.id,
            })
            .unwrap();
        let second = store.reply_to_feedback(NewFeedbackReply {
            content: "again".to_string(),
            parent_id: feedback.id,
        });

        assert!(matches!(second, Err(ModelError::Duplicate(_))));
        assert_eq!(store.feedback_reply(feedback.id), Some(&reply));
    }

    #[test]
    fn reply_must_stay_in_parent_channel() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let chess = club(&mut store, "chess");
        let go = club(&mut store, "go");
        let chess_channel = channel(&mut store, chess.id);
        let go_channel = channel(&mut store, go.id);
        let root = say(&mut store, chess_channel.id, ada.id, None);

        let stray = store.start_conversation(NewConversation {
            content: "wrong room".to_string(),
            channel_id: go_channel.id,
            author_id: ada.id,
            parent_id: Some(root.id),
        });
        assert!(matches!(
            stray,
            Err(ModelError::ChannelMismatch { parent_id, channel_id })
                if parent_id == root.id && channel_id == go_channel.id
        ));

        let reply = say(&mut store, chess_channel.id, ada.id, Some(root.id));
        assert_eq!(store.replies(root.id), vec![&reply]);
        assert_eq!(store.channel_threads(chess_channel.id), vec![&root]);
    }

    #[test]
    fn closing_a_project_is_final() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let project = store
            .create_project(NewProject {
                name: "robot".to_string(),
                description: String::new(),
                leader_id: ada.id,
            })
            .unwrap();
        assert!(project.is_open());

        let closed = store.close_project(project.id).unwrap();
        assert!(closed.closed.is_some());
        assert!(matches!(
            store.close_project(project.id),
            Err(ModelError::AlreadyClosed { entity: "project", .. })
        ));
    }

    #[test]
    fn members_are_listed_once_per_club() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let bob = user(&mut store, "bob");
        let chess = club(&mut store, "chess");
        let go = club(&mut store, "go");
        let roles: Vec<ClubRole> = [(chess.id, "captain"), (chess.id, "player"), (go.id, "player")]
            .into_iter()
            .map(|(club_id, name)| {
                store
                    .create_role(NewClubRole {
                        name: name.to_string(),
                        description: String::new(),
                        club_id,
                        privilege: None,
                    })
                    .unwrap()
            })
            .collect();

        for (user_id, role) in [(bob.id, &roles[0]), (ada.id, &roles[1]), (bob.id, &roles[1])] {
            store
                .add_membership(NewClubMembership {
                    user_id,
                    club_role_id: role.id,
                })
                .unwrap();
        }
        store
            .add_membership(NewClubMembership {
                user_id: ada.id,
                club_role_id: roles[2].id,
            })
            .unwrap();

        assert_eq!(store.club_members(chess.id), vec![&ada, &bob]);
        assert_eq!(store.club_members(go.id), vec![&ada]);
        assert_eq!(store.role_members(roles[1].id), vec![&ada, &bob]);
        assert_eq!(store.user_clubs(ada.id), vec![&chess, &go]);
        assert_eq!(store.club_roles(chess.id).len(), 2);
    }

    #[test]
    fn projects_span_clubs() {
        let mut store = MemoryStore::new();
        let ada = user(&mut store, "ada");
        let bob = user(&mut store, "bob");
        let chess = club(&mut store, "chess");
        let go = club(&mut store, "go");
        let project = store
            .create_project(NewProject {
                name: "engine".to_string(),
                description: String::new(),
                leader_id: ada.id,
            })
            .unwrap();
        for club_id in [chess.id, go.id] {
            store
                .link_project(NewClubProject {
                    club_id,
                    project_id: project.id,
                })
                .unwrap();
        }
        store
            .join_project(NewProjectMembership {
                user_id: bob.id,
                project_id: project.id,
            })
            .unwrap();

        assert_eq!(store.project_clubs(project.id), vec![&chess, &go]);
        assert_eq!(store.club_projects(go.id), vec![&project]);
        assert_eq!(store.project_members(project.id), vec![&bob]);
        assert_eq!(store.lead_projects(ada.id), vec![&project]);
    }
}
