use crate::{
    auth,
    error::{ModelError, ModelResult},
    schema::*,
};
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql},
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
    AsExpression, FromSqlRow,
};
use std::{fmt, io::Write, str::FromStr};

pub const NAME_MAX_LEN: usize = 100;
pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, thiserror::Error)]
#[error("unknown choice code {0:?}")]
pub struct UnknownChoice(pub String);

/// Lifecycle of a membership request. Everything but `Pending` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::Rejected,
        RequestStatus::Cancelled,
    ];

    /// The two-letter code stored in `club_membership_requests.status`.
    pub fn code(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PD",
            RequestStatus::Accepted => "AC",
            RequestStatus::Rejected => "RE",
            RequestStatus::Cancelled => "CN",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != RequestStatus::Pending
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| UnknownChoice(s.to_string()))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ToSql<Text, Pg> for RequestStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.code().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for RequestStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        Ok(std::str::from_utf8(bytes.as_bytes())?.parse::<Self>()?)
    }
}

/// What a club role allows its holders to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Privilege {
    Representative,
    #[default]
    Member,
}

impl Privilege {
    pub const ALL: [Privilege; 2] = [Privilege::Representative, Privilege::Member];

    /// The three-letter code stored in `club_roles.privilege`.
    pub fn code(self) -> &'static str {
        match self {
            Privilege::Representative => "REP",
            Privilege::Member => "MEM",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Privilege::Representative => "Representative",
            Privilege::Member => "Member",
        }
    }
}

impl FromStr for Privilege {
    type Err = UnknownChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Privilege::ALL
            .into_iter()
            .find(|privilege| privilege.code() == s)
            .ok_or_else(|| UnknownChoice(s.to_string()))
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ToSql<Text, Pg> for Privilege {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.code().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Privilege {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        Ok(std::str::from_utf8(bytes.as_bytes())?.parse::<Self>()?)
    }
}

fn not_blank(field: &'static str, value: &str) -> ModelResult<()> {
    if value.trim().is_empty() {
        return Err(ModelError::Blank { field });
    }
    Ok(())
}

fn at_most(field: &'static str, value: &str, max: usize) -> ModelResult<()> {
    if value.chars().count() > max {
        return Err(ModelError::TooLong { field, max });
    }
    Ok(())
}

fn name(field: &'static str, value: &str) -> ModelResult<()> {
    not_blank(field, value)?;
    at_most(field, value, NAME_MAX_LEN)
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl NewUser {
    /// An active, unprivileged account with a freshly hashed password.
    pub fn with_password(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl AsRef<[u8]>,
    ) -> ModelResult<NewUser> {
        let password_hash = auth::hash_password(password)?;
        Ok(NewUser {
            username: username.into(),
            email: email.into(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_active: true,
            is_superuser: false,
        })
    }

    pub fn validate(&self) -> ModelResult<()> {
        not_blank("username", &self.username)?;
        at_most("username", &self.username, USERNAME_MAX_LEN)?;
        at_most("email", &self.email, EMAIL_MAX_LEN)?;
        at_most("first_name", &self.first_name, USERNAME_MAX_LEN)?;
        at_most("last_name", &self.last_name, USERNAME_MAX_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
pub struct Club {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl fmt::Display for Club {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = clubs)]
pub struct NewClub {
    pub name: String,
    pub description: String,
}

impl NewClub {
    pub fn validate(&self) -> ModelResult<()> {
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Club))]
pub struct ClubMembershipRequest {
    pub id: i32,
    pub user_id: i32,
    pub club_id: i32,
    pub initiated: DateTime<Utc>,
    pub status: RequestStatus,
    pub closed: Option<DateTime<Utc>>,
}

impl ClubMembershipRequest {
    pub fn is_open(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Leaving `status` empty lets the column default (`Pending`) apply.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = club_membership_requests)]
pub struct NewClubMembershipRequest {
    pub user_id: i32,
    pub club_id: i32,
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
pub struct ClubRole {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub club_id: i32,
    pub privilege: Privilege,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = club_roles)]
pub struct NewClubRole {
    pub name: String,
    pub description: String,
    pub club_id: i32,
    pub privilege: Option<Privilege>,
}

impl NewClubRole {
    pub fn validate(&self) -> ModelResult<()> {
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(ClubRole))]
pub struct ClubMembership {
    pub id: i32,
    pub user_id: i32,
    pub club_role_id: i32,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = club_memberships)]
pub struct NewClubMembership {
    pub user_id: i32,
    pub club_role_id: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(User, foreign_key = leader_id))]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub started: DateTime<Utc>,
    pub closed: Option<DateTime<Utc>>,
    pub leader_id: i32,
}

impl Project {
    pub fn is_open(&self) -> bool {
        self.closed.is_none()
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub leader_id: i32,
}

impl NewProject {
    pub fn validate(&self) -> ModelResult<()> {
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
#[diesel(belongs_to(Project))]
pub struct ClubProject {
    pub id: i32,
    pub club_id: i32,
    pub project_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = club_projects)]
pub struct NewClubProject {
    pub club_id: i32,
    pub project_id: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Project))]
pub struct ProjectMembership {
    pub id: i32,
    pub user_id: i32,
    pub project_id: i32,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_memberships)]
pub struct NewProjectMembership {
    pub user_id: i32,
    pub project_id: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Club))]
pub struct Channel {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub club_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = channels)]
pub struct NewChannel {
    pub name: String,
    pub description: String,
    pub club_id: i32,
}

impl NewChannel {
    pub fn validate(&self) -> ModelResult<()> {
        name("name", &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Channel))]
pub struct ChannelSubscription {
    pub id: i32,
    pub user_id: i32,
    pub channel_id: i32,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = channel_subscriptions)]
pub struct NewChannelSubscription {
    pub user_id: i32,
    pub channel_id: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Channel))]
pub struct Post {
    pub id: i32,
    pub content: String,
    pub created: DateTime<Utc>,
    pub channel_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub content: String,
    pub channel_id: i32,
}

impl NewPost {
    pub fn validate(&self) -> ModelResult<()> {
        not_blank("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(belongs_to(Channel))]
#[diesel(belongs_to(User, foreign_key = author_id))]
pub struct Conversation {
    pub id: i32,
    pub content: String,
    pub created: DateTime<Utc>,
    pub channel_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
}

/// A `parent_id` must name a conversation in the same channel.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub content: String,
    pub channel_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
}

impl NewConversation {
    pub fn validate(&self) -> ModelResult<()> {
        not_blank("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(table_name = feedback)]
#[diesel(belongs_to(Club))]
#[diesel(belongs_to(User, foreign_key = author_id))]
pub struct Feedback {
    pub id: i32,
    pub content: String,
    pub created: DateTime<Utc>,
    pub club_id: i32,
    pub author_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback)]
pub struct NewFeedback {
    pub content: String,
    pub club_id: i32,
    pub author_id: i32,
}

impl NewFeedback {
    pub fn validate(&self) -> ModelResult<()> {
        not_blank("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations)]
#[diesel(table_name = feedback_replies)]
#[diesel(belongs_to(Feedback, foreign_key = parent_id))]
pub struct FeedbackReply {
    pub id: i32,
    pub content: String,
    pub created: DateTime<Utc>,
    pub parent_id: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = feedback_replies)]
pub struct NewFeedbackReply {
    pub content: String,
    pub parent_id: i32,
}

impl NewFeedbackReply {
    pub fn validate(&self) -> ModelResult<()> {
        not_blank("content", &self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        for status in RequestStatus::ALL {
            assert_eq!(status.code().parse::<RequestStatus>().unwrap(), status);
        }
        assert!("XX".parse::<RequestStatus>().is_err());
        assert!("Pending".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn status_defaults_to_pending() {
        assert_eq!(RequestStatus::default(), RequestStatus::Pending);
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Accepted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn privilege_defaults_to_member() {
        assert_eq!(Privilege::default(), Privilege::Member);
        assert_eq!("REP".parse::<Privilege>().unwrap(), Privilege::Representative);
        assert_eq!(Privilege::Representative.to_string(), "Representative");
        assert!("ADM".parse::<Privilege>().is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        let club = NewClub {
            name: "   ".to_string(),
            description: "chess".to_string(),
        };
        assert!(matches!(
            club.validate(),
            Err(ModelError::Blank { field: "name" })
        ));

        let post = NewPost {
            content: String::new(),
            channel_id: 1,
        };
        assert!(matches!(
            post.validate(),
            Err(ModelError::Blank { field: "content" })
        ));
    }

    #[test]
    fn long_names_are_rejected() {
        let role = NewClubRole {
            name: "x".repeat(NAME_MAX_LEN + 1),
            description: String::new(),
            club_id: 1,
            privilege: None,
        };
        assert!(matches!(
            role.validate(),
            Err(ModelError::TooLong { field: "name", max: NAME_MAX_LEN })
        ));

        let role = NewClubRole {
            name: "é".repeat(NAME_MAX_LEN),
            ..role
        };
        assert!(role.validate().is_ok());
    }

    #[test]
    fn new_user_hashes_password() {
        let user = NewUser::with_password("ada", "ada@example.com", "s3cret").unwrap();
        assert!(user.is_active);
        assert!(!user.is_staff);
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(user.validate().is_ok());

        let nameless = NewUser {
            username: String::new(),
            ..user
        };
        assert!(matches!(
            nameless.validate(),
            Err(ModelError::Blank { field: "username" })
        ));
    }
}
