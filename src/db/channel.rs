use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{
        Channel, ChannelSubscription, Conversation, NewChannel, NewChannelSubscription,
        NewConversation, NewPost, Post, User,
    },
    schema::*,
};
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};
use tracing::debug;

pub async fn create_channel(conn: &mut AsyncPgConnection, new: &NewChannel) -> ModelResult<Channel> {
    new.validate()?;
    if channel_for_club(conn, new.club_id).await?.is_some() {
        return Err(ModelError::Duplicate(format!(
            "club {} already has a channel",
            new.club_id
        )));
    }

    Ok(diesel::insert_into(channels::table)
        .values(new)
        .get_result::<Channel>(conn)
        .await?)
}

pub async fn channel_for_club(
    conn: &mut AsyncPgConnection,
    club_id: i32,
) -> ModelResult<Option<Channel>> {
    Ok(channels::table
        .filter(channels::club_id.eq(club_id))
        .first::<Channel>(conn)
        .await
        .optional()?)
}

pub async fn delete_channel(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(channels::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "channel", id)?;
    debug!(channel_id = id, "deleted channel");
    Ok(())
}

pub async fn subscribe(
    conn: &mut AsyncPgConnection,
    new: &NewChannelSubscription,
) -> ModelResult<ChannelSubscription> {
    Ok(diesel::insert_into(channel_subscriptions::table)
        .values(new)
        .get_result::<ChannelSubscription>(conn)
        .await?)
}

pub async fn channel_subscribers(
    conn: &mut AsyncPgConnection,
    channel_id: i32,
) -> ModelResult<Vec<User>> {
    Ok(channel_subscriptions::table
        .inner_join(users::table)
        .filter(channel_subscriptions::channel_id.eq(channel_id))
        .select(users::all_columns)
        .order(channel_subscriptions::id)
        .load::<User>(conn)
        .await?)
}

pub async fn unsubscribe(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(channel_subscriptions::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "channel subscription", id)
}

pub async fn create_post(conn: &mut AsyncPgConnection, new: &NewPost) -> ModelResult<Post> {
    new.validate()?;
    Ok(diesel::insert_into(posts::table)
        .values(new)
        .get_result::<Post>(conn)
        .await?)
}

pub async fn channel_posts(conn: &mut AsyncPgConnection, channel_id: i32) -> ModelResult<Vec<Post>> {
    Ok(posts::table
        .filter(posts::channel_id.eq(channel_id))
        .order(posts::id)
        .load::<Post>(conn)
        .await?)
}

pub async fn delete_post(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(posts::table.find(id)).execute(conn).await?;
    expect_deleted(rows, "post", id)
}

pub async fn find_conversation(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<Conversation> {
    conversations::table
        .find(id)
        .first::<Conversation>(conn)
        .await
        .optional()?
        .ok_or_else(|| ModelError::not_found("conversation", id))
}

/// Inserts a conversation. A reply must live in the same channel as its parent.
pub async fn start_conversation(
    conn: &mut AsyncPgConnection,
    new: &NewConversation,
) -> ModelResult<Conversation> {
    new.validate()?;
    if let Some(parent_id) = new.parent_id {
        let parent = conversations::table
            .find(parent_id)
            .first::<Conversation>(conn)
            .await
            .optional()?
            .ok_or_else(|| ModelError::missing("conversation", parent_id))?;
        if parent.channel_id != new.channel_id {
            return Err(ModelError::ChannelMismatch {
                parent_id,
                channel_id: new.channel_id,
            });
        }
    }

    Ok(diesel::insert_into(conversations::table)
        .values(new)
        .get_result::<Conversation>(conn)
        .await?)
}

/// Top-level conversations of the channel.
pub async fn channel_threads(
    conn: &mut AsyncPgConnection,
    channel_id: i32,
) -> ModelResult<Vec<Conversation>> {
    Ok(conversations::table
        .filter(conversations::channel_id.eq(channel_id))
        .filter(conversations::parent_id.is_null())
        .order(conversations::id)
        .load::<Conversation>(conn)
        .await?)
}

pub async fn replies(
    conn: &mut AsyncPgConnection,
    conversation_id: i32,
) -> ModelResult<Vec<Conversation>> {
    Ok(conversations::table
        .filter(conversations::parent_id.eq(conversation_id))
        .order(conversations::id)
        .load::<Conversation>(conn)
        .await?)
}

/// Deletes the conversation; replies beneath it go through the self-referencing key.
pub async fn delete_conversation(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(conversations::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "conversation", id)?;
    debug!(conversation_id = id, "deleted conversation");
    Ok(())
}
