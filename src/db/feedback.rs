use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{Feedback, FeedbackReply, NewFeedback, NewFeedbackReply},
    schema::*,
};
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};

pub async fn leave_feedback(conn: &mut AsyncPgConnection, new: &NewFeedback) -> ModelResult<Feedback> {
    new.validate()?;
    Ok(diesel::insert_into(feedback::table)
        .values(new)
        .get_result::<Feedback>(conn)
        .await?)
}

pub async fn club_feedback(conn: &mut AsyncPgConnection, club_id: i32) -> ModelResult<Vec<Feedback>> {
    Ok(feedback::table
        .filter(feedback::club_id.eq(club_id))
        .order(feedback::created.desc())
        .load::<Feedback>(conn)
        .await?)
}

pub async fn delete_feedback(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(feedback::table.find(id)).execute(conn).await?;
    expect_deleted(rows, "feedback", id)
}

/// Answers a feedback. Each feedback takes a single reply.
pub async fn reply_to_feedback(
    conn: &mut AsyncPgConnection,
    new: &NewFeedbackReply,
) -> ModelResult<FeedbackReply> {
    new.validate()?;
    if feedback_reply(conn, new.parent_id).await?.is_some() {
        return Err(ModelError::Duplicate(format!(
            "feedback {} already has a reply",
            new.parent_id
        )));
    }

    Ok(diesel::insert_into(feedback_replies::table)
        .values(new)
        .get_result::<FeedbackReply>(conn)
        .await?)
}

pub async fn feedback_reply(
    conn: &mut AsyncPgConnection,
    feedback_id: i32,
) -> ModelResult<Option<FeedbackReply>> {
    Ok(feedback_replies::table
        .filter(feedback_replies::parent_id.eq(feedback_id))
        .first::<FeedbackReply>(conn)
        .await
        .optional()?)
}

pub async fn delete_feedback_reply(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(feedback_replies::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "feedback reply", id)
}
