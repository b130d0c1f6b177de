use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{NewUser, Project, User},
    schema::*,
};
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};
use tracing::debug;

pub async fn create_user(conn: &mut AsyncPgConnection, new: &NewUser) -> ModelResult<User> {
    new.validate()?;
    Ok(diesel::insert_into(users::table)
        .values(new)
        .get_result::<User>(conn)
        .await?)
}

pub async fn find_user(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<User> {
    users::table
        .find(id)
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or_else(|| ModelError::not_found("user", id))
}

pub async fn find_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> ModelResult<Option<User>> {
    Ok(users::table
        .filter(users::username.eq(username))
        .first::<User>(conn)
        .await
        .optional()?)
}

pub async fn lead_projects(conn: &mut AsyncPgConnection, user_id: i32) -> ModelResult<Vec<Project>> {
    Ok(projects::table
        .filter(projects::leader_id.eq(user_id))
        .order(projects::id)
        .load::<Project>(conn)
        .await?)
}

pub async fn count_users(conn: &mut AsyncPgConnection) -> ModelResult<i64> {
    Ok(users::table.count().get_result::<i64>(conn).await?)
}

/// Deletes the user and, through the foreign keys, everything they own.
/// Refused while any project still names them as leader.
pub async fn delete_user(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    if let Some(project_id) = projects::table
        .filter(projects::leader_id.eq(id))
        .select(projects::id)
        .first::<i32>(conn)
        .await
        .optional()?
    {
        return Err(ModelError::Protected {
            user_id: id,
            project_id,
        });
    }

    let rows = diesel::delete(users::table.find(id)).execute(conn).await?;
    expect_deleted(rows, "user", id)?;
    debug!(user_id = id, "deleted user");
    Ok(())
}
