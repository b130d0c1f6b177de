use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{Club, ClubRole, NewClub, Project, User},
    schema::*,
};
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};
use tracing::debug;

pub async fn create_club(conn: &mut AsyncPgConnection, new: &NewClub) -> ModelResult<Club> {
    new.validate()?;
    Ok(diesel::insert_into(clubs::table)
        .values(new)
        .get_result::<Club>(conn)
        .await?)
}

pub async fn find_club(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<Club> {
    clubs::table
        .find(id)
        .first::<Club>(conn)
        .await
        .optional()?
        .ok_or_else(|| ModelError::not_found("club", id))
}

pub async fn list_clubs(conn: &mut AsyncPgConnection) -> ModelResult<Vec<Club>> {
    Ok(clubs::table.order(clubs::id).load::<Club>(conn).await?)
}

pub async fn count_clubs(conn: &mut AsyncPgConnection) -> ModelResult<i64> {
    Ok(clubs::table.count().get_result::<i64>(conn).await?)
}

pub async fn club_roles(conn: &mut AsyncPgConnection, club_id: i32) -> ModelResult<Vec<ClubRole>> {
    Ok(club_roles::table
        .filter(club_roles::club_id.eq(club_id))
        .order(club_roles::id)
        .load::<ClubRole>(conn)
        .await?)
}

/// Distinct users holding any role in the club.
pub async fn club_members(conn: &mut AsyncPgConnection, club_id: i32) -> ModelResult<Vec<User>> {
    Ok(club_memberships::table
        .inner_join(users::table)
        .inner_join(club_roles::table)
        .filter(club_roles::club_id.eq(club_id))
        .select(users::all_columns)
        .distinct()
        .order(users::id)
        .load::<User>(conn)
        .await?)
}

pub async fn club_projects(conn: &mut AsyncPgConnection, club_id: i32) -> ModelResult<Vec<Project>> {
    Ok(club_projects::table
        .inner_join(projects::table)
        .filter(club_projects::club_id.eq(club_id))
        .select(projects::all_columns)
        .order(projects::id)
        .load::<Project>(conn)
        .await?)
}

/// Deletes the club. Roles, memberships, requests, the channel with its
/// posts and conversations, project links and feedback go with it.
pub async fn delete_club(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(clubs::table.find(id)).execute(conn).await?;
    expect_deleted(rows, "club", id)?;
    debug!(club_id = id, "deleted club");
    Ok(())
}
