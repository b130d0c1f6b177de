use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{
        Club, ClubProject, NewClubProject, NewProject, NewProjectMembership, Project,
        ProjectMembership, User,
    },
    schema::*,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};
use tracing::debug;

pub async fn create_project(conn: &mut AsyncPgConnection, new: &NewProject) -> ModelResult<Project> {
    new.validate()?;
    Ok(diesel::insert_into(projects::table)
        .values(new)
        .get_result::<Project>(conn)
        .await?)
}

pub async fn find_project(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<Project> {
    projects::table
        .find(id)
        .first::<Project>(conn)
        .await
        .optional()?
        .ok_or_else(|| ModelError::not_found("project", id))
}

pub async fn count_projects(conn: &mut AsyncPgConnection) -> ModelResult<i64> {
    Ok(projects::table.count().get_result::<i64>(conn).await?)
}

pub async fn close_project(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<Project> {
    let closed = diesel::update(projects::table.find(id).filter(projects::closed.is_null()))
        .set(projects::closed.eq(Some(Utc::now())))
        .get_result::<Project>(conn)
        .await
        .optional()?;

    match closed {
        Some(project) => {
            debug!(project_id = id, "closed project");
            Ok(project)
        }
        None => {
            // distinguish a missing project from one closed earlier
            find_project(conn, id).await?;
            Err(ModelError::AlreadyClosed {
                entity: "project",
                id,
            })
        }
    }
}

pub async fn link_club(
    conn: &mut AsyncPgConnection,
    new: &NewClubProject,
) -> ModelResult<ClubProject> {
    Ok(diesel::insert_into(club_projects::table)
        .values(new)
        .get_result::<ClubProject>(conn)
        .await?)
}

pub async fn add_member(
    conn: &mut AsyncPgConnection,
    new: &NewProjectMembership,
) -> ModelResult<ProjectMembership> {
    Ok(diesel::insert_into(project_memberships::table)
        .values(new)
        .get_result::<ProjectMembership>(conn)
        .await?)
}

pub async fn project_members(
    conn: &mut AsyncPgConnection,
    project_id: i32,
) -> ModelResult<Vec<User>> {
    Ok(project_memberships::table
        .inner_join(users::table)
        .filter(project_memberships::project_id.eq(project_id))
        .select(users::all_columns)
        .order(project_memberships::id)
        .load::<User>(conn)
        .await?)
}

pub async fn project_clubs(conn: &mut AsyncPgConnection, project_id: i32) -> ModelResult<Vec<Club>> {
    Ok(club_projects::table
        .inner_join(clubs::table)
        .filter(club_projects::project_id.eq(project_id))
        .select(clubs::all_columns)
        .order(clubs::id)
        .load::<Club>(conn)
        .await?)
}

pub async fn unlink_club(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(club_projects::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "club project", id)
}

pub async fn remove_member(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(project_memberships::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "project membership", id)
}

/// Deletes the project with its club links and memberships.
pub async fn delete_project(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(projects::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "project", id)?;
    debug!(project_id = id, "deleted project");
    Ok(())
}
