use super::expect_deleted;
use crate::{
    error::{ModelError, ModelResult},
    models::{
        Club, ClubMembership, ClubMembershipRequest, ClubRole, NewClubMembership,
        NewClubMembershipRequest, NewClubRole, RequestStatus, User,
    },
    schema::*,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{pg::AsyncPgConnection, RunQueryDsl};
use tracing::debug;

pub async fn request_membership(
    conn: &mut AsyncPgConnection,
    new: &NewClubMembershipRequest,
) -> ModelResult<ClubMembershipRequest> {
    Ok(diesel::insert_into(club_membership_requests::table)
        .values(new)
        .get_result::<ClubMembershipRequest>(conn)
        .await?)
}

pub async fn find_request(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> ModelResult<ClubMembershipRequest> {
    club_membership_requests::table
        .find(id)
        .first::<ClubMembershipRequest>(conn)
        .await
        .optional()?
        .ok_or_else(|| ModelError::not_found("club membership request", id))
}

/// Moves a pending request to a terminal status and stamps `closed`.
pub async fn close_request(
    conn: &mut AsyncPgConnection,
    id: i32,
    status: RequestStatus,
) -> ModelResult<ClubMembershipRequest> {
    let current = find_request(conn, id).await?;
    if !status.is_terminal() {
        return Err(ModelError::InvalidTransition {
            from: current.status,
            to: status,
        });
    }

    // only a row that is still pending is touched
    let closed = diesel::update(
        club_membership_requests::table
            .find(id)
            .filter(club_membership_requests::status.eq(RequestStatus::Pending)),
    )
    .set((
        club_membership_requests::status.eq(status),
        club_membership_requests::closed.eq(Some(Utc::now())),
    ))
    .get_result::<ClubMembershipRequest>(conn)
    .await
    .optional()?;

    let Some(closed) = closed else {
        return Err(ModelError::AlreadyClosed {
            entity: "club membership request",
            id,
        });
    };
    debug!(request_id = id, %status, "closed membership request");
    Ok(closed)
}

pub async fn pending_requests(
    conn: &mut AsyncPgConnection,
    club_id: i32,
) -> ModelResult<Vec<ClubMembershipRequest>> {
    Ok(club_membership_requests::table
        .filter(club_membership_requests::club_id.eq(club_id))
        .filter(club_membership_requests::status.eq(RequestStatus::Pending))
        .order(club_membership_requests::initiated)
        .load::<ClubMembershipRequest>(conn)
        .await?)
}

pub async fn delete_request(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(club_membership_requests::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "club membership request", id)
}

pub async fn create_role(conn: &mut AsyncPgConnection, new: &NewClubRole) -> ModelResult<ClubRole> {
    new.validate()?;
    Ok(diesel::insert_into(club_roles::table)
        .values(new)
        .get_result::<ClubRole>(conn)
        .await?)
}

pub async fn delete_role(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(club_roles::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "club role", id)
}

pub async fn add_membership(
    conn: &mut AsyncPgConnection,
    new: &NewClubMembership,
) -> ModelResult<ClubMembership> {
    Ok(diesel::insert_into(club_memberships::table)
        .values(new)
        .get_result::<ClubMembership>(conn)
        .await?)
}

pub async fn delete_membership(conn: &mut AsyncPgConnection, id: i32) -> ModelResult<()> {
    let rows = diesel::delete(club_memberships::table.find(id))
        .execute(conn)
        .await?;
    expect_deleted(rows, "club membership", id)
}

pub async fn role_members(conn: &mut AsyncPgConnection, role_id: i32) -> ModelResult<Vec<User>> {
    Ok(club_memberships::table
        .inner_join(users::table)
        .filter(club_memberships::club_role_id.eq(role_id))
        .select(users::all_columns)
        .order(club_memberships::id)
        .load::<User>(conn)
        .await?)
}

/// Clubs in which the user holds at least one role.
pub async fn user_clubs(conn: &mut AsyncPgConnection, user_id: i32) -> ModelResult<Vec<Club>> {
    Ok(club_memberships::table
        .inner_join(club_roles::table.inner_join(clubs::table))
        .filter(club_memberships::user_id.eq(user_id))
        .select(clubs::all_columns)
        .distinct()
        .order(clubs::id)
        .load::<Club>(conn)
        .await?)
}
