//! Member management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::member::{Member, MemberRequest},
};

use super::ValidatedJson;

/// List all members
#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    responses(
        (status = 200, description = "All members", body = Vec<Member>)
    )
)]
pub async fn list_members(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Member>>> {
    let members = state.services.members.list().await?;
    Ok(Json(members))
}

/// Get member by ID
#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    responses(
        (status = 200, description = "Member details", body = Member),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.get_by_id(id).await?;
    Ok(Json(member))
}

/// Enroll a new member
#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = MemberRequest,
    responses(
        (status = 201, description = "Member created", body = Member),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_member(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<MemberRequest>,
) -> AppResult<(StatusCode, Json<Member>)> {
    let member = state.services.members.create(&request).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Rename a member
#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "Member updated", body = Member),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<MemberRequest>,
) -> AppResult<Json<Member>> {
    let member = state.services.members.update(id, &request).await?;
    Ok(Json(member))
}

/// Delete a member
#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Member is borrowing a book", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_member(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.members.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
