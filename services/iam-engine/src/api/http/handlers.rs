//! HTTP 处理器

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use iam_common::{DeptId, MenuId, RoleId};
use serde::{Deserialize, Serialize};

use super::extract::IdentityContext;
use super::response::ApiError;
use super::state::AppState;
use crate::application::login::{LoginOutcome, LoginRequest};
use crate::domain::{DataScope, ReplaceOutcome, RouteNode, SocialIdentity};

/// 分配角色菜单所需权限
pub const UPDATE_ROLE_PERMISSION: &str = "system:role:updatePermission";
/// 修改角色数据权限所需权限
pub const UPDATE_ROLE: &str = "system:role:update";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BindRequiredResponse {
    bind_required: bool,
    #[serde(flatten)]
    identity: SocialIdentity,
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    match state.auth_service.login(request).await? {
        LoginOutcome::Token(token) => Ok(Json(token).into_response()),
        LoginOutcome::BindRequired(identity) => Ok(Json(BindRequiredResponse {
            bind_required: true,
            identity,
        })
        .into_response()),
    }
}

pub(super) async fn logout(
    State(state): State<AppState>,
    IdentityContext(context): IdentityContext,
) -> Result<StatusCode, ApiError> {
    let subject = context.subject()?;
    state.auth_service.logout(&subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoResponse {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub dept_id: Option<i64>,
    pub dept_name: Option<String>,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
    pub data_scope: DataScope,
    pub pwd_expired: bool,
}

pub(super) async fn user_info(
    State(state): State<AppState>,
    IdentityContext(context): IdentityContext,
) -> Result<Json<UserInfoResponse>, ApiError> {
    let identity = context.identity().await?;
    let user = &identity.user;

    let dept_name = match user.dept_id {
        Some(dept_id) => state.org_units.find_by_id(dept_id).await?.map(|d| d.name),
        None => None,
    };

    Ok(Json(UserInfoResponse {
        id: user.id.value(),
        username: user.username.clone(),
        nickname: user.nickname.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        avatar: user.avatar.clone(),
        dept_id: user.dept_id.map(|d| d.value()),
        dept_name,
        roles: identity.role_codes.clone(),
        permissions: identity.permissions.clone(),
        data_scope: identity.data_scope.scope,
        pwd_expired: identity.password_expired,
    }))
}

pub(super) async fn user_route(
    State(state): State<AppState>,
    IdentityContext(context): IdentityContext,
) -> Result<Json<Vec<RouteNode>>, ApiError> {
    let identity = context.identity().await?;
    let tree = state
        .permissions
        .compute_menu_tree(identity.user.id, &identity.roles)
        .await?;
    Ok(Json(tree))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleMenusRequest {
    #[serde(default)]
    pub menu_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleDeptsRequest {
    #[serde(default)]
    pub dept_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ReplaceResponse {
    pub changed: bool,
    pub added: usize,
    pub removed: usize,
}

impl From<ReplaceOutcome> for ReplaceResponse {
    fn from(outcome: ReplaceOutcome) -> Self {
        match outcome {
            ReplaceOutcome::Unchanged => Self {
                changed: false,
                added: 0,
                removed: 0,
            },
            ReplaceOutcome::Replaced { added, removed } => Self {
                changed: true,
                added,
                removed,
            },
        }
    }
}

pub(super) async fn update_role_permission(
    State(state): State<AppState>,
    IdentityContext(context): IdentityContext,
    Path(role_id): Path<i64>,
    Json(request): Json<UpdateRoleMenusRequest>,
) -> Result<Json<ReplaceResponse>, ApiError> {
    context.identity().await?.require_permission(UPDATE_ROLE_PERMISSION)?;

    let menu_ids: BTreeSet<MenuId> = request.menu_ids.into_iter().map(MenuId).collect();
    let outcome = state
        .permissions
        .replace_role_menus(RoleId(role_id), menu_ids)
        .await?;
    Ok(Json(outcome.into()))
}

pub(super) async fn update_role_dept(
    State(state): State<AppState>,
    IdentityContext(context): IdentityContext,
    Path(role_id): Path<i64>,
    Json(request): Json<UpdateRoleDeptsRequest>,
) -> Result<Json<ReplaceResponse>, ApiError> {
    context.identity().await?.require_permission(UPDATE_ROLE)?;

    let dept_ids: BTreeSet<DeptId> = request.dept_ids.into_iter().map(DeptId).collect();
    let outcome = state
        .permissions
        .replace_role_depts(RoleId(role_id), dept_ids)
        .await?;
    Ok(Json(outcome.into()))
}
