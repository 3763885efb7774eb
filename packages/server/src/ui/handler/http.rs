//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    domain::{ChatError, MessageContent, MessageId, MessageKind, RoomId, RoomKind, Timestamp, UserId},
    infrastructure::dto::{
        conversion::{to_message_dto, to_room_dto, to_room_overview_dto},
        http::{
            AddParticipantsRequest, CreateRoomRequest, ErrorResponse, MarkAllReadDto, MessageDto,
            MessagePageDto, RoomDto, RoomOverviewDto, SendMessageRequest, UnreadCountDto,
            UpdateRoomRequest,
        },
    },
    ui::state::AppState,
};

/// 既定のページサイズ
const DEFAULT_PAGE_SIZE: usize = 20;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// ChatError から HTTP ステータスへの変換
fn to_error_response(err: ChatError) -> ApiError {
    let status = match &err {
        ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::Forbidden(_) => StatusCode::FORBIDDEN,
        ChatError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ChatError::InvalidState(_) | ChatError::Conflict(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn parse_room_id(value: String) -> Result<RoomId, ApiError> {
    RoomId::new(value).map_err(to_error_response)
}

fn parse_user_id(value: String) -> Result<UserId, ApiError> {
    UserId::new(value).map_err(to_error_response)
}

fn parse_message_id(value: String) -> Result<MessageId, ApiError> {
    MessageId::new(value).map_err(to_error_response)
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

// ========================================
// ルーム系エンドポイント
// ========================================

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> ApiResult<(StatusCode, Json<RoomDto>)> {
    let creator_id = parse_user_id(request.creator_id)?;
    let mut participant_ids = Vec::new();
    for id in request.participant_ids {
        participant_ids.push(parse_user_id(id)?);
    }

    let room = state
        .room_manager
        .create_room(
            request.name,
            request.description,
            request.kind.unwrap_or(RoomKind::Group),
            creator_id,
            participant_ids,
        )
        .await
        .map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(to_room_dto(&room))))
}

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomDto>> {
    let rooms = state.room_manager.list_all_rooms().await;
    Json(rooms.iter().map(to_room_dto).collect())
}

#[derive(Debug, Deserialize)]
pub struct SearchRoomsQuery {
    pub name: String,
}

pub async fn search_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchRoomsQuery>,
) -> Json<Vec<RoomDto>> {
    let rooms = state.room_manager.search_rooms_by_name(&query.name).await;
    Json(rooms.iter().map(to_room_dto).collect())
}

#[derive(Debug, Deserialize)]
pub struct DirectRoomQuery {
    pub user_a: String,
    pub user_b: String,
}

pub async fn get_direct_room(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DirectRoomQuery>,
) -> ApiResult<Json<RoomDto>> {
    let user_a = parse_user_id(query.user_a)?;
    let user_b = parse_user_id(query.user_b)?;

    let room = state
        .room_manager
        .get_or_create_direct_room(&user_a, &user_b)
        .await
        .map_err(to_error_response)?;

    Ok(Json(to_room_dto(&room)))
}

/// ユーザーの参加ルーム一覧（最新メッセージと未読数で装飾）
pub async fn list_rooms_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<RoomOverviewDto>>> {
    let user_id = parse_user_id(user_id)?;

    let rooms = state.room_manager.list_rooms_for_user(&user_id).await;
    let mut overviews = Vec::with_capacity(rooms.len());
    for room in &rooms {
        let last_message = state
            .message_service
            .get_latest(&room.id)
            .await
            .map_err(to_error_response)?;
        let unread_count = state
            .message_service
            .count_unread(&room.id, &user_id)
            .await
            .map_err(to_error_response)?;
        overviews.push(
            to_room_overview_dto(room, last_message, unread_count, state.identity.as_ref()).await,
        );
    }

    Ok(Json(overviews))
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<RoomDto>> {
    let room_id = parse_room_id(room_id)?;

    let room = state
        .room_manager
        .get_room(&room_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(to_room_dto(&room)))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<UpdateRoomRequest>,
) -> ApiResult<Json<RoomDto>> {
    let room_id = parse_room_id(room_id)?;

    let room = state
        .room_manager
        .update_room(&room_id, request.name, request.description)
        .await
        .map_err(to_error_response)?;

    Ok(Json(to_room_dto(&room)))
}

pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<StatusCode> {
    let room_id = parse_room_id(room_id)?;

    state
        .room_manager
        .delete_room(&room_id)
        .await
        .map_err(to_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_participants(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<AddParticipantsRequest>,
) -> ApiResult<Json<RoomDto>> {
    let room_id = parse_room_id(room_id)?;
    let mut user_ids = Vec::new();
    for id in request.participant_ids {
        user_ids.push(parse_user_id(id)?);
    }

    let room = state
        .room_manager
        .add_participants(&room_id, user_ids)
        .await
        .map_err(to_error_response)?;

    Ok(Json(to_room_dto(&room)))
}

/// 参加者を削除する。最後の参加者が抜けてルームごと消えた場合は
/// `null` を返す。
pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<Option<RoomDto>>> {
    let room_id = parse_room_id(room_id)?;
    let user_id = parse_user_id(user_id)?;

    let room = state
        .room_manager
        .remove_participant(&room_id, &user_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(room.as_ref().map(to_room_dto)))
}

// ========================================
// メッセージ系エンドポイント
// ========================================

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageDto>)> {
    let room_id = parse_room_id(room_id)?;
    let sender_id = parse_user_id(request.sender_id)?;
    let content = MessageContent::new(request.content).map_err(to_error_response)?;

    let message = state
        .message_service
        .send_message(
            &room_id,
            sender_id,
            request.kind.unwrap_or(MessageKind::Text),
            content,
        )
        .await
        .map_err(to_error_response)?;

    let dto = to_message_dto(&message, state.identity.as_ref()).await;
    Ok((StatusCode::CREATED, Json(dto)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page_size: Option<usize>,
    pub page_token: Option<String>,
}

pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<MessagePageDto>> {
    let room_id = parse_room_id(room_id)?;

    let (messages, next_page_token) = state
        .message_service
        .get_page(
            &room_id,
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            query.page_token.as_deref(),
        )
        .await
        .map_err(to_error_response)?;

    let mut dtos = Vec::with_capacity(messages.len());
    for message in &messages {
        dtos.push(to_message_dto(message, state.identity.as_ref()).await);
    }

    Ok(Json(MessagePageDto {
        messages: dtos,
        next_page_token,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SinceQuery {
    /// Unix ミリ秒。この時刻より後のメッセージを返す。
    pub after: i64,
}

pub async fn get_messages_since(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<SinceQuery>,
) -> ApiResult<Json<Vec<MessageDto>>> {
    let room_id = parse_room_id(room_id)?;

    let messages = state
        .message_service
        .get_since(&room_id, Timestamp::new(query.after))
        .await
        .map_err(to_error_response)?;

    let mut dtos = Vec::with_capacity(messages.len());
    for message in &messages {
        dtos.push(to_message_dto(message, state.identity.as_ref()).await);
    }

    Ok(Json(dtos))
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    pub keyword: String,
}

pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<KeywordQuery>,
) -> ApiResult<Json<Vec<MessageDto>>> {
    let room_id = parse_room_id(room_id)?;

    let messages = state
        .message_service
        .search_by_content(&room_id, &query.keyword)
        .await
        .map_err(to_error_response)?;

    let mut dtos = Vec::with_capacity(messages.len());
    for message in &messages {
        dtos.push(to_message_dto(message, state.identity.as_ref()).await);
    }

    Ok(Json(dtos))
}

pub async fn get_latest_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<Option<MessageDto>>> {
    let room_id = parse_room_id(room_id)?;

    let latest = state
        .message_service
        .get_latest(&room_id)
        .await
        .map_err(to_error_response)?;

    let dto = match latest {
        Some(message) => Some(to_message_dto(&message, state.identity.as_ref()).await),
        None => None,
    };
    Ok(Json(dto))
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

pub async fn count_unread(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<UnreadCountDto>> {
    let room_id = parse_room_id(room_id)?;
    let user_id = parse_user_id(query.user_id)?;

    let unread_count = state
        .message_service
        .count_unread(&room_id, &user_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(UnreadCountDto {
        unread_count: unread_count as u64,
    }))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<MarkAllReadDto>> {
    let room_id = parse_room_id(room_id)?;
    let user_id = parse_user_id(query.user_id)?;

    let marked = state
        .message_service
        .mark_all_read(&room_id, &user_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(MarkAllReadDto {
        marked_count: marked as u64,
    }))
}

pub async fn get_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<Json<MessageDto>> {
    let message_id = parse_message_id(message_id)?;

    let message = state
        .message_service
        .get_by_id(&message_id)
        .await
        .map_err(to_error_response)?;

    let dto = to_message_dto(&message, state.identity.as_ref()).await;
    Ok(Json(dto))
}

pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<StatusCode> {
    let message_id = parse_message_id(message_id)?;
    let user_id = parse_user_id(query.user_id)?;

    state
        .message_service
        .mark_read(&message_id, &user_id)
        .await
        .map_err(to_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<String>,
) -> ApiResult<StatusCode> {
    let message_id = parse_message_id(message_id)?;

    state
        .message_service
        .delete_message(&message_id)
        .await
        .map_err(to_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
