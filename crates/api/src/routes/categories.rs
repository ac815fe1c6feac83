//! Category management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use fintrack_core::ledger::{CategoryType, LedgerError};
use fintrack_db::entities::categories;
use fintrack_db::repositories::{CategoryFilter, CategoryRepository, UpdateCategoryInput};
use fintrack_shared::types::CategoryId;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the category routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/merge", post(merge_categories))
        .route(
            "/categories/{category_id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route("/categories/{category_id}/deactivate", post(deactivate_category))
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListCategoriesQuery {
    /// Include inactive categories (default: false).
    #[serde(default)]
    pub include_inactive: bool,
    /// INCOME or EXPENSE, case-insensitive.
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Category name.
    pub name: String,
    /// INCOME or EXPENSE, case-insensitive.
    #[serde(rename = "type")]
    pub category_type: String,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New type.
    #[serde(rename = "type")]
    pub category_type: Option<String>,
}

/// Request body for merging two categories.
#[derive(Debug, Deserialize)]
pub struct MergeCategoriesRequest {
    /// Category whose transactions move.
    pub source_id: Uuid,
    /// Category receiving them.
    pub destination_id: Uuid,
}

/// Response for a category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: Uuid,
    /// Category name.
    pub name: String,
    /// INCOME or EXPENSE.
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    /// Whether the category is active.
    pub active: bool,
    /// True for the transfer categories.
    pub system: bool,
}

impl From<categories::Model> for CategoryResponse {
    fn from(model: categories::Model) -> Self {
        let info = model.to_info();
        Self {
            system: info.is_system(),
            id: model.id,
            name: info.name,
            category_type: info.category_type,
            active: info.active,
        }
    }
}

fn parse_type(raw: Option<&str>) -> Result<Option<CategoryType>, LedgerError> {
    raw.map(str::parse::<CategoryType>).transpose()
}

/// GET `/fin/categories` - List categories ordered by type, then name.
async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> impl IntoResponse {
    let category_type = match parse_type(query.category_type.as_deref()) {
        Ok(t) => t,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = CategoryRepository::new((*state.db).clone());
    let filter = CategoryFilter {
        include_inactive: query.include_inactive,
        category_type,
    };

    match repo.list(auth.user_id(), &filter).await {
        Ok(categories) => {
            let data: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "data": data }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/categories` - Create a category.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    let category_type = match payload.category_type.parse::<CategoryType>() {
        Ok(t) => t,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .create(auth.user_id(), &payload.name, category_type)
        .await
    {
        Ok(category) => {
            info!(
                user_id = %auth.user_id(),
                category_id = %category.id,
                category_type = %category_type,
                "Category created"
            );
            (StatusCode::CREATED, Json(json!(CategoryResponse::from(category)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET `/fin/categories/{category_id}` - Get one category.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .get(auth.user_id(), CategoryId::from_uuid(category_id))
        .await
    {
        Ok(category) => {
            (StatusCode::OK, Json(json!(CategoryResponse::from(category)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// PATCH `/fin/categories/{category_id}` - Rename and/or retype a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    let category_type = match parse_type(payload.category_type.as_deref()) {
        Ok(t) => t,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let repo = CategoryRepository::new((*state.db).clone());
    let input = UpdateCategoryInput {
        name: payload.name,
        category_type,
    };

    match repo
        .update(auth.user_id(), CategoryId::from_uuid(category_id), input)
        .await
    {
        Ok(category) => {
            info!(category_id = %category.id, "Category updated");
            (StatusCode::OK, Json(json!(CategoryResponse::from(category)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/categories/{category_id}/deactivate` - Hide a category.
async fn deactivate_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .deactivate(auth.user_id(), CategoryId::from_uuid(category_id))
        .await
    {
        Ok(category) => {
            info!(category_id = %category.id, "Category deactivated");
            (StatusCode::OK, Json(json!(CategoryResponse::from(category)))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// DELETE `/fin/categories/{category_id}` - Delete an unused category.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(category_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .delete(auth.user_id(), CategoryId::from_uuid(category_id))
        .await
    {
        Ok(()) => {
            info!(category_id = %category_id, "Category deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST `/fin/categories/merge` - Move all transactions from one category to another.
async fn merge_categories(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<MergeCategoriesRequest>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo
        .merge(
            auth.user_id(),
            CategoryId::from_uuid(payload.source_id),
            CategoryId::from_uuid(payload.destination_id),
        )
        .await
    {
        Ok(moved) => {
            info!(
                source_id = %payload.source_id,
                destination_id = %payload.destination_id,
                moved,
                "Categories merged"
            );
            (StatusCode::OK, Json(json!({ "moved": moved }))).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
