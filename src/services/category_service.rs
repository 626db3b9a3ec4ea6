use uuid::Uuid;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Category,
    policy::{Permission, require},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct CategoryList {
    pub items: Vec<Category>,
}

const CACHE_KEY: &str = "categories:all";

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    if let Some(hit) = state.cache.get(CACHE_KEY).await {
        if let Ok(items) = serde_json::from_value::<Vec<Category>>(hit) {
            return Ok(ApiResponse::success("Categories", CategoryList { items }, None));
        }
    }

    let items = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    if let Ok(value) = serde_json::to_value(&items) {
        state.cache.put(CACHE_KEY.to_string(), value).await;
    }
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    require(user.role, Permission::ManageStore)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
        .bind(&name)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("category already exists".into()));
    }

    if let Some(parent_id) = payload.parent_id {
        let parent: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(parent_id)
            .fetch_optional(&state.pool)
            .await?;
        if parent.is_none() {
            return Err(AppError::BadRequest("parent category not found".into()));
        }
    }

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug, parent_id) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(slugify(&name))
    .bind(payload.parent_id)
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Category created", category, None))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    require(user.role, Permission::ManageStore)?;

    let existing = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    let parent_id = payload.parent_id.or(existing.parent_id);
    if parent_id == Some(id) {
        return Err(AppError::BadRequest("category cannot be its own parent".into()));
    }

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, slug = $3, parent_id = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&name)
    .bind(slugify(&name))
    .bind(parent_id)
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_all();
    Ok(ApiResponse::success("Category updated", category, None))
}

/// Deleting a category that still has products is refused outright.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require(user.role, Permission::ManageStore)?;

    let in_use: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    if in_use.0 > 0 {
        return Err(AppError::Conflict(
            "category still has products; move them first".into(),
        ));
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  Gadgets  "), "gadgets");
        assert_eq!(slugify("Déjà Vu"), "déjà-vu");
    }
}
