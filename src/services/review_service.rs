use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{CreateReviewRequest, ReviewList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    policy::{Permission, require},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }

    let product_exist: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND published = true")
            .bind(product_id)
            .fetch_optional(&state.pool)
            .await?;
    if product_exist.is_none() {
        return Err(AppError::NotFound);
    }

    // Reviews come from buyers: the user must have a paid order containing
    // this product.
    let purchased: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT oi.id
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.user_id = $1 AND oi.product_id = $2 AND o.payment_status = 'paid'
        LIMIT 1
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .fetch_optional(&state.pool)
    .await?;
    if purchased.is_none() {
        return Err(AppError::BadRequest(
            "only buyers of this product can review it".into(),
        ));
    }

    let already: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM reviews WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(product_id)
            .fetch_optional(&state.pool)
            .await?;
    if already.is_some() {
        return Err(AppError::Conflict(
            "you have already reviewed this product".into(),
        ));
    }

    let review: Review = sqlx::query_as(
        r#"
        INSERT INTO reviews (id, product_id, user_id, rating, body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.body)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Review created", review, None))
}

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Review>(
        r#"
        SELECT * FROM reviews
        WHERE product_id = $1 AND status = 'published'
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM reviews WHERE product_id = $1 AND status = 'published'",
    )
    .bind(product_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

/// Admin moderation: flip a review between published and hidden.
pub async fn set_review_status(
    state: &AppState,
    user: &AuthUser,
    review_id: Uuid,
    status: &str,
) -> AppResult<ApiResponse<Review>> {
    require(user.role, Permission::ManageStore)?;
    if !matches!(status, "published" | "hidden") {
        return Err(AppError::BadRequest("invalid review status".into()));
    }

    let review: Option<Review> =
        sqlx::query_as("UPDATE reviews SET status = $2 WHERE id = $1 RETURNING *")
            .bind(review_id)
            .bind(status)
            .fetch_optional(&state.pool)
            .await?;
    let review = match review {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_moderate",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "status": status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Review updated", review, None))
}
