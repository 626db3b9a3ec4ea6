//! Prompt wrappers around the generative-AI client, gated by feature flags.

use crate::{
    clients::ai::AiClient,
    dto::ai::{AiFlags, FaqRequest, FraudCheckRequest, GeneratedText, ProductCopyRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    policy::{Permission, require},
    response::ApiResponse,
    services::flags::{load_flags, save_flags},
    state::AppState,
};

const COPY_SYSTEM: &str = "You write concise, truthful e-commerce product copy. \
    Never invent specifications that were not provided.";
const FAQ_SYSTEM: &str = "You draft customer-facing FAQ entries for an online store. \
    Answer only from the provided product details.";
const FRAUD_SYSTEM: &str = "You are a payment-risk analyst. Given an order summary, list \
    concrete risk signals and finish with one line: RISK: low|medium|high.";

fn ai(state: &AppState) -> AppResult<&AiClient> {
    state
        .ai
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("AI features are not configured".into()))
}

pub async fn product_copy(
    state: &AppState,
    user: &AuthUser,
    payload: ProductCopyRequest,
) -> AppResult<ApiResponse<GeneratedText>> {
    require(user.role, Permission::ManageOwnShop)?;
    let flags = load_flags(&state.config.ai_flags_path).await;
    if !flags.product_copy {
        return Err(AppError::BadRequest("product copy generation is disabled".into()));
    }
    let ai = ai(state)?;

    let tone = payload.tone.as_deref().unwrap_or("friendly");
    let prompt = format!(
        "Write a product description (80-120 words) for \"{}\".\nTone: {tone}.\nKeywords: {}.",
        payload.name,
        payload.keywords.join(", ")
    );
    let text = ai.generate(COPY_SYSTEM, &prompt).await?;

    Ok(ApiResponse::success("Generated", GeneratedText { text }, None))
}

pub async fn product_faq(
    state: &AppState,
    user: &AuthUser,
    payload: FaqRequest,
) -> AppResult<ApiResponse<GeneratedText>> {
    require(user.role, Permission::ManageOwnShop)?;
    let flags = load_flags(&state.config.ai_flags_path).await;
    if !flags.faq {
        return Err(AppError::BadRequest("FAQ generation is disabled".into()));
    }
    let ai = ai(state)?;

    let product: Option<(String, Option<String>)> =
        sqlx::query_as("SELECT name, description FROM products WHERE id = $1")
            .bind(payload.product_id)
            .fetch_optional(&state.pool)
            .await?;
    let (name, description) = product.ok_or(AppError::NotFound)?;

    let count = payload.question_count.unwrap_or(5).clamp(1, 10);
    let prompt = format!(
        "Product: {name}\nDescription: {}\n\nWrite {count} FAQ entries (Q and A) for this product.",
        description.unwrap_or_default()
    );
    let text = ai.generate(FAQ_SYSTEM, &prompt).await?;

    Ok(ApiResponse::success("Generated", GeneratedText { text }, None))
}

/// Heuristic risk read over one order; advisory only, never blocks anything.
pub async fn fraud_check(
    state: &AppState,
    user: &AuthUser,
    payload: FraudCheckRequest,
) -> AppResult<ApiResponse<GeneratedText>> {
    require(user.role, Permission::ManageStore)?;
    let flags = load_flags(&state.config.ai_flags_path).await;
    if !flags.fraud_check {
        return Err(AppError::BadRequest("fraud check is disabled".into()));
    }
    let ai = ai(state)?;

    let order: Option<(i64, i64, String, String)> = sqlx::query_as(
        "SELECT total_amount, discount_amount, status, shipping_address FROM orders WHERE id = $1",
    )
    .bind(payload.order_id)
    .fetch_optional(&state.pool)
    .await?;
    let (total, discount, status, address) = order.ok_or(AppError::NotFound)?;

    let item_count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
            .bind(payload.order_id)
            .fetch_one(&state.pool)
            .await?;

    let prior_orders: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE user_id = (SELECT user_id FROM orders WHERE id = $1)",
    )
    .bind(payload.order_id)
    .fetch_one(&state.pool)
    .await?;

    let prompt = format!(
        "Order summary:\n- total: {total}\n- discount: {discount}\n- status: {status}\n\
         - distinct items: {}\n- orders by this customer (incl. this one): {}\n\
         - shipping address: {address}",
        item_count.0, prior_orders.0
    );
    let text = ai.generate(FRAUD_SYSTEM, &prompt).await?;

    Ok(ApiResponse::success("Fraud check", GeneratedText { text }, None))
}

pub async fn get_flags(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<AiFlags>> {
    require(user.role, Permission::ManageStore)?;
    let flags = load_flags(&state.config.ai_flags_path).await;
    Ok(ApiResponse::success("AI flags", flags, None))
}

pub async fn update_flags(
    state: &AppState,
    user: &AuthUser,
    flags: AiFlags,
) -> AppResult<ApiResponse<AiFlags>> {
    require(user.role, Permission::ManagePlatform)?;
    save_flags(&state.config.ai_flags_path, &flags).await?;

    if let Err(err) = crate::audit::log_audit(
        &state.pool,
        Some(user.user_id),
        "ai_flags_update",
        Some("ai_flags"),
        serde_json::to_value(&flags).ok(),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("AI flags updated", flags, None))
}
