use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    clients::webpush::PushOutcome,
    concurrency::run_limited,
    dto::push::{
        BroadcastRequest, BroadcastResult, SubscribeRequest, SubscriptionResponse,
        UnsubscribeRequest,
    },
    entity::{
        notification_logs::ActiveModel as LogActive,
        push_subscriptions::{
            ActiveModel as SubActive, Column as SubCol, Entity as PushSubscriptions,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    policy::{Permission, require},
    response::{ApiResponse, Meta},
    services::convert::push_subscription_from_entity,
    state::AppState,
};

/// Delivery fan-out width for broadcasts.
const SEND_CONCURRENCY: usize = 8;

pub async fn subscribe(
    state: &AppState,
    user: &AuthUser,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<SubscriptionResponse>> {
    if !payload.endpoint.starts_with("https://") {
        return Err(AppError::BadRequest("endpoint must be an https URL".into()));
    }

    let existing = PushSubscriptions::find()
        .filter(SubCol::Endpoint.eq(payload.endpoint.clone()))
        .one(&state.orm)
        .await?;

    let subscription = match existing {
        // Re-subscribing refreshes keys and reactivates.
        Some(sub) => {
            let mut active: SubActive = sub.into();
            active.user_id = Set(Some(user.user_id));
            active.p256dh = Set(payload.keys.p256dh);
            active.auth = Set(payload.keys.auth);
            active.active = Set(true);
            active.update(&state.orm).await?
        }
        None => {
            SubActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(Some(user.user_id)),
                endpoint: Set(payload.endpoint),
                p256dh: Set(payload.keys.p256dh),
                auth: Set(payload.keys.auth),
                active: Set(true),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(ApiResponse::success(
        "Subscribed",
        SubscriptionResponse {
            subscription: push_subscription_from_entity(subscription),
        },
        None,
    ))
}

pub async fn unsubscribe(
    state: &AppState,
    user: &AuthUser,
    payload: UnsubscribeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let subscription = PushSubscriptions::find()
        .filter(
            Condition::all()
                .add(SubCol::Endpoint.eq(payload.endpoint))
                .add(SubCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let subscription = match subscription {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active: SubActive = subscription.into();
    active.active = Set(false);
    active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Unsubscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Admin broadcast to every active subscription. Deliveries run through the
/// bounded fan-out; a dead endpoint (404/410 from the push service) deactivates
/// the subscription instead of failing the broadcast.
pub async fn broadcast(
    state: &AppState,
    user: &AuthUser,
    payload: BroadcastRequest,
) -> AppResult<ApiResponse<BroadcastResult>> {
    require(user.role, Permission::ManageStore)?;
    let push = state
        .push
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("push notifications are not configured".into()))?;

    let subscriptions = PushSubscriptions::find()
        .filter(SubCol::Active.eq(true))
        .all(&state.orm)
        .await?;

    let thunks: Vec<_> = subscriptions
        .iter()
        .map(|sub| {
            let push = push.clone();
            let endpoint = sub.endpoint.clone();
            let id = sub.id;
            move || async move {
                let outcome = push.send(&endpoint).await?;
                Ok::<(Uuid, PushOutcome), AppError>((id, outcome))
            }
        })
        .collect();

    let outcomes = run_limited(SEND_CONCURRENCY, thunks).await?;

    let mut result = BroadcastResult {
        sent: 0,
        gone: 0,
        failed: 0,
    };
    for (subscription_id, outcome) in &outcomes {
        let (label, detail) = match outcome {
            PushOutcome::Sent => {
                result.sent += 1;
                ("sent", None)
            }
            PushOutcome::Gone => {
                result.gone += 1;
                ("gone", None)
            }
            PushOutcome::Failed(detail) => {
                result.failed += 1;
                ("failed", Some(detail.clone()))
            }
        };

        if matches!(outcome, PushOutcome::Gone) {
            PushSubscriptions::update_many()
                .col_expr(SubCol::Active, Expr::value(false))
                .filter(SubCol::Id.eq(*subscription_id))
                .exec(&state.orm)
                .await?;
        }

        LogActive {
            id: Set(Uuid::new_v4()),
            subscription_id: Set(*subscription_id),
            title: Set(payload.title.clone()),
            outcome: Set(label.into()),
            detail: Set(detail),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "push_broadcast",
        Some("push_subscriptions"),
        Some(serde_json::json!({
            "title": payload.title,
            "sent": result.sent,
            "gone": result.gone,
            "failed": result.failed,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Broadcast finished",
        result,
        Some(Meta::empty()),
    ))
}
