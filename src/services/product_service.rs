use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{
        CreateProductRequest, CreateVariantRequest, ImageUploadResponse, ProductDetail,
        ProductList, UpdateProductRequest, UpdateVariantRequest,
    },
    entity::{
        product_variants::{ActiveModel as VariantActive, Column as VariantCol, Entity as ProductVariants},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
        reviews::{Column as ReviewCol, Entity as Reviews},
        shops::{Column as ShopCol, Entity as Shops, Model as ShopModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    policy::{Permission, require},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::convert::{product_from_entity, review_from_entity, variant_from_entity},
    state::AppState,
};

#[derive(Serialize, Deserialize)]
struct CachedListing {
    items: Vec<Product>,
    meta: Meta,
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let key = query.cache_key();
    if let Some(hit) = state.cache.get(&key).await {
        if let Ok(cached) = serde_json::from_value::<CachedListing>(hit) {
            return Ok(ApiResponse::success(
                "Products",
                ProductList { items: cached.items },
                Some(cached.meta),
            ));
        }
    }

    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(ProdCol::Published.eq(true));
    if let Some(q) = query.q.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(ProdCol::Name.contains(q.as_str()));
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }
    if let Some(shop_id) = query.shop_id {
        condition = condition.add(ProdCol::ShopId.eq(shop_id));
    }
    if let Some(min) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let column = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(column),
        SortOrder::Desc => finder.order_by_desc(column),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items: Vec<Product> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    if let Ok(value) = serde_json::to_value(CachedListing {
        items: items.clone(),
        meta: meta.clone(),
    }) {
        state.cache.put(key, value).await;
    }

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .filter(ProdCol::Published.eq(true))
        .one(&state.orm)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let variants = ProductVariants::find()
        .filter(VariantCol::ProductId.eq(id))
        .order_by_asc(VariantCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(variant_from_entity)
        .collect();

    let reviews = Reviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::ProductId.eq(id))
                .add(ReviewCol::Status.eq("published")),
        )
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product_from_entity(product),
            variants,
            reviews,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    require(user.role, Permission::ManageOwnShop)?;
    let shop = own_shop(state, user).await?;

    if payload.price < 0 || payload.stock < 0 {
        return Err(AppError::BadRequest(
            "price and stock must not be negative".into(),
        ));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop.id),
        category_id: Set(payload.category_id),
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image_url: Set(None),
        published: Set(payload.published.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "shop_id": shop.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_managed_product(state, user, id).await?;

    let mut active: ProductActive = existing.into();
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if payload.description.is_some() {
        active.description = Set(payload.description);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price must not be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    if let Some(published) = payload.published {
        active.published = Set(published);
    }

    let product = active.update(&state.orm).await?;
    state.cache.invalidate_all();

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = find_managed_product(state, user, id).await?;

    let ordered: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM order_items WHERE product_id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    if ordered.is_some() {
        return Err(AppError::Conflict(
            "product appears in orders; unpublish it instead".into(),
        ));
    }

    ProductVariants::delete_many()
        .filter(VariantCol::ProductId.eq(id))
        .exec(&state.orm)
        .await?;
    Products::delete_by_id(product.id).exec(&state.orm).await?;
    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
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

pub async fn add_variant(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateVariantRequest,
) -> AppResult<ApiResponse<crate::models::ProductVariant>> {
    find_managed_product(state, user, product_id).await?;

    if payload.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }

    let variant = VariantActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        label: Set(payload.label),
        price_delta: Set(payload.price_delta),
        stock: Set(payload.stock),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    state.cache.invalidate_all();
    Ok(ApiResponse::success(
        "Variant created",
        variant_from_entity(variant),
        Some(Meta::empty()),
    ))
}

pub async fn update_variant(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    variant_id: Uuid,
    payload: UpdateVariantRequest,
) -> AppResult<ApiResponse<crate::models::ProductVariant>> {
    find_managed_product(state, user, product_id).await?;

    let variant = ProductVariants::find()
        .filter(
            Condition::all()
                .add(VariantCol::Id.eq(variant_id))
                .add(VariantCol::ProductId.eq(product_id)),
        )
        .one(&state.orm)
        .await?;
    let variant = match variant {
        Some(v) => v,
        None => return Err(AppError::NotFound),
    };

    let mut active: VariantActive = variant.into();
    if let Some(label) = payload.label {
        active.label = Set(label);
    }
    if let Some(price_delta) = payload.price_delta {
        active.price_delta = Set(price_delta);
    }
    if let Some(stock) = payload.stock {
        if stock < 0 {
            return Err(AppError::BadRequest("stock must not be negative".into()));
        }
        active.stock = Set(stock);
    }
    let variant = active.update(&state.orm).await?;

    state.cache.invalidate_all();
    Ok(ApiResponse::success(
        "Variant updated",
        variant_from_entity(variant),
        Some(Meta::empty()),
    ))
}

pub async fn delete_variant(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    variant_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    find_managed_product(state, user, product_id).await?;

    let result = ProductVariants::delete_many()
        .filter(
            Condition::all()
                .add(VariantCol::Id.eq(variant_id))
                .add(VariantCol::ProductId.eq(product_id)),
        )
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    state.cache.invalidate_all();
    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    file_name: String,
    bytes: Vec<u8>,
) -> AppResult<ApiResponse<ImageUploadResponse>> {
    let product = find_managed_product(state, user, product_id).await?;

    let images = state
        .images
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("image uploads are not configured".into()))?;
    let image_url = images.upload(file_name, bytes).await?;

    let mut active: ProductActive = product.into();
    active.image_url = Set(Some(image_url.clone()));
    active.update(&state.orm).await?;
    state.cache.invalidate_all();

    Ok(ApiResponse::success(
        "Image uploaded",
        ImageUploadResponse { image_url },
        Some(Meta::empty()),
    ))
}

/// The seller's own active shop; sellers without one cannot list products.
async fn own_shop(state: &AppState, user: &AuthUser) -> AppResult<ShopModel> {
    let shop = Shops::find()
        .filter(
            Condition::all()
                .add(ShopCol::OwnerUserId.eq(user.user_id))
                .add(ShopCol::Active.eq(true)),
        )
        .one(&state.orm)
        .await?;
    shop.ok_or(AppError::Forbidden)
}

/// Fetch a product the caller may manage: its owner, or store staff.
async fn find_managed_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ProductModel> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if require(user.role, Permission::ManageStore).is_ok() {
        return Ok(product);
    }
    require(user.role, Permission::ManageOwnShop)?;
    let shop = own_shop(state, user).await?;
    if shop.id != product.shop_id {
        return Err(AppError::Forbidden);
    }
    Ok(product)
}
