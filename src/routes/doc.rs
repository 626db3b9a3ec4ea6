use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{
            ChangeRoleRequest, DecideRequest, InventoryAdjustRequest, PayoutList, RefundList,
            RefundRequestBody, UpdateOrderStatusRequest, UserList,
        },
        ai::{AiFlags, FaqRequest, FraudCheckRequest, GeneratedText, ProductCopyRequest},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        contact::{
            AnnouncementList, ContactMessageList, ContactRequest, CreateAnnouncementRequest,
            UpdateAnnouncementRequest,
        },
        coupons::{
            CouponList, CreateCouponRequest, PreviewCouponRequest, PreviewCouponResponse,
            UpdateCouponRequest,
        },
        loyalty::{LoyaltyOverview, RedeemPointsRequest, RedeemPointsResponse, TierInfo, TierList},
        orders::{CheckoutItem, CheckoutRequest, OrderList, OrderWithItems},
        payments::{InitiatePaymentResponse, IpnPayload},
        products::{
            CreateProductRequest, CreateVariantRequest, ImageUploadResponse, ProductDetail,
            ProductList, UpdateProductRequest, UpdateVariantRequest,
        },
        push::{BroadcastRequest, BroadcastResult, SubscribeRequest, UnsubscribeRequest},
        reviews::{CreateReviewRequest, ReviewList},
        sellers::{ApplicationList, ApplyRequest, ApprovalResponse, PayoutRequestBody},
    },
    models::{
        Announcement, Category, ContactMessage, Coupon, LoyaltyAccount, Order, OrderItem, Payment,
        PayoutRequest, Product, ProductVariant, PushSubscription, Refund, Review,
        SellerApplication, Shop, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, ai, auth, categories, content, coupons, health, loyalty, orders, params, payments,
        products, push, sellers,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::add_variant,
        products::update_variant,
        products::delete_variant,
        products::upload_image,
        products::list_reviews,
        products::create_review,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::cancel_order,
        orders::request_refund,
        payments::initiate,
        payments::callback,
        payments::ipn,
        coupons::list_coupons,
        coupons::create_coupon,
        coupons::update_coupon,
        coupons::preview_coupon,
        loyalty::overview,
        loyalty::redeem,
        loyalty::tiers,
        sellers::apply,
        sellers::my_application,
        sellers::request_payout,
        content::list_announcements,
        content::submit_contact,
        push::subscribe,
        push::unsubscribe,
        push::broadcast,
        ai::product_copy,
        ai::product_faq,
        ai::fraud_check,
        ai::get_flags,
        ai::update_flags,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_users,
        admin::change_role,
        admin::list_applications,
        admin::decide_application,
        admin::list_refunds,
        admin::decide_refund,
        admin::list_payouts,
        admin::decide_payout,
        admin::moderate_review,
        admin::list_contact_messages,
        admin::close_contact_message,
        admin::create_announcement,
        admin::update_announcement,
        admin::delete_announcement,
    ),
    components(
        schemas(
            User,
            Shop,
            SellerApplication,
            Category,
            Product,
            ProductVariant,
            Order,
            OrderItem,
            Payment,
            Coupon,
            LoyaltyAccount,
            Review,
            Announcement,
            ContactMessage,
            PushSubscription,
            Refund,
            PayoutRequest,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateProductRequest,
            UpdateProductRequest,
            CreateVariantRequest,
            UpdateVariantRequest,
            ProductList,
            ProductDetail,
            ImageUploadResponse,
            CheckoutItem,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            InitiatePaymentResponse,
            IpnPayload,
            CouponList,
            CreateCouponRequest,
            UpdateCouponRequest,
            PreviewCouponRequest,
            PreviewCouponResponse,
            LoyaltyOverview,
            RedeemPointsRequest,
            RedeemPointsResponse,
            TierInfo,
            TierList,
            CreateReviewRequest,
            ReviewList,
            ApplyRequest,
            ApplicationList,
            ApprovalResponse,
            PayoutRequestBody,
            PayoutList,
            ContactRequest,
            ContactMessageList,
            CreateAnnouncementRequest,
            UpdateAnnouncementRequest,
            AnnouncementList,
            SubscribeRequest,
            UnsubscribeRequest,
            BroadcastRequest,
            BroadcastResult,
            ProductCopyRequest,
            FaqRequest,
            FraudCheckRequest,
            GeneratedText,
            AiFlags,
            ChangeRoleRequest,
            DecideRequest,
            InventoryAdjustRequest,
            RefundRequestBody,
            RefundList,
            UpdateOrderStatusRequest,
            UserList,
            admin::ApplicationListQuery,
            admin::ModerateReviewRequest,
            crate::services::category_service::CategoryList,
            crate::services::category_service::CreateCategoryRequest,
            crate::services::category_service::UpdateCategoryRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::LowStockQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<LoyaltyOverview>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment gateway flow"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Loyalty", description = "Loyalty program endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Sellers", description = "Seller onboarding and payouts"),
        (name = "Content", description = "Announcements and contact"),
        (name = "Push", description = "Web push endpoints"),
        (name = "AI", description = "AI-assisted content endpoints"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
