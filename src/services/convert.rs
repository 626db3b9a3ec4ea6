//! Entity-to-API-model conversions shared by the services.

use chrono::Utc;

use crate::entity::{
    coupons, loyalty_accounts, order_items, orders, payments, payout_requests, product_variants,
    products, push_subscriptions, refunds, reviews, seller_applications, shops,
};
use crate::models::{
    Coupon, LoyaltyAccount, Order, OrderItem, Payment, PayoutRequest, Product, ProductVariant,
    PushSubscription, Refund, Review, SellerApplication, Shop,
};

pub fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        shop_id: model.shop_id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        image_url: model.image_url,
        published: model.published,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn variant_from_entity(model: product_variants::Model) -> ProductVariant {
    ProductVariant {
        id: model.id,
        product_id: model.product_id,
        label: model.label,
        price_delta: model.price_delta,
        stock: model.stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user_id: model.user_id,
        rating: model.rating,
        body: model.body,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn order_from_entity(model: orders::Model) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        total_amount: model.total_amount,
        discount_amount: model.discount_amount,
        coupon_id: model.coupon_id,
        status: model.status,
        payment_status: model.payment_status,
        invoice_number: model.invoice_number,
        shipping_address: model.shipping_address,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: order_items::Model) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        variant_id: model.variant_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn payment_from_entity(model: payments::Model) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        gateway_ref: model.gateway_ref,
        amount: model.amount,
        status: model.status,
        payer_msisdn: model.payer_msisdn,
        verified_at: model.verified_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn coupon_from_entity(model: coupons::Model) -> Coupon {
    Coupon {
        id: model.id,
        code: model.code,
        kind: model.kind,
        value: model.value,
        min_order_value: model.min_order_value,
        max_discount: model.max_discount,
        usage_limit: model.usage_limit,
        used_count: model.used_count,
        valid_from: model.valid_from.with_timezone(&Utc),
        valid_until: model.valid_until.with_timezone(&Utc),
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn loyalty_account_from_entity(model: loyalty_accounts::Model) -> LoyaltyAccount {
    LoyaltyAccount {
        id: model.id,
        user_id: model.user_id,
        points_balance: model.points_balance,
        lifetime_spend: model.lifetime_spend,
        tier: model.tier,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn shop_from_entity(model: shops::Model) -> Shop {
    Shop {
        id: model.id,
        owner_user_id: model.owner_user_id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        logo_url: model.logo_url,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn application_from_entity(model: seller_applications::Model) -> SellerApplication {
    SellerApplication {
        id: model.id,
        user_id: model.user_id,
        shop_name: model.shop_name,
        pitch: model.pitch,
        status: model.status,
        decided_by: model.decided_by,
        decided_at: model.decided_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn push_subscription_from_entity(model: push_subscriptions::Model) -> PushSubscription {
    PushSubscription {
        id: model.id,
        user_id: model.user_id,
        endpoint: model.endpoint,
        p256dh: model.p256dh,
        auth: model.auth,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn refund_from_entity(model: refunds::Model) -> Refund {
    Refund {
        id: model.id,
        order_id: model.order_id,
        payment_id: model.payment_id,
        amount: model.amount,
        reason: model.reason,
        status: model.status,
        decided_by: model.decided_by,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn payout_from_entity(model: payout_requests::Model) -> PayoutRequest {
    PayoutRequest {
        id: model.id,
        shop_id: model.shop_id,
        amount: model.amount,
        status: model.status,
        decided_by: model.decided_by,
        decided_at: model.decided_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
