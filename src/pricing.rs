//! Coupon discount calculation over an already-fetched coupon row.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entity::coupons::Model as Coupon;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    Exhausted,
    #[error("order total is below the coupon minimum")]
    BelowMinimum,
    #[error("unknown coupon kind {0}")]
    UnknownKind(String),
}

/// Discount in minor units for `subtotal`, or why the coupon does not apply.
///
/// Percentage coupons are capped by `max_discount`; fixed coupons never exceed
/// the subtotal.
pub fn coupon_discount(
    coupon: &Coupon,
    subtotal: i64,
    now: DateTime<Utc>,
) -> Result<i64, CouponError> {
    if !coupon.active {
        return Err(CouponError::Inactive);
    }
    if now < coupon.valid_from {
        return Err(CouponError::NotStarted);
    }
    if now > coupon.valid_until {
        return Err(CouponError::Expired);
    }
    if coupon.used_count >= coupon.usage_limit {
        return Err(CouponError::Exhausted);
    }
    if subtotal < coupon.min_order_value {
        return Err(CouponError::BelowMinimum);
    }

    let discount = match coupon.kind.as_str() {
        "percentage" => {
            let raw = subtotal * coupon.value / 100;
            match coupon.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        "fixed" => coupon.value,
        other => return Err(CouponError::UnknownKind(other.to_string())),
    };

    Ok(discount.min(subtotal).max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn coupon(kind: &str, value: i64) -> Coupon {
        let now = Utc::now();
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE10".into(),
            kind: kind.into(),
            value,
            min_order_value: 0,
            max_discount: None,
            usage_limit: 100,
            used_count: 0,
            valid_from: (now - Duration::days(1)).into(),
            valid_until: (now + Duration::days(1)).into(),
            active: true,
            created_at: now.into(),
        }
    }

    #[test]
    fn percentage_discount() {
        let c = coupon("percentage", 10);
        assert_eq!(coupon_discount(&c, 10_000, Utc::now()), Ok(1_000));
    }

    #[test]
    fn percentage_capped_by_max_discount() {
        let mut c = coupon("percentage", 25);
        c.max_discount = Some(500);
        assert_eq!(coupon_discount(&c, 10_000, Utc::now()), Ok(500));
    }

    #[test]
    fn fixed_discount_clamped_to_subtotal() {
        let c = coupon("fixed", 5_000);
        assert_eq!(coupon_discount(&c, 3_000, Utc::now()), Ok(3_000));
        assert_eq!(coupon_discount(&c, 8_000, Utc::now()), Ok(5_000));
    }

    #[test]
    fn rejected_outside_validity_window() {
        let c = coupon("fixed", 100);
        let before = Utc::now() - Duration::days(2);
        let after = Utc::now() + Duration::days(2);
        assert_eq!(coupon_discount(&c, 1_000, before), Err(CouponError::NotStarted));
        assert_eq!(coupon_discount(&c, 1_000, after), Err(CouponError::Expired));
    }

    #[test]
    fn rejected_when_usage_exhausted() {
        let mut c = coupon("fixed", 100);
        c.used_count = c.usage_limit;
        assert_eq!(coupon_discount(&c, 1_000, Utc::now()), Err(CouponError::Exhausted));
    }

    #[test]
    fn rejected_below_min_order_value() {
        let mut c = coupon("percentage", 10);
        c.min_order_value = 2_000;
        assert_eq!(
            coupon_discount(&c, 1_999, Utc::now()),
            Err(CouponError::BelowMinimum)
        );
        assert_eq!(coupon_discount(&c, 2_000, Utc::now()), Ok(200));
    }

    #[test]
    fn inactive_rejected() {
        let mut c = coupon("fixed", 100);
        c.active = false;
        assert_eq!(coupon_discount(&c, 1_000, Utc::now()), Err(CouponError::Inactive));
    }

    #[test]
    fn unknown_kind_rejected() {
        let c = coupon("bogo", 1);
        assert!(matches!(
            coupon_discount(&c, 1_000, Utc::now()),
            Err(CouponError::UnknownKind(_))
        ));
    }
}
