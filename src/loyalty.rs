//! Loyalty tiers and point accrual.
//!
//! A tier is derived from lifetime spend; the thresholds and earn rates live
//! here rather than in a table so the mapping is versioned with the code.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// Lifetime spend (minor units) required to enter each tier.
pub const SILVER_AT: i64 = 50_000;
pub const GOLD_AT: i64 = 200_000;
pub const PLATINUM_AT: i64 = 500_000;

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }

    /// Points earned per 100 minor units paid.
    pub fn earn_rate(&self) -> i64 {
        match self {
            Tier::Bronze => 1,
            Tier::Silver => 2,
            Tier::Gold => 3,
            Tier::Platinum => 5,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            _ => Err(()),
        }
    }
}

pub fn tier_for_spend(lifetime_spend: i64) -> Tier {
    if lifetime_spend >= PLATINUM_AT {
        Tier::Platinum
    } else if lifetime_spend >= GOLD_AT {
        Tier::Gold
    } else if lifetime_spend >= SILVER_AT {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// Points credited for a paid amount at the account's current tier.
pub fn points_earned(tier: Tier, paid_amount: i64) -> i64 {
    if paid_amount <= 0 {
        return 0;
    }
    paid_amount / 100 * tier.earn_rate()
}

/// Minor units of credit a point redemption is worth.
pub fn redemption_value(points: i64) -> i64 {
    points * 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_thresholds() {
        assert_eq!(tier_for_spend(0), Tier::Bronze);
        assert_eq!(tier_for_spend(49_999), Tier::Bronze);
        assert_eq!(tier_for_spend(50_000), Tier::Silver);
        assert_eq!(tier_for_spend(199_999), Tier::Silver);
        assert_eq!(tier_for_spend(200_000), Tier::Gold);
        assert_eq!(tier_for_spend(500_000), Tier::Platinum);
        assert_eq!(tier_for_spend(5_000_000), Tier::Platinum);
    }

    #[test]
    fn accrual_scales_with_tier() {
        assert_eq!(points_earned(Tier::Bronze, 10_000), 100);
        assert_eq!(points_earned(Tier::Silver, 10_000), 200);
        assert_eq!(points_earned(Tier::Platinum, 10_000), 500);
    }

    #[test]
    fn accrual_ignores_sub_unit_remainder_and_refund_amounts() {
        assert_eq!(points_earned(Tier::Bronze, 199), 1);
        assert_eq!(points_earned(Tier::Bronze, 99), 0);
        assert_eq!(points_earned(Tier::Gold, -500), 0);
    }

    #[test]
    fn tier_round_trips_through_strings() {
        for tier in [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Platinum] {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert!("diamond".parse::<Tier>().is_err());
    }
}
