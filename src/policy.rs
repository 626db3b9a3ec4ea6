//! Role-based access control.
//!
//! Routes declare the permission they need instead of comparing role strings
//! inline; `require` is the single gate.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Seller,
    Admin,
    Superadmin,
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            _ => Err(AppError::Forbidden),
        }
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Place orders, review purchases, manage own loyalty account.
    Shop,
    /// Manage products and payouts of the shop the user owns.
    ManageOwnShop,
    /// Back-office: orders, coupons, refunds, moderation, broadcasts.
    ManageStore,
    /// Role escalation and AI feature flags.
    ManagePlatform,
}

fn allows(role: Role, permission: Permission) -> bool {
    match permission {
        Permission::Shop => true,
        Permission::ManageOwnShop => matches!(role, Role::Seller | Role::Admin | Role::Superadmin),
        Permission::ManageStore => matches!(role, Role::Admin | Role::Superadmin),
        Permission::ManagePlatform => role == Role::Superadmin,
    }
}

pub fn require(role: Role, permission: Permission) -> Result<(), AppError> {
    if allows(role, permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_cannot_manage() {
        assert!(require(Role::Customer, Permission::Shop).is_ok());
        assert!(require(Role::Customer, Permission::ManageOwnShop).is_err());
        assert!(require(Role::Customer, Permission::ManageStore).is_err());
        assert!(require(Role::Customer, Permission::ManagePlatform).is_err());
    }

    #[test]
    fn seller_manages_own_shop_only() {
        assert!(require(Role::Seller, Permission::ManageOwnShop).is_ok());
        assert!(require(Role::Seller, Permission::ManageStore).is_err());
    }

    #[test]
    fn admin_short_of_platform() {
        assert!(require(Role::Admin, Permission::ManageStore).is_ok());
        assert!(require(Role::Admin, Permission::ManagePlatform).is_err());
    }

    #[test]
    fn superadmin_everything() {
        for p in [
            Permission::Shop,
            Permission::ManageOwnShop,
            Permission::ManageStore,
            Permission::ManagePlatform,
        ] {
            assert!(require(Role::Superadmin, p).is_ok());
        }
    }

    #[test]
    fn unknown_role_string_rejected() {
        assert!("root".parse::<Role>().is_err());
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
    }
}
