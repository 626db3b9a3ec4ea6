pub mod announcements;
pub mod audit_logs;
pub mod categories;
pub mod contact_messages;
pub mod coupons;
pub mod loyalty_accounts;
pub mod loyalty_transactions;
pub mod notification_logs;
pub mod order_items;
pub mod orders;
pub mod payments;
pub mod payout_requests;
pub mod product_variants;
pub mod products;
pub mod push_subscriptions;
pub mod refunds;
pub mod reviews;
pub mod seller_applications;
pub mod shops;
pub mod users;

pub use announcements::Entity as Announcements;
pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use contact_messages::Entity as ContactMessages;
pub use coupons::Entity as Coupons;
pub use loyalty_accounts::Entity as LoyaltyAccounts;
pub use loyalty_transactions::Entity as LoyaltyTransactions;
pub use notification_logs::Entity as NotificationLogs;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payments::Entity as Payments;
pub use payout_requests::Entity as PayoutRequests;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use push_subscriptions::Entity as PushSubscriptions;
pub use refunds::Entity as Refunds;
pub use reviews::Entity as Reviews;
pub use seller_applications::Entity as SellerApplications;
pub use shops::Entity as Shops;
pub use users::Entity as Users;
