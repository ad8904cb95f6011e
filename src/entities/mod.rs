//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod address;
pub mod booking;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod review;
pub mod settings;
pub mod user;

// Re-export specific types to avoid conflicts
pub use address::{Column as AddressColumn, Entity as Address, Model as AddressModel};
pub use booking::{Column as BookingColumn, Entity as Booking, Model as BookingModel};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use settings::{Column as SettingsColumn, Entity as Settings, Model as SettingsModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
