//! Admin dashboard statistics.
//!
//! Figures are recomputed from the full orders table on every call. Cancelled
//! orders count towards `total_orders` but are excluded from every revenue and
//! dish figure.

use crate::{
    core::order::{OrderWithItems, attach_items},
    entities::{Order, User, menu_item::Category, order::OrderStatus, user},
    errors::Result,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{PaginatorTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Size of the revenue-by-day window.
pub const REVENUE_WINDOW_DAYS: i64 = 30;

/// How many dishes `top_dishes` keeps.
pub const TOP_DISHES: usize = 5;

/// Revenue for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    /// Calendar day, `YYYY-MM-DD` (UTC)
    pub date: String,
    pub revenue: i64,
    pub orders: u64,
}

/// A dish ranked by quantity sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDish {
    pub name: String,
    pub quantity: i64,
    pub revenue: i64,
}

/// Quantity sold per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: Category,
    pub quantity: i64,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_orders: u64,
    pub total_revenue: i64,
    pub active_orders: u64,
    pub revenue_by_day: Vec<DailyRevenue>,
    pub top_dishes: Vec<TopDish>,
    pub category_stats: Vec<CategoryStat>,
}

/// Loads every order and customer count and aggregates them as of now.
pub async fn compute_stats(db: &DatabaseConnection) -> Result<DashboardStats> {
    let total_users = User::find()
        .filter(user::Column::Role.eq(user::Role::User))
        .count(db)
        .await?;
    let orders = attach_items(db, Order::find().all(db).await?).await?;
    Ok(aggregate(total_users, &orders, Utc::now()))
}

/// Pure aggregation over already-loaded orders.
#[must_use]
pub fn aggregate(total_users: u64, orders: &[OrderWithItems], now: DateTime<Utc>) -> DashboardStats {
    let window_start = now - Duration::days(REVENUE_WINDOW_DAYS);

    let mut total_revenue = 0;
    let mut active_orders = 0;
    let mut by_day: BTreeMap<String, (i64, u64)> = BTreeMap::new();
    let mut dishes: HashMap<&str, (i64, i64)> = HashMap::new();
    let mut categories: HashMap<Category, i64> = HashMap::new();

    for entry in orders {
        let order = &entry.order;
        if order.status.is_active() {
            active_orders += 1;
        }
        if order.status == OrderStatus::Cancelled {
            continue;
        }

        total_revenue += order.total;

        if order.created_at >= window_start {
            let day = by_day
                .entry(order.created_at.format("%Y-%m-%d").to_string())
                .or_default();
            day.0 += order.total;
            day.1 += 1;
        }

        for item in &entry.items {
            let quantity = i64::from(item.quantity);
            let dish = dishes.entry(item.name.as_str()).or_default();
            dish.0 += quantity;
            dish.1 += item.line_total();
            *categories.entry(item.category).or_default() += quantity;
        }
    }

    let mut top_dishes: Vec<TopDish> = dishes
        .into_iter()
        .map(|(name, (quantity, revenue))| TopDish {
            name: name.to_string(),
            quantity,
            revenue,
        })
        .collect();
    top_dishes.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    top_dishes.truncate(TOP_DISHES);

    let mut category_stats: Vec<CategoryStat> = categories
        .into_iter()
        .map(|(category, quantity)| CategoryStat { category, quantity })
        .collect();
    category_stats.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    DashboardStats {
        total_users,
        total_orders: orders.len() as u64,
        total_revenue,
        active_orders,
        revenue_by_day: by_day
            .into_iter()
            .map(|(date, (revenue, orders))| DailyRevenue {
                date,
                revenue,
                orders,
            })
            .collect(),
        top_dishes,
        category_stats,
    }
}
