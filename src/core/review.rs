//! Review business logic - adding reviews and keeping menu item ratings in sync.
//!
//! A menu item's `rating` is the mean of its review ratings and `review_count`
//! their number. Both are recomputed from the reviews table inside the same
//! transaction that inserts a review.

use crate::{
    entities::{MenuItem, Review, menu_item, review, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::info;

const ALREADY_REVIEWED: &str = "You have already reviewed this item";

/// Review payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

/// Lists reviews of a menu item, newest first.
pub async fn list_reviews(
    db: &DatabaseConnection,
    menu_item_id: i64,
) -> Result<Vec<review::Model>> {
    Review::find()
        .filter(review::Column::MenuItemId.eq(menu_item_id))
        .order_by_desc(review::Column::CreatedAt)
        .order_by_desc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds `user`'s review of a menu item and refreshes the item's rating.
///
/// # Errors
/// Returns `Validation` if the rating is outside 1..=5 or the user already
/// reviewed this item (including when a concurrent submission wins the race),
/// and `NotFound` if the menu item does not exist.
pub async fn add_review(
    db: &DatabaseConnection,
    menu_item_id: i64,
    user: &user::Model,
    rating: i32,
    comment: String,
) -> Result<review::Model> {
    if !(1..=5).contains(&rating) {
        return Err(Error::validation("Rating must be between 1 and 5"));
    }

    let txn = db.begin().await?;

    MenuItem::find_by_id(menu_item_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Menu item", menu_item_id))?;

    let existing = Review::find()
        .filter(review::Column::MenuItemId.eq(menu_item_id))
        .filter(review::Column::UserId.eq(user.id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(Error::validation(ALREADY_REVIEWED));
    }

    let review = review::ActiveModel {
        user_id: Set(user.id),
        menu_item_id: Set(menu_item_id),
        user_name: Set(user.name.clone()),
        rating: Set(rating),
        comment: Set(comment.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => Error::validation(ALREADY_REVIEWED),
        _ => Error::from(e),
    })?;

    let item = recompute_rating(&txn, menu_item_id).await?;
    txn.commit().await?;

    info!(
        menu_item_id,
        rating = item.rating,
        reviews = item.review_count,
        "Recorded review"
    );
    Ok(review)
}

/// Recomputes `rating` and `review_count` of a menu item from its reviews.
pub async fn recompute_rating<C>(db: &C, menu_item_id: i64) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    let ratings: Vec<i32> = Review::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::MenuItemId.eq(menu_item_id))
        .into_tuple()
        .all(db)
        .await?;
    let (rating, count) = mean_rating(&ratings);

    let mut item: menu_item::ActiveModel = MenuItem::find_by_id(menu_item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Menu item", menu_item_id))?
        .into();
    item.rating = Set(rating);
    item.review_count = Set(count);
    item.update(db).await.map_err(Into::into)
}

/// Arithmetic mean and count of `ratings`; `(0.0, 0)` when empty.
#[must_use]
pub fn mean_rating(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    let count = i32::try_from(ratings.len()).unwrap_or(i32::MAX);
    #[allow(clippy::cast_precision_loss)]
    let mean = sum as f64 / ratings.len() as f64;
    (mean, count)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_mean_rating() {
        assert_eq!(mean_rating(&[]), (0.0, 0));
        assert_eq!(mean_rating(&[5, 4]), (4.5, 2));
        assert_eq!(mean_rating(&[1, 2, 3]), (2.0, 3));
    }

    #[tokio::test]
    async fn test_add_review_updates_rating() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let bob = create_test_user(&db, "bob@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;

        add_review(&db, item.id, &ada, 5, "Great".to_string()).await?;
        add_review(&db, item.id, &bob, 4, "Good".to_string()).await?;

        let item = crate::core::menu::get_menu_item(&db, item.id).await?.unwrap();
        assert_eq!(item.rating, 4.5);
        assert_eq!(item.review_count, 2);

        let reviews = list_reviews(&db, item.id).await?;
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].user_name, "Test bob");
        Ok(())
    }

    #[tokio::test]
    async fn test_second_review_by_same_user_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;

        add_review(&db, item.id, &ada, 5, "Great".to_string()).await?;
        let result = add_review(&db, item.id, &ada, 1, "Changed my mind".to_string()).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        // The rejected review leaves the aggregate untouched
        let item = crate::core::menu::get_menu_item(&db, item.id).await?.unwrap();
        assert_eq!(item.rating, 5.0);
        assert_eq!(item.review_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unique_index_backs_review_check() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;
        add_review(&db, item.id, &ada, 5, String::new()).await?;

        // Bypass the existence check the way a racing request would
        let duplicate = review::ActiveModel {
            user_id: Set(ada.id),
            menu_item_id: Set(item.id),
            user_name: Set(ada.name.clone()),
            rating: Set(3),
            comment: Set(String::new()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(matches!(
            duplicate.unwrap_err().sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_review_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let ada = create_test_user(&db, "ada@example.com").await?;
        let item = create_test_menu_item(&db, "Suya", 4_500).await?;

        for rating in [0, 6] {
            let result = add_review(&db, item.id, &ada, rating, String::new()).await;
            assert!(matches!(result, Err(Error::Validation { message: _ })));
        }

        let result = add_review(&db, 999, &ada, 3, String::new()).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
