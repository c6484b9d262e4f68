use super::catalog::find_item;
use crate::repository::{CartLine, CartRepository, UserRepository};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("user not found")]
    UserNotFound,
    #[error("item not found")]
    ItemNotFound,
    #[error("cart entry not found")]
    LineNotFound,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A cart entry as shown to clients. `id` addresses the entry for updates and
/// removal, `item_id` is the catalog item.
#[derive(Clone, Debug, Serialize, ToSchema, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub item_id: String,
    pub name: String,
    pub quantity: i32,
    pub price: f64,
}

impl From<CartLine> for CartItem {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            item_id: line.item_id,
            name: line.name,
            quantity: line.quantity,
            price: line.price,
        }
    }
}

#[derive(Clone)]
pub struct MarketService {
    users: Arc<dyn UserRepository>,
    carts: Arc<dyn CartRepository>,
}

impl std::fmt::Debug for MarketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketService").finish_non_exhaustive()
    }
}

impl MarketService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, carts: Arc<dyn CartRepository>) -> Self {
        Self { users, carts }
    }

    /// Put `quantity` of a catalog item in the user's cart and return the cart.
    ///
    /// # Errors
    /// [`CartError::UserNotFound`], [`CartError::ItemNotFound`] or
    /// [`CartError::InvalidQuantity`].
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        item_id: &str,
        quantity: i32,
    ) -> Result<Vec<CartItem>, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(CartError::UserNotFound);
        }

        let item = find_item(item_id).ok_or(CartError::ItemNotFound)?;

        let line = self
            .carts
            .add_line(CartLine {
                id: Uuid::new_v4(),
                user_id,
                item_id: item.id.to_string(),
                name: item.name.to_string(),
                quantity,
                price: item.price * f64::from(quantity),
            })
            .await?;

        debug!(line_id = %line.id, "cart line added");

        self.get_cart(user_id).await
    }

    /// Change the quantity of a cart entry, keeping its unit price.
    ///
    /// # Errors
    /// [`CartError::LineNotFound`] or [`CartError::InvalidQuantity`].
    #[instrument(skip(self))]
    pub async fn update_cart(&self, line_id: Uuid, new_quantity: i32) -> Result<(), CartError> {
        if new_quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let line = self
            .carts
            .find_line(line_id)
            .await?
            .ok_or(CartError::LineNotFound)?;

        let new_price = (line.price / f64::from(line.quantity)) * f64::from(new_quantity);

        if self.carts.update_line(line_id, new_quantity, new_price).await? {
            Ok(())
        } else {
            Err(CartError::LineNotFound)
        }
    }

    /// # Errors
    /// [`CartError::LineNotFound`] if the entry does not exist.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, line_id: Uuid) -> Result<(), CartError> {
        if self.carts.remove_line(line_id).await? {
            Ok(())
        } else {
            Err(CartError::LineNotFound)
        }
    }

    /// # Errors
    /// Returns an error if the repository fails.
    pub async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, CartError> {
        let lines = self.carts.lines_for_user(user_id).await?;
        Ok(lines.into_iter().map(CartItem::from).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;

    async fn setup() -> (MarketService, Uuid) {
        let store = MemoryStore::new();
        let user = store.create("Ana", "ana@x.com", "hash").await.unwrap();
        let market = MarketService::new(Arc::new(store.clone()), Arc::new(store));
        (market, user.id)
    }

    #[tokio::test]
    async fn add_prices_by_quantity() {
        let (market, user_id) = setup().await;

        let cart = market.add_to_cart(user_id, "0002", 3).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].item_id, "0002");
        assert_eq!(cart[0].name, "Bag Pack");
        assert_eq!(cart[0].quantity, 3);
        assert!((cart[0].price - 62.97).abs() < 1e-9);

        let cart = market.add_to_cart(user_id, "0001", 1).await.unwrap();
        assert_eq!(cart.len(), 2);
    }

    #[tokio::test]
    async fn add_rejects_unknown_user_item_and_quantity() {
        let (market, user_id) = setup().await;

        assert!(matches!(
            market.add_to_cart(Uuid::new_v4(), "0001", 1).await,
            Err(CartError::UserNotFound)
        ));
        assert!(matches!(
            market.add_to_cart(user_id, "9999", 1).await,
            Err(CartError::ItemNotFound)
        ));
        assert!(matches!(
            market.add_to_cart(user_id, "0001", 0).await,
            Err(CartError::InvalidQuantity)
        ));
    }

    #[tokio::test]
    async fn update_keeps_unit_price() {
        let (market, user_id) = setup().await;
        let cart = market.add_to_cart(user_id, "0003", 2).await.unwrap();
        let line_id = Uuid::parse_str(&cart[0].id).unwrap();

        market.update_cart(line_id, 5).await.unwrap();

        let cart = market.get_cart(user_id).await.unwrap();
        assert_eq!(cart[0].quantity, 5);
        assert!((cart[0].price - 64.95).abs() < 1e-9);

        assert!(matches!(
            market.update_cart(Uuid::new_v4(), 2).await,
            Err(CartError::LineNotFound)
        ));
    }

    #[tokio::test]
    async fn remove() {
        let (market, user_id) = setup().await;
        let cart = market.add_to_cart(user_id, "0001", 1).await.unwrap();
        let line_id = Uuid::parse_str(&cart[0].id).unwrap();

        market.remove_from_cart(line_id).await.unwrap();
        assert!(market.get_cart(user_id).await.unwrap().is_empty());
        assert!(matches!(
            market.remove_from_cart(line_id).await,
            Err(CartError::LineNotFound)
        ));
    }
}
