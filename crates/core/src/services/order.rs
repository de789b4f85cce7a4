//! Order service: checkout, payment and the status lifecycle.

use atelier_common::{AppError, AppResult, IdGenerator};
use atelier_db::{
    entities::{download, order, order_item, order::OrderStatus, user},
    repositories::{
        BasketRepository, DownloadRepository, OrderLine, OrderRepository, ProductRepository,
    },
};
use chrono::Utc;
use sea_orm::Set;

/// An order together with its line items.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// Order service.
#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    basket_repo: BasketRepository,
    product_repo: ProductRepository,
    download_repo: DownloadRepository,
    id_gen: IdGenerator,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        order_repo: OrderRepository,
        basket_repo: BasketRepository,
        product_repo: ProductRepository,
        download_repo: DownloadRepository,
    ) -> Self {
        Self {
            order_repo,
            basket_repo,
            product_repo,
            download_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Snapshot a basket into a new pending order and clear the basket.
    ///
    /// With no `basket_id` the user's oldest basket is used. Line prices are
    /// frozen from the products' current prices.
    pub async fn checkout(
        &self,
        user_id: &str,
        basket_id: Option<&str>,
    ) -> AppResult<order::Model> {
        let basket = match basket_id {
            Some(id) => {
                let basket = self
                    .basket_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Basket not found: {id}")))?;
                if basket.user_id != user_id {
                    return Err(AppError::Forbidden("Not your basket".to_string()));
                }
                basket
            }
            None => self
                .basket_repo
                .find_by_user(user_id)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| AppError::BadRequest("No basket to check out".to_string()))?,
        };

        let items = self.basket_repo.find_items_with_products(&basket.id).await?;

        let lines: Vec<OrderLine> = items
            .into_iter()
            .filter_map(|(item, product)| {
                product.map(|p| OrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: p.price,
                })
            })
            .collect();

        if lines.is_empty() {
            return Err(AppError::BadRequest("Basket is empty".to_string()));
        }

        let order_id = self.id_gen.generate();
        let item_ids = lines.iter().map(|_| self.id_gen.generate()).collect();

        self.order_repo
            .create_from_lines(
                order_id,
                item_ids,
                user_id,
                &basket.id,
                lines,
                Utc::now().into(),
            )
            .await
    }

    /// List a user's orders.
    pub async fn list(&self, user_id: &str) -> AppResult<Vec<order::Model>> {
        self.order_repo.find_by_user(user_id).await
    }

    /// Get an order with its line items.
    pub async fn get(&self, actor: &user::Model, order_id: &str) -> AppResult<OrderView> {
        let order = self.get_visible(actor, order_id).await?;
        let items = self.order_repo.find_items(order_id).await?;
        Ok(OrderView { order, items })
    }

    /// Pay an order and unlock downloads for its products.
    ///
    /// Payment is a stub that always succeeds; no charge is made. Paid and
    /// canceled orders are rejected, any other state moves to paid.
    pub async fn pay(&self, actor: &user::Model, order_id: &str) -> AppResult<order::Model> {
        let order = self.get_owned(actor, order_id).await?;

        match order.status {
            OrderStatus::Paid => {
                return Err(AppError::Conflict("Order is already paid".to_string()));
            }
            OrderStatus::Canceled => {
                return Err(AppError::Conflict(
                    "Cannot pay a canceled order".to_string(),
                ));
            }
            _ => {}
        }

        let items = self.order_repo.find_items(order_id).await?;
        let order = self.order_repo.set_status(order, OrderStatus::Paid).await?;

        for item in items {
            self.unlock_download(&actor.id, &item.product_id).await?;
        }

        Ok(order)
    }

    /// Cancel an order. Only pending orders can be canceled.
    pub async fn cancel(&self, actor: &user::Model, order_id: &str) -> AppResult<order::Model> {
        let order = self.get_owned(actor, order_id).await?;

        if !order.status.can_cancel() {
            return Err(AppError::Conflict(
                "Cannot cancel a paid or completed order".to_string(),
            ));
        }

        self.order_repo.set_status(order, OrderStatus::Canceled).await
    }

    /// Advance an order along the fulfilment lifecycle. Admin only.
    pub async fn set_status(
        &self,
        actor: &user::Model,
        order_id: &str,
        status: OrderStatus,
    ) -> AppResult<order::Model> {
        if !actor.is_admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order not found: {order_id}")))?;

        if !valid_transition(order.status, status) {
            return Err(AppError::Conflict(format!(
                "Cannot move order from {:?} to {status:?}",
                order.status
            )));
        }

        self.order_repo.set_status(order, status).await
    }

    async fn get_owned(&self, actor: &user::Model, order_id: &str) -> AppResult<order::Model> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order not found: {order_id}")))?;

        if order.user_id != actor.id {
            return Err(AppError::Forbidden("Not your order".to_string()));
        }

        Ok(order)
    }

    async fn get_visible(&self, actor: &user::Model, order_id: &str) -> AppResult<order::Model> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order not found: {order_id}")))?;

        if order.user_id != actor.id && !actor.is_admin {
            return Err(AppError::Forbidden("Not your order".to_string()));
        }

        Ok(order)
    }

    /// Record a download ledger entry for a paid product, refreshing the
    /// timestamp when the user already unlocked it.
    async fn unlock_download(&self, user_id: &str, product_id: &str) -> AppResult<()> {
        if let Some(existing) = self
            .download_repo
            .find_by_user_and_product(user_id, product_id)
            .await?
        {
            self.download_repo.touch(existing, Utc::now().into()).await?;
            return Ok(());
        }

        let product = self.product_repo.get_by_id(product_id).await?;

        let model = download::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            product_id: Set(product_id.to_string()),
            format: Set(None),
            file_url: Set(product.image_url),
            created_at: Set(Utc::now().into()),
        };
        self.download_repo.create(model).await?;

        Ok(())
    }
}

/// Allowed lifecycle moves beyond the owner-driven pay/cancel pair.
const fn valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Paid | OrderStatus::Canceled)
            | (OrderStatus::Paid, OrderStatus::Shipped)
            | (OrderStatus::Shipped, OrderStatus::Completed)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use atelier_db::entities::{basket, basket_item, product};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn owner() -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            email: None,
            token: None,
            name: None,
            is_admin: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn order_model(status: OrderStatus) -> order::Model {
        order::Model {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            status,
            total_price: Decimal::new(4200, 2),
            created_at: Utc::now().into(),
        }
    }

    fn basket_model() -> basket::Model {
        basket::Model {
            id: "b1".to_string(),
            user_id: "u1".to_string(),
            name: "Basket".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn empty_db() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        order_db: Arc<sea_orm::DatabaseConnection>,
        basket_db: Arc<sea_orm::DatabaseConnection>,
    ) -> OrderService {
        OrderService::new(
            OrderRepository::new(order_db),
            BasketRepository::new(basket_db),
            ProductRepository::new(empty_db()),
            DownloadRepository::new(empty_db()),
        )
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_basket() {
        let basket_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[basket_model()]])
                .append_query_results([Vec::<(basket_item::Model, product::Model)>::new()])
                .into_connection(),
        );
        let svc = service(empty_db(), basket_db);

        let result = svc.checkout("u1", Some("b1")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cancel_rejects_paid_order() {
        let order_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model(OrderStatus::Paid)]])
                .into_connection(),
        );
        let svc = service(order_db, empty_db());

        let result = svc.cancel(&owner(), "o1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_pay_rejects_already_paid_order() {
        let order_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model(OrderStatus::Paid)]])
                .into_connection(),
        );
        let svc = service(order_db, empty_db());

        let result = svc.pay(&owner(), "o1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_pay_rejects_canceled_order() {
        let order_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model(OrderStatus::Canceled)]])
                .into_connection(),
        );
        let svc = service(order_db, empty_db());

        let result = svc.pay(&owner(), "o1").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_pay_propagates_download_grant_failure() {
        let order_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[order_model(OrderStatus::Pending)]])
                .append_query_results([vec![order_item::Model {
                    id: "oi1".to_string(),
                    order_id: "o1".to_string(),
                    product_id: "p1".to_string(),
                    quantity: 1,
                    price: Decimal::new(4200, 2),
                }]])
                .append_query_results([[order_model(OrderStatus::Paid)]])
                .into_connection(),
        );
        // The download ledger connection has no prepared results, so the
        // grant lookup fails and the error must reach the caller
        let svc = service(order_db, empty_db());

        let result = svc.pay(&owner(), "o1").await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_valid_transitions() {
        assert!(valid_transition(OrderStatus::Pending, OrderStatus::Paid));
        assert!(valid_transition(OrderStatus::Pending, OrderStatus::Canceled));
        assert!(valid_transition(OrderStatus::Paid, OrderStatus::Shipped));
        assert!(valid_transition(OrderStatus::Shipped, OrderStatus::Completed));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!valid_transition(OrderStatus::Paid, OrderStatus::Canceled));
        assert!(!valid_transition(OrderStatus::Pending, OrderStatus::Shipped));
        assert!(!valid_transition(OrderStatus::Shipped, OrderStatus::Paid));
        assert!(!valid_transition(OrderStatus::Completed, OrderStatus::Shipped));
        assert!(!valid_transition(OrderStatus::Canceled, OrderStatus::Paid));
    }
}
