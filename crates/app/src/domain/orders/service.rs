//! Orders service.

use std::{
    fmt::{self, Debug},
    sync::Arc,
};

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::{
    domain::{
        carts::{CartsService, CartsServiceError, records::CartRecord},
        orders::{
            data::{NewOrder, OrderUpdate},
            email::normalize_email,
            errors::OrdersServiceError,
            records::{OrderItemRecord, OrderRecord, OrderStatus, OrderUuid},
        },
        products::{ProductResolver, ProductsServiceError},
        validation::ValidationError,
    },
    notify::{Event, Notifier, publish},
    store::{Collection, Filter},
};

#[derive(Clone)]
pub struct StoreOrdersService {
    orders: Arc<dyn Collection<OrderRecord>>,
    carts: Arc<dyn CartsService>,
    products: Arc<dyn ProductResolver>,
    notifier: Arc<dyn Notifier>,
}

impl StoreOrdersService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn Collection<OrderRecord>>,
        carts: Arc<dyn CartsService>,
        products: Arc<dyn ProductResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orders,
            carts,
            products,
            notifier,
        }
    }

    /// Price every cart line at the current product price.
    async fn price_lines(
        &self,
        cart: &CartRecord,
    ) -> Result<(Vec<OrderItemRecord>, Decimal), OrdersServiceError> {
        let mut lines = Vec::with_capacity(cart.products.len());
        let mut total = Decimal::ZERO;

        for line in &cart.products {
            let product = self
                .products
                .resolve(line.product_uuid)
                .await
                .map_err(|error| match error {
                    ProductsServiceError::NotFound => {
                        OrdersServiceError::ProductNotFound(line.product_uuid)
                    }
                    error => OrdersServiceError::Products(error),
                })?;

            let subtotal = product
                .price
                .checked_mul(Decimal::from(line.quantity))
                .ok_or_else(|| overflow("subtotal"))?;

            total = total.checked_add(subtotal).ok_or_else(|| overflow("total"))?;

            lines.push(OrderItemRecord {
                product_uuid: line.product_uuid,
                quantity: line.quantity,
                unit_price: product.price,
                subtotal,
            });
        }

        Ok((lines, total))
    }
}

fn overflow(field: &'static str) -> ValidationError {
    ValidationError::Malformed {
        field,
        reason: "amount is too large".to_string(),
    }
}

impl Debug for StoreOrdersService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreOrdersService").finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for StoreOrdersService {
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError> {
        let cart_uuid = order
            .cart
            .ok_or(ValidationError::MissingField { field: "cart" })?;

        let email = normalize_email(
            &order
                .email
                .ok_or(ValidationError::MissingField { field: "email" })?,
        )?;

        let cart = self
            .carts
            .get_cart(cart_uuid)
            .await
            .map_err(|error| match error {
                CartsServiceError::NotFound => OrdersServiceError::CartNotFound(cart_uuid),
                error => OrdersServiceError::Carts(error),
            })?;

        if cart.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let (products, total) = self.price_lines(&cart).await?;
        let now = Timestamp::now();

        let created = self
            .orders
            .insert(OrderRecord {
                uuid: OrderUuid::new(),
                cart_uuid,
                products,
                email,
                total,
                status: OrderStatus::Pending,
                shipping_address: order.shipping_address.filter(|address| !address.is_empty()),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!(
            order = %created.uuid,
            cart = %cart_uuid,
            total = %created.total,
            "order created"
        );
        publish(self.notifier.as_ref(), Event::OrderCreated, &created);

        Ok(created)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        self.orders
            .find_by_id(order)
            .await?
            .ok_or(OrdersServiceError::NotFound)
    }

    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let orders = self.orders.find(&Filter::all(), None, 0, None).await?;

        debug!(count = orders.len(), "listed orders");

        Ok(orders)
    }

    async fn update_order(
        &self,
        order: OrderUuid,
        update: OrderUpdate,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut record = self.get_order(order).await?;

        if update.is_empty() {
            return Ok(record);
        }

        if let Some(status) = update.status {
            record.status = status;
        }

        if let Some(address) = update.shipping_address {
            record.shipping_address = Some(address).filter(|address| !address.is_empty());
        }

        record.updated_at = Timestamp::now();

        let updated = self
            .orders
            .update_by_id(order, record)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        info!(order = %order, status = %updated.status, "order updated");
        publish(self.notifier.as_ref(), Event::OrderUpdated, &updated);

        Ok(updated)
    }

    async fn delete_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError> {
        let deleted = self
            .orders
            .delete_by_id(order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        info!(order = %order, "order deleted");
        publish(self.notifier.as_ref(), Event::OrderDeleted, &deleted);

        Ok(deleted)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Place an order for the current contents of a cart.
    ///
    /// Each line is priced at the product's current price. The cart itself is
    /// left as it is.
    async fn create_order(&self, order: NewOrder) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve a single order.
    async fn get_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;

    /// Retrieve every order, oldest first.
    async fn list_orders(&self) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Change the status and/or shipping address of an order.
    async fn update_order(
        &self,
        order: OrderUuid,
        update: OrderUpdate,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Deletes an order, returning the removed record.
    async fn delete_order(&self, order: OrderUuid) -> Result<OrderRecord, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{MockCartsService, records::CartUuid},
            orders::records::ShippingAddress,
            products::{
                MockProductResolver, ProductsService, data::ProductPatch,
                records::{ProductRecord, ProductUuid},
            },
        },
        notify::NoopNotifier,
        store::MemoryCollection,
        test::{TestContext, helpers::create_product},
    };

    use super::*;

    fn new_order(cart: CartUuid) -> NewOrder {
        NewOrder {
            cart: Some(cart),
            email: Some("buyer@example.com".to_string()),
            shipping_address: None,
        }
    }

    fn priced(uuid: ProductUuid, price: Decimal) -> ProductRecord {
        let now = Timestamp::now();

        ProductRecord {
            uuid,
            title: "Priced".to_string(),
            description: String::new(),
            code: uuid.to_string(),
            price,
            stock: 1,
            category: "Test".to_string(),
            status: true,
            thumbnails: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn mocked_service(carts: MockCartsService, products: MockProductResolver) -> StoreOrdersService {
        StoreOrdersService::new(
            Arc::new(MemoryCollection::<OrderRecord>::new()),
            Arc::new(carts),
            Arc::new(products),
            Arc::new(NoopNotifier),
        )
    }

    #[tokio::test]
    async fn order_total_is_the_sum_of_its_lines() -> TestResult {
        let kettle = ProductUuid::new();
        let toaster = ProductUuid::new();

        let mut cart = CartRecord::new(Timestamp::now());
        cart.add(kettle, 2);
        cart.add(toaster, 3);
        let cart_uuid = cart.uuid;

        let mut carts = MockCartsService::new();
        carts
            .expect_get_cart()
            .with(eq(cart_uuid))
            .times(1)
            .returning(move |_| Ok(cart.clone()));

        let mut products = MockProductResolver::new();
        products
            .expect_resolve()
            .returning(move |uuid| {
                let price = if uuid == kettle {
                    Decimal::new(4550, 2)
                } else {
                    Decimal::new(1999, 2)
                };

                Ok(priced(uuid, price))
            });

        let order = mocked_service(carts, products)
            .create_order(new_order(cart_uuid))
            .await?;

        let lines: Vec<(ProductUuid, u32, Decimal, Decimal)> = order
            .products
            .iter()
            .map(|line| (line.product_uuid, line.quantity, line.unit_price, line.subtotal))
            .collect();

        assert_eq!(
            lines,
            [
                (kettle, 2, Decimal::new(4550, 2), Decimal::new(9100, 2)),
                (toaster, 3, Decimal::new(1999, 2), Decimal::new(5997, 2)),
            ]
        );
        assert_eq!(order.total, Decimal::new(15097, 2));
        assert_eq!(order.total, order.lines_total());
        assert_eq!(order.status, OrderStatus::Pending);

        Ok(())
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_ordered() -> TestResult {
        let cart = CartRecord::new(Timestamp::now());
        let cart_uuid = cart.uuid;

        let mut carts = MockCartsService::new();
        carts
            .expect_get_cart()
            .returning(move |_| Ok(cart.clone()));

        let mut products = MockProductResolver::new();
        products.expect_resolve().never();

        let result = mocked_service(carts, products)
            .create_order(new_order(cart_uuid))
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Validation(ValidationError::EmptyCart))
            ),
            "expected EmptyCart, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_cart_is_cart_not_found() -> TestResult {
        let cart_uuid = CartUuid::new();

        let mut carts = MockCartsService::new();
        carts
            .expect_get_cart()
            .returning(|_| Err(CartsServiceError::NotFound));

        let result = mocked_service(carts, MockProductResolver::new())
            .create_order(new_order(cart_uuid))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::CartNotFound(missing)) if missing == cart_uuid),
            "expected CartNotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn cart_and_email_are_required() -> TestResult {
        let service = mocked_service(MockCartsService::new(), MockProductResolver::new());

        let no_cart = service
            .create_order(NewOrder {
                cart: None,
                ..new_order(CartUuid::new())
            })
            .await;

        let no_email = service
            .create_order(NewOrder {
                email: None,
                ..new_order(CartUuid::new())
            })
            .await;

        assert!(
            matches!(
                no_cart,
                Err(OrdersServiceError::Validation(ValidationError::MissingField { field: "cart" }))
            ),
            "expected missing cart, got {no_cart:?}"
        );
        assert!(
            matches!(
                no_email,
                Err(OrdersServiceError::Validation(ValidationError::MissingField { field: "email" }))
            ),
            "expected missing email, got {no_email:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_loading_the_cart() -> TestResult {
        let mut carts = MockCartsService::new();
        carts.expect_get_cart().never();

        let result = mocked_service(carts, MockProductResolver::new())
            .create_order(NewOrder {
                email: Some("not-an-email".to_string()),
                ..new_order(CartUuid::new())
            })
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Validation(ValidationError::InvalidEmail { .. }))
            ),
            "expected InvalidEmail, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn placing_an_order_leaves_the_cart_untouched() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        let before = ctx.carts.add_product(cart.uuid, product.uuid, 2).await?;

        let order = ctx.orders.create_order(new_order(cart.uuid)).await?;

        assert_eq!(order.cart_uuid, cart.uuid);
        assert_eq!(order.total, Decimal::new(90, 0));
        assert_eq!(ctx.carts.get_cart(cart.uuid).await?, before);

        Ok(())
    }

    #[tokio::test]
    async fn failed_order_leaves_the_cart_untouched() -> TestResult {
        let ctx = TestContext::new();
        let cart = ctx.carts.create_cart().await?;
        let before = ctx.carts.add_product(cart.uuid, ProductUuid::new(), 1).await?;

        let result = ctx.orders.create_order(new_order(cart.uuid)).await;

        assert!(
            matches!(result, Err(OrdersServiceError::ProductNotFound(_))),
            "expected ProductNotFound for a dangling line, got {result:?}"
        );
        assert_eq!(ctx.carts.get_cart(cart.uuid).await?, before);
        assert!(ctx.orders.list_orders().await?.is_empty(), "no order should be stored");

        Ok(())
    }

    #[tokio::test]
    async fn later_price_changes_do_not_alter_placed_orders() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;

        let order = ctx.orders.create_order(new_order(cart.uuid)).await?;

        ctx.products
            .update_product(
                product.uuid,
                ProductPatch {
                    price: Some(99_u32.into()),
                    ..ProductPatch::default()
                },
            )
            .await?;

        let stored = ctx.orders.get_order(order.uuid).await?;

        assert_eq!(stored.total, Decimal::new(45, 0));
        assert_eq!(
            stored.products.first().map(|line| line.unit_price),
            Some(Decimal::new(45, 0))
        );

        Ok(())
    }

    #[tokio::test]
    async fn email_is_stored_normalized() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(NewOrder {
                email: Some(" Buyer@Example.com ".to_string()),
                ..new_order(cart.uuid)
            })
            .await?;

        assert_eq!(order.email, "buyer@example.com");

        Ok(())
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;

        let address = ShippingAddress {
            city: Some("Rosario".to_string()),
            ..ShippingAddress::default()
        };

        let order = ctx
            .orders
            .create_order(NewOrder {
                shipping_address: Some(address.clone()),
                ..new_order(cart.uuid)
            })
            .await?;

        let updated = ctx
            .orders
            .update_order(
                order.uuid,
                OrderUpdate {
                    status: Some(OrderStatus::Shipped),
                    shipping_address: None,
                },
            )
            .await?;

        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.shipping_address, Some(address));
        assert_eq!(updated.total, order.total);

        Ok(())
    }

    #[tokio::test]
    async fn empty_address_is_stored_as_none_on_create_and_update() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(NewOrder {
                shipping_address: Some(ShippingAddress::default()),
                ..new_order(cart.uuid)
            })
            .await?;

        assert_eq!(order.shipping_address, None);

        let addressed = ctx
            .orders
            .update_order(
                order.uuid,
                OrderUpdate {
                    status: None,
                    shipping_address: Some(ShippingAddress {
                        city: Some("Rosario".to_string()),
                        ..ShippingAddress::default()
                    }),
                },
            )
            .await?;

        assert!(addressed.shipping_address.is_some(), "address should be set");

        let cleared = ctx
            .orders
            .update_order(
                order.uuid,
                OrderUpdate {
                    status: None,
                    shipping_address: Some(ShippingAddress::default()),
                },
            )
            .await?;

        assert_eq!(cleared.shipping_address, None);
        assert_eq!(ctx.orders.get_order(order.uuid).await?.shipping_address, None);

        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_unknown_order_are_not_found() -> TestResult {
        let ctx = TestContext::new();

        let updated = ctx
            .orders
            .update_order(
                OrderUuid::new(),
                OrderUpdate {
                    status: Some(OrderStatus::Confirmed),
                    ..OrderUpdate::default()
                },
            )
            .await;

        let deleted = ctx.orders.delete_order(OrderUuid::new()).await;

        assert!(
            matches!(updated, Err(OrdersServiceError::NotFound)),
            "expected NotFound on update, got {updated:?}"
        );
        assert!(
            matches!(deleted, Err(OrdersServiceError::NotFound)),
            "expected NotFound on delete, got {deleted:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn orders_are_listed_and_deleted() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;

        let first = ctx.orders.create_order(new_order(cart.uuid)).await?;
        let second = ctx.orders.create_order(new_order(cart.uuid)).await?;

        assert_eq!(ctx.orders.list_orders().await?, [first.clone(), second.clone()]);
        assert_eq!(ctx.orders.delete_order(first.uuid).await?, first);
        assert_eq!(ctx.orders.list_orders().await?, [second]);

        Ok(())
    }

    #[tokio::test]
    async fn order_mutations_are_announced() -> TestResult {
        let ctx = TestContext::new();
        let product = create_product(&ctx, "K-1", 45).await?;
        let cart = ctx.carts.create_cart().await?;
        ctx.carts.add_product(cart.uuid, product.uuid, 1).await?;
        let mut notifications = ctx.notifier.subscribe();

        let order = ctx.orders.create_order(new_order(cart.uuid)).await?;
        ctx.orders.delete_order(order.uuid).await?;

        assert_eq!(notifications.recv().await?.event, Event::OrderCreated);
        assert_eq!(notifications.recv().await?.event, Event::OrderDeleted);

        Ok(())
    }
}
