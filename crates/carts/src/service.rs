//! Cart service: the operations exposed to the API layer.
//!
//! Every operation validates its preconditions before touching the store, so
//! a failed call leaves no partial state behind. The unpaid cart is created
//! implicitly on the first add (`get_or_create_unpaid`).

use std::sync::Arc;

use voltmart_catalog::ProductCatalog;
use voltmart_core::{CustomerId, DomainError, ProductModel};

use crate::cart::{Cart, RemovedUnit};
use crate::error::{CartError, CartResult};
use crate::store::CartStore;

pub struct CartService {
    store: Arc<dyn CartStore>,
    catalog: Arc<dyn ProductCatalog>,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Add one unit of `model` to the customer's active cart, creating the
    /// cart if none exists. Stock is checked here as a UX guard and checked
    /// again at checkout.
    pub async fn add_product(
        &self,
        customer: &CustomerId,
        model: &ProductModel,
    ) -> CartResult<()> {
        let product = self
            .catalog
            .get_by_model(model)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(model.clone()))?;
        if !product.in_stock() {
            return Err(CartError::OutOfStock(model.clone()));
        }

        let mut cart = self.get_or_create_unpaid(customer).await?;
        let line = cart.add_unit(&product)?;
        self.store.upsert_item(cart.id(), &line).await?;
        self.store.update_header(&cart).await?;

        tracing::debug!(
            customer = %customer,
            model = %model,
            quantity = line.quantity,
            total = cart.total(),
            "product added to cart"
        );
        Ok(())
    }

    /// The customer's unpaid cart with its line items, or a fresh empty
    /// (unpersisted) cart if none exists. Never fails on a missing cart.
    pub async fn get_current_cart(&self, customer: &CustomerId) -> CartResult<Cart> {
        Ok(self
            .store
            .find_unpaid(customer)
            .await?
            .unwrap_or_else(|| Cart::new_unpaid(customer.clone())))
    }

    /// Remove one unit of `model` from the active cart.
    ///
    /// Catalog existence and in-cart membership are independent
    /// preconditions: an unknown model fails with `ProductNotFound` even when
    /// the cart would also not contain it.
    pub async fn remove_product(
        &self,
        customer: &CustomerId,
        model: &ProductModel,
    ) -> CartResult<()> {
        if self.catalog.get_by_model(model).await?.is_none() {
            return Err(CartError::ProductNotFound(model.clone()));
        }

        let mut cart = self
            .store
            .find_unpaid(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let removed = match cart.remove_unit(model) {
            Ok(removed) => removed,
            Err(DomainError::NotFound) => return Err(CartError::ProductNotInCart(model.clone())),
            Err(e) => return Err(e.into()),
        };
        match &removed {
            RemovedUnit::Decremented(line) => self.store.upsert_item(cart.id(), line).await?,
            RemovedUnit::Deleted { .. } => self.store.delete_item(cart.id(), model).await?,
        }
        self.store.update_header(&cart).await?;

        tracing::debug!(
            customer = %customer,
            model = %model,
            total = cart.total(),
            "product removed from cart"
        );
        Ok(())
    }

    /// Finalize the active cart. Payment is assumed to succeed.
    ///
    /// Stock is re-validated per line against the current catalog, because
    /// time may have passed since the items were added. All checks run before
    /// the single status-flipping write; any failure aborts with no state
    /// change. The catalog stock itself is validated but not decremented;
    /// quantity management stays with the catalog.
    pub async fn checkout(&self, customer: &CustomerId) -> CartResult<Cart> {
        let mut cart = self
            .store
            .find_unpaid(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;
        if cart.is_empty() {
            return Err(CartError::EmptyCart);
        }

        for item in cart.items() {
            let product = self
                .catalog
                .get_by_model(&item.model)
                .await?
                .ok_or_else(|| CartError::ProductNotFound(item.model.clone()))?;
            if product.quantity == 0 {
                return Err(CartError::OutOfStock(item.model.clone()));
            }
            if product.quantity < item.quantity {
                return Err(CartError::InsufficientStock {
                    model: item.model.clone(),
                    requested: item.quantity,
                    available: product.quantity,
                });
            }
        }

        cart.mark_paid(chrono::Utc::now().date_naive())?;
        self.store.update_header(&cart).await?;

        tracing::info!(
            customer = %customer,
            cart_id = %cart.id(),
            total = cart.total(),
            lines = cart.items().len(),
            "cart checked out"
        );
        Ok(cart)
    }

    /// All paid carts of a customer, stable insertion order.
    pub async fn get_customer_cart_history(
        &self,
        customer: &CustomerId,
    ) -> CartResult<Vec<Cart>> {
        Ok(self.store.find_paid(customer).await?)
    }

    /// Delete all line items of the active cart, keeping it active.
    pub async fn clear_current_cart(&self, customer: &CustomerId) -> CartResult<()> {
        let mut cart = self
            .store
            .find_unpaid(customer)
            .await?
            .ok_or(CartError::CartNotFound)?;
        cart.clear()?;
        self.store.clear_items(cart.id()).await?;
        self.store.update_header(&cart).await?;
        Ok(())
    }

    /// Administrative: every cart of every customer, any status.
    pub async fn get_all_carts(&self) -> CartResult<Vec<Cart>> {
        Ok(self.store.find_all().await?)
    }

    /// Administrative: wipe the entire cart store.
    pub async fn delete_all_carts(&self) -> CartResult<()> {
        self.store.delete_all().await?;
        tracing::warn!("all carts deleted");
        Ok(())
    }

    async fn get_or_create_unpaid(&self, customer: &CustomerId) -> CartResult<Cart> {
        if let Some(cart) = self.store.find_unpaid(customer).await? {
            return Ok(cart);
        }
        let cart = Cart::new_unpaid(customer.clone());
        self.store.insert_cart(&cart).await?;
        Ok(cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartStatus;
    use crate::store::InMemoryCartStore;
    use chrono::NaiveDate;
    use voltmart_catalog::{Category, InMemoryCatalog, Product};

    fn product(model: &str, price: u64, quantity: u32) -> Product {
        Product {
            model: ProductModel::new(model).unwrap(),
            category: Category::Smartphone,
            selling_price: price,
            quantity,
            details: None,
            arrival_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    fn service_with(products: Vec<Product>) -> (CartService, Arc<InMemoryCartStore>, Arc<InMemoryCatalog>) {
        let store = InMemoryCartStore::arc();
        let catalog = Arc::new(InMemoryCatalog::with_products(products));
        let service = CartService::new(store.clone(), catalog.clone());
        (service, store, catalog)
    }

    fn ada() -> CustomerId {
        CustomerId::new("ada").unwrap()
    }

    fn model(name: &str) -> ProductModel {
        ProductModel::new(name).unwrap()
    }

    #[tokio::test]
    async fn first_add_creates_the_cart_implicitly() {
        let (service, store, _) = service_with(vec![product("Realme X2", 5700, 3)]);

        assert!(store.find_unpaid(&ada()).await.unwrap().is_none());
        service.add_product(&ada(), &model("Realme X2")).await.unwrap();

        let cart = store.find_unpaid(&ada()).await.unwrap().unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), 5700);
    }

    #[tokio::test]
    async fn double_add_aggregates_quantity_and_total() {
        let (service, _, _) = service_with(vec![product("Realme X2", 5700, 3)]);

        service.add_product(&ada(), &model("Realme X2")).await.unwrap();
        service.add_product(&ada(), &model("Realme X2")).await.unwrap();

        let cart = service.get_current_cart(&ada()).await.unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), 2 * 5700);
    }

    #[tokio::test]
    async fn add_unknown_model_fails_without_creating_a_cart() {
        let (service, store, _) = service_with(vec![]);

        let err = service
            .add_product(&ada(), &model("Realme X2"))
            .await
            .unwrap_err();
        assert_eq!(err, CartError::ProductNotFound(model("Realme X2")));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_out_of_stock_model_fails_without_cart_mutation() {
        let (service, store, _) = service_with(vec![product("Realme X2", 5700, 0)]);

        let err = service
            .add_product(&ada(), &model("Realme X2"))
            .await
            .unwrap_err();
        assert_eq!(err, CartError::OutOfStock(model("Realme X2")));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn current_cart_is_synthetic_and_unpersisted_when_absent() {
        let (service, store, _) = service_with(vec![]);

        let cart = service.get_current_cart(&ada()).await.unwrap();
        assert_eq!(cart.customer(), &ada());
        assert_eq!(cart.status(), CartStatus::Unpaid);
        assert_eq!(cart.total(), 0);
        assert!(cart.is_empty());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_distinguishes_its_three_failure_kinds() {
        let (service, _, _) = service_with(vec![
            product("Realme X2", 5700, 3),
            product("LG TV", 89900, 2),
        ]);

        // No cart at all.
        assert_eq!(
            service
                .remove_product(&ada(), &model("Realme X2"))
                .await
                .unwrap_err(),
            CartError::CartNotFound
        );

        service.add_product(&ada(), &model("Realme X2")).await.unwrap();

        // Unknown catalog model, independent of cart membership.
        assert_eq!(
            service
                .remove_product(&ada(), &model("iPhone 13"))
                .await
                .unwrap_err(),
            CartError::ProductNotFound(model("iPhone 13"))
        );

        // Known model, not in the cart.
        assert_eq!(
            service
                .remove_product(&ada(), &model("LG TV"))
                .await
                .unwrap_err(),
            CartError::ProductNotInCart(model("LG TV"))
        );

        // Cart emptied: removal of a known model reports not-in-cart.
        service.clear_current_cart(&ada()).await.unwrap();
        assert_eq!(
            service
                .remove_product(&ada(), &model("Realme X2"))
                .await
                .unwrap_err(),
            CartError::ProductNotInCart(model("Realme X2"))
        );
    }

    #[tokio::test]
    async fn remove_last_unit_deletes_the_line_and_adjusts_total() {
        let (service, _, _) = service_with(vec![product("Realme X2", 5700, 3)]);

        service.add_product(&ada(), &model("Realme X2")).await.unwrap();
        service
            .remove_product(&ada(), &model("Realme X2"))
            .await
            .unwrap();

        let cart = service.get_current_cart(&ada()).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[tokio::test]
    async fn checkout_without_a_cart_fails() {
        let (service, _, _) = service_with(vec![]);
        assert_eq!(
            service.checkout(&ada()).await.unwrap_err(),
            CartError::CartNotFound
        );
    }

    #[tokio::test]
    async fn checkout_of_empty_cart_fails() {
        let (service, _, _) = service_with(vec![product("Realme X2", 5700, 3)]);
        service.add_product(&ada(), &model("Realme X2")).await.unwrap();
        service.clear_current_cart(&ada()).await.unwrap();

        assert_eq!(
            service.checkout(&ada()).await.unwrap_err(),
            CartError::EmptyCart
        );
    }

    #[tokio::test]
    async fn checkout_revalidates_stock_at_commit_time() {
        let (service, _, catalog) = service_with(vec![product("Realme X2", 5700, 3)]);
        let realme = model("Realme X2");

        service.add_product(&ada(), &realme).await.unwrap();
        service.add_product(&ada(), &realme).await.unwrap();

        // Stock depleted by another actor after the items were added.
        catalog.set_quantity(&realme, 1).await.unwrap();
        let err = service.checkout(&ada()).await.unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                model: realme.clone(),
                requested: 2,
                available: 1,
            }
        );

        catalog.set_quantity(&realme, 0).await.unwrap();
        assert_eq!(
            service.checkout(&ada()).await.unwrap_err(),
            CartError::OutOfStock(realme.clone())
        );

        // Failed checkout leaves the cart unpaid and unchanged.
        let cart = service.get_current_cart(&ada()).await.unwrap();
        assert_eq!(cart.status(), CartStatus::Unpaid);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.total(), 2 * 5700);
    }

    #[tokio::test]
    async fn checkout_fails_when_a_line_vanished_from_the_catalog() {
        // Catalog entries can be withdrawn while a cart is open; checkout
        // re-validation must catch that instead of skipping the line.
        let store = InMemoryCartStore::arc();
        let catalog = Arc::new(InMemoryCatalog::with_products(vec![product(
            "Realme X2",
            5700,
            3,
        )]));
        let service = CartService::new(store.clone(), catalog);

        service.add_product(&ada(), &model("Realme X2")).await.unwrap();

        // Withdraw the product entirely.
        let bare = Arc::new(InMemoryCatalog::new());
        let service = CartService::new(store, bare);
        assert_eq!(
            service.checkout(&ada()).await.unwrap_err(),
            CartError::ProductNotFound(model("Realme X2"))
        );
    }

    #[tokio::test]
    async fn successful_checkout_moves_cart_to_history() {
        let (service, _, _) = service_with(vec![product("Realme X2", 5700, 3)]);
        let realme = model("Realme X2");

        service.add_product(&ada(), &realme).await.unwrap();
        let paid = service.checkout(&ada()).await.unwrap();
        assert_eq!(paid.status(), CartStatus::Paid);
        assert!(paid.checkout_date().is_some());

        let history = service.get_customer_cart_history(&ada()).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id(), paid.id());

        // The next current cart is a fresh empty one.
        let current = service.get_current_cart(&ada()).await.unwrap();
        assert!(current.is_empty());
        assert_ne!(current.id(), paid.id());
    }

    #[tokio::test]
    async fn add_after_checkout_opens_a_fresh_cart() {
        let (service, store, _) = service_with(vec![product("Realme X2", 5700, 3)]);
        let realme = model("Realme X2");

        service.add_product(&ada(), &realme).await.unwrap();
        let paid = service.checkout(&ada()).await.unwrap();

        service.add_product(&ada(), &realme).await.unwrap();
        let current = store.find_unpaid(&ada()).await.unwrap().unwrap();
        assert_ne!(current.id(), paid.id());
        assert_eq!(current.total(), 5700);

        // Exactly one unpaid cart exists for the customer.
        let unpaid: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|c| c.customer() == &ada() && c.status() == CartStatus::Unpaid)
            .collect();
        assert_eq!(unpaid.len(), 1);
    }

    #[tokio::test]
    async fn clear_requires_an_active_cart() {
        let (service, _, _) = service_with(vec![]);
        assert_eq!(
            service.clear_current_cart(&ada()).await.unwrap_err(),
            CartError::CartNotFound
        );
    }

    #[tokio::test]
    async fn admin_ops_span_all_customers() {
        let (service, _, _) = service_with(vec![product("Realme X2", 5700, 10)]);
        let grace = CustomerId::new("grace").unwrap();
        let realme = model("Realme X2");

        service.add_product(&ada(), &realme).await.unwrap();
        service.add_product(&grace, &realme).await.unwrap();
        service.checkout(&grace).await.unwrap();

        let all = service.get_all_carts().await.unwrap();
        assert_eq!(all.len(), 2);

        service.delete_all_carts().await.unwrap();
        assert!(service.get_all_carts().await.unwrap().is_empty());
        // History is gone too; the wipe spans statuses.
        assert!(service
            .get_customer_cart_history(&grace)
            .await
            .unwrap()
            .is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const MODELS: [&str; 3] = ["Realme X2", "LG TV", "ThinkPad X1"];
        const PRICES: [u64; 3] = [5700, 89900, 120000];

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Add(usize),
            Remove(usize),
            Clear,
            Checkout,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                4 => (0..MODELS.len()).prop_map(Op::Add),
                2 => (0..MODELS.len()).prop_map(Op::Remove),
                1 => Just(Op::Clear),
                1 => Just(Op::Checkout),
            ]
        }

        fn fixture() -> (CartService, Arc<InMemoryCartStore>) {
            let products: Vec<_> = MODELS
                .iter()
                .zip(PRICES)
                .map(|(m, p)| product(m, p, 10_000))
                .collect();
            let store = InMemoryCartStore::arc();
            let catalog = Arc::new(InMemoryCatalog::with_products(products));
            (CartService::new(store.clone(), catalog), store)
        }

        /// Pure in-memory replay of the same operation sequence.
        #[derive(Debug, Default)]
        struct Replay {
            cart_exists: bool,
            quantities: [u32; 3],
        }

        impl Replay {
            fn total(&self) -> u64 {
                self.quantities
                    .iter()
                    .zip(PRICES)
                    .map(|(q, p)| u64::from(*q) * p)
                    .sum()
            }

            fn is_empty(&self) -> bool {
                self.quantities.iter().all(|q| *q == 0)
            }
        }

        async fn run_ops(service: &CartService, ops: &[Op]) -> Replay {
            let customer = ada();
            let mut replay = Replay::default();

            for op in ops {
                match *op {
                    Op::Add(i) => {
                        service.add_product(&customer, &model(MODELS[i])).await.unwrap();
                        replay.cart_exists = true;
                        replay.quantities[i] += 1;
                    }
                    Op::Remove(i) => {
                        let res = service.remove_product(&customer, &model(MODELS[i])).await;
                        if !replay.cart_exists {
                            assert_eq!(res.unwrap_err(), CartError::CartNotFound);
                        } else if replay.quantities[i] == 0 {
                            assert_eq!(
                                res.unwrap_err(),
                                CartError::ProductNotInCart(model(MODELS[i]))
                            );
                        } else {
                            res.unwrap();
                            replay.quantities[i] -= 1;
                        }
                    }
                    Op::Clear => {
                        let res = service.clear_current_cart(&customer).await;
                        if !replay.cart_exists {
                            assert_eq!(res.unwrap_err(), CartError::CartNotFound);
                        } else {
                            res.unwrap();
                            replay.quantities = [0; 3];
                        }
                    }
                    Op::Checkout => {
                        let res = service.checkout(&customer).await;
                        if !replay.cart_exists {
                            assert_eq!(res.unwrap_err(), CartError::CartNotFound);
                        } else if replay.is_empty() {
                            assert_eq!(res.unwrap_err(), CartError::EmptyCart);
                        } else {
                            res.unwrap();
                            replay = Replay::default();
                        }
                    }
                }
            }

            replay
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// The persisted current cart never drifts from a pure in-memory
            /// replay of the same operation sequence.
            #[test]
            fn current_cart_matches_in_memory_replay(
                ops in proptest::collection::vec(op_strategy(), 0..48)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                let (replay, cart) = rt.block_on(async {
                    let (service, _) = fixture();
                    let replay = run_ops(&service, &ops).await;
                    let cart = service.get_current_cart(&ada()).await.unwrap();
                    (replay, cart)
                });

                prop_assert_eq!(cart.total(), replay.total());
                prop_assert_eq!(cart.total(), cart.items_total());
                for (i, m) in MODELS.iter().enumerate() {
                    let quantity = cart
                        .find_item(&model(m))
                        .map(|l| l.quantity)
                        .unwrap_or(0);
                    prop_assert_eq!(quantity, replay.quantities[i]);
                }
                // Zero-quantity lines are deleted, never stored.
                prop_assert!(cart.items().iter().all(|l| l.quantity >= 1));
            }

            /// After any operation sequence, at most one cart per customer is
            /// unpaid, and every paid cart is internally consistent.
            #[test]
            fn at_most_one_unpaid_cart_per_customer(
                ops in proptest::collection::vec(op_strategy(), 0..48)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .unwrap();
                let all = rt.block_on(async {
                    let (service, store) = fixture();
                    run_ops(&service, &ops).await;
                    store.find_all().await.unwrap()
                });

                let unpaid = all
                    .iter()
                    .filter(|c| c.status() == CartStatus::Unpaid)
                    .count();
                prop_assert!(unpaid <= 1);

                for cart in all.iter().filter(|c| c.is_paid()) {
                    prop_assert!(!cart.is_empty());
                    prop_assert_eq!(cart.total(), cart.items_total());
                    prop_assert!(cart.checkout_date().is_some());
                }
            }
        }
    }
}
