//! Integration tests for the checkout flow against in-memory services.

use chrono::{Duration, Utc};
use checkout::{
    CheckoutCoordinator, CheckoutError, InMemoryAccessTokenValidator, InMemoryCatalogProvider,
    InMemoryPersistenceGateway, OrderBook, SubmissionStage, CatalogProvider,
};
use domain::catalog::{CategoryRecord, ComplementRecord, ExtraRecord, ProductRecord};
use domain::{
    AccessGrant, Cart, Catalog, CatalogItemId, CheckoutDetails, ComplementId, CustomerId,
    DeliveryAddress, ExtraId, FlavorPosition, GrantedCustomer, LineItemConfiguration, Money,
    OrderStatus, OrganizationId, PaymentType, SelectedComplement,
};

type TestCoordinator = CheckoutCoordinator<InMemoryPersistenceGateway, InMemoryAccessTokenValidator>;

struct TestHarness {
    coordinator: TestCoordinator,
    gateway: InMemoryPersistenceGateway,
    tokens: InMemoryAccessTokenValidator,
    catalog: Catalog,
}

fn id(value: &str) -> CatalogItemId {
    CatalogItemId::parse(value).unwrap()
}

fn product(id: &str, name: &str, category: &str, price: f64) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        description: None,
        category_id: Some(category.to_string()),
        price: Some(price),
        active: Some(true),
        extras: Vec::new(),
        complements: Vec::new(),
    }
}

impl TestHarness {
    async fn new() -> Self {
        let scope = OrganizationId::new();
        let provider = InMemoryCatalogProvider::new();

        let mut artesanal = product("artesanal", "Hambúrguer Artesanal", "burgers", 24.90);
        artesanal.extras.push(ExtraRecord {
            id: "bacon".to_string(),
            name: Some("Bacon extra".to_string()),
            price: Some(4.00),
        });
        let mut margherita = product("margherita", "Pizza Margherita", "pizzas", 32.90);
        margherita.complements.push(ComplementRecord {
            id: "refri".to_string(),
            name: Some("Refrigerante".to_string()),
            price: Some(6.00),
            required: Some(false),
            max_items: Some(3),
        });

        provider
            .set_menu(
                scope,
                vec![
                    CategoryRecord {
                        id: "burgers".to_string(),
                        name: Some("Hambúrgueres".to_string()),
                        allows_dual_composite: Some(false),
                        active: Some(true),
                    },
                    CategoryRecord {
                        id: "pizzas".to_string(),
                        name: Some("Pizzas".to_string()),
                        allows_dual_composite: Some(true),
                        active: Some(true),
                    },
                ],
                vec![
                    artesanal,
                    margherita,
                    product("pepperoni", "Pizza Pepperoni", "pizzas", 35.90),
                ],
            )
            .await;

        let catalog = provider.load_catalog(scope).await.unwrap().catalog;
        let gateway = InMemoryPersistenceGateway::new();
        let tokens = InMemoryAccessTokenValidator::new();
        let coordinator = CheckoutCoordinator::new(gateway.clone(), tokens.clone());

        Self {
            coordinator,
            gateway,
            tokens,
            catalog,
        }
    }

    fn details(&self) -> CheckoutDetails {
        CheckoutDetails::new()
            .with_customer(CustomerId::new())
            .unwrap()
            .with_payment_type(PaymentType::Card)
            .with_delivery_address(DeliveryAddress::parse("Rua das Palmeiras, 42").unwrap())
    }

    /// Two bacon burgers and one margherita: R$ 90.70.
    fn burger_and_pizza_cart(&self) -> Cart {
        let mut cart = Cart::new();
        let burger = LineItemConfiguration::single(id("artesanal"))
            .with_extra(ExtraId::parse("bacon").unwrap());
        self.coordinator
            .add_to_cart(&mut cart, &self.catalog, burger.clone())
            .unwrap();
        self.coordinator
            .add_to_cart(&mut cart, &self.catalog, burger)
            .unwrap();
        self.coordinator
            .add_to_cart(
                &mut cart,
                &self.catalog,
                LineItemConfiguration::single(id("margherita")),
            )
            .unwrap();
        cart
    }
}

#[tokio::test]
async fn test_checkout_persists_full_order() {
    let h = TestHarness::new().await;
    let mut cart = h.burger_and_pizza_cart();
    assert_eq!(cart.total(&h.catalog), Money::from_cents(9070));

    let receipt = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await
        .unwrap();

    assert!(cart.is_empty());
    assert_eq!(receipt.confirmation.total, Money::from_cents(9070));
    assert_eq!(receipt.confirmation.line_item_ids.len(), 2);

    let stored = h
        .gateway
        .get_order(h.catalog.scope(), receipt.confirmation.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.header.status, OrderStatus::Pending);
    assert_eq!(stored.header.payment_type, PaymentType::Card);
    assert_eq!(stored.lines.len(), 2);
    assert_eq!(stored.lines[0].item.quantity, 2);
    assert_eq!(stored.lines[0].item.unit_value, Money::from_cents(2890));

    let message = receipt.summary.render_message();
    assert!(message.contains("2x Hambúrguer Artesanal - R$ 57.80"));
    assert!(message.contains("*TOTAL: R$ 90.70*"));
}

#[tokio::test]
async fn test_dual_line_writes_flavors_and_complements() {
    let h = TestHarness::new().await;
    let mut cart = Cart::new();
    let dual = h
        .catalog
        .compose_dual(&id("margherita"), &id("pepperoni"))
        .unwrap()
        .with_complement(SelectedComplement::new(ComplementId::parse("refri").unwrap(), 2).unwrap()).unwrap();
    h.coordinator
        .add_to_cart(&mut cart, &h.catalog, dual)
        .unwrap();

    let receipt = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await
        .unwrap();

    // Dual base takes the higher flavor price, plus two drinks.
    assert_eq!(receipt.confirmation.total, Money::from_cents(4790));
    assert_eq!(
        h.gateway.write_log().await,
        vec![
            SubmissionStage::Header,
            SubmissionStage::LineItem,
            SubmissionStage::Flavor,
            SubmissionStage::Flavor,
            SubmissionStage::Complement,
        ]
    );

    let stored = h.gateway.order(receipt.confirmation.order_id).await.unwrap();
    let line = &stored.lines[0];
    assert_eq!(line.flavors[0].product_id, id("margherita"));
    assert_eq!(line.flavors[0].position, FlavorPosition::First);
    assert_eq!(line.flavors[1].position, FlavorPosition::Second);
    assert_eq!(line.complements[0].quantity, 2);
    assert_eq!(line.complements[0].value, Money::from_cents(1200));
}

#[tokio::test]
async fn test_line_item_failure_leaves_orphaned_header() {
    let h = TestHarness::new().await;
    h.gateway.fail_on(SubmissionStage::LineItem, 1).await;
    let mut cart = h.burger_and_pizza_cart();
    let before = cart.clone();

    let error = match h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await
    {
        Err(CheckoutError::Submission(error)) => error,
        other => panic!("expected submission error, got {other:?}"),
    };

    assert_eq!(error.stage, SubmissionStage::LineItem);
    assert_eq!(error.line_index, Some(0));
    assert!(error.written_lines.is_empty());
    assert_eq!(cart, before);

    let orphans = h.gateway.list_orphaned(h.catalog.scope()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(Some(orphans[0].id), error.order_id);
}

#[tokio::test]
async fn test_second_line_failure_leaves_orphaned_order() {
    let h = TestHarness::new().await;
    h.gateway.fail_on(SubmissionStage::LineItem, 2).await;
    let mut cart = h.burger_and_pizza_cart();

    let error = match h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await
    {
        Err(CheckoutError::Submission(error)) => error,
        other => panic!("expected submission error, got {other:?}"),
    };
    assert_eq!(error.line_index, Some(1));
    assert_eq!(error.written_lines.len(), 1);

    let orphans = h.gateway.list_orphaned(h.catalog.scope()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(Some(orphans[0].id), error.order_id);
    assert_eq!(orphans[0].lines.len(), 1);
    assert_ne!(orphans[0].lines_total(), orphans[0].header.total);
}

#[tokio::test]
async fn test_second_flavor_failure_leaves_orphaned_order() {
    let h = TestHarness::new().await;
    h.gateway.fail_on(SubmissionStage::Flavor, 2).await;
    let mut cart = Cart::new();
    let dual = h
        .catalog
        .compose_dual(&id("margherita"), &id("pepperoni"))
        .unwrap();
    h.coordinator.add_to_cart(&mut cart, &h.catalog, dual).unwrap();

    let result = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await;
    assert!(matches!(result, Err(CheckoutError::Submission(_))));

    let orphans = h.gateway.list_orphaned(h.catalog.scope()).await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].lines[0].flavors.len(), 1);
}

#[tokio::test]
async fn test_retry_after_failure_creates_second_order() {
    let h = TestHarness::new().await;
    h.gateway.fail_on(SubmissionStage::Complement, 1).await;
    let mut cart = Cart::new();
    cart.add(
        LineItemConfiguration::single(id("margherita"))
            .with_complement(SelectedComplement::one(ComplementId::parse("refri").unwrap())).unwrap(),
    );
    let details = h.details();

    assert!(h
        .coordinator
        .checkout(&mut cart, &h.catalog, &details, None)
        .await
        .is_err());
    assert_eq!(cart.len(), 1);

    h.gateway.clear_failure().await;
    h.coordinator
        .checkout(&mut cart, &h.catalog, &details, None)
        .await
        .unwrap();

    assert!(cart.is_empty());
    assert_eq!(h.gateway.order_count().await, 2);
}

#[tokio::test]
async fn test_missing_payment_type_blocks_submission() {
    let h = TestHarness::new().await;
    let mut cart = h.burger_and_pizza_cart();
    let details = CheckoutDetails::new()
        .with_customer(CustomerId::new())
        .unwrap()
        .with_delivery_address(DeliveryAddress::parse("Rua A, 1").unwrap());

    let result = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &details, None)
        .await;

    assert!(matches!(result, Err(CheckoutError::Validation(_))));
    assert_eq!(h.gateway.order_count().await, 0);
    assert_eq!(cart.len(), 2);
}

#[tokio::test]
async fn test_token_checkout_is_single_use() {
    let h = TestHarness::new().await;
    let grant = AccessGrant {
        organization_id: h.catalog.scope(),
        organization_name: "Cantina da Praça".to_string(),
        customer: GrantedCustomer {
            id: CustomerId::new(),
            name: "Carla".to_string(),
            phone: Some("5511988887777".to_string()),
        },
    };
    h.tokens
        .issue("link-123", grant, Utc::now() + Duration::hours(2))
        .await;

    let (grant, details) = h
        .coordinator
        .open_with_token("link-123", h.catalog.scope())
        .await
        .unwrap();
    assert!(details.is_customer_locked());
    assert_eq!(details.customer_id(), Some(grant.customer.id));

    let details = details
        .with_payment_type(PaymentType::Pix)
        .with_delivery_address(DeliveryAddress::parse("Rua E, 5").unwrap());
    let mut cart = h.burger_and_pizza_cart();
    let receipt = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &details, Some("link-123"))
        .await
        .unwrap();

    assert_eq!(receipt.summary.customer_name.as_deref(), Some("Carla"));
    assert!(h.tokens.is_used("link-123").await);

    let mut second = h.burger_and_pizza_cart();
    let result = h
        .coordinator
        .checkout(&mut second, &h.catalog, &details, Some("link-123"))
        .await;
    assert!(matches!(result, Err(CheckoutError::InvalidAccessToken)));
    assert_eq!(h.gateway.order_count().await, 1);
}

#[tokio::test]
async fn test_status_administration_after_checkout() {
    let h = TestHarness::new().await;
    let mut cart = h.burger_and_pizza_cart();
    let receipt = h
        .coordinator
        .checkout(&mut cart, &h.catalog, &h.details(), None)
        .await
        .unwrap();
    let scope = h.catalog.scope();
    let order_id = receipt.confirmation.order_id;

    let updated = h
        .gateway
        .update_status(scope, order_id, OrderStatus::Preparing)
        .await
        .unwrap();
    assert_eq!(updated.header.status, OrderStatus::Preparing);

    let preparing = h
        .gateway
        .list_orders(scope, Some(OrderStatus::Preparing))
        .await
        .unwrap();
    assert_eq!(preparing.len(), 1);

    assert!(h
        .gateway
        .update_status(scope, order_id, OrderStatus::Pending)
        .await
        .is_err());
    assert!(h
        .gateway
        .get_order(OrganizationId::new(), order_id)
        .await
        .unwrap()
        .is_none());
}
