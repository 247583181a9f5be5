//! Order composition: validation and persistence planning.

use chrono::{DateTime, Utc};
use common::{CustomerId, Money};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    CheckoutDetails, DeliveryAddress, OrderHeader, OrderLineComplement, OrderLineFlavor,
    OrderLineItem, OrderStatus, PaymentType,
};
use crate::cart::{self, Cart, CartLine, resolve_complement, resolve_extra};
use crate::catalog::Catalog;

/// Checkout fields, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredField {
    Customer,
    PaymentType,
    DeliveryAddress,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::Customer => "customer",
            RequiredField::PaymentType => "paymentType",
            RequiredField::DeliveryAddress => "deliveryAddress",
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reasons a cart cannot be turned into an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("missing required field: {0}")]
    MissingRequiredField(RequiredField),

    #[error("order total must be positive, got {total}")]
    ZeroOrNegativeTotal { total: Money },
}

impl ValidationError {
    /// Short label used in metrics and API error codes.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyCart => "empty_cart",
            ValidationError::MissingRequiredField(_) => "missing_required_field",
            ValidationError::ZeroOrNegativeTotal { .. } => "zero_or_negative_total",
        }
    }
}

/// A cart and checkout details that passed validation.
///
/// Borrows the cart and catalog so no edit can slip in between validation
/// and planning.
#[derive(Debug, Clone)]
pub struct ValidatedOrder<'a> {
    cart: &'a Cart,
    catalog: &'a Catalog,
    customer_id: CustomerId,
    payment_type: PaymentType,
    delivery_address: DeliveryAddress,
    note: Option<String>,
    total: Money,
}

impl ValidatedOrder<'_> {
    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn delivery_address(&self) -> &DeliveryAddress {
        &self.delivery_address
    }

    /// Total computed at validation time.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn line_count(&self) -> usize {
        self.cart.len()
    }
}

/// Checks that a cart and its checkout details can become an order.
///
/// Checks run in this order: empty cart, then the first missing field
/// among customer, payment type and delivery address, then the total.
pub fn validate<'a>(
    cart: &'a Cart,
    catalog: &'a Catalog,
    details: &CheckoutDetails,
) -> Result<ValidatedOrder<'a>, ValidationError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    let customer_id = details
        .customer_id()
        .ok_or(ValidationError::MissingRequiredField(RequiredField::Customer))?;
    let payment_type = details
        .payment_type()
        .ok_or(ValidationError::MissingRequiredField(RequiredField::PaymentType))?;
    let delivery_address = details
        .delivery_address()
        .cloned()
        .ok_or(ValidationError::MissingRequiredField(
            RequiredField::DeliveryAddress,
        ))?;

    let total = cart::cart_total(cart, catalog);
    if !total.is_positive() {
        return Err(ValidationError::ZeroOrNegativeTotal { total });
    }

    Ok(ValidatedOrder {
        cart,
        catalog,
        customer_id,
        payment_type,
        delivery_address,
        note: details.note().map(str::to_string),
        total,
    })
}

/// Rows to write for one cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedLine {
    /// Item name, or `"A + B"` for a dual composite.
    pub display_name: String,
    /// Names of the selected extras.
    pub extras: Vec<String>,
    pub item: OrderLineItem,
    /// Zero or two rows, position 1 first.
    pub flavors: Vec<OrderLineFlavor>,
    /// In selection order.
    pub complements: Vec<OrderLineComplement>,
}

/// Everything needed to write one order, in write order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistencePlan {
    pub header: OrderHeader,
    pub lines: Vec<PlannedLine>,
}

impl PersistencePlan {
    /// Number of rows the plan will insert, header included.
    pub fn row_count(&self) -> usize {
        1 + self
            .lines
            .iter()
            .map(|line| 1 + line.flavors.len() + line.complements.len())
            .sum::<usize>()
    }

    /// Sum of `unit_value * quantity` over the planned lines.
    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|line| line.item.total()).sum()
    }
}

/// Builds the persistence plan stamped with the current time.
pub fn build_persistence_plan(validated: &ValidatedOrder<'_>) -> PersistencePlan {
    build_persistence_plan_at(validated, Utc::now())
}

/// Builds the persistence plan with an explicit creation time.
///
/// The header total is recomputed from the catalog here rather than taken
/// from validation.
pub fn build_persistence_plan_at(
    validated: &ValidatedOrder<'_>,
    created_at: DateTime<Utc>,
) -> PersistencePlan {
    let catalog = validated.catalog;
    let lines: Vec<PlannedLine> = validated
        .cart
        .lines()
        .iter()
        .map(|line| plan_line(line, catalog))
        .collect();

    let header = OrderHeader {
        organization_id: catalog.scope(),
        customer_id: validated.customer_id,
        payment_type: validated.payment_type,
        delivery_address: validated.delivery_address.clone(),
        status: OrderStatus::Pending,
        total: cart::cart_total(validated.cart, catalog),
        note: validated.note.clone(),
        created_at,
    };

    PersistencePlan { header, lines }
}

fn plan_line(line: &CartLine, catalog: &Catalog) -> PlannedLine {
    let config = line.configuration();

    let item = OrderLineItem {
        product_id: config.primary_item_id().clone(),
        quantity: line.quantity(),
        unit_value: cart::unit_price(config, catalog),
        note: config.note().map(str::to_string),
    };

    let flavors = config
        .flavors()
        .into_iter()
        .map(|flavor| OrderLineFlavor {
            product_id: flavor.item_id,
            position: flavor.position,
        })
        .collect();

    let complements = config
        .complements()
        .iter()
        .filter_map(|selected| {
            match resolve_complement(config, catalog, &selected.complement_id) {
                Some(option) => Some(OrderLineComplement {
                    complement_id: selected.complement_id.clone(),
                    quantity: selected.quantity,
                    value: option
                        .unit_price
                        .max(Money::zero())
                        .multiply(selected.quantity),
                }),
                None => {
                    tracing::warn!(
                        complement_id = %selected.complement_id,
                        line = %line.key(),
                        "complement not in catalog, left out of the order"
                    );
                    None
                }
            }
        })
        .collect();

    let extras = config
        .extras()
        .filter_map(|extra| resolve_extra(config, catalog, extra))
        .map(|option| option.name.clone())
        .collect();

    PlannedLine {
        display_name: catalog.display_name(config),
        extras,
        item,
        flavors,
        complements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{FlavorPosition, LineItemConfiguration, SelectedComplement};
    use crate::catalog::{CatalogItem, Category, ComplementOption, ExtraOption};
    use common::{CatalogItemId, CategoryId, ComplementId, ExtraId, OrganizationId};

    fn id(value: &str) -> CatalogItemId {
        CatalogItemId::parse(value).unwrap()
    }

    fn catalog() -> Catalog {
        let pizzas = Category {
            id: CategoryId::parse("pizzas").unwrap(),
            name: "Pizzas".to_string(),
            allows_dual_composite: true,
        };
        let items = vec![
            CatalogItem::new(id("artesanal"), "Hambúrguer Artesanal", Money::from_cents(2490))
                .with_extra(ExtraOption {
                    id: ExtraId::parse("bacon").unwrap(),
                    name: "Bacon extra".to_string(),
                    price: Money::from_cents(400),
                })
                .with_complement(ComplementOption {
                    id: ComplementId::parse("molho").unwrap(),
                    name: "Molho".to_string(),
                    unit_price: Money::from_cents(150),
                    required: false,
                    max_items: None,
                }),
            CatalogItem::new(id("margherita"), "Pizza Margherita", Money::from_cents(3290))
                .in_category(&pizzas),
            CatalogItem::new(id("pepperoni"), "Pizza Pepperoni", Money::from_cents(3590))
                .in_category(&pizzas),
            CatalogItem::new(id("free"), "Brinde", Money::zero()),
        ];
        Catalog::new(OrganizationId::new(), vec![pizzas], items)
    }

    fn complete_details() -> CheckoutDetails {
        CheckoutDetails::new()
            .with_customer(CustomerId::new())
            .unwrap()
            .with_payment_type(PaymentType::Pix)
            .with_delivery_address(DeliveryAddress::parse("Rua das Flores, 10").unwrap())
    }

    fn created_at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T19:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_cart_fails_first() {
        let catalog = catalog();
        let cart = Cart::new();
        let result = validate(&cart, &catalog, &CheckoutDetails::new());
        assert_eq!(result.unwrap_err(), ValidationError::EmptyCart);
    }

    #[test]
    fn test_missing_fields_reported_in_priority_order() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(LineItemConfiguration::single(id("artesanal")));

        let nothing = CheckoutDetails::new();
        assert_eq!(
            validate(&cart, &catalog, &nothing).unwrap_err(),
            ValidationError::MissingRequiredField(RequiredField::Customer)
        );

        let customer_only = CheckoutDetails::new().with_customer(CustomerId::new()).unwrap();
        assert_eq!(
            validate(&cart, &catalog, &customer_only).unwrap_err(),
            ValidationError::MissingRequiredField(RequiredField::PaymentType)
        );

        let no_address = customer_only.with_payment_type(PaymentType::Cash);
        assert_eq!(
            validate(&cart, &catalog, &no_address).unwrap_err(),
            ValidationError::MissingRequiredField(RequiredField::DeliveryAddress)
        );
    }

    #[test]
    fn test_zero_total_rejected() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(LineItemConfiguration::single(id("free")));

        assert_eq!(
            validate(&cart, &catalog, &complete_details()).unwrap_err(),
            ValidationError::ZeroOrNegativeTotal {
                total: Money::zero()
            }
        );
    }

    #[test]
    fn test_plan_for_simple_order() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let burger = LineItemConfiguration::single(id("artesanal"))
            .with_extra(ExtraId::parse("bacon").unwrap());
        cart.add(burger.clone());
        cart.add(burger);
        cart.add(LineItemConfiguration::single(id("margherita")));

        let details = complete_details().with_note("Troco para 100");
        let validated = validate(&cart, &catalog, &details).unwrap();
        let plan = build_persistence_plan_at(&validated, created_at());

        assert_eq!(plan.header.total, Money::from_cents(9070));
        assert_eq!(plan.header.total, plan.lines_total());
        assert_eq!(plan.header.status, OrderStatus::Pending);
        assert_eq!(plan.header.organization_id, catalog.scope());
        assert_eq!(plan.header.note.as_deref(), Some("Troco para 100"));
        assert_eq!(plan.header.created_at, created_at());

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].item.quantity, 2);
        assert_eq!(plan.lines[0].item.unit_value, Money::from_cents(2890));
        assert_eq!(plan.lines[0].extras, vec!["Bacon extra".to_string()]);
        assert!(plan.lines[0].flavors.is_empty());
        assert_eq!(plan.lines[1].item.unit_value, Money::from_cents(3290));
        assert_eq!(plan.row_count(), 3);
    }

    #[test]
    fn test_plan_for_dual_line() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(catalog.compose_dual(&id("pepperoni"), &id("margherita")).unwrap());

        let validated = validate(&cart, &catalog, &complete_details()).unwrap();
        let plan = build_persistence_plan(&validated);
        let line = &plan.lines[0];

        assert_eq!(line.item.product_id, id("pepperoni"));
        assert_eq!(line.item.unit_value, Money::from_cents(3590));
        assert_eq!(line.display_name, "Pizza Pepperoni + Pizza Margherita");
        assert_eq!(line.flavors.len(), 2);
        assert_eq!(line.flavors[0].position, FlavorPosition::First);
        assert_eq!(line.flavors[0].product_id, id("pepperoni"));
        assert_eq!(line.flavors[1].position, FlavorPosition::Second);
        assert_eq!(line.flavors[1].product_id, id("margherita"));
    }

    #[test]
    fn test_plan_complements_keep_selection_order_and_drop_unknown() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(
            LineItemConfiguration::single(id("artesanal"))
                .with_complement(SelectedComplement::one(ComplementId::parse("ghost").unwrap())).unwrap()
                .with_complement(
                    SelectedComplement::new(ComplementId::parse("molho").unwrap(), 2).unwrap(),
                ).unwrap()
                .with_note("  sem cebola  "),
        );

        let validated = validate(&cart, &catalog, &complete_details()).unwrap();
        let plan = build_persistence_plan(&validated);
        let line = &plan.lines[0];

        assert_eq!(line.complements.len(), 1);
        assert_eq!(line.complements[0].complement_id.as_str(), "molho");
        assert_eq!(line.complements[0].value, Money::from_cents(300));
        assert_eq!(line.item.unit_value, Money::from_cents(2790));
        assert_eq!(line.item.note.as_deref(), Some("sem cebola"));
        assert_eq!(plan.header.total, plan.lines_total());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(LineItemConfiguration::single(id("artesanal")));
        cart.add(catalog.compose_dual(&id("margherita"), &id("pepperoni")).unwrap());

        let validated = validate(&cart, &catalog, &complete_details()).unwrap();
        assert_eq!(
            build_persistence_plan_at(&validated, created_at()),
            build_persistence_plan_at(&validated, created_at())
        );
    }
}
