//! Sequential submission of a persistence plan.

use chrono::{DateTime, Utc};
use common::{LineItemId, Money, OrderId};
use domain::PersistencePlan;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, SubmissionError, SubmissionStage};
use crate::services::PersistenceGateway;

/// Identifiers of a fully written order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    /// One per plan line, in plan order.
    pub line_item_ids: Vec<LineItemId>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// Tracks progress so a failure can report what was already written.
struct Progress {
    order_id: Option<OrderId>,
    written_lines: Vec<LineItemId>,
}

impl Progress {
    fn fail(
        self,
        stage: SubmissionStage,
        line_index: Option<usize>,
        cause: GatewayError,
    ) -> SubmissionError {
        metrics::counter!("order_submission_failures_total", "stage" => stage.as_str())
            .increment(1);
        if self.order_id.is_some() {
            tracing::error!(
                %stage,
                line_index = ?line_index,
                order_id = ?self.order_id,
                written_lines = self.written_lines.len(),
                error = %cause,
                "order submission failed, partial order left behind"
            );
        } else {
            tracing::warn!(%stage, error = %cause, "order submission failed");
        }
        SubmissionError {
            stage,
            line_index,
            order_id: self.order_id,
            written_lines: self.written_lines,
            cause,
        }
    }
}

/// Writes a plan through the gateway.
///
/// Order of writes: the header, then for each line its line item, its
/// flavors by position and its complements in selection order. Every
/// write is awaited before the next starts. The first failure stops the
/// submission; nothing written before it is undone.
#[tracing::instrument(skip_all, fields(lines = plan.lines.len(), total = %plan.header.total))]
pub async fn submit<G>(
    plan: &PersistencePlan,
    gateway: &G,
) -> Result<OrderConfirmation, SubmissionError>
where
    G: PersistenceGateway + ?Sized,
{
    let started = std::time::Instant::now();
    let mut progress = Progress {
        order_id: None,
        written_lines: Vec::with_capacity(plan.lines.len()),
    };

    let order_id = match gateway.insert_order_header(&plan.header).await {
        Ok(order_id) => order_id,
        Err(cause) => return Err(progress.fail(SubmissionStage::Header, None, cause)),
    };
    progress.order_id = Some(order_id);
    tracing::debug!(%order_id, "order header written");

    for (index, line) in plan.lines.iter().enumerate() {
        let line_item_id = match gateway.insert_order_line_item(order_id, &line.item).await {
            Ok(id) => id,
            Err(cause) => {
                return Err(progress.fail(SubmissionStage::LineItem, Some(index), cause));
            }
        };
        progress.written_lines.push(line_item_id);

        for flavor in &line.flavors {
            if let Err(cause) = gateway.insert_order_line_flavor(line_item_id, flavor).await {
                return Err(progress.fail(SubmissionStage::Flavor, Some(index), cause));
            }
        }

        for complement in &line.complements {
            if let Err(cause) = gateway
                .insert_order_line_complement(line_item_id, complement)
                .await
            {
                return Err(progress.fail(SubmissionStage::Complement, Some(index), cause));
            }
        }
    }

    let duration = started.elapsed().as_secs_f64();
    metrics::counter!("orders_submitted_total").increment(1);
    metrics::histogram!("order_submission_duration_seconds").record(duration);
    tracing::info!(%order_id, duration, "order submitted");

    Ok(OrderConfirmation {
        order_id,
        line_item_ids: progress.written_lines,
        total: plan.header.total,
        created_at: plan.header.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryPersistenceGateway;
    use common::{CatalogItemId, ComplementId, CustomerId, OrganizationId};
    use domain::{
        DeliveryAddress, FlavorPosition, OrderHeader, OrderLineComplement, OrderLineFlavor,
        OrderLineItem, OrderStatus, PaymentType, PlannedLine,
    };

    fn item(id: &str) -> CatalogItemId {
        CatalogItemId::parse(id).unwrap()
    }

    fn plan() -> PersistencePlan {
        PersistencePlan {
            header: OrderHeader {
                organization_id: OrganizationId::new(),
                customer_id: CustomerId::new(),
                payment_type: PaymentType::Card,
                delivery_address: DeliveryAddress::parse("Rua B, 2").unwrap(),
                status: OrderStatus::Pending,
                total: Money::from_cents(8180),
                note: None,
                created_at: Utc::now(),
            },
            lines: vec![
                PlannedLine {
                    display_name: "Pizza Margherita + Pizza Pepperoni".to_string(),
                    extras: Vec::new(),
                    item: OrderLineItem {
                        product_id: item("margherita"),
                        quantity: 1,
                        unit_value: Money::from_cents(4190),
                        note: None,
                    },
                    flavors: vec![
                        OrderLineFlavor {
                            product_id: item("margherita"),
                            position: FlavorPosition::First,
                        },
                        OrderLineFlavor {
                            product_id: item("pepperoni"),
                            position: FlavorPosition::Second,
                        },
                    ],
                    complements: vec![OrderLineComplement {
                        complement_id: ComplementId::parse("refri").unwrap(),
                        quantity: 1,
                        value: Money::from_cents(600),
                    }],
                },
                PlannedLine {
                    display_name: "Salada Caesar".to_string(),
                    extras: Vec::new(),
                    item: OrderLineItem {
                        product_id: item("caesar"),
                        quantity: 2,
                        unit_value: Money::from_cents(1995),
                        note: Some("sem croutons".to_string()),
                    },
                    flavors: Vec::new(),
                    complements: Vec::new(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_writes_happen_in_order() {
        let gateway = InMemoryPersistenceGateway::new();
        let confirmation = submit(&plan(), &gateway).await.unwrap();

        assert_eq!(confirmation.line_item_ids.len(), 2);
        assert_eq!(confirmation.total, Money::from_cents(8180));
        assert_eq!(
            gateway.write_log().await,
            vec![
                SubmissionStage::Header,
                SubmissionStage::LineItem,
                SubmissionStage::Flavor,
                SubmissionStage::Flavor,
                SubmissionStage::Complement,
                SubmissionStage::LineItem,
            ]
        );

        let stored = gateway.order(confirmation.order_id).await.unwrap();
        assert_eq!(stored.lines[0].flavors[0].position, FlavorPosition::First);
        assert_eq!(stored.lines[1].item.note.as_deref(), Some("sem croutons"));
    }

    #[tokio::test]
    async fn test_header_failure_writes_nothing() {
        let gateway = InMemoryPersistenceGateway::new();
        gateway.fail_on(SubmissionStage::Header, 1).await;

        let error = submit(&plan(), &gateway).await.unwrap_err();
        assert_eq!(error.stage, SubmissionStage::Header);
        assert_eq!(error.order_id, None);
        assert!(!error.left_partial_order());
        assert_eq!(gateway.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_line_failure_keeps_first_line() {
        let gateway = InMemoryPersistenceGateway::new();
        gateway.fail_on(SubmissionStage::LineItem, 2).await;

        let error = submit(&plan(), &gateway).await.unwrap_err();
        assert_eq!(error.stage, SubmissionStage::LineItem);
        assert_eq!(error.line_index, Some(1));
        assert_eq!(error.written_lines.len(), 1);

        let order_id = error.order_id.unwrap();
        let stored = gateway.order(order_id).await.unwrap();
        assert_eq!(stored.lines.len(), 1);
        assert_eq!(stored.lines[0].flavors.len(), 2);
        assert_eq!(stored.lines[0].complements.len(), 1);
    }

    #[tokio::test]
    async fn test_flavor_failure_stops_before_complements() {
        let gateway = InMemoryPersistenceGateway::new();
        gateway.fail_on(SubmissionStage::Flavor, 2).await;

        let error = submit(&plan(), &gateway).await.unwrap_err();
        assert_eq!(error.stage, SubmissionStage::Flavor);
        assert_eq!(error.line_index, Some(0));
        assert_eq!(
            gateway.write_log().await,
            vec![
                SubmissionStage::Header,
                SubmissionStage::LineItem,
                SubmissionStage::Flavor,
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_through_trait_object() {
        let gateway: std::sync::Arc<dyn PersistenceGateway> =
            std::sync::Arc::new(InMemoryPersistenceGateway::new());
        assert!(submit(&plan(), gateway.as_ref()).await.is_ok());
    }
}
