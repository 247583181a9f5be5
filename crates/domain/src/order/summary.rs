//! Plain order summary for handing an order off as a text message.

use common::Money;
use serde::{Deserialize, Serialize};

use super::PersistencePlan;

/// One line of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: u32,
    /// Unit value times quantity.
    pub line_value: Money,
    pub extras: Vec<String>,
    pub note: Option<String>,
}

/// Order summary independent of any messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub customer_name: Option<String>,
    pub delivery_address: String,
    pub payment: String,
    pub lines: Vec<SummaryLine>,
    pub total: Money,
    pub note: Option<String>,
}

impl OrderSummary {
    pub fn from_plan(plan: &PersistencePlan) -> Self {
        Self {
            customer_name: None,
            delivery_address: plan.header.delivery_address.to_string(),
            payment: plan.header.payment_type.label().to_string(),
            lines: plan
                .lines
                .iter()
                .map(|line| SummaryLine {
                    name: line.display_name.clone(),
                    quantity: line.item.quantity,
                    line_value: line.item.total(),
                    extras: line.extras.clone(),
                    note: line.item.note.clone(),
                })
                .collect(),
            total: plan.header.total,
            note: plan.header.note.clone(),
        }
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    /// Renders the summary as a chat message.
    pub fn render_message(&self) -> String {
        let mut message = String::from("*NOVO PEDIDO*\n\n");

        if let Some(name) = &self.customer_name {
            message.push_str(&format!("*Cliente:* {name}\n"));
        }
        message.push_str(&format!("*Endereço:* {}\n", self.delivery_address));
        message.push_str(&format!("*Pagamento:* {}\n\n", self.payment));

        message.push_str("*ITENS DO PEDIDO:*\n");
        for line in &self.lines {
            message.push_str(&format!(
                "• {}x {} - {}\n",
                line.quantity, line.name, line.line_value
            ));
            for extra in &line.extras {
                message.push_str(&format!("  + {extra}\n"));
            }
            if let Some(note) = &line.note {
                message.push_str(&format!("  Obs: {note}\n"));
            }
        }

        message.push_str(&format!("\n*TOTAL: {}*", self.total));

        if let Some(note) = &self.note {
            message.push_str(&format!("\n\n*Observações:* {note}"));
        }

        message
    }
}

impl std::fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render_message())
    }
}
