//! Checkout coordinator: validate, plan, submit, then clear the cart.

use common::OrganizationId;
use domain::{
    AccessGrant, Cart, CartEvent, Catalog, CheckoutDetails, CompositionState, LineItemConfiguration,
    OrderError, OrderSummary, build_persistence_plan, validate,
};
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::services::{AccessTokenValidator, PersistenceGateway};
use crate::submission::{OrderConfirmation, submit};

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub confirmation: OrderConfirmation,
    pub summary: OrderSummary,
}

/// Orchestrates a checkout against the persistence gateway.
///
/// The coordinator walks the composition states
/// Composing → Validated → Submitting → Committed | Failed. The cart is
/// cleared only on Committed; on any failure it is left exactly as it was.
pub struct CheckoutCoordinator<G, T>
where
    G: PersistenceGateway,
    T: AccessTokenValidator,
{
    gateway: G,
    tokens: T,
}

impl<G, T> CheckoutCoordinator<G, T>
where
    G: PersistenceGateway,
    T: AccessTokenValidator,
{
    /// Creates a new checkout coordinator.
    pub fn new(gateway: G, tokens: T) -> Self {
        Self { gateway, tokens }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Validates an access token for `scope` and returns the grant with
    /// checkout details pre-filled and the customer locked.
    #[tracing::instrument(skip(self, token))]
    pub async fn open_with_token(
        &self,
        token: &str,
        scope: OrganizationId,
    ) -> Result<(AccessGrant, CheckoutDetails), CheckoutError> {
        let grant = self
            .tokens
            .validate(token)
            .await?
            .ok_or(CheckoutError::InvalidAccessToken)?;
        if grant.organization_id != scope {
            return Err(CheckoutError::AccessTokenScopeMismatch);
        }
        let details = CheckoutDetails::from_grant(&grant);
        tracing::info!(customer_id = %grant.customer.id, "access token accepted");
        Ok((grant, details))
    }

    /// Adds a configuration to the cart after checking it against the catalog.
    pub fn add_to_cart(
        &self,
        cart: &mut Cart,
        catalog: &Catalog,
        configuration: LineItemConfiguration,
    ) -> Result<CartEvent, CheckoutError> {
        catalog.verify(&configuration)?;
        Ok(cart.add(configuration))
    }

    /// Adds `quantity` units of a configuration, verified once against the
    /// catalog. Quantities outside `1..=MAX_LINE_QUANTITY` are rejected.
    pub fn add_many_to_cart(
        &self,
        cart: &mut Cart,
        catalog: &Catalog,
        configuration: LineItemConfiguration,
        quantity: u32,
    ) -> Result<CartEvent, CheckoutError> {
        catalog.verify(&configuration)?;
        Ok(cart.add_many(configuration, quantity)?)
    }

    /// Claims a token for this checkout. The claim is released again if
    /// the token does not fit the checkout.
    async fn claim_token(
        &self,
        token: &str,
        scope: OrganizationId,
        details: &CheckoutDetails,
    ) -> Result<AccessGrant, CheckoutError> {
        let grant = self
            .tokens
            .claim(token)
            .await?
            .ok_or(CheckoutError::InvalidAccessToken)?;
        let mismatch = if grant.organization_id != scope {
            Some(CheckoutError::AccessTokenScopeMismatch)
        } else if Some(grant.customer.id) != details.customer_id() {
            Some(OrderError::CustomerLocked.into())
        } else {
            None
        };
        match mismatch {
            Some(error) => {
                self.release_token(token).await;
                Err(error)
            }
            None => Ok(grant),
        }
    }

    async fn release_token(&self, token: &str) {
        if let Err(error) = self.tokens.release(token).await {
            tracing::warn!(%error, "could not release access token");
        }
    }

    /// Runs a full checkout.
    ///
    /// When `access_token` is given it is claimed before any write and must
    /// name the checkout's customer. Concurrent checkouts with the same
    /// token cannot both pass the claim. A failed submission releases it
    /// so the customer can retry.
    #[tracing::instrument(skip_all, fields(lines = cart.len(), scope = %catalog.scope()))]
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        catalog: &Catalog,
        details: &CheckoutDetails,
        access_token: Option<&str>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let mut state = CompositionState::default();

        let validated = match validate(cart, catalog, details) {
            Ok(validated) => validated,
            Err(error) => {
                metrics::counter!("order_validation_failures_total", "reason" => error.code())
                    .increment(1);
                tracing::info!(%error, "checkout validation failed");
                return Err(error.into());
            }
        };
        state = state.transition(CompositionState::Validated)?;

        let grant = match access_token {
            Some(token) => Some(self.claim_token(token, catalog.scope(), details).await?),
            None => None,
        };

        let plan = build_persistence_plan(&validated);
        let mut summary = OrderSummary::from_plan(&plan);
        if let Some(grant) = &grant {
            summary = summary.with_customer_name(grant.customer.name.clone());
        }

        state = state.transition(CompositionState::Submitting)?;
        let confirmation = match submit(&plan, &self.gateway).await {
            Ok(confirmation) => confirmation,
            Err(error) => {
                state = state.transition(CompositionState::Failed)?;
                tracing::warn!(%state, stage = %error.stage, "checkout failed, cart kept");
                if let Some(token) = access_token {
                    self.release_token(token).await;
                }
                return Err(error.into());
            }
        };
        state = state.transition(CompositionState::Committed)?;

        cart.clear();

        tracing::info!(%state, order_id = %confirmation.order_id, "checkout committed");
        Ok(CheckoutReceipt {
            confirmation,
            summary,
        })
    }
}
