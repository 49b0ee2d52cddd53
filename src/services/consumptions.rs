use rust_decimal::Decimal;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entities::movement_record::{self, MovementType, ReferenceType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::ledger::{LedgerService, MovementDraft, VALUE_SCALE};

#[derive(Debug, Clone)]
pub struct RecordConsumption {
    pub variant_id: Uuid,
    pub location_id: Uuid,
    /// Units consumed; positive. Stored on the ledger as a negative delta.
    pub quantity: Decimal,
    /// The storefront order item this consumption fulfils.
    pub order_item_id: Uuid,
}

/// Order-item consumption: the storefront checkout's draw-down against a
/// location balance. One ORDER_ITEM_CONSUMPTION movement per order item,
/// valued at the running average; no separate workflow entity.
#[derive(Clone)]
pub struct ConsumptionService {
    ledger: LedgerService,
    event_sender: EventSender,
}

impl ConsumptionService {
    pub fn new(ledger: LedgerService, event_sender: EventSender) -> Self {
        Self {
            ledger,
            event_sender,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn record(
        &self,
        input: RecordConsumption,
    ) -> Result<movement_record::Model, ServiceError> {
        if input.quantity <= Decimal::ZERO {
            return Err(ServiceError::Validation(
                "consumed quantity must be positive".to_string(),
            ));
        }

        let draft = MovementDraft::new(
            input.variant_id,
            input.location_id,
            MovementType::OrderItemConsumption,
            -input.quantity.round_dp(VALUE_SCALE),
            None,
            Some((ReferenceType::OrderItem, input.order_item_id)),
        );
        let record = self.ledger.append(draft).await?;

        let event = Event::ConsumptionRecorded {
            order_item_id: input.order_item_id,
            movement_id: record.id,
        };
        if let Err(err) = self.event_sender.send(event).await {
            warn!("failed to publish consumption event: {}", err);
        }
        Ok(record)
    }
}
