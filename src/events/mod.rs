use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted by the ledger and workflow services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    MovementAppended {
        movement_id: Uuid,
        location_id: Uuid,
        variant_id: Uuid,
        movement_type: String,
        quantity: Decimal,
        new_total_quantity: Decimal,
    },
    BalanceRecomputed {
        location_id: Uuid,
        variant_id: Uuid,
        total_quantity: Decimal,
    },

    PurchaseCreated(Uuid),
    PurchaseReceived(Uuid),
    PurchasePaymentRecorded {
        purchase_id: Uuid,
        amount: Decimal,
        payment_status: String,
    },

    TransferCreated(Uuid),
    TransferApproved(Uuid),
    TransferCancelled(Uuid),

    StockRequestCreated(Uuid),
    StockRequestApproved(Uuid),
    StockRequestCancelled(Uuid),

    ModificationRecorded(Uuid),
    ConsumptionRecorded {
        order_item_id: Uuid,
        movement_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; failure means the processor is gone, which the
    /// caller surfaces rather than ignores.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Background event processor. Today this is a structured-log sink; it
/// is the single place an outbound integration would hook in.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::MovementAppended {
                movement_id,
                location_id,
                variant_id,
                movement_type,
                quantity,
                new_total_quantity,
            } => {
                info!(
                    %movement_id,
                    %location_id,
                    %variant_id,
                    movement_type,
                    %quantity,
                    %new_total_quantity,
                    "movement appended"
                );
            }
            other => debug!(event = ?other, "domain event"),
        }
    }
    info!("Event processor stopped: channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_fails_when_processor_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);
        assert!(sender.send(Event::PurchaseCreated(Uuid::new_v4())).await.is_err());
    }

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::TransferApproved(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(Event::TransferApproved(_))));
    }
}
