use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::key_lock::KeyLocks;
use crate::services::balances::BalanceProjector;
use crate::services::catalog::CatalogService;
use crate::services::consumptions::ConsumptionService;
use crate::services::ledger::LedgerService;
use crate::services::modifications::ModificationService;
use crate::services::purchases::PurchaseService;
use crate::services::reports::ReportService;
use crate::services::requests::StockRequestService;
use crate::services::transfers::TransferService;

pub mod balances;
pub mod catalog;
pub mod consumptions;
pub mod health;
pub mod modifications;
pub mod movements;
pub mod purchases;
pub mod reports;
pub mod requests;
pub mod transfers;

/// Aggregated domain services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub ledger: LedgerService,
    pub projector: Arc<BalanceProjector>,
    pub purchases: PurchaseService,
    pub transfers: TransferService,
    pub requests: StockRequestService,
    pub modifications: ModificationService,
    pub consumptions: ConsumptionService,
    pub reports: ReportService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        let projector = Arc::new(BalanceProjector::new());
        let locks = Arc::new(KeyLocks::new());
        let ledger = LedgerService::new(
            db.clone(),
            projector.clone(),
            locks,
            event_sender.clone(),
        );
        let catalog = CatalogService::new(db.clone());
        let purchases = PurchaseService::new(
            db.clone(),
            ledger.clone(),
            catalog.clone(),
            event_sender.clone(),
        );
        let transfers = TransferService::new(
            db.clone(),
            ledger.clone(),
            catalog.clone(),
            event_sender.clone(),
        );
        let requests = StockRequestService::new(
            db.clone(),
            ledger.clone(),
            catalog.clone(),
            event_sender.clone(),
        );
        let modifications =
            ModificationService::new(db.clone(), ledger.clone(), event_sender.clone());
        let consumptions = ConsumptionService::new(ledger.clone(), event_sender);
        let reports = ReportService::new(db);

        Self {
            catalog,
            ledger,
            projector,
            purchases,
            transfers,
            requests,
            modifications,
            consumptions,
            reports,
        }
    }
}
