use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::movement_record::{self, Entity as MovementRecords};
use crate::errors::ServiceError;
use crate::key_lock::BalanceKey;
use crate::services::ledger::VALUE_SCALE;

/// Projected state of one (location, variant) balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Balance {
    pub total_quantity: Decimal,
    pub average_value: Decimal,
    /// Sequence number of the latest movement folded in; 0 when empty.
    pub last_sequence: i64,
}

impl Balance {
    pub fn empty() -> Self {
        Self {
            total_quantity: Decimal::ZERO,
            average_value: Decimal::ZERO,
            last_sequence: 0,
        }
    }

    /// Applies one signed delta, returning the post-movement balance.
    /// Inflows blend into the weighted average; outflows leave it
    /// unchanged. The caller has already established that the result is
    /// non-negative.
    pub fn apply(&self, quantity: Decimal, value: Decimal, sequence: i64) -> Self {
        let new_quantity = self.total_quantity + quantity;
        let average_value = if quantity > Decimal::ZERO {
            ((self.average_value * self.total_quantity + value) / new_quantity)
                .round_dp(VALUE_SCALE)
        } else {
            self.average_value
        };
        Self {
            total_quantity: new_quantity,
            average_value,
            last_sequence: sequence,
        }
    }
}

/// Result of a cache-vs-fold audit for one key.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceAudit {
    pub cached: Option<Balance>,
    pub recomputed: Balance,
    pub consistent: bool,
}

/// Balance projector: an explicit keyed store of projected balances,
/// seeded by folding the ledger and updated synchronously on every
/// append (while the appender holds the key lock).
#[derive(Debug, Default)]
pub struct BalanceProjector {
    cache: DashMap<BalanceKey, Balance>,
}

impl BalanceProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance for a key, folding the ledger on cache miss.
    pub async fn get_balance<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: BalanceKey,
    ) -> Result<Balance, ServiceError> {
        if let Some(cached) = self.cache.get(&key) {
            return Ok(*cached);
        }
        let folded = self.fold(conn, key).await?;
        self.cache.insert(key, folded);
        Ok(folded)
    }

    /// Post-commit cache update. Only called while the appender holds
    /// the key lock, so the write cannot race another mutation of the
    /// same key.
    pub fn store(&self, key: BalanceKey, balance: Balance) {
        self.cache.insert(key, balance);
    }

    /// Drops the cached entry so the next read re-folds from the ledger.
    pub fn invalidate(&self, key: BalanceKey) {
        self.cache.remove(&key);
    }

    /// Full fold from scratch, replacing the cached entry (repair).
    pub async fn recompute<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: BalanceKey,
    ) -> Result<Balance, ServiceError> {
        let folded = self.fold(conn, key).await?;
        self.cache.insert(key, folded);
        Ok(folded)
    }

    /// Compares the incremental cache against a full fold without
    /// repairing anything.
    pub async fn audit<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: BalanceKey,
    ) -> Result<BalanceAudit, ServiceError> {
        let cached = self.cache.get(&key).map(|entry| *entry);
        let recomputed = self.fold(conn, key).await?;
        let consistent = cached.map(|c| c == recomputed).unwrap_or(true);
        Ok(BalanceAudit {
            cached,
            recomputed,
            consistent,
        })
    }

    /// Folds the ledger for one key in sequence order. Recomputes the
    /// running average from the deltas rather than trusting the stored
    /// snapshots, so an audit actually re-derives the chain.
    pub async fn fold<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: BalanceKey,
    ) -> Result<Balance, ServiceError> {
        let records = MovementRecords::find()
            .filter(movement_record::Column::LocationId.eq(key.location_id))
            .filter(movement_record::Column::VariantId.eq(key.variant_id))
            .order_by_asc(movement_record::Column::Sequence)
            .all(conn)
            .await?;

        let mut balance = Balance::empty();
        for record in records {
            balance = balance.apply(record.quantity, record.value, record.sequence);
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn intake_blends_weighted_average() {
        let balance = Balance::empty()
            .apply(dec!(10), dec!(1000), 1)
            .apply(dec!(5), dec!(600), 2);
        assert_eq!(balance.total_quantity, dec!(15));
        // (100 * 10 + 600) / 15 rounded to scale 4
        assert_eq!(balance.average_value, dec!(106.6667));
        assert_eq!(balance.last_sequence, 2);
    }

    #[test]
    fn outflow_leaves_average_unchanged() {
        let balance = Balance::empty()
            .apply(dec!(10), dec!(1000), 1)
            .apply(dec!(-4), dec!(-400), 2);
        assert_eq!(balance.total_quantity, dec!(6));
        assert_eq!(balance.average_value, dec!(100));
    }

    #[test]
    fn intake_into_emptied_balance_resets_average() {
        let balance = Balance::empty()
            .apply(dec!(10), dec!(1000), 1)
            .apply(dec!(-10), dec!(-1000), 2)
            .apply(dec!(4), dec!(600), 3);
        assert_eq!(balance.total_quantity, dec!(4));
        assert_eq!(balance.average_value, dec!(150));
    }
}
