use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_movement_records_table::Migration),
            Box::new(m20240101_000003_create_purchase_tables::Migration),
            Box::new(m20240101_000004_create_transfer_tables::Migration),
            Box::new(m20240101_000005_create_modifications_table::Migration),
        ]
    }
}

// The schema targets Postgres `DECIMAL(19,4)` (per spec). The SQLite backend
// used in tests caps decimal precision at 16 and ignores declared numeric
// precision at runtime (type affinity stores `rust_decimal` as text), so we
// emit a SQLite-safe precision there without altering the Postgres schema.
fn money_precision(manager: &SchemaManager) -> u32 {
    match manager.get_database_backend() {
        sea_orm::DatabaseBackend::Sqlite => 16,
        _ => 19,
    }
}

// Migration implementations

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Stocks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Stocks::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Stocks::Name).string().not_null())
                        .col(ColumnDef::new(Stocks::Category).string().not_null())
                        .col(ColumnDef::new(Stocks::Description).string().null())
                        .col(ColumnDef::new(Stocks::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockVariants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockVariants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockVariants::StockId).uuid().not_null())
                        .col(ColumnDef::new(StockVariants::Name).string().not_null())
                        .col(ColumnDef::new(StockVariants::Unit).string().not_null())
                        .col(
                            ColumnDef::new(StockVariants::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_variants_stock_id")
                        .table(StockVariants::Table)
                        .col(StockVariants::StockId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Locations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Locations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Locations::Name).string().not_null())
                        .col(ColumnDef::new(Locations::Kind).string().not_null())
                        .col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Locations::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockVariants::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Stocks::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Stocks {
        Table,
        Id,
        Name,
        Category,
        Description,
        CreatedAt,
    }

    #[derive(Iden)]
    enum StockVariants {
        Table,
        Id,
        StockId,
        Name,
        Unit,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Locations {
        Table,
        Id,
        Name,
        Kind,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Email,
        Phone,
        CreatedAt,
    }
}

mod m20240101_000002_create_movement_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_movement_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MovementRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MovementRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MovementRecords::StockId).uuid().not_null())
                        .col(
                            ColumnDef::new(MovementRecords::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::LocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::Quantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::Value)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::PreviousTotalQuantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::PreviousAverageValue)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::NewTotalQuantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::NewAverageValue)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::Sequence)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MovementRecords::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(MovementRecords::ReferenceId).uuid().null())
                        .col(
                            ColumnDef::new(MovementRecords::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Replay determinism and the cross-process append backstop.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("ux_movement_records_key_sequence")
                        .table(MovementRecords::Table)
                        .col(MovementRecords::LocationId)
                        .col(MovementRecords::VariantId)
                        .col(MovementRecords::Sequence)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movement_records_variant_id")
                        .table(MovementRecords::Table)
                        .col(MovementRecords::VariantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movement_records_created_at")
                        .table(MovementRecords::Table)
                        .col(MovementRecords::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MovementRecords::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum MovementRecords {
        Table,
        Id,
        StockId,
        VariantId,
        LocationId,
        MovementType,
        Quantity,
        Value,
        PreviousTotalQuantity,
        PreviousAverageValue,
        NewTotalQuantity,
        NewAverageValue,
        Sequence,
        ReferenceType,
        ReferenceId,
        CreatedAt,
    }
}

mod m20240101_000003_create_purchase_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_purchase_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockIntakePurchases::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockIntakePurchases::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::SupplierId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::LocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::Status)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::PaymentStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::TotalCost)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::PaidAmount)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::DeliveryDate)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(StockIntakePurchases::Notes).string().null())
                        .col(
                            ColumnDef::new(StockIntakePurchases::ReceivedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockIntakePurchases::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_intake_purchases_supplier_id")
                        .table(StockIntakePurchases::Table)
                        .col(StockIntakePurchases::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_intake_purchases_status")
                        .table(StockIntakePurchases::Table)
                        .col(StockIntakePurchases::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PurchaseLineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseLineItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLineItems::PurchaseId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PurchaseLineItems::StockId).uuid().not_null())
                        .col(
                            ColumnDef::new(PurchaseLineItems::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLineItems::Quantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLineItems::UnitCost)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseLineItems::LineCost)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_line_items_purchase_id")
                        .table(PurchaseLineItems::Table)
                        .col(PurchaseLineItems::PurchaseId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchaseLineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockIntakePurchases::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockIntakePurchases {
        Table,
        Id,
        SupplierId,
        LocationId,
        Status,
        PaymentStatus,
        TotalCost,
        PaidAmount,
        DeliveryDate,
        Notes,
        ReceivedAt,
        Version,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PurchaseLineItems {
        Table,
        Id,
        PurchaseId,
        StockId,
        VariantId,
        Quantity,
        UnitCost,
        LineCost,
    }
}

mod m20240101_000004_create_transfer_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_transfer_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransfers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransfers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransfers::VariantId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockTransfers::FromLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::ToLocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::Quantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::Value)
                                .decimal_len(super::money_precision(manager), 4)
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransfers::Status).string().not_null())
                        .col(ColumnDef::new(StockTransfers::StaffId).uuid().not_null())
                        .col(ColumnDef::new(StockTransfers::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockTransfers::ApprovedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::CancelledAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(StockTransfers::Notes).string().null())
                        .col(
                            ColumnDef::new(StockTransfers::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockTransfers::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transfers_status")
                        .table(StockTransfers::Table)
                        .col(StockTransfers::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRequests::VariantId).uuid().not_null())
                        .col(ColumnDef::new(StockRequests::WarehouseId).uuid().not_null())
                        .col(ColumnDef::new(StockRequests::LocationId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockRequests::Quantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::Value)
                                .decimal_len(super::money_precision(manager), 4)
                                .null(),
                        )
                        .col(ColumnDef::new(StockRequests::Status).string().not_null())
                        .col(ColumnDef::new(StockRequests::RequestedBy).uuid().not_null())
                        .col(ColumnDef::new(StockRequests::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockRequests::ApprovedDate)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::CancelledAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockRequests::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_requests_status")
                        .table(StockRequests::Table)
                        .col(StockRequests::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRequests::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockTransfers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockTransfers {
        Table,
        Id,
        VariantId,
        FromLocationId,
        ToLocationId,
        Quantity,
        Value,
        Status,
        StaffId,
        ApprovedBy,
        ApprovedAt,
        CancelledAt,
        Notes,
        Version,
        CreatedAt,
    }

    #[derive(Iden)]
    enum StockRequests {
        Table,
        Id,
        VariantId,
        WarehouseId,
        LocationId,
        Quantity,
        Value,
        Status,
        RequestedBy,
        ApprovedBy,
        ApprovedDate,
        CancelledAt,
        Version,
        CreatedAt,
    }
}

mod m20240101_000005_create_modifications_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_modifications_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockModifications::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockModifications::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::VariantId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::LocationId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::Quantity)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::Value)
                                .decimal_len(super::money_precision(manager), 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::Reason)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockModifications::StaffId).uuid().not_null())
                        .col(ColumnDef::new(StockModifications::Comment).string().null())
                        .col(
                            ColumnDef::new(StockModifications::MovementId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockModifications::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_modifications_variant_id")
                        .table(StockModifications::Table)
                        .col(StockModifications::VariantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockModifications::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockModifications {
        Table,
        Id,
        VariantId,
        LocationId,
        Quantity,
        Value,
        Reason,
        StaffId,
        Comment,
        MovementId,
        CreatedAt,
    }
}
