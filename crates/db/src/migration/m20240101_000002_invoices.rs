//! Invoices and their line items.
//!
//! Invoice totals are maintained by the application; no trigger recomputes them.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(INVOICE_ITEMS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS invoice_items, invoices CASCADE;")
            .await?;
        Ok(())
    }
}

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id BIGSERIAL PRIMARY KEY,
    is_active BOOLEAN NOT NULL DEFAULT true,
    date DATE NOT NULL,
    -- Organisation-scoped, not unique
    number VARCHAR(50) NOT NULL,
    organisation_id BIGINT NOT NULL REFERENCES organisations(id),
    bank_account_id BIGINT REFERENCES bank_accounts(id),
    company_id BIGINT REFERENCES companies(id),
    agreement_id BIGINT REFERENCES agreements(id),
    amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    vat NUMERIC(15, 2) NOT NULL DEFAULT 0,
    user_id BIGINT,
    uuid UUID NOT NULL UNIQUE,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoice_totals_non_negative CHECK (amount >= 0 AND discount >= 0 AND vat >= 0)
);

-- Latest-number lookup
CREATE INDEX idx_invoices_organisation_created ON invoices(organisation_id, created_at DESC);
CREATE INDEX idx_invoices_company ON invoices(company_id) WHERE destroyed_at IS NULL;
CREATE INDEX idx_invoices_date ON invoices(date) WHERE destroyed_at IS NULL;
";

const INVOICE_ITEMS_SQL: &str = r"
CREATE TABLE invoice_items (
    id BIGSERIAL PRIMARY KEY,
    invoice_id BIGINT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    product_id BIGINT NOT NULL REFERENCES products(id),
    description TEXT NOT NULL DEFAULT '',
    unit_id BIGINT REFERENCES units(id),
    quantity NUMERIC(15, 3) NOT NULL DEFAULT 0,
    price NUMERIC(15, 2) NOT NULL DEFAULT 0,
    amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    discount_rate INTEGER NOT NULL DEFAULT 0,
    discount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    vat_rate_id BIGINT REFERENCES vat_rates(id),
    vat NUMERIC(15, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_invoice_item_discount_rate CHECK (discount_rate BETWEEN 0 AND 100),
    CONSTRAINT chk_invoice_item_amounts CHECK (
        quantity >= 0 AND price >= 0 AND amount >= 0 AND discount >= 0 AND vat >= 0
    )
);

CREATE INDEX idx_invoice_items_invoice ON invoice_items(invoice_id, position, id);
";
