//! Reference tables joined into invoice reads.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ORGANISATIONS_SQL).await?;
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(AGREEMENTS_SQL).await?;
        db.execute_unprepared(UNITS_SQL).await?;
        db.execute_unprepared(VAT_RATES_SQL).await?;
        db.execute_unprepared(PRODUCTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS products, vat_rates, units, agreements, companies, \
             bank_accounts, organisations CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const ORGANISATIONS_SQL: &str = r"
CREATE TABLE organisations (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    full_name TEXT,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id BIGSERIAL PRIMARY KEY,
    organisation_id BIGINT NOT NULL REFERENCES organisations(id) ON DELETE CASCADE,
    is_default BOOLEAN NOT NULL DEFAULT false,
    name VARCHAR(255) NOT NULL,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_bank_accounts_organisation ON bank_accounts(organisation_id);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    full_name TEXT,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Full-text company search
CREATE INDEX idx_companies_name_search ON companies USING GIN (to_tsvector('simple', name));
";

const AGREEMENTS_SQL: &str = r"
CREATE TABLE agreements (
    id BIGSERIAL PRIMARY KEY,
    company_id BIGINT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    name VARCHAR(255) NOT NULL,
    start_at DATE,
    end_at DATE,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_agreements_company ON agreements(company_id);
";

const UNITS_SQL: &str = r"
CREATE TABLE units (
    id BIGSERIAL PRIMARY KEY,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const VAT_RATES_SQL: &str = r"
CREATE TABLE vat_rates (
    id BIGSERIAL PRIMARY KEY,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_default BOOLEAN NOT NULL DEFAULT false,
    rate NUMERIC(5, 2) NOT NULL,
    name VARCHAR(255) NOT NULL,
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_vat_rate_range CHECK (rate >= 0 AND rate <= 100)
);
";

const PRODUCTS_SQL: &str = r"
CREATE TABLE products (
    id BIGSERIAL PRIMARY KEY,
    is_active BOOLEAN NOT NULL DEFAULT true,
    name VARCHAR(255) NOT NULL,
    sku VARCHAR(100),
    price NUMERIC(15, 2) NOT NULL DEFAULT 0,
    unit_id BIGINT REFERENCES units(id),
    vat_rate_id BIGINT REFERENCES vat_rates(id),
    destroyed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";
