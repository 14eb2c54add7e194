//! Money-flow ledger schema.
//!
//! Creates `money_flows`, the per-shop `ledger_heads` tail record, and the
//! `orders` table read by analytics.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(MONEY_FLOWS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS orders CASCADE;
             DROP TABLE IF EXISTS ledger_heads CASCADE;
             DROP TABLE IF EXISTS money_flows CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const MONEY_FLOWS_SQL: &str = r"
-- Append-only money-flow entries, one chain per shop
CREATE TABLE money_flows (
    id BIGSERIAL PRIMARY KEY,
    shop_id UUID NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    direction VARCHAR(3) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    balance_after NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_money_flows_direction CHECK (direction IN ('in', 'out')),
    CONSTRAINT chk_money_flows_amount CHECK (amount >= 0)
);

-- Ledger order, range scans and balance-at-time lookups
CREATE INDEX idx_money_flows_shop_order ON money_flows(shop_id, created_at, id);

-- Explicit tail state; row-locked by every append
CREATE TABLE ledger_heads (
    shop_id UUID PRIMARY KEY,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    last_entry_id BIGINT REFERENCES money_flows(id),
    last_recorded_at TIMESTAMPTZ,
    version BIGINT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_ledger_heads_version CHECK (version >= 0)
);

-- Entries are immutable once written
CREATE OR REPLACE FUNCTION money_flows_immutable() RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'money_flows rows are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_money_flows_immutable
    BEFORE UPDATE OR DELETE ON money_flows
    FOR EACH ROW EXECUTE FUNCTION money_flows_immutable();

-- Orders placed in shops; analytics reads counts and first-order dates
CREATE TABLE orders (
    id UUID PRIMARY KEY,
    shop_id UUID NOT NULL,
    customer_id UUID NOT NULL,
    total NUMERIC(19, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_orders_total CHECK (total >= 0)
);

CREATE INDEX idx_orders_shop_created ON orders(shop_id, created_at);
CREATE INDEX idx_orders_shop_customer ON orders(shop_id, customer_id, created_at);
";
