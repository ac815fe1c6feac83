//! Initial database migration.
//!
//! Creates the ledger enums, tables, indexes and guard triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS & CATEGORIES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;

        // ============================================================
        // PART 3: TRANSFERS & TRANSACTIONS
        // ============================================================
        db.execute_unprepared(TRANSFERS_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: FX RATES
        // ============================================================
        db.execute_unprepared(FX_RATES_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_status AS ENUM ('ACTIVE', 'INACTIVE', 'CLOSED');
CREATE TYPE category_type AS ENUM ('INCOME', 'EXPENSE');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    currency CHAR(3) NOT NULL,
    status account_status NOT NULL DEFAULT 'ACTIVE',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounts_user_name UNIQUE (user_id, name),
    CONSTRAINT chk_accounts_currency CHECK (currency ~ '^[A-Z]{3}$')
);

CREATE INDEX idx_accounts_user ON accounts(user_id, name);
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    name VARCHAR(200) NOT NULL,
    type category_type NOT NULL,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_categories_user_name_type UNIQUE (user_id, name, type)
);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    src_account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    dst_account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    src_amount_minor BIGINT NOT NULL,
    dst_amount_minor BIGINT NOT NULL,
    rate_base CHAR(3) NOT NULL,
    rate_quote CHAR(3) NOT NULL,
    -- Effective rate: dst / src at full precision, so no fixed scale
    rate_value NUMERIC NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    voided BOOLEAN NOT NULL DEFAULT false,
    ref_rate_value NUMERIC(18, 10),
    ref_rate_date DATE,
    ref_rate_source VARCHAR(32),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transfers_distinct_accounts CHECK (src_account_id <> dst_account_id),
    CONSTRAINT chk_transfers_positive CHECK (src_amount_minor > 0 AND dst_amount_minor > 0),
    CONSTRAINT chk_transfers_rate_positive CHECK (rate_value > 0)
);

CREATE INDEX idx_transfers_user ON transfers(user_id, occurred_at);
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    category_id UUID REFERENCES categories(id) ON DELETE RESTRICT,
    amount_minor BIGINT NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL,
    description VARCHAR(1000),
    transfer_id UUID REFERENCES transfers(id) ON DELETE RESTRICT,
    voided BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_positive CHECK (amount_minor > 0)
);

-- Aggregator scans
CREATE INDEX idx_transactions_user_occurred ON transactions(user_id, occurred_at);
CREATE INDEX idx_transactions_user_account ON transactions(user_id, account_id);
CREATE INDEX idx_transactions_user_category ON transactions(user_id, category_id);

-- Void cascade
CREATE INDEX idx_transactions_transfer ON transactions(transfer_id) WHERE transfer_id IS NOT NULL;
";

const FX_RATES_SQL: &str = r"
CREATE TABLE fx_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    date DATE NOT NULL,
    base CHAR(3) NOT NULL,
    quote CHAR(3) NOT NULL,
    rate_value NUMERIC(18, 10) NOT NULL,
    source VARCHAR(32) NOT NULL DEFAULT 'manual',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_fx_rates_date_pair UNIQUE (date, base, quote),
    CONSTRAINT chk_fx_rates_positive CHECK (rate_value > 0),
    CONSTRAINT chk_fx_rates_distinct CHECK (base <> quote)
);
";

const TRIGGERS_SQL: &str = r"
-- Transfers are voided, never deleted
CREATE OR REPLACE FUNCTION prevent_transfer_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'transfers cannot be deleted, void them instead';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_transfer_delete
    BEFORE DELETE ON transfers
    FOR EACH ROW EXECUTE FUNCTION prevent_transfer_delete();

-- Transfer legs cannot be deleted on their own
CREATE OR REPLACE FUNCTION prevent_transfer_leg_delete()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.transfer_id IS NOT NULL THEN
        RAISE EXCEPTION 'transaction % belongs to transfer %', OLD.id, OLD.transfer_id;
    END IF;
    RETURN OLD;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_transfer_leg_delete
    BEFORE DELETE ON transactions
    FOR EACH ROW EXECUTE FUNCTION prevent_transfer_leg_delete();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_transfer_leg_delete ON transactions;
DROP TRIGGER IF EXISTS trg_prevent_transfer_delete ON transfers;

DROP FUNCTION IF EXISTS prevent_transfer_leg_delete();
DROP FUNCTION IF EXISTS prevent_transfer_delete();

DROP TABLE IF EXISTS fx_rates CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS transfers CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP TYPE IF EXISTS category_type;
DROP TYPE IF EXISTS account_status;
";
