//! Database seeder for Mercato development and testing.
//!
//! Seeds a demo shop with 90 days of money flows and orders, then prints a
//! bearer token scoped to that shop.
//!
//! Usage: cargo run --bin seeder

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use mercato_core::analytics::OrderRecord;
use mercato_core::ledger::{AppendInput, FlowDirection, MoneyFlowStore};
use mercato_db::{MoneyFlowRepository, OrderRepository};
use mercato_shared::types::{CustomerId, OrderId, ShopId};
use mercato_shared::{AppConfig, JwtService};

/// Demo shop ID (consistent for all seeds)
const DEMO_SHOP_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo owner ID (consistent for all seeds)
const DEMO_OWNER_ID: &str = "00000000-0000-0000-0000-000000000002";

const SEED_DAYS: i64 = 90;
/// Hours of the day at which sales land.
const SALE_HOURS: [i64; 3] = [10, 14, 19];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = mercato_db::connect(&config.database.url).await?;

    let shop_id = ShopId::from_uuid(Uuid::parse_str(DEMO_SHOP_ID)?);
    let flows = MoneyFlowRepository::new(db.clone());
    let orders = OrderRepository::new(db);

    if flows.head(shop_id).await?.version > 0 {
        println!("  Demo shop already has a ledger, skipping...");
    } else {
        println!("Seeding {SEED_DAYS} days of money flows and orders...");
        seed_demo_shop(&flows, &orders, shop_id).await?;
    }

    let jwt_service = JwtService::new(config.jwt.clone());
    let token = jwt_service.generate_access_token(
        Uuid::parse_str(DEMO_OWNER_ID)?,
        shop_id.into_inner(),
        "owner",
    )?;

    println!("Seeding complete!");
    println!("  Shop:  {shop_id}");
    println!("  Token: {token}");
    Ok(())
}

/// Deterministic sale amount between 20.00 and 99.99.
fn sale_amount(day: i64, slot: i64) -> Decimal {
    let cents = 2000 + (day * 7919 + slot * 104_729) % 8000;
    Decimal::new(cents, 2)
}

/// Appends sales, daily fees and weekly payouts in ascending time order,
/// with one order per sale.
async fn seed_demo_shop(
    flows: &MoneyFlowRepository,
    orders: &OrderRepository,
    shop_id: ShopId,
) -> anyhow::Result<()> {
    let first_day = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or_else(Utc::now)
        - Duration::days(SEED_DAYS);

    let mut customers: Vec<CustomerId> = Vec::new();
    let mut entries = 0_usize;
    let mut recorded_orders = 0_usize;

    for day in 0..SEED_DAYS {
        let midnight = first_day + Duration::days(day);
        customers.push(CustomerId::new());

        let mut daily_sales = Decimal::ZERO;
        for (slot, hour) in (0_i64..).zip(SALE_HOURS) {
            let at = midnight + Duration::hours(hour);
            let amount = sale_amount(day, slot);
            daily_sales += amount;

            let index = usize::try_from((day * 3 + slot * 5).unsigned_abs())? % customers.len();
            let customer_id = customers[index];

            record(flows, shop_id, FlowDirection::In, amount, "Order payment", at).await?;
            orders
                .record(&OrderRecord {
                    id: OrderId::new(),
                    shop_id,
                    customer_id,
                    total: amount,
                    created_at: at,
                })
                .await?;
            entries += 1;
            recorded_orders += 1;
        }

        // 3% marketplace fee on the day's sales
        let fee = (daily_sales * Decimal::new(3, 2)).round_dp(2);
        let fee_at = midnight + Duration::hours(23);
        record(flows, shop_id, FlowDirection::Out, fee, "Marketplace fee", fee_at).await?;
        entries += 1;

        if day % 7 == 6 {
            let balance = flows.head(shop_id).await?.balance;
            let payout = (balance * Decimal::new(6, 1)).round_dp(2);
            let payout_at = fee_at + Duration::minutes(30);
            record(flows, shop_id, FlowDirection::Out, payout, "Weekly payout", payout_at).await?;
            entries += 1;
        }
    }

    println!("  Inserted {entries} money flows and {recorded_orders} orders");
    Ok(())
}

async fn record(
    flows: &MoneyFlowRepository,
    shop_id: ShopId,
    direction: FlowDirection,
    amount: Decimal,
    description: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<()> {
    flows
        .append(
            shop_id,
            AppendInput::new(direction, amount, description).recorded_at(at),
        )
        .await?;
    Ok(())
}
