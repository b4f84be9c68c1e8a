//! Development data seeder for Billet.
//!
//! Seeds reference data (organisations, companies, products, units, VAT
//! rates) and a handful of demo invoices. Generated values come from one
//! `StdRng` seeded from `SEED` (default 42) and passed explicitly to every
//! generator, so two runs with the same seed produce the same data.
//!
//! Usage: cargo run --bin seeder

use std::time::Duration;

use anyhow::Context;
use billet_core::invoice::{InvoiceHeader, ItemDraft};
use billet_db::entities::{
    agreements, bank_accounts, companies, organisations, products, units, vat_rates,
};
use billet_db::{CreateInvoiceInput, InvoiceRepository};
use billet_shared::AppConfig;
use chrono::{Days, NaiveDate};
use fake::Fake;
use fake::faker::company::en::{Buzzword, CompanyName};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

const DEFAULT_SEED: u64 = 42;
const COMPANY_COUNT: usize = 8;
const PRODUCT_COUNT: usize = 6;
const INVOICES_PER_ORGANISATION: usize = 5;

/// Ids of the seeded reference rows.
struct Reference {
    organisations: Vec<i64>,
    companies: Vec<i64>,
    products: Vec<(i64, Decimal, Option<i64>)>,
    units: Vec<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let seed = std::env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);
    let mut rng = StdRng::seed_from_u64(seed);

    let config = AppConfig::load().context("Failed to load configuration")?;

    println!("Connecting to database...");
    let db = billet_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    if organisations::Entity::find().count(&db).await? > 0 {
        println!("Database already seeded, skipping...");
        return Ok(());
    }

    println!("Seeding reference data (seed {seed})...");
    let reference = seed_reference(&db, &mut rng).await?;

    println!("Seeding demo invoices...");
    seed_invoices(&db, &reference, &mut rng).await?;

    println!("Seeding complete!");
    Ok(())
}

async fn seed_reference(db: &DatabaseConnection, rng: &mut StdRng) -> anyhow::Result<Reference> {
    let mut organisation_ids = Vec::new();
    for name in ["Northwind Consulting", "Blue Harbour Studio"] {
        let organisation = organisations::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        bank_accounts::ActiveModel {
            organisation_id: Set(organisation.id),
            is_default: Set(true),
            name: Set(format!("{name} current account")),
            ..Default::default()
        }
        .insert(db)
        .await?;

        organisation_ids.push(organisation.id);
    }

    let mut company_ids = Vec::new();
    for _ in 0..COMPANY_COUNT {
        let name: String = CompanyName().fake_with_rng(rng);
        let company = companies::ActiveModel {
            name: Set(name.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        agreements::ActiveModel {
            company_id: Set(company.id),
            name: Set(format!("{name} framework agreement")),
            ..Default::default()
        }
        .insert(db)
        .await?;

        company_ids.push(company.id);
    }

    let mut unit_ids = Vec::new();
    for (code, name) in [("h", "Hour"), ("pc", "Piece"), ("mo", "Month")] {
        let unit = units::ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        unit_ids.push(unit.id);
    }

    let mut rate_ids = Vec::new();
    let rates = [
        (0_u32, "Exempt", false),
        (10, "Reduced", false),
        (20, "Standard", true),
    ];
    for (rate, name, is_default) in rates {
        let vat_rate = vat_rates::ActiveModel {
            is_active: Set(true),
            is_default: Set(is_default),
            rate: Set(Decimal::from(rate)),
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        rate_ids.push(vat_rate.id);
    }

    let mut product_rows = Vec::new();
    for _ in 0..PRODUCT_COUNT {
        let name: String = Buzzword().fake_with_rng(rng);
        let price = Decimal::new(rng.random_range(1_000..=50_000), 2);
        let unit_id = unit_ids[rng.random_range(0..unit_ids.len())];
        let vat_rate_id = rate_ids[rng.random_range(0..rate_ids.len())];
        let product = products::ActiveModel {
            is_active: Set(true),
            name: Set(format!("{name} service")),
            price: Set(price),
            unit_id: Set(Some(unit_id)),
            vat_rate_id: Set(Some(vat_rate_id)),
            ..Default::default()
        }
        .insert(db)
        .await?;
        product_rows.push((product.id, price, product.vat_rate_id));
    }

    Ok(Reference {
        organisations: organisation_ids,
        companies: company_ids,
        products: product_rows,
        units: unit_ids,
    })
}

async fn seed_invoices(
    db: &DatabaseConnection,
    reference: &Reference,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let invoices = InvoiceRepository::new(db.clone()).with_deadline(Duration::from_secs(10));
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    for &organisation_id in &reference.organisations {
        for _ in 0..INVOICES_PER_ORGANISATION {
            let company_id = reference.companies[rng.random_range(0..reference.companies.len())];
            let date = start
                .checked_add_days(Days::new(rng.random_range(0..365)))
                .unwrap_or(start);

            let line_count = rng.random_range(1..=4);
            let items = (0..line_count)
                .map(|position| draft_line(reference, rng, position))
                .collect();

            let invoice = invoices
                .create(CreateInvoiceInput {
                    header: InvoiceHeader {
                        is_active: true,
                        date,
                        number: None,
                        organisation_id: Some(organisation_id),
                        bank_account_id: None,
                        company_id: Some(company_id),
                        agreement_id: None,
                    },
                    items,
                    user_id: None,
                })
                .await?;

            println!(
                "  Invoice {} for organisation {organisation_id}: amount {} vat {}",
                invoice.number, invoice.amount, invoice.vat
            );
        }
    }

    Ok(())
}

fn draft_line(reference: &Reference, rng: &mut StdRng, position: i32) -> ItemDraft {
    let (product_id, price, vat_rate_id) =
        reference.products[rng.random_range(0..reference.products.len())];
    let unit_id = reference.units[rng.random_range(0..reference.units.len())];

    ItemDraft {
        position,
        product_id: Some(product_id),
        description: Buzzword().fake_with_rng(rng),
        unit_id: Some(unit_id),
        quantity: Decimal::from(rng.random_range(1_u32..=20)),
        price,
        amount: None,
        discount_rate: if rng.random_ratio(1, 4) { 10 } else { 0 },
        discount: None,
        vat_rate_id,
        vat: None,
    }
}
