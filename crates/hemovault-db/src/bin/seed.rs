//! # Seed Data Generator
//!
//! Populates the database with test data for development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 donors (default)
//! cargo run -p hemovault-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p hemovault-db --bin seed -- --donors 200
//!
//! # Specify database path
//! cargo run -p hemovault-db --bin seed -- --db ./data/hemovault.db
//! ```
//!
//! ## Generated Data
//! - Donors spread across all eight blood groups, a mix of first-timers and
//!   donors with a donation history (so the eligibility roster shows both)
//! - A small staff roster (one per role)
//! - A handful of hospitals
//! - Starting stock per blood group
//! - A queue of open requests with mixed urgency and deadlines

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use tracing_subscriber::EnvFilter;

use hemovault_core::{
    BloodGroup, NewDonor, NewHospital, NewRequest, NewStaff, StaffRole, Units, UrgencyLevel,
};
use hemovault_db::{Database, DbConfig};

/// First names cycled through generated donors.
const FIRST_NAMES: &[&str] = &[
    "Aarav", "Vivaan", "Aditya", "Arjun", "Sai", "Reyansh", "Krishna", "Ishaan", "Rohan", "Kabir",
    "Ananya", "Diya", "Saanvi", "Aadhya", "Kiara", "Meera", "Isha", "Priya", "Riya", "Tara",
];

/// Last names cycled through generated donors.
const LAST_NAMES: &[&str] = &[
    "Sharma", "Verma", "Patel", "Nair", "Iyer", "Reddy", "Singh", "Kumar", "Das", "Mehta",
    "Joshi", "Kulkarni", "Chopra", "Malhotra", "Bose",
];

/// Cities with their states.
const CITIES: &[(&str, &str)] = &[
    ("Pune", "Maharashtra"),
    ("Mumbai", "Maharashtra"),
    ("Bengaluru", "Karnataka"),
    ("Chennai", "Tamil Nadu"),
    ("Hyderabad", "Telangana"),
    ("Delhi", "Delhi"),
];

/// Hospitals registered by the seed.
const HOSPITALS: &[(&str, &str, &str, &str)] = &[
    ("City Care Hospital", "Multi-specialty", "Dr. Rao", "MH-BB-1001"),
    ("Sunrise Medical Centre", "General", "Dr. Kapoor", "MH-BB-1002"),
    ("Lakeview Children's Hospital", "Pediatric", "Dr. Menon", "KA-BB-2001"),
    ("St. Mary's Hospital", "Multi-specialty", "Dr. D'Souza", "TN-BB-3001"),
];

/// Starting stock per blood group (units).
const INITIAL_STOCK: &[(BloodGroup, i64)] = &[
    (BloodGroup::APositive, 25),
    (BloodGroup::ANegative, 8),
    (BloodGroup::BPositive, 30),
    (BloodGroup::BNegative, 5),
    (BloodGroup::ABPositive, 12),
    (BloodGroup::ABNegative, 3),
    (BloodGroup::OPositive, 40),
    (BloodGroup::ONegative, 10),
];

/// Open requests per hospital: (hospital index, group, units, due in days, urgency).
const OPEN_REQUESTS: &[(usize, BloodGroup, i64, i64, UrgencyLevel)] = &[
    (0, BloodGroup::ONegative, 4, 1, UrgencyLevel::Critical),
    (1, BloodGroup::APositive, 2, 3, UrgencyLevel::Urgent),
    (2, BloodGroup::BPositive, 6, 7, UrgencyLevel::Normal),
    (3, BloodGroup::ABNegative, 1, 2, UrgencyLevel::Urgent),
    (0, BloodGroup::OPositive, 3, 10, UrgencyLevel::Normal),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for query-level detail; default keeps the output clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,hemovault=info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut donor_count: usize = 50;
    let mut db_path = String::from("./hemovault_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--donors" | "-n" => {
                if i + 1 < args.len() {
                    donor_count = args[i + 1].parse().unwrap_or(50);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("HemoVault Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --donors <N>   Number of donors to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./hemovault_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🩸 HemoVault Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Donors:   {}", donor_count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing donors
    let existing = db.donors().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} donors", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();

    // Staff: one member per role
    println!();
    println!("Registering staff...");
    for (idx, role) in [
        StaffRole::Admin,
        StaffRole::Technician,
        StaffRole::Nurse,
        StaffRole::Doctor,
    ]
    .into_iter()
    .enumerate()
    {
        let staff = NewStaff {
            first_name: FIRST_NAMES[idx].to_string(),
            last_name: LAST_NAMES[idx].to_string(),
            email: format!("staff{}@hemovault.example", idx + 1),
            phone: format!("98220{:05}", idx + 1),
            role,
            hire_date: today - Duration::days(400 + idx as i64 * 30),
        };
        db.staff().insert(&staff).await?;
    }
    println!("  Registered 4 staff members");

    // Hospitals
    println!("Registering hospitals...");
    let mut hospital_ids = Vec::with_capacity(HOSPITALS.len());
    for (idx, (name, kind, contact, license)) in HOSPITALS.iter().enumerate() {
        let (city, state) = CITIES[idx % CITIES.len()];
        let hospital = NewHospital {
            hospital_name: name.to_string(),
            hospital_type: kind.to_string(),
            contact_person: contact.to_string(),
            email: format!("hospital{}@hemovault.example", idx + 1),
            phone: format!("020-25{:05}", idx + 100),
            address: format!("{} Hospital Road", idx + 1),
            city: city.to_string(),
            state: state.to_string(),
            pincode: Some(format!("4110{:02}", idx + 1)),
            license_number: license.to_string(),
        };
        let registered = db.hospitals().insert(&hospital).await?;
        hospital_ids.push(registered.hospital_id);
    }
    println!("  Registered {} hospitals", HOSPITALS.len());

    // Donors
    println!("Generating donors...");
    let start = std::time::Instant::now();
    let mut generated = 0;

    for seed in 0..donor_count {
        let donor = generate_donor(seed, today);
        if let Err(e) = db.donors().insert(&donor).await {
            eprintln!("Failed to insert donor {}: {}", donor.email, e);
            continue;
        }
        generated += 1;

        if generated % 100 == 0 {
            println!("  Generated {} donors...", generated);
        }
    }

    let elapsed = start.elapsed();
    println!("  Generated {} donors in {:?}", generated, elapsed);

    // Starting stock
    println!("Stocking shelves...");
    let mut conn = db.pool().acquire().await?;
    for (group, units) in INITIAL_STOCK {
        db.stock()
            .credit(&mut conn, *group, Units::new(*units), None)
            .await?;
    }
    drop(conn);

    let below = db.stock().count_below_threshold().await?;
    println!(
        "  Stocked {} groups ({} below threshold)",
        INITIAL_STOCK.len(),
        below
    );

    // Open requests so the pending queue has content on first launch
    println!("Registering blood requests...");
    for (hospital_idx, blood_group, units, due_in_days, urgency) in OPEN_REQUESTS {
        let request = NewRequest {
            hospital_id: hospital_ids[hospital_idx % hospital_ids.len()],
            blood_group: *blood_group,
            units_requested: Units::new(*units),
            request_date: today,
            required_by_date: today + Duration::days(*due_in_days),
            urgency_level: *urgency,
            remarks: None,
        };
        db.requests().insert(&request).await?;
    }
    println!("  Registered {} open requests", OPEN_REQUESTS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single donor with deterministic pseudo-random data.
fn generate_donor(seed: usize, today: NaiveDate) -> NewDonor {
    let first_name = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last_name = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];
    let blood_group = BloodGroup::ALL[seed % BloodGroup::ALL.len()];
    let (city, state) = CITIES[seed % CITIES.len()];

    // birth years 1970-2005; day capped at 27 so every month is valid
    let birth_year = 1970 + (seed as i32 * 7) % 36;
    let date_of_birth = NaiveDate::from_ymd_opt(birth_year, (seed as u32 % 12) + 1, (seed as u32 % 27) + 1)
        .unwrap_or_default();

    // every third donor has donated before; stagger how long ago so some are
    // inside the 90-day window and some past it
    let last_donation_date = if seed % 3 == 0 {
        Some(today - Duration::days(20 + (seed as i64 * 13) % 160))
    } else {
        None
    };

    NewDonor {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}.{}{}@example.com", first_name.to_lowercase(), last_name.to_lowercase(), seed),
        phone: format!("98{:08}", 10000000 + seed),
        blood_group,
        date_of_birth,
        gender: if seed % 2 == 0 { "Male" } else { "Female" }.to_string(),
        address: None,
        city: Some(city.to_string()),
        state: Some(state.to_string()),
        pincode: None,
        last_donation_date,
    }
}
