//! Test Request Producer
//!
//! Generates customer profiles and publishes them to NATS for pipeline testing.
//!
//! Usage: test_producer [nats_url] [subject] [count] [at_risk_rate] [invalid_rate] [delay_ms]
//!
//! Geography and gender values come from the encoder artifacts under
//! `CHURN_ARTIFACTS_DIR` (default `artifacts`).

use churn_prediction_pipeline::artifacts::{read_json, LabelEncoder, OneHotEncoder};
use churn_prediction_pipeline::config::AppConfig;
use churn_prediction_pipeline::CustomerProfile;
use rand::Rng;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const GEOGRAPHIES: [&str; 3] = ["France", "Germany", "Spain"];
const GENDERS: [&str; 2] = ["Female", "Male"];

/// Categorical values the generator draws from
#[derive(Debug, Clone, PartialEq)]
struct Vocabulary {
    geographies: Vec<String>,
    genders: Vec<String>,
}

impl Vocabulary {
    fn builtin() -> Self {
        Self {
            geographies: GEOGRAPHIES.iter().map(|s| s.to_string()).collect(),
            genders: GENDERS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Read the fitted encoder vocabularies, falling back to the built-in lists.
    fn load(dir: &Path) -> Self {
        let files = AppConfig::default().artifacts;
        let geo = read_json::<OneHotEncoder>(&dir.join(&files.geography_encoder_file));
        let gender = read_json::<LabelEncoder>(&dir.join(&files.gender_encoder_file));

        match (geo, gender) {
            (Ok(geo), Ok(gender)) if geo.validate().is_ok() && gender.validate().is_ok() => Self {
                geographies: geo.categories().to_vec(),
                genders: gender.classes().to_vec(),
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Using built-in vocabulary");
                Self::builtin()
            }
            _ => {
                warn!(dir = %dir.display(), "Encoder artifacts are invalid, using built-in vocabulary");
                Self::builtin()
            }
        }
    }
}

/// Customer profile generator for testing
struct ProfileGenerator {
    rng: rand::rngs::ThreadRng,
    customer_counter: u64,
    vocabulary: Vocabulary,
}

impl ProfileGenerator {
    fn new(vocabulary: Vocabulary) -> Self {
        Self {
            rng: rand::thread_rng(),
            customer_counter: 0,
            vocabulary,
        }
    }

    fn next_id(&mut self) -> Option<String> {
        self.customer_counter += 1;
        Some(format!("cust_{:08}", self.customer_counter))
    }

    /// Generate a typical, engaged customer
    fn generate_typical(&mut self) -> CustomerProfile {
        CustomerProfile {
            customer_id: self.next_id(),
            credit_score: self.rng.gen_range(500..=850),
            geography: self.random_geography(),
            gender: self.random_gender(),
            age: self.rng.gen_range(18..=50),
            tenure: self.rng.gen_range(0..=10),
            balance: if self.rng.gen_bool(0.35) {
                0.0
            } else {
                self.rng.gen_range(20_000.0..180_000.0)
            },
            num_products: self.rng.gen_range(1..=2),
            has_cr_card: u8::from(self.rng.gen_bool(0.7)),
            is_active_member: u8::from(self.rng.gen_bool(0.6)),
            estimated_salary: self.rng.gen_range(10_000.0..200_000.0),
        }
    }

    /// Generate a customer matching common churn signals
    fn generate_at_risk(&mut self) -> CustomerProfile {
        CustomerProfile {
            customer_id: self.next_id(),
            credit_score: self.rng.gen_range(350..=650),
            geography: self.preferred_geography("Germany"), // Highest churn share
            gender: self.random_gender(),
            age: self.rng.gen_range(45..=70), // Older customers
            tenure: self.rng.gen_range(0..=3),
            balance: self.rng.gen_range(90_000.0..250_000.0), // High balance
            num_products: self.rng.gen_range(3..=4),          // Many products
            has_cr_card: u8::from(self.rng.gen_bool(0.7)),
            is_active_member: 0, // Inactive
            estimated_salary: self.rng.gen_range(10_000.0..200_000.0),
        }
    }

    /// Generate a profile the pipeline must reject
    fn generate_invalid(&mut self) -> CustomerProfile {
        let mut profile = self.generate_typical();
        match self.rng.gen_range(0..3) {
            0 => profile.geography = "Atlantis".to_string(),
            1 => profile.age = self.rng.gen_range(0..18),
            _ => profile.num_products = 7,
        }
        profile
    }

    fn generate(&mut self, at_risk_rate: f64, invalid_rate: f64) -> (CustomerProfile, Kind) {
        let roll: f64 = self.rng.gen();
        if roll < invalid_rate {
            (self.generate_invalid(), Kind::Invalid)
        } else if roll < invalid_rate + at_risk_rate {
            (self.generate_at_risk(), Kind::AtRisk)
        } else {
            (self.generate_typical(), Kind::Typical)
        }
    }

    fn random_geography(&mut self) -> String {
        let index = self.rng.gen_range(0..self.vocabulary.geographies.len());
        self.vocabulary.geographies[index].clone()
    }

    fn random_gender(&mut self) -> String {
        let index = self.rng.gen_range(0..self.vocabulary.genders.len());
        self.vocabulary.genders[index].clone()
    }

    fn preferred_geography(&mut self, preferred: &str) -> String {
        if self.vocabulary.geographies.iter().any(|g| g == preferred) {
            preferred.to_string()
        } else {
            self.random_geography()
        }
    }
}

#[derive(Default)]
struct Tally {
    typical: u64,
    at_risk: u64,
    invalid: u64,
}

enum Kind {
    Typical,
    AtRisk,
    Invalid,
}

impl Tally {
    fn add(&mut self, kind: &Kind) {
        match kind {
            Kind::Typical => self.typical += 1,
            Kind::AtRisk => self.at_risk += 1,
            Kind::Invalid => self.invalid += 1,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Request Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("churn.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let invalid_rate: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let delay_ms: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(100);
    let artifacts_dir =
        std::env::var("CHURN_ARTIFACTS_DIR").unwrap_or_else(|_| "artifacts".to_string());
    let vocabulary = Vocabulary::load(Path::new(&artifacts_dir));

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        at_risk_rate = at_risk_rate,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        geographies = ?vocabulary.geographies,
        genders = ?vocabulary.genders,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(vocabulary, count, at_risk_rate, invalid_rate, delay_ms).await;
        }
    };

    let mut generator = ProfileGenerator::new(vocabulary);
    let mut tally = Tally::default();

    info!("Starting to publish {} customer profiles...", count);

    for i in 0..count {
        let (profile, kind) = generator.generate(at_risk_rate, invalid_rate);
        tally.add(&kind);

        let payload = serde_json::to_vec(&profile)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} profiles ({} typical, {} at risk, {} invalid)",
                i + 1,
                count,
                tally.typical,
                tally.at_risk,
                tally.invalid
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} profiles ({} typical, {} at risk, {} invalid)",
        count, tally.typical, tally.at_risk, tally.invalid
    );

    Ok(())
}

async fn run_dry_mode(
    vocabulary: Vocabulary,
    count: u64,
    at_risk_rate: f64,
    invalid_rate: f64,
    delay_ms: u64,
) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ProfileGenerator::new(vocabulary);

    for i in 0..count {
        let (profile, _) = generator.generate(at_risk_rate, invalid_rate);
        let json = serde_json::to_string_pretty(&profile)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample profile {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
