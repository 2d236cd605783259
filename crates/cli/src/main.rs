//! C2C Cars CLI - browse, sell and manage vehicle listings from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session token is kept in ~/.c2c/storage.json)
//! c2c login -e asha@example.com -p 'Secret123'
//!
//! # Browse listings
//! c2c listings browse --category bikes --city Pune --max-price 200000
//!
//! # Publish a listing
//! c2c listings create --title "Maruti Swift VXi 2019" \
//!     --description "Petrol, 41,000 km, single owner" \
//!     --price 450000 --city Pune --image https://img.example.com/swift.jpg
//!
//! # Your listings
//! c2c listings mine
//! ```
//!
//! # Environment
//!
//! See `c2c_client::config` for API settings. `SENTRY_DSN` and
//! `SENTRY_ENVIRONMENT` enable error tracking. `RUST_LOG` overrides the
//! default `c2c=info` log filter; logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use c2c_client::{ClientConfig, Marketplace};
use c2c_core::validation::{ListingForm, RegisterForm};
use c2c_core::{
    Availability, Category, ListingFilters, ListingId, ListingUpdate, Price, ProfileUpdate,
};
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

mod commands;
mod render;

use render::Renderer;

#[derive(Parser)]
#[command(name = "c2c")]
#[command(author, version, about = "C2C Cars peer-to-peer vehicle marketplace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password
        #[arg(short, long)]
        confirm_password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse and manage listings
    Listings {
        #[command(subcommand)]
        action: ListingsAction,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Print credentials for the hosted image uploader
    UploadAuth,
}

#[derive(Subcommand)]
enum ListingsAction {
    /// Browse all listings
    Browse {
        /// `cars`, `bikes`, `suv` or `luxury`
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        min_price: Option<i64>,
        #[arg(long)]
        max_price: Option<i64>,
        /// `available` or `sold`
        #[arg(long)]
        availability: Option<Availability>,
        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one listing
    Show { id: String },
    /// List your own listings
    Mine,
    /// Publish a new listing
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "cars")]
        category: String,
        /// Price in rupees; digit grouping is allowed (`4,50,000`)
        #[arg(long)]
        price: String,
        #[arg(long)]
        city: String,
        /// Image URL; repeat for more photos, the first is the cover
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Change fields of one of your listings
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        /// Price in rupees
        #[arg(long)]
        price: Option<i64>,
        #[arg(long)]
        city: Option<String>,
        /// Replace all images; repeat for more photos
        #[arg(long = "image")]
        images: Vec<Url>,
        #[arg(long)]
        availability: Option<Availability>,
    },
    /// Delete one of your listings
    Delete { id: String },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show your profile
    Show,
    /// Change profile fields
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        /// Profile photo URL
        #[arg(long)]
        image: Option<String>,
    },
}

/// Initialize Sentry error tracking when `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load .env before reading SENTRY_DSN
    let _ = dotenvy::dotenv();
    let sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "c2c=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if sentry_guard.is_some() {
        tracing::debug!("Sentry initialized");
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> commands::CommandResult {
    let config = ClientConfig::from_env()?;
    let market = Marketplace::new(&config)?;
    let stdout = std::io::stdout();
    let out = &mut Renderer::new(stdout.lock());

    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&market, out, email, password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                full_name: name,
                email,
                password,
                confirm_password,
            };
            commands::auth::register(&market, out, form).await?;
        }
        Commands::Logout => commands::auth::logout(&market, out).await?,
        Commands::Whoami => commands::auth::whoami(&market, out).await?,
        Commands::Listings { action } => run_listings(&market, out, action).await?,
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&market, out).await?,
            ProfileAction::Update {
                name,
                city,
                country,
                image,
            } => {
                let update = ProfileUpdate {
                    full_name: name,
                    city,
                    country,
                    profile_image: image,
                };
                commands::profile::update(&market, out, update).await?;
            }
        },
        Commands::UploadAuth => commands::listings::upload_auth(&market, out).await?,
    }
    Ok(())
}

async fn run_listings<W: std::io::Write>(
    market: &Marketplace,
    out: &mut Renderer<W>,
    action: ListingsAction,
) -> commands::CommandResult {
    match action {
        ListingsAction::Browse {
            category,
            city,
            min_price,
            max_price,
            availability,
            search,
        } => {
            let filters = ListingFilters {
                category,
                city,
                min_price,
                max_price,
                availability,
                search,
            };
            commands::listings::browse(market, out, &filters).await
        }
        ListingsAction::Show { id } => {
            commands::listings::show(market, out, &ListingId::new(id)).await
        }
        ListingsAction::Mine => commands::listings::mine(market, out).await,
        ListingsAction::Create {
            title,
            description,
            category,
            price,
            city,
            images,
        } => {
            let form = ListingForm {
                title,
                description,
                category,
                price,
                city,
                images,
            };
            commands::listings::create(market, out, &form).await
        }
        ListingsAction::Update {
            id,
            title,
            description,
            category,
            price,
            city,
            images,
            availability,
        } => {
            let update = ListingUpdate {
                title,
                description,
                category,
                price: price.map(Price::from_rupees),
                city,
                images: (!images.is_empty()).then_some(images),
                availability,
            };
            commands::listings::update(market, out, &ListingId::new(id), &update).await
        }
        ListingsAction::Delete { id } => {
            commands::listings::delete(market, out, &ListingId::new(id)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_browse_filters() {
        let cli = Cli::try_parse_from([
            "c2c", "listings", "browse", "--category", "suv", "--max-price", "900000",
        ])
        .map_err(|e| e.to_string());
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::Listings {
                    action: ListingsAction::Browse {
                        category: Some(Category::Suv),
                        max_price: Some(900_000),
                        ..
                    }
                }
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["c2c", "listings", "browse", "--category", "trucks"]).is_err());
    }
}
