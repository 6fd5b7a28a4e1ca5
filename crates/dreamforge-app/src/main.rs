//! DreamForge: Application entry point.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dreamforge_access::{
    BillingService, CreditLedger, Denial, GalleryService, GenerationService, SubscriptionListener,
    SubscriptionState, denial, plan_catalogue,
};
use dreamforge_core::error::DreamforgeError;
use dreamforge_core::gateway::SubscriptionAuthority;
use dreamforge_core::models::creation::Creation;
use dreamforge_core::models::entitlement::{Capability, Resolution};
use dreamforge_core::models::generation::{GenerationRequest, Visibility};
use dreamforge_core::models::session::Session;
use dreamforge_core::models::tier::SubscriptionTier;
use dreamforge_db::repository::SurrealCreationRepository;
use dreamforge_remote::{StabilityClient, SupabaseClient};
use surrealdb::engine::remote::ws::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, CONFIG_ENV};

#[derive(Parser)]
#[command(name = "dreamforge")]
#[command(about = "AI image generation with plan-based access", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available plans and what they include
    Plans,

    /// Show the current plan and remaining credits
    Status,

    /// Generate images from a prompt and save them
    Generate {
        /// Text prompt
        prompt: String,

        /// Output resolution: 512, 1024 or 4K (default: the plan's best, up to 1024)
        #[arg(long, value_parser = parse_resolution)]
        resolution: Option<Resolution>,

        /// Number of images
        #[arg(long, default_value_t = 1)]
        samples: u32,

        /// What the image should not contain
        #[arg(long)]
        negative: Option<String>,

        #[arg(long)]
        seed: Option<u32>,

        /// Keep the creations out of the public gallery
        #[arg(long)]
        private: bool,
    },

    /// Browse saved creations
    Gallery {
        #[arg(value_enum, default_value_t = GalleryView::Recent)]
        view: GalleryView,
    },

    /// Start a checkout for a paid plan
    Checkout {
        /// Plan to buy: pro or studio
        tier: SubscriptionTier,
    },

    /// Open the subscription management portal
    Portal,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GalleryView {
    Recent,
    Trending,
    Contest,
    Mine,
}

fn parse_resolution(value: &str) -> Result<Resolution, String> {
    Resolution::parse(value).ok_or_else(|| format!("unknown resolution '{value}'"))
}

/// Resolution used when none is given: the plan's maximum, capped at
/// the standard size.
fn default_resolution(max: Resolution) -> Resolution {
    max.min(Resolution::default())
}

/// Collaborators shared by every command.
struct App {
    config: AppConfig,
    supabase: SupabaseClient,
    state: Arc<SubscriptionState<SupabaseClient>>,
    _listener: SubscriptionListener,
}

impl App {
    fn new(config: AppConfig) -> Result<Self> {
        let supabase = SupabaseClient::new(config.supabase.clone())?;
        let ledger = Arc::new(CreditLedger::with_system_clock(
            SubscriptionTier::Community,
            config.access.reset_period,
        ));
        let state = Arc::new(SubscriptionState::new(supabase.clone(), ledger));
        let listener = state.listen(supabase.auth_events());
        Ok(Self {
            config,
            supabase,
            state,
            _listener: listener,
        })
    }

    async fn session(&self) -> Result<Session> {
        self.supabase
            .get_session()
            .await?
            .ok_or_else(|| DreamforgeError::AuthenticationRequired.into())
    }

    async fn creations(&self) -> Result<SurrealCreationRepository<Client>> {
        dreamforge_db::open(&self.config.db)
            .await
            .context("opening the creation store")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("dreamforge=info".parse()?))
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    if let Commands::Plans = cli.command {
        print_plans();
        return Ok(());
    }

    let app = App::new(config)?;
    let subscription = app.state.refresh().await;
    info!(tier = %subscription.tier, "Subscription loaded");

    let result = run(&app, cli.command).await;
    if let Err(err) = &result {
        explain_denial(err);
    }
    result
}

async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Plans => print_plans(),
        Commands::Status => print_status(app),
        Commands::Generate {
            prompt,
            resolution,
            samples,
            negative,
            seed,
            private,
        } => {
            let session = app.session().await?;
            let max_resolution = app.state.gate().entitlements().max_resolution;
            let resolution = resolution.unwrap_or_else(|| default_resolution(max_resolution));
            let mut request = GenerationRequest::new(prompt)
                .with_resolution(resolution)
                .with_samples(samples);
            if let Some(negative) = negative {
                request = request.with_negative_prompt(negative);
            }
            if let Some(seed) = seed {
                request = request.with_seed(seed);
            }
            if private {
                request = request.with_visibility(Visibility::Private);
            }

            let service = GenerationService::new(
                StabilityClient::new(app.config.stability.clone())?,
                app.creations().await?,
                app.state.gate(),
                Arc::clone(app.state.ledger()),
                app.config.access.clone(),
            );
            let outcome = service.generate(session.user_id, request).await?;
            for creation in &outcome.creations {
                print_creation(creation);
            }
            println!(
                "Spent {} credits, {}",
                outcome.credits_spent, outcome.balance
            );
        }
        Commands::Gallery { view } => {
            let gallery = GalleryService::new(
                app.creations().await?,
                app.state.gate(),
                app.config.access.clone(),
            );
            let items = match view {
                GalleryView::Recent => gallery.recent_public().await?,
                GalleryView::Trending => gallery.trending().await?,
                GalleryView::Contest => gallery.contest_entries().await?,
                GalleryView::Mine => gallery.my_creations(app.session().await?.user_id).await?,
            };
            if items.is_empty() {
                println!("No creations yet.");
            }
            for creation in &items {
                print_creation(creation);
            }
        }
        Commands::Checkout { tier } => {
            let url = billing(app).start_checkout(tier).await?;
            println!("{url}");
        }
        Commands::Portal => {
            let url = billing(app).manage_subscription().await?;
            println!("{url}");
        }
    }
    Ok(())
}

fn billing(app: &App) -> BillingService<SupabaseClient, SupabaseClient> {
    BillingService::new(
        app.supabase.clone(),
        app.supabase.clone(),
        app.config.access.clone(),
    )
}

fn print_plans() {
    for plan in plan_catalogue() {
        let entitlements = plan.entitlements;
        println!(
            "{:<10} ${}.{:02}/month  {} generations/day  up to {}  {} features",
            plan.tier.as_str(),
            plan.monthly_price_cents / 100,
            plan.monthly_price_cents % 100,
            entitlements.generation_limit,
            entitlements.max_resolution,
            entitlements.capabilities.len(),
        );
    }
}

fn print_status(app: &App) {
    let subscription = app.state.current();
    let gate = app.state.gate();
    println!("Plan: {}", subscription.tier);
    match subscription.renews_at {
        Some(renews_at) => println!("Renews: {}", renews_at.format("%Y-%m-%d")),
        None => println!("Renews: never"),
    }
    println!("Credits: {}", app.state.ledger().balance());
    println!("Max resolution: {}", gate.entitlements().max_resolution);
    if let Ok(suggestions) = gate.prompt_suggestions() {
        println!("Prompt ideas:");
        for suggestion in suggestions {
            println!("  - {suggestion}");
        }
    }
}

fn print_creation(creation: &Creation) {
    let visibility = if creation.is_public { "public" } else { "private" };
    println!(
        "{}  {:<53}  {} likes  {visibility}",
        creation.id, creation.title, creation.likes_count
    );
}

/// The upgrade notice for `err`, when it is a capability denial.
fn denial_notice(err: &anyhow::Error) -> Option<Denial> {
    match err.downcast_ref::<DreamforgeError>()? {
        DreamforgeError::FeatureDenied { feature, .. } => {
            Capability::from_feature(feature).map(denial)
        }
        _ => None,
    }
}

fn explain_denial(err: &anyhow::Error) {
    if let Some(notice) = denial_notice(err) {
        eprintln!("{}: {}", notice.title, notice.description);
    }
}
