//! Crowdfund client command-line entry point.
//!
//! Drives the client stores against a live backend from a terminal and can
//! host the payment redirect listener. Every command prints its result as
//! pretty JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crowdfund::callback::{self, CallbackState};
use crowdfund::models::{Campaign, CommentInput, Recipient, RecipientInput};
use crowdfund::navigation::TracingNavigator;
use crowdfund::saga::PayoutRequest;
use crowdfund::stores::campaigns::{CampaignQuery, SortOrder};
use crowdfund::{AppContext, Config};

#[derive(Parser)]
#[command(name = "crowdfund")]
#[command(about = "Command-line client for the crowdfunding platform")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user's profile
    Whoami,

    /// Browse and manage campaigns
    Campaigns {
        #[command(subcommand)]
        action: CampaignCommand,
    },

    /// Start a donation and print the payment page URL
    Donate {
        campaign_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        fundraiser_id: String,
    },

    /// Verify a payment by its reference
    Verify { reference: String },

    /// List a campaign's rewards
    Rewards { campaign_id: String },

    /// List a campaign's comments, or post one with --post
    Comments {
        campaign_id: String,
        #[arg(long)]
        post: Option<String>,
        /// Required when posting without a session
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },

    /// List a campaign's progress updates
    Updates { campaign_id: String },

    /// Show leaderboards
    Leaderboard {
        /// Only the leaderboard of this campaign
        #[arg(long)]
        campaign: Option<String>,
        /// Entries of this leaderboard
        #[arg(long)]
        entries: Option<String>,
    },

    /// Show point balance and earned backer rewards
    Points {
        /// Backer rewards of this campaign instead of your own
        #[arg(long)]
        campaign: Option<String>,
    },

    /// List articles, or show one with --id
    Articles {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        id: Option<String>,
    },

    /// Pay campaign funds out to a bank account
    Payout {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        account_number: Option<String>,
        #[arg(long)]
        bank_code: Option<String>,
        #[arg(long, default_value = "NGN")]
        currency: String,
        /// Reuse a registered recipient instead of creating one
        #[arg(long)]
        recipient_code: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        campaign: Option<String>,
    },

    /// Listen for the payment processor's redirect back
    ServeCallback,
}

#[derive(Subcommand)]
enum CampaignCommand {
    /// Campaigns you own
    Mine,
    /// The public listing
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 12)]
        page_size: u32,
        #[arg(long, default_value = "created_at")]
        sort_by: String,
        #[arg(long, value_parser = ["asc", "desc"], default_value = "desc")]
        order: String,
        /// Extra filter as key=value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
    },
    Show { id: String },
    /// Dashboard statistics
    Stats,
    Favorites,
    Favorite { id: String },
    Unfavorite { id: String },
}

/// `campaigns show` output: the campaign plus its countdown.
#[derive(Serialize)]
struct CampaignView {
    #[serde(flatten)]
    campaign: Campaign,
    days_remaining: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env().map_err(|e| anyhow!("{e}"))?;
    let ctx = AppContext::build(config, Arc::new(TracingNavigator)).await?;

    match cli.command {
        Commands::Login { email, password } => {
            let user = ctx.auth.sign_in(&ctx.api, &email, &password).await?;
            print_json(&user)?;
        }
        Commands::Logout => {
            ctx.auth.logout().await?;
            println!("Logged out");
        }
        Commands::Whoami => {
            if !ctx.auth.session().is_authenticated() {
                bail!("Not logged in");
            }
            print_json(&ctx.profile.fetch_profile().await?)?;
        }
        Commands::Campaigns { action } => campaigns(&ctx, action).await?,
        Commands::Donate {
            campaign_id,
            email,
            amount,
            fundraiser_id,
        } => {
            let fundraiser_id = if fundraiser_id.is_empty() {
                campaign_id.clone()
            } else {
                fundraiser_id
            };
            let authorization = ctx
                .donations
                .create_donation_transaction(&email, &amount, &fundraiser_id, &campaign_id)
                .await?;
            print_json(&authorization)?;
            println!("Open {} to complete the payment", authorization.authorization_url);
        }
        Commands::Verify { reference } => {
            print_json(&ctx.donations.verify_transaction(&reference).await?)?;
        }
        Commands::Rewards { campaign_id } => {
            print_json(&ctx.rewards.fetch_rewards(&campaign_id).await?)?;
        }
        Commands::Comments {
            campaign_id,
            post,
            email,
            name,
        } => match post {
            Some(content) => {
                let input = CommentInput {
                    content,
                    email,
                    name,
                };
                print_json(&ctx.comments.create_comment(&campaign_id, &input).await?)?;
            }
            None => print_json(&ctx.comments.fetch_comments(&campaign_id).await?)?,
        },
        Commands::Updates { campaign_id } => {
            print_json(&ctx.updates.fetch_updates(&campaign_id).await?)?;
        }
        Commands::Leaderboard { campaign, entries } => match (campaign, entries) {
            (_, Some(id)) => print_json(&ctx.leaderboard.fetch_leaderboard_entries(&id).await?)?,
            (Some(id), None) => {
                print_json(&ctx.leaderboard.fetch_campaign_leaderboard(&id).await?)?
            }
            (None, None) => print_json(&ctx.leaderboard.fetch_leaderboards().await?)?,
        },
        Commands::Points { campaign } => match campaign {
            Some(id) => print_json(&ctx.points.fetch_campaign_backer_rewards(&id).await?)?,
            None => {
                print_json(&ctx.points.fetch_my_points().await?)?;
                print_json(&ctx.points.fetch_backer_rewards().await?)?;
            }
        },
        Commands::Articles { page, id } => match id {
            Some(id) => print_json(&ctx.articles.fetch_article_by_id(&id).await?)?,
            None => {
                print_json(&ctx.articles.fetch_articles(page).await?)?;
                print_json(&ctx.articles.snapshot().data.pagination)?;
            }
        },
        Commands::Payout {
            amount,
            name,
            account_number,
            bank_code,
            currency,
            recipient_code,
            reason,
            campaign,
        } => {
            let existing = recipient_code.map(|code| Recipient {
                recipient_code: code,
                ..Recipient::default()
            });
            if existing.is_none() && (account_number.is_none() || bank_code.is_none()) {
                bail!("--account-number and --bank-code are required without --recipient-code");
            }
            let request = PayoutRequest {
                recipient: RecipientInput {
                    name: name.unwrap_or_default(),
                    account_number: account_number.unwrap_or_default(),
                    bank_code: bank_code.unwrap_or_default(),
                    currency,
                },
                amount,
                reason,
                campaign_id: campaign,
            };
            let mut saga = ctx.payout(request, existing);
            let transfer = saga
                .run()
                .await
                .with_context(|| format!("payout stopped at {:?}", saga.stage()))?;
            print_json(&transfer)?;
        }
        Commands::ServeCallback => serve_callback(&ctx).await?,
    }

    Ok(())
}

async fn campaigns(ctx: &AppContext, action: CampaignCommand) -> anyhow::Result<()> {
    let store = &ctx.campaigns;
    match action {
        CampaignCommand::Mine => print_json(&store.fetch_campaigns().await?),
        CampaignCommand::List {
            page,
            page_size,
            sort_by,
            order,
            filters,
        } => {
            let query = CampaignQuery {
                sort_by,
                sort_order: if order == "asc" {
                    SortOrder::Asc
                } else {
                    SortOrder::Desc
                },
                page,
                page_size,
                filters: parse_filters(&filters)?,
            };
            print_json(&store.fetch_all_campaigns(&query).await?)?;
            print_json(&store.snapshot().data.pagination)
        }
        CampaignCommand::Show { id } => {
            let campaign = store.fetch_campaign_by_id(&id).await?;
            let days_remaining = campaign.days_remaining(Utc::now().date_naive());
            print_json(&CampaignView {
                campaign,
                days_remaining,
            })
        }
        CampaignCommand::Stats => print_json(&store.fetch_campaign_statistics().await?),
        CampaignCommand::Favorites => print_json(&store.fetch_favorited_campaigns().await?),
        CampaignCommand::Favorite { id } => print_json(&store.favorite_campaign(&id).await?),
        CampaignCommand::Unfavorite { id } => print_json(&store.unfavorite_campaign(&id).await?),
    }
}

async fn serve_callback(ctx: &AppContext) -> anyhow::Result<()> {
    let state = Arc::new(CallbackState {
        donations: ctx.donations.clone(),
    });
    let app = callback::router(state);

    let addr = format!("0.0.0.0:{}", ctx.config.callback_port);
    info!("Payment callback listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn parse_filters(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .ok_or_else(|| anyhow!("Filter '{pair}' is not key=value"))
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
