//! Command line surface over the curation core.
//!
//! The active session lives in the local storage file, so consecutive invocations
//! behave like one storefront visit: pick a package, add items, save a draft,
//! submit, check out.

use crate::{
    config::settings::Settings,
    core::{
        cart,
        catalog::{self, CatalogKind},
        curation,
        money::format_naira,
        package::PackageDetails,
        selection::SelectionChange,
        session::CurationSession,
        storage::SharedStore,
        users::{self, NewUser, ProfileUpdate, Role, UserProfile},
    },
    errors::{Error, Result},
};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared handles every command runs against.
pub struct AppContext {
    pub db: DatabaseConnection,
    pub settings: Settings,
    pub store: SharedStore,
}

impl AppContext {
    fn session(&self) -> Result<CurationSession> {
        CurationSession::restore(Arc::clone(&self.store), self.settings.draft_matching)
    }
}

#[derive(Debug, Parser)]
#[command(name = "curation-buddy", about = "Build and order curated gift packages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Insert the catalog from config.toml, skipping existing categories
    Seed,
    /// List categories of one catalog
    Categories {
        #[arg(long, default_value = "custom")]
        kind: CatalogKind,
    },
    /// List the items of a category
    Items { category_id: i64 },
    /// Create a user profile
    RegisterUser(RegisterUserArgs),
    /// Replace a user's username, email and phone number
    UpdateProfile(UpdateProfileArgs),
    /// Give a user a referral code
    RegisterAffiliate {
        #[arg(long)]
        user: String,
        #[arg(long)]
        code: String,
    },
    /// Start a new package, emptying the current selection
    Package(PackageArgs),
    /// Select or deselect a single-unit item
    Toggle { item_id: i64 },
    /// Add one unit of an item
    Add { item_id: i64 },
    /// Remove one unit of an item
    Decrement { item_id: i64 },
    /// Remove an item entirely
    Remove { item_id: i64 },
    /// Empty the selection
    Clear,
    /// Show the current package, selection and totals
    Show,
    /// Save the current session as a draft
    SaveDraft,
    /// List saved drafts at current prices
    Drafts,
    /// Load a saved draft into the session
    Resume { id: Uuid },
    /// Delete a saved draft
    DeleteDraft { id: Uuid },
    /// Submit the current session as an order
    Submit {
        #[arg(long, env = "CURATION_USER_ID")]
        user: String,
        /// Delete the draft the order came from
        #[arg(long)]
        delete_draft: bool,
    },
    /// Drop the current session
    Reset,
    /// List the orders in a user's cart
    Cart {
        #[arg(long, env = "CURATION_USER_ID")]
        user: String,
    },
    /// Move a user's cart into purchases with a payment reference
    Checkout {
        #[arg(long, env = "CURATION_USER_ID")]
        user: String,
        #[arg(long)]
        reference: String,
    },
    /// List a user's purchases
    Purchases {
        #[arg(long, env = "CURATION_USER_ID")]
        user: String,
    },
}

#[derive(Debug, Args)]
struct RegisterUserArgs {
    #[arg(long)]
    id: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long, default_value = "customer")]
    role: Role,
}

#[derive(Debug, Args)]
struct UpdateProfileArgs {
    #[arg(long, env = "CURATION_USER_ID")]
    user: String,
    #[arg(long)]
    email: String,
    /// Leave empty to clear
    #[arg(long, default_value = "")]
    username: String,
    /// Leave empty to clear
    #[arg(long, default_value = "")]
    phone: String,
}

#[derive(Debug, Args)]
struct PackageArgs {
    #[arg(long)]
    name: String,
    /// Total budget including the packaging fee
    #[arg(long)]
    budget: Option<Decimal>,
    #[arg(long)]
    referral: Option<String>,
}

impl Cli {
    /// Runs the parsed command.
    pub async fn run(self, ctx: &AppContext) -> Result<()> {
        match self.command {
            Commands::Seed => {
                let created = catalog::seed_catalog(&ctx.db, &ctx.settings.categories).await?;
                println!("seeded {created} categories");
            }
            Commands::Categories { kind } => {
                for category in catalog::list_categories(&ctx.db, kind).await? {
                    println!("{:>4}  {}", category.id, category.name);
                }
            }
            Commands::Items { category_id } => {
                for item in catalog::list_items(&ctx.db, category_id).await? {
                    let unit = if item.quantifiable { "per unit" } else { "single" };
                    println!(
                        "{:>4}  {}  {} ({unit})",
                        item.id,
                        item.name,
                        format_naira(item.price)
                    );
                }
            }
            Commands::RegisterUser(args) => {
                let profile = users::register_user(
                    &ctx.db,
                    NewUser {
                        id: args.id,
                        email: args.email,
                        role: args.role,
                        username: args.username,
                        phone_number: args.phone,
                    },
                )
                .await?;
                println!("registered {} ({})", profile.display_name(), profile.role);
            }
            Commands::UpdateProfile(args) => {
                let profile = users::update_profile(
                    &ctx.db,
                    &args.user,
                    ProfileUpdate {
                        username: args.username,
                        email: args.email,
                        phone_number: args.phone,
                    },
                )
                .await?;
                println!("updated {} ({})", profile.display_name(), profile.email);
            }
            Commands::RegisterAffiliate { user, code } => {
                let affiliate = users::register_affiliate(&ctx.db, &user, &code).await?;
                println!("affiliate code {} registered", affiliate.code);
            }
            Commands::Package(args) => {
                let package = PackageDetails::new(args.name, args.budget, args.referral)?;
                let mut session = ctx.session()?;
                session.start_package(package);
                print_session(&session)?;
            }
            Commands::Toggle { item_id } => {
                mutate(ctx, item_id, |session| session.toggle(item_id)).await?;
            }
            Commands::Add { item_id } => {
                mutate(ctx, item_id, |session| session.increment(item_id)).await?;
            }
            Commands::Decrement { item_id } => {
                mutate(ctx, item_id, |session| session.decrement(item_id)).await?;
            }
            Commands::Remove { item_id } => {
                mutate(ctx, item_id, |session| session.remove(item_id)).await?;
            }
            Commands::Clear => {
                let mut session = ctx.session()?;
                session.clear()?;
                print_session(&session)?;
            }
            Commands::Show => {
                let mut session = ctx.session()?;
                session.refresh_prices(&ctx.db).await?;
                print_session(&session)?;
            }
            Commands::SaveDraft => {
                let mut session = ctx.session()?;
                let draft = session.save_draft()?;
                println!("saved draft {} ({})", draft.id, draft.package.name());
            }
            Commands::Drafts => {
                let session = ctx.session()?;
                let drafts = session.drafts().list_all()?;
                if drafts.is_empty() {
                    println!("no saved drafts");
                }
                for draft in drafts {
                    let resolved = curation::resolve_items(&ctx.db, &draft).await?;
                    println!(
                        "{}  {}  {} items  {}  saved {}",
                        draft.id,
                        draft.package.name(),
                        resolved.lines.len(),
                        format_naira(resolved.totals.final_total),
                        draft.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
            Commands::Resume { id } => {
                let mut session = ctx.session()?;
                let resolved = session.resume_draft(&ctx.db, id).await?;
                if !resolved.missing.is_empty() {
                    println!(
                        "dropped items no longer in the catalog: {:?}",
                        resolved.missing
                    );
                }
                print_session(&session)?;
            }
            Commands::DeleteDraft { id } => {
                let session = ctx.session()?;
                if session.drafts().delete(id)? {
                    println!("deleted draft {id}");
                } else {
                    return Err(Error::CurationNotFound { id });
                }
            }
            Commands::Submit { user, delete_draft } => {
                let profile = signed_in(ctx, &user).await?;
                let mut session = ctx.session()?;
                let receipt = session
                    .submit(&ctx.db, Some(&profile), &ctx.settings.whatsapp_number)
                    .await?;
                for warning in &receipt.warnings {
                    println!("warning: {warning}");
                }
                println!("order {} placed", receipt.order.id);
                println!("{}", receipt.message);
                println!("confirm at {}", receipt.whatsapp_url);

                if let Some(draft_id) = receipt.source_draft {
                    if delete_draft {
                        session.drafts().delete(draft_id)?;
                        println!("deleted draft {draft_id}");
                    } else {
                        println!("draft {draft_id} kept; pass --delete-draft to remove it");
                    }
                }
            }
            Commands::Reset => {
                ctx.session()?.reset();
                println!("session cleared");
            }
            Commands::Cart { user } => {
                let summary = cart::list_cart(&ctx.db, &user).await?;
                for view in &summary.orders {
                    println!(
                        "#{}  {}  {}  {}",
                        view.order.id,
                        view.order.package_name,
                        view.order.status,
                        view.order.created_at.format("%Y-%m-%d %H:%M")
                    );
                    for line in &view.lines {
                        println!(
                            "    - {} (x{}): {}",
                            line.item.name,
                            line.quantity,
                            format_naira(line.line_total)
                        );
                    }
                }
                println!("total: {}", format_naira(summary.grand_total));
            }
            Commands::Checkout { user, reference } => {
                let profile = signed_in(ctx, &user).await?;
                let purchases = cart::checkout(&ctx.db, &profile, &reference).await?;
                println!("checked out {} orders", purchases.len());
            }
            Commands::Purchases { user } => {
                for purchase in cart::list_purchases(&ctx.db, &user).await? {
                    println!(
                        "#{}  {}  {}  ref {}  {}",
                        purchase.id,
                        purchase.package_name,
                        purchase.total_price,
                        purchase.payment_ref,
                        purchase.purchased_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Ok(())
    }
}

async fn signed_in(ctx: &AppContext, user_id: &str) -> Result<UserProfile> {
    users::current_user(&ctx.db, user_id)
        .await?
        .ok_or(Error::NotAuthenticated)
}

/// Restores the session, makes sure the item and the current selection have fresh
/// prices, then applies the mutation.
async fn mutate<F>(ctx: &AppContext, item_id: i64, action: F) -> Result<()>
where
    F: FnOnce(&mut CurationSession) -> Result<SelectionChange>,
{
    let mut session = ctx.session()?;
    session.refresh_prices(&ctx.db).await?;
    if let Some(item) = catalog::get_item(&ctx.db, item_id).await? {
        session.remember_items([item]);
    }

    let change = action(&mut session)?;
    info!("Selection change: {:?}", change);
    print_session(&session)?;
    Ok(())
}

fn print_session(session: &CurationSession) -> Result<()> {
    match session.package() {
        Some(package) => {
            let budget = package
                .budget()
                .map_or_else(|| "no budget".to_string(), format_naira);
            println!("package: {}  ({budget})", package.name());
        }
        None => println!("package: curated box"),
    }
    for entry in session.selection().entries() {
        let name = session
            .prices()
            .get(entry.item_id)
            .map_or("unknown item", |item| item.name.as_str());
        println!("  {name} x{}", entry.quantity);
    }
    let totals = session.totals()?;
    println!("{}", totals.detail_text());
    Ok(())
}
