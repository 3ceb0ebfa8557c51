use clap::{Args, Parser, Subcommand};
use card_valuation_engine::{CardQuery, CredentialsProvider, EngineConfig, Locale, ValuationEngine};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "card-valuation-cli")]
#[command(about = "Card market valuation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database path (overrides VALUATION_DB_PATH)
    #[arg(short, long)]
    db: Option<String>,
}

#[derive(Args)]
struct CardArgs {
    /// Player name
    player: String,

    #[arg(short, long)]
    year: Option<i32>,

    #[arg(short, long)]
    brand: Option<String>,

    #[arg(short, long)]
    series: Option<String>,

    /// Card number (without '#')
    #[arg(short = 'n', long)]
    number: Option<String>,

    #[arg(short, long)]
    parallel: Option<String>,

    /// Grading company, e.g. PSA
    #[arg(long, requires = "grade")]
    company: Option<String>,

    #[arg(long, requires = "company")]
    grade: Option<String>,

    #[arg(long)]
    auto: bool,

    /// Search with this text instead of the card fields
    #[arg(long)]
    custom: Option<String>,

    /// Listing URL to leave out (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Ignore cached results
    #[arg(long)]
    refresh: bool,
}

impl CardArgs {
    fn into_query(self) -> CardQuery {
        let mut query = CardQuery::new(self.player);
        if let Some(year) = self.year {
            query = query.with_year(year);
        }
        if let Some(brand) = self.brand {
            query = query.with_brand(brand);
        }
        if let Some(series) = self.series {
            query = query.with_series(series);
        }
        if let Some(number) = self.number {
            query = query.with_card_number(number);
        }
        if let Some(parallel) = self.parallel {
            query = query.with_parallel(parallel);
        }
        if let (Some(company), Some(grade)) = (self.company, self.grade) {
            query = query.with_grading(company, grade);
        }
        if self.auto {
            query = query.with_autograph();
        }
        if let Some(custom) = self.custom {
            query = query.with_custom_query(custom);
        }
        for url in self.exclude {
            query = query.excluding(url);
        }
        if self.refresh {
            query = query.forcing_refresh();
        }
        query
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Value a card from recent sold listings
    Value(CardArgs),

    /// Compare raw vs graded prices
    Grade(CardArgs),

    /// Valuation plus a short investment note
    Analyze {
        #[command(flatten)]
        card: CardArgs,

        /// Note language (en, fr)
        #[arg(short, long)]
        locale: Option<Locale>,
    },

    /// Get cache statistics
    Stats,

    /// Delete expired cache entries
    Purge,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("card_valuation_engine=info")))
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let engine = ValuationEngine::new(&config, Arc::new(CredentialsProvider::from_env())).await?;

    match cli.command {
        Commands::Value(card) => {
            let query = card.into_query();
            println!("🔍 Valuing: {}", query.display_name());

            let value = engine.valuate(&query).await?;
            if !value.has_data() {
                println!("\n⚠️  No comparable sales found");
                return Ok(());
            }

            println!("\n💰 Average: ${:.2} ({:?} confidence)", value.average, value.confidence);
            println!("   Range: ${:.2} - ${:.2}", value.low, value.high);
            println!("   Sales: {}", value.sales_count);
            if let (Some(price), Some(at)) = (value.last_sold, value.last_sold_at) {
                println!("   Last sold: ${:.2} on {}", price, at.format("%Y-%m-%d"));
            }
            if let Some(trend) = value.trend_percent {
                println!("   Trend: {:+.1}%", trend);
            }
            println!("   Sources: {}", value.sources.join(", "));

            println!("\n📋 Comparables:");
            for (i, comp) in value.comps.iter().take(10).enumerate() {
                println!("   {}. ${:.2}  {}", i + 1, comp.price, comp.title);
            }
        }

        Commands::Grade(card) => {
            let query = card.into_query();
            println!("🔍 Grading analysis: {}", query.display_name());

            let analysis = engine.grading_analysis(&query).await?;
            let company = &analysis.grading_company;

            println!("\n   Raw: ${:.2}", analysis.raw_price);
            println!("   {} 9: ${:.2} (ROI {:.1}%)", company, analysis.grade9_price, analysis.grade9_roi);
            println!("   {} 10: ${:.2} (ROI {:.1}%)", company, analysis.grade10_price, analysis.grade10_roi);
            println!("   Grading cost: ${:.2}", analysis.grading_cost);
            println!("   Active listings: {}", analysis.active_listings);
            println!("\n✅ Recommendation: {:?}", analysis.recommendation);
            if analysis.insufficient_data {
                println!("   (a population had no sales; ROI figures are not meaningful)");
            }
        }

        Commands::Analyze { card, locale } => {
            let query = card.into_query();
            let locale = locale.unwrap_or(config.locale);

            let analysis = engine.quick_analysis(&query, locale).await?;
            println!("💰 {}: ${:.2} from {} sales", query.display_name(), analysis.valuation.average, analysis.valuation.sales_count);
            println!("\n{}", analysis.summary);
        }

        Commands::Stats => {
            let stats = engine.cache_stats().await?;

            println!("📊 Cache Statistics:");
            println!("   Total entries: {}", stats.total_entries);
            println!("   Expired entries: {}", stats.expired_entries);

            if let Some(oldest) = stats.oldest_entry {
                println!("   Oldest entry: {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            }

            if let Some(newest) = stats.newest_entry {
                println!("   Newest entry: {}", newest.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Commands::Purge => {
            let deleted = engine.purge_expired().await?;
            println!("🧹 Deleted {} expired entries", deleted);
        }
    }

    Ok(())
}
