use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use engine::{Engine, ReportAnalyzer, Snapshot};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "pocketbook")]
#[command(about = "Local-first household budget book")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "pocketbook")]
    config: String,

    /// Database connection string; overrides the settings file.
    #[arg(long, env = "DATABASE_URL")]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record counts and readiness of every collection.
    Status,
    /// Current balance of every active account.
    Balances,
    /// Monthly summary, category breakdown and budget usage.
    Report {
        /// Reference day of the report (defaults to today).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "pocketbook={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let url = cli.database.unwrap_or(settings.database.url);
    let engine = Engine::builder().database_url(&url).build();
    let report = engine.initialize_all().await?;
    for (collection, err) in &report.failures {
        tracing::error!("{collection} unavailable: {err}");
    }

    match cli.command {
        Command::Status => print_status(&engine),
        Command::Balances => {
            ensure_ready(&engine)?;
            print_balances(&engine.snapshot());
        }
        Command::Report { date } => {
            ensure_ready(&engine)?;
            let today = date.unwrap_or_else(|| Local::now().date_naive());
            let snapshot = engine.snapshot();
            print_report(&snapshot.reports(today));
        }
    }

    Ok(())
}

fn ensure_ready(engine: &Engine) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if engine.status().ready {
        Ok(())
    } else {
        Err("some collections failed to load, see the log".into())
    }
}

fn print_status(engine: &Engine) {
    let status = engine.status();
    println!("store:         {}", engine.store().url());
    println!("ready:         {}", status.ready);
    println!("transactions:  {}", engine.transactions().len());
    println!("budgets:       {}", engine.budgets().len());
    println!("accounts:      {}", engine.accounts().len());
    println!("categories:    {}", engine.categories().len());
    println!("account types: {}", engine.account_types().len());
}

fn print_balances(snapshot: &Snapshot) {
    let balances = snapshot.balances();
    for balance in &balances {
        let name = snapshot
            .accounts
            .iter()
            .find(|account| account.id == balance.account_id)
            .map_or("?", |account| account.name.as_str());
        if balance.pending > 0 {
            println!(
                "{name:<20} {:>12}  (available {}, pending {})",
                balance.current, balance.available, balance.pending
            );
        } else {
            println!("{name:<20} {:>12}", balance.current);
        }
    }
    println!("{:<20} {:>12}", "net worth", engine::net_worth(&balances));
}

fn print_report(analyzer: &ReportAnalyzer<'_>) {
    let stats = analyzer.stats_summary();
    println!("month {}", analyzer.current_month());
    println!(
        "  spent {} (last month {}, {:+.1}%)",
        stats.this_month_total, stats.last_month_total, stats.change_percentage
    );
    println!("  daily average {:.0}", stats.avg_daily_expense);
    println!(
        "  budget {} used {:.1}%",
        stats.total_budget, stats.budget_usage_percentage
    );

    println!("categories");
    for slice in analyzer.category_breakdown() {
        println!(
            "  {:<12} {:>10} {:>5.1}%",
            slice.category, slice.amount, slice.percentage
        );
    }

    println!("budgets");
    for usage in analyzer.budget_analysis() {
        println!(
            "  {:<12} {:>10}/{:<10} {:>5.1}% {}",
            usage.budget_name,
            usage.spent,
            usage.budget_amount,
            usage.percentage,
            usage.status.as_str()
        );
    }

    let advances = analyzer.advance_analysis();
    if advances.count > 0 {
        println!("advances: {} totaling {}", advances.count, advances.total);
    }
}
