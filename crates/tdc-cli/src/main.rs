//! # tdc: Takedowns Query Console
//!
//! Command-line front end for the takedowns backend.
//!
//! - `tdc collections` / `tdc schema [COLLECTION]`: what can be queried.
//! - `tdc query run|simple|predefined|example`: build and execute queries.
//! - `tdc dashboard …` / `tdc analytics …`: read-only views as JSON.
//! - `tdc report templates|agencies|generate`: reports, saved to disk.
//!
//! Logs go to stderr (`RUST_LOG`), results to stdout.

mod args;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tdc_client::insights::DEFAULT_ACTIVITY_LIMIT;
use tdc_client::{
    save_report, AnalyticsView, ApiClient, ClientConfig, ClientError, DashboardView,
    HttpQueryService, InsightsClient, Outcome, QuerySession, ReportRequest,
};
use tdc_core::schema::display_name;
use tdc_core::templates::{find_example, quick_start_examples};
use tdc_core::{Query, QueryEditor, ResultPage, SchemaRegistry, SimpleQueryPatch};

const QUERY_FAILED: &str = "Query execution failed";
const REPORT_FAILED: &str = "Failed to generate report";
const REQUEST_FAILED: &str = "Request failed";

#[derive(Parser)]
#[command(name = "tdc", version, about = "Query console for the takedowns backend", long_about = None)]
struct Cli {
    /// Config file (optional; defaults apply when missing).
    #[arg(long, global = true, default_value = "tdc.toml")]
    config: PathBuf,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the collections the service can query.
    Collections,

    /// Show the local schema: all collections, or the fields of one.
    Schema { collection: Option<String> },

    /// Build and run queries.
    Query {
        #[command(subcommand)]
        action: QueryCmd,
    },

    /// Dashboard views.
    Dashboard {
        #[command(subcommand)]
        view: DashboardCmd,
    },

    /// Analytics views.
    Analytics {
        #[command(subcommand)]
        view: AnalyticsCmd,
    },

    /// Report templates and generation.
    Report {
        #[command(subcommand)]
        action: ReportCmd,
    },
}

#[derive(Subcommand)]
enum QueryCmd {
    /// Run an advanced query.
    Run(RunArgs),

    /// Run a simple form query.
    Simple(SimpleArgs),

    /// List predefined queries, or load one by key.
    Predefined {
        key: Option<String>,
        /// Execute the loaded template instead of printing it.
        #[arg(long)]
        run: bool,
    },

    /// List quick-start examples, or run one by id.
    Example { id: Option<String> },
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    collection: Option<String>,

    /// "FIELD OP [VALUE]", repeatable.
    #[arg(long = "where", value_name = "CONDITION")]
    conditions: Vec<String>,

    /// "COLLECTION:LOCAL:FOREIGN:AS", repeatable.
    #[arg(long = "join", value_name = "JOIN")]
    joins: Vec<String>,

    /// "FIELD[:asc|desc]", repeatable.
    #[arg(long = "sort", value_name = "SORT")]
    sort: Vec<String>,

    /// Fields to return, comma separated.
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    page: Option<String>,

    #[arg(long)]
    limit: Option<String>,

    /// Read the whole query from a JSON file; other flags are applied on top.
    #[arg(long)]
    file: Option<PathBuf>,

    /// List the full content of compacted cells after the table.
    #[arg(long)]
    expand: bool,
}

#[derive(Args)]
struct SimpleArgs {
    #[arg(long)]
    collection: Option<String>,
    #[arg(long)]
    client_name: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date_from: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    date_to: Option<String>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    page: Option<String>,
    #[arg(long)]
    limit: Option<String>,
    #[arg(long)]
    expand: bool,
}

#[derive(Subcommand)]
enum DashboardCmd {
    Overview,
    Activity {
        #[arg(long, default_value_t = DEFAULT_ACTIVITY_LIMIT)]
        limit: u32,
    },
    Top,
    Alerts,
    Stats,
}

#[derive(Subcommand)]
enum AnalyticsCmd {
    Dashboard,
    Clients,
    Findings,
    Performance,
}

#[derive(Subcommand)]
enum ReportCmd {
    /// Available report types.
    Templates,
    /// Distinct agencies across all clients.
    Agencies,
    /// Generate a report and save it as `{type}-{date}.json`.
    Generate {
        report_type: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
        #[arg(long)]
        agency: Option<String>,
        /// Output directory (defaults to `reports.out_dir`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tdc=info,tdc_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

struct App {
    config: ClientConfig,
    registry: Arc<SchemaRegistry>,
    api: ApiClient,
    json: bool,
}

impl App {
    fn session(&self) -> QuerySession<HttpQueryService> {
        let service = HttpQueryService::new(self.api.clone());
        QuerySession::new(service, QueryEditor::new(self.registry.clone()))
    }

    fn insights(&self) -> InsightsClient {
        InsightsClient::new(self.api.clone())
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load(&cli.config)?;
    config.apply_env(|key| std::env::var(key).ok());
    let registry = Arc::new(config.schema_registry()?);
    let api = ApiClient::from_config(&config.service);
    tracing::debug!("service at {}", api.base_url());

    let app = App {
        config,
        registry,
        api,
        json: cli.json,
    };

    match cli.command {
        Commands::Collections => {
            let names = app
                .session()
                .collections()
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;
            if app.json {
                render::print_json(&names)?;
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        Commands::Schema { collection } => show_schema(&app, collection.as_deref())?,
        Commands::Query { action } => query(&app, action).await?,
        Commands::Dashboard { view } => {
            let view = match view {
                DashboardCmd::Overview => DashboardView::Overview,
                DashboardCmd::Activity { limit } => DashboardView::RecentActivity { limit },
                DashboardCmd::Top => DashboardView::TopPerformers,
                DashboardCmd::Alerts => DashboardView::Alerts,
                DashboardCmd::Stats => DashboardView::QuickStats,
            };
            let body = app
                .insights()
                .dashboard(view)
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;
            render::print_json(&body)?;
        }
        Commands::Analytics { view } => {
            let view = match view {
                AnalyticsCmd::Dashboard => AnalyticsView::Dashboard,
                AnalyticsCmd::Clients => AnalyticsView::Clients,
                AnalyticsCmd::Findings => AnalyticsView::Findings,
                AnalyticsCmd::Performance => AnalyticsView::Performance,
            };
            let body = app
                .insights()
                .analytics(view)
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;
            render::print_json(&body)?;
        }
        Commands::Report { action } => report(&app, action).await?,
    }
    Ok(())
}

/// Log the full error, hand the user the short one.
fn user_error(e: ClientError, fallback: &str) -> anyhow::Error {
    tracing::debug!("{:?}", e);
    anyhow!(e.user_message(fallback))
}

fn show_schema(app: &App, collection: Option<&str>) -> Result<()> {
    let Some(name) = collection else {
        let rows = app
            .registry
            .collections()
            .filter_map(|name| app.registry.get(name))
            .map(|schema| vec![schema.name().to_string(), schema.fields().len().to_string()])
            .collect();
        println!("{}", render::table(vec!["Collection".into(), "Fields".into()], rows));
        return Ok(());
    };

    let schema = app
        .registry
        .get(name)
        .ok_or_else(|| anyhow!("unknown collection '{}'", name))?;
    let rows = schema
        .fields()
        .iter()
        .map(|def| {
            vec![
                def.name.clone(),
                display_name(&def.name),
                def.schema.type_label(),
                def.schema.placeholder(),
            ]
        })
        .collect();
    let headers = ["Field", "Label", "Type", "Placeholder"]
        .into_iter()
        .map(String::from)
        .collect();
    println!("{}", render::table(headers, rows));
    Ok(())
}

// =============================================================================
// Queries
// =============================================================================

async fn query(app: &App, action: QueryCmd) -> Result<()> {
    let mut session = app.session();
    match action {
        QueryCmd::Run(opts) => {
            if let Some(path) = &opts.file {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                let loaded: Query = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                *session.editor_mut() = QueryEditor::with_query(app.registry.clone(), loaded);
            }

            let editor = session.editor_mut();
            if let Some(collection) = &opts.collection {
                editor.set_collection(collection.clone());
            }
            args::apply_clauses(editor, &opts.conditions, &opts.joins, &opts.sort)?;
            if !opts.select.is_empty() {
                editor.set_select(opts.select.clone());
            }
            if let Some(search) = &opts.search {
                editor.set_search(search.clone());
            }
            if let Some(page) = &opts.page {
                editor.set_page_input(page);
            }
            if let Some(limit) = &opts.limit {
                editor.set_limit_input(limit);
            }

            let page = applied(session.execute().await)?;
            render::print_page(&page, app.json, opts.expand)?;
        }
        QueryCmd::Simple(simple) => {
            let patch = SimpleQueryPatch {
                collection: simple.collection,
                client_name: simple.client_name,
                status: simple.status,
                priority: simple.priority,
                date_from: simple.date_from,
                date_to: simple.date_to,
                search_text: simple.search,
                ..SimpleQueryPatch::default()
            };
            let form = session.simple_mut();
            form.apply(&patch);
            if let Some(page) = &simple.page {
                form.set_page_input(page);
            }
            if let Some(limit) = &simple.limit {
                form.set_limit_input(limit);
            }

            let page = applied(session.execute_simple().await)?;
            render::print_page(&page, app.json, simple.expand)?;
        }
        QueryCmd::Predefined { key, run } => {
            let templates = session
                .predefined_queries()
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;

            let Some(key) = key else {
                if app.json {
                    let listing: serde_json::Map<String, serde_json::Value> = templates
                        .iter()
                        .map(|(k, t)| Ok((k.to_string(), serde_json::to_value(t)?)))
                        .collect::<Result<_, serde_json::Error>>()?;
                    return render::print_json(&listing);
                }
                let rows = templates
                    .iter()
                    .map(|(key, t)| {
                        let marker = if t.needs_parameters() { " *" } else { "" };
                        vec![
                            format!("{}{}", key, marker),
                            t.name.clone(),
                            t.collection.clone(),
                            t.description.clone(),
                        ]
                    })
                    .collect();
                let headers = ["Key", "Name", "Collection", "Description"]
                    .into_iter()
                    .map(String::from)
                    .collect();
                println!("{}", render::table(headers, rows));
                println!("* contains placeholder values to edit before running");
                return Ok(());
            };

            let template = templates
                .get(&key)
                .ok_or_else(|| anyhow!("no predefined query '{}'", key))?;
            if template.needs_parameters() {
                tracing::warn!("'{}' contains placeholder values", key);
            }
            session.editor_mut().load_template(template);

            if run {
                let page = applied(session.execute().await)?;
                render::print_page(&page, app.json, false)?;
            } else {
                render::print_json(session.editor().query())?;
            }
        }
        QueryCmd::Example { id } => {
            let Some(id) = id else {
                let rows = quick_start_examples()
                    .into_iter()
                    .map(|e| vec![e.id.to_string(), e.title.to_string(), e.description.to_string()])
                    .collect();
                let headers = ["Id", "Title", "Description"]
                    .into_iter()
                    .map(String::from)
                    .collect();
                println!("{}", render::table(headers, rows));
                return Ok(());
            };
            let example =
                find_example(&id).ok_or_else(|| anyhow!("no quick-start example '{}'", id))?;
            session.simple_mut().apply(&example.patch);
            tracing::info!("loaded example '{}'", example.title);

            let page = applied(session.execute_simple().await)?;
            render::print_page(&page, app.json, false)?;
        }
    }
    Ok(())
}

fn applied(result: Result<Outcome<ResultPage>, ClientError>) -> Result<ResultPage> {
    match result.map_err(|e| user_error(e, QUERY_FAILED))? {
        Outcome::Applied(page) => Ok(page),
        Outcome::Superseded => bail!("query was superseded by a newer request"),
    }
}

// =============================================================================
// Reports
// =============================================================================

async fn report(app: &App, action: ReportCmd) -> Result<()> {
    let insights = app.insights();
    match action {
        ReportCmd::Templates => {
            let body = insights
                .report_templates()
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;
            render::print_json(&body)?;
        }
        ReportCmd::Agencies => {
            let agencies = insights
                .agencies()
                .await
                .map_err(|e| user_error(e, REQUEST_FAILED))?;
            if app.json {
                render::print_json(&agencies)?;
            } else {
                for agency in agencies {
                    println!("{}", agency);
                }
            }
        }
        ReportCmd::Generate {
            report_type,
            start,
            end,
            client_id,
            agency,
            out,
        } => {
            let request = ReportRequest {
                report_type,
                start_date: start.unwrap_or_default(),
                end_date: end.unwrap_or_default(),
                client_id: client_id.unwrap_or_default(),
                agency: agency.unwrap_or_default(),
            };
            let outcome = insights
                .generate_report(&request)
                .await
                .map_err(|e| user_error(e, REPORT_FAILED))?;
            let Outcome::Applied(body) = outcome else {
                bail!("report was superseded by a newer request");
            };

            let dir = out.unwrap_or_else(|| app.config.reports.out_dir.clone());
            let today = chrono::Local::now().date_naive();
            let path = save_report(&dir, &request.report_type, &body, today)
                .map_err(|e| user_error(e, REPORT_FAILED))?;
            if app.json {
                render::print_json(&body)?;
            } else {
                println!("Report generated and saved to {}", path.display());
            }
        }
    }
    Ok(())
}
