use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use newsgate_core::{address_env_var, ArticleList, FilterResult, NewsgateConfig};
use newsgate_filter::RelevanceFilter;
use newsgate_headlines::HeadlineProvider;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "newsgate.toml";

#[derive(Parser)]
#[command(
    name = "newsgate",
    version,
    about = "Top news headlines over MCP, with pay-per-call business filtering",
    long_about = "newsgate serves current top headlines to MCP clients.\n\n\
                   The free `news` tool returns every headline; the paid `business_news`\n\
                   tool keeps only the stories an LLM judges relevant to businesses.\n\n\
                   Examples:\n  \
                     newsgate serve                   Run the MCP server on stdio\n  \
                     newsgate headlines               Print today's top headlines\n  \
                     newsgate headlines --business    Print only business-relevant headlines\n  \
                     newsgate doctor                  Check credentials and payment setup"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: newsgate.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server on stdio
    #[command(long_about = "Start the MCP server on stdio.\n\n\
        Exposes two tools: `news` (free, unfiltered) and `business_news`\n\
        (relevance-filtered, paid per call unless payment is disabled).\n\
        Logs go to stderr; stdout carries the MCP stream.")]
    Serve,
    /// Fetch the current top headlines once and print them
    #[command(long_about = "Fetch the current top headlines once and print them.\n\n\
        With --business the list is passed through the LLM relevance filter.\n\
        No payment is taken for local runs.\n\n\
        Examples:\n  newsgate headlines\n  newsgate headlines --business --format json")]
    Headlines {
        /// Keep only business-relevant headlines
        #[arg(long)]
        business: bool,
    },
    /// Create a default newsgate.toml configuration file
    #[command(long_about = "Create a default newsgate.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if newsgate.toml already exists.")]
    Init,
    /// Check credentials and payment setup
    #[command(long_about = "Check credentials and payment setup.\n\n\
        Reports the config file, news and LLM API keys, facilitator URL,\n\
        recipient addresses, and price. Use --format json for\n\
        machine-readable output.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable listing
    Text,
    /// JSON, as returned by the MCP tools
    Json,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mnewsgate\x1b[0m v{version}: top headlines for MCP clients\n");

        println!("Quick start:");
        println!("  \x1b[36mnewsgate init\x1b[0m          Create a newsgate.toml config file");
        println!("  \x1b[36mnewsgate doctor\x1b[0m        Check keys and payment setup");
        println!("  \x1b[36mnewsgate serve\x1b[0m         Run the MCP server on stdio\n");

        println!("All commands:");
        println!("  \x1b[32mserve\x1b[0m      MCP server with `news` and `business_news` tools");
        println!("  \x1b[32mheadlines\x1b[0m  Fetch and print headlines once");
        println!("  \x1b[32mdoctor\x1b[0m     Check your setup and environment");
        println!("  \x1b[32minit\x1b[0m       Create default configuration\n");
    } else {
        println!("newsgate v{version}: top headlines for MCP clients\n");

        println!("Quick start:");
        println!("  newsgate init          Create a newsgate.toml config file");
        println!("  newsgate doctor        Check keys and payment setup");
        println!("  newsgate serve         Run the MCP server on stdio\n");

        println!("All commands:");
        println!("  serve      MCP server with `news` and `business_news` tools");
        println!("  headlines  Fetch and print headlines once");
        println!("  doctor     Check your setup and environment");
        println!("  init       Create default configuration\n");
    }

    println!("Run 'newsgate <command> --help' for details.");
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<NewsgateConfig> {
    let config = match path {
        Some(path) => NewsgateConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                NewsgateConfig::from_file(default_path)?
            } else {
                NewsgateConfig::default()
            }
        }
    };
    Ok(config.with_process_env()?)
}

fn print_articles(articles: &ArticleList) {
    if articles.is_empty() {
        println!("No headlines.");
        return;
    }
    for (i, article) in articles.iter().enumerate() {
        let title = article.title_text().unwrap_or("(untitled)");
        match article.source.as_ref().and_then(|s| s.as_deref()) {
            Some(source) => println!("{:>3}. {title} ({source})", i + 1),
            None => println!("{:>3}. {title}", i + 1),
        }
        if let Some(url) = article.url.as_ref().and_then(|u| u.as_deref()) {
            println!("     {url}");
        }
    }
}

async fn run_headlines(
    config: &NewsgateConfig,
    business: bool,
    format: OutputFormat,
) -> Result<()> {
    let provider = newsgate_headlines::build_provider(&config.provider)?;
    info!(provider = provider.name(), business, "fetching headlines");
    let headlines = provider.fetch_headlines().await?;
    eprintln!("{}: {}", provider.name(), headlines.summary);
    let articles = headlines.articles;

    if !business {
        match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&articles).into_diagnostic()?
            ),
            OutputFormat::Text => print_articles(&articles),
        }
        return Ok(());
    }

    let filter = RelevanceFilter::new(&config.llm)?;
    let result = filter.filter(&articles).await;
    let selected = match &result {
        FilterResult::Failed { error } => miette::bail!("{error}"),
        FilterResult::Filtered { articles } => articles,
    };
    eprintln!("business filter kept {} of {}", selected.len(), articles.len());

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&result).into_diagnostic()?
        ),
        OutputFormat::Text => print_articles(selected),
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn info(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "info",
            detail: detail.into(),
            hint: None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            "fail" => "\u{2717}",
            _ => "~",
        }
    }

    fn colored_symbol(&self) -> String {
        match self.status {
            "pass" => "\x1b[32m\u{2713}\x1b[0m".into(),
            "fail" => "\x1b[31m\u{2717}\x1b[0m".into(),
            _ => "\x1b[33m~\x1b[0m".into(),
        }
    }
}

fn collect_checks(config: &NewsgateConfig, config_path: Option<&Path>) -> Vec<CheckResult> {
    let mut checks: Vec<CheckResult> = Vec::new();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if path.exists() {
        checks.push(CheckResult::pass(
            "config_file",
            format!("{} found", path.display()),
        ));
    } else {
        checks.push(CheckResult::info(
            "config_file",
            format!("{} not found, using defaults", path.display()),
        ));
    }

    checks.push(CheckResult::info(
        "news_provider",
        config.provider.kind.to_string(),
    ));
    if config.provider.api_key.is_some() {
        checks.push(CheckResult::pass("news_api_key", "NEWS_API_KEY set"));
    } else {
        checks.push(CheckResult::fail(
            "news_api_key",
            "NEWS_API_KEY not set",
            "export NEWS_API_KEY=... or set provider.api_key in newsgate.toml",
        ));
    }

    if config.llm.api_key.is_some() {
        checks.push(CheckResult::pass(
            "llm_api_key",
            format!("OPENAI_API_KEY set (model: {})", config.llm.model),
        ));
    } else {
        checks.push(CheckResult::fail(
            "llm_api_key",
            "OPENAI_API_KEY not set, business_news will return an error",
            "export OPENAI_API_KEY=... or set llm.api_key in newsgate.toml",
        ));
    }

    if !config.payment.enabled {
        checks.push(CheckResult::info(
            "payment",
            "disabled, business_news is free to call",
        ));
        return checks;
    }

    match &config.payment.facilitator_url {
        Some(url) => checks.push(CheckResult::pass("facilitator_url", url.clone())),
        None => checks.push(CheckResult::fail(
            "facilitator_url",
            "FACILITATOR_URL not set",
            "export FACILITATOR_URL=https://... or set payment.facilitator_url",
        )),
    }

    let recipients: Vec<&str> = config
        .payment
        .networks
        .iter()
        .filter(|(_, n)| n.pay_to.is_some() && n.asset.is_some())
        .map(|(name, _)| name.as_str())
        .collect();
    if recipients.is_empty() {
        let vars: Vec<String> = config
            .payment
            .networks
            .keys()
            .map(String::as_str)
            .map(address_env_var)
            .collect();
        checks.push(CheckResult::fail(
            "recipients",
            "no network has a recipient address",
            format!("export one of: {}", vars.join(", ")),
        ));
    } else {
        checks.push(CheckResult::pass("recipients", recipients.join(", ")));
    }

    let decimals = config
        .payment
        .networks
        .values()
        .map(|n| n.decimals)
        .max()
        .unwrap_or(6);
    match newsgate_mcp::payment::usd_to_atomic(&config.payment.price, decimals) {
        Ok(_) => checks.push(CheckResult::pass(
            "price",
            format!("{} per business_news call", config.payment.price),
        )),
        Err(e) => checks.push(CheckResult::fail(
            "price",
            e.to_string(),
            "use a USD amount such as \"$0.01\"",
        )),
    }

    checks
}

fn run_doctor(
    config: &NewsgateConfig,
    config_path: Option<&Path>,
    format: OutputFormat,
    use_color: bool,
) -> Result<()> {
    let checks = collect_checks(config, config_path);
    let version = env!("CARGO_PKG_VERSION");

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "version": version,
                "checks": checks,
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Text => {
            println!("newsgate v{version}: environment check\n");

            for check in &checks {
                let sym = if use_color {
                    check.colored_symbol()
                } else {
                    check.symbol().to_string()
                };
                let label = check.name.replace('_', " ");
                println!("  {sym} {label:<16} {}", check.detail);
                if let Some(hint) = &check.hint {
                    println!("    hint: {hint}");
                }
            }

            let passed = checks.iter().filter(|c| c.status == "pass").count();
            let failed = checks.iter().filter(|c| c.status == "fail").count();
            let info = checks.iter().filter(|c| c.status == "info").count();
            println!("\n{passed} checks passed, {failed} failed, {info} info");
        }
    }

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# newsgate configuration
# Environment variables override file values.

[provider]
# kind = "thenewsapi"          # or "newsapi"; env: NEWS_PROVIDER
# api_key = "..."              # env: NEWS_API_KEY
# locale = "us"                # thenewsapi
# language = "en"              # thenewsapi
# country = "us"               # newsapi

[llm]
# model = "gpt-4o-mini"        # env: OPENAI_MODEL
# api_key = "sk-..."           # env: OPENAI_API_KEY
# base_url = "https://api.openai.com"  # env: OPENAI_BASE_URL

[payment]
# enabled = true               # false makes business_news free
# price = "$0.01"
# facilitator_url = "https://..."      # env: FACILITATOR_URL

# [payment.networks.base-sepolia]
# pay_to = "0x..."             # env: ADDRESS_BASE_SEPOLIA
# asset = "0x036CbD53842c5426634e7929541eC2318f3dCF7e"
# decimals = 6
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    let config_path = cli.config.as_deref();

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Serve) => {
            let config = load_config(config_path)?;
            info!(version = env!("CARGO_PKG_VERSION"), "newsgate serve");
            newsgate_mcp::server::run_server(&config).await?;
        }
        Some(Command::Headlines { business }) => {
            let config = load_config(config_path)?;
            run_headlines(&config, business, cli.format).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(DEFAULT_CONFIG_PATH);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_PATH} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_PATH} with default configuration");
        }
        Some(Command::Doctor) => {
            let config = load_config(config_path)?;
            run_doctor(&config, config_path, cli.format, use_color)?;
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "newsgate", &mut std::io::stdout());
        }
    }

    Ok(())
}
