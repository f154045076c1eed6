mod repl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use churn_client::{
    BatchFile, ChurnClient, ChurnConfig, ChurnSession, Completion, Dispatcher, FeatureKey,
    FeatureVector, Flow, Metric, ModelKind, Outcome, ViewMode,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "churn")]
#[command(about = "Customer churn prediction client", long_about = None)]
struct Cli {
    /// Prediction service base URL (overrides CHURN_API_HOST and the config file)
    #[arg(long, global = true)]
    host: Option<String>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Start the interactive session in developer mode
    #[arg(short, long)]
    developer: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the service to score a model on a metric
    Evaluate {
        /// Logistic Regression, Random Forest or XGBoost
        #[arg(short, long)]
        model: String,

        /// Accuracy, Precision or Recall
        #[arg(short = 'M', long)]
        metric: String,
    },

    /// Predict churn for one customer
    Predict {
        /// JSON object of feature name to value
        #[arg(short, long)]
        features: Option<PathBuf>,

        /// Set a single field, e.g. --set "customer service calls=5"
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Also print the raw response payload
        #[arg(long)]
        raw: bool,
    },

    /// Predict churn for every customer in a CSV file
    PredictList {
        /// CSV with one customer per row
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the feature names the service expects
    Features,
}

fn load_config(cli: &Cli) -> Result<ChurnConfig> {
    let mut config = match &cli.config {
        Some(path) => ChurnConfig::from_file(path)?,
        None => ChurnConfig::default(),
    }
    .with_env_overrides();

    if let Some(host) = &cli.host {
        config.service.host = host.clone();
    }
    if cli.developer {
        config.ui.developer_mode = true;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("churn_client=info,churn=info")),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!("Using service at {}", config.service.host);

    let client = ChurnClient::from_config(&config.service)?;
    let dispatcher = Dispatcher::new(Arc::new(client));

    match cli.command {
        Some(Commands::Evaluate { model, metric }) => {
            cmd_evaluate(dispatcher, &model, &metric).await?
        }
        Some(Commands::Predict { features, set, raw }) => {
            cmd_predict(dispatcher, features.as_deref(), &set, raw).await?
        }
        Some(Commands::PredictList { file }) => cmd_predict_list(dispatcher, &file).await?,
        Some(Commands::Features) => cmd_features(),
        None => {
            let mode = ViewMode::from_developer(config.ui.developer_mode);
            repl::run_interactive(dispatcher, ChurnSession::with_mode(mode)).await?
        }
    }

    Ok(())
}

async fn cmd_evaluate(
    mut dispatcher: Dispatcher<ChurnClient>,
    model: &str,
    metric: &str,
) -> Result<()> {
    let mut session = ChurnSession::new();
    session.form.set_model(Some(model.parse::<ModelKind>()?));
    session.form.set_metric(Some(metric.parse::<Metric>()?));

    dispatcher.submit_evaluation(&mut session)?;
    let done = dispatcher.wait_idle(&mut session).await;
    finish(&done)?;

    print_flow(&session, Flow::Evaluation, false);
    Ok(())
}

async fn cmd_predict(
    mut dispatcher: Dispatcher<ChurnClient>,
    features: Option<&Path>,
    assignments: &[String],
    raw: bool,
) -> Result<()> {
    let mut session = ChurnSession::new();
    if let Some(path) = features {
        let text = std::fs::read_to_string(path)?;
        session.form.features = serde_json::from_str::<FeatureVector>(&text)?;
    }
    for assignment in assignments {
        let (key, value) = parse_assignment(assignment)?;
        session.form.set_feature_field(key, value);
    }

    dispatcher.submit_single_prediction(&mut session)?;
    let done = dispatcher.wait_idle(&mut session).await;
    finish(&done)?;

    print_flow(&session, Flow::SinglePrediction, raw);
    Ok(())
}

async fn cmd_predict_list(mut dispatcher: Dispatcher<ChurnClient>, file: &Path) -> Result<()> {
    let mut session = ChurnSession::new();
    session.form.set_file(Some(BatchFile::open(file)?));

    dispatcher.submit_batch_prediction(&mut session)?;
    let done = dispatcher.wait_idle(&mut session).await;
    finish(&done)?;

    print_flow(&session, Flow::BatchPrediction, false);
    Ok(())
}

fn cmd_features() {
    println!();
    println!("Features:");
    println!("{:-<40}", "");
    for (i, key) in FeatureKey::all().iter().enumerate() {
        println!("  {:<4} {}", i + 1, key);
    }
    println!();
}

fn parse_assignment(s: &str) -> Result<(FeatureKey, String)> {
    let Some((key, value)) = s.split_once('=') else {
        bail!("Expected KEY=VALUE, got '{}'", s);
    };
    Ok((key.parse()?, value.trim().to_string()))
}

/// One-shot commands exit non-zero when their request failed
fn finish(done: &[Completion]) -> Result<()> {
    for completion in done {
        if let Outcome::Failed(msg) = &completion.outcome {
            bail!("{} failed: {}", completion.flow.label(), msg);
        }
    }
    Ok(())
}

pub(crate) fn print_flow(session: &ChurnSession, flow: Flow, raw: bool) {
    let Some(text) = session.results.render_flow(flow) else {
        return;
    };

    println!();
    match flow {
        Flow::BatchPrediction => println!("Bulk Prediction Results:"),
        _ => println!("Result:"),
    }
    println!("{}", text);

    if raw && flow == Flow::SinglePrediction {
        if let Some(prediction) = &session.results.prediction {
            println!();
            println!("Raw:");
            println!(
                "{}",
                serde_json::to_string_pretty(&prediction.raw).unwrap_or_default()
            );
        }
    }
    println!();
}
