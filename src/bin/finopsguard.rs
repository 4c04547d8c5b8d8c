// CLI entrypoint for FinOpsGuard — a thin caller of the in-process API
// (§6). It decodes a Terraform file from disk, calls `check_cost_impact`
// or `evaluate_policy`, and prints the result as JSON or a short text
// summary. Auth, webhook delivery, and the web UI are someone else's job.

use base64::Engine as _;
use clap::{Parser, Subcommand, ValueEnum};
use finopsguard::api::{BudgetRules, CheckRequest, EvaluateRequest};
use finopsguard::{CoreConfig, FinOpsGuard};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "finopsguard")]
#[command(about = "Pre-deployment cost and policy gate for infrastructure as code")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast cost and (optionally) evaluate policies for a Terraform file
    Check(CheckArgs),
    /// Evaluate a single named policy against a Terraform file
    Evaluate(EvaluateArgs),
    /// List the policies currently registered
    Policies,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Path to a Terraform (.tf) file
    path: PathBuf,

    /// Deployment environment, e.g. dev / staging / prod
    #[arg(long, default_value = "dev")]
    environment: String,

    /// Fail if the forecast monthly cost exceeds this amount
    #[arg(long)]
    budget: Option<f64>,

    /// Named policy ids to evaluate (repeatable)
    #[arg(long = "policy")]
    policy_ids: Vec<String>,
}

#[derive(clap::Args)]
struct EvaluateArgs {
    /// Path to a Terraform (.tf) file
    path: PathBuf,

    /// Deployment environment, e.g. dev / staging / prod
    #[arg(long, default_value = "dev")]
    environment: String,

    /// Policy id to evaluate
    #[arg(long)]
    policy: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let guard = FinOpsGuard::new(CoreConfig::from_env());

    match cli.command {
        Commands::Check(args) => run_check(&guard, args, cli.format).await,
        Commands::Evaluate(args) => run_evaluate(&guard, args, cli.format).await,
        Commands::Policies => {
            print_policies(&guard, cli.format);
            ExitCode::SUCCESS
        }
    }
}

async fn run_check(guard: &FinOpsGuard, args: CheckArgs, format: OutputFormat) -> ExitCode {
    let text = match std::fs::read_to_string(&args.path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let request = CheckRequest {
        iac_type: "terraform".to_string(),
        iac_payload: base64::engine::general_purpose::STANDARD.encode(text),
        environment: args.environment,
        budget_rules: args.budget.map(BudgetRules::new),
        policy_ids: if args.policy_ids.is_empty() {
            None
        } else {
            Some(args.policy_ids)
        },
        request_id: None,
    };

    match guard.check_cost_impact(request).await {
        Ok(response) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&response).unwrap()),
                OutputFormat::Text => {
                    println!(
                        "estimated monthly cost: ${:.2} (first week ${:.2}, confidence {:?})",
                        response.estimated_monthly_cost,
                        response.estimated_first_week_cost,
                        response.pricing_confidence,
                    );
                    println!("resources analyzed: {}", response.resource_count);
                    for flag in &response.risk_flags {
                        println!("risk: {flag}");
                    }
                    for rec in &response.recommendations {
                        println!("recommendation: {rec}");
                    }
                    for eval in &response.policy_eval {
                        println!("policy {}: {:?} ({})", eval.policy_id, eval.status, eval.reason);
                    }
                }
            }
            let blocked = response.policy_eval.iter().any(|e| {
                matches!(e.status, finopsguard::engines::policy::EvalStatus::Fail)
                    && matches!(e.mode, finopsguard::engines::policy::EvalMode::Blocking)
            });
            if blocked {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            e.log();
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_evaluate(guard: &FinOpsGuard, args: EvaluateArgs, format: OutputFormat) -> ExitCode {
    let text = match std::fs::read_to_string(&args.path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let request = EvaluateRequest {
        iac_type: "terraform".to_string(),
        iac_payload: base64::engine::general_purpose::STANDARD.encode(text),
        environment: args.environment,
        budget_rules: None,
        policy_id: args.policy,
        mode: None,
    };

    match guard.evaluate_policy(request).await {
        Ok(eval) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&eval).unwrap()),
                OutputFormat::Text => println!("{}: {:?} ({})", eval.policy_id, eval.status, eval.reason),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.log();
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_policies(guard: &FinOpsGuard, format: OutputFormat) {
    let policies = guard.list_policies();
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&policies).unwrap()),
        OutputFormat::Text => {
            for policy in policies {
                println!(
                    "{} [{}] on_violation={:?} enabled={}",
                    policy.id, policy.name, policy.on_violation, policy.enabled
                );
            }
        }
    }
}
