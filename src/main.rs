use clap::Parser;
use script_conditions::{
    Bindings, ConditionKind, Context, EvaluationDecision, Os, OsDeclaration, Script,
    ScriptCondition, ScriptDeclaration, ScriptExecutionManager, TestInfo,
};
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Decide whether a test would run under the given script condition.
/// Exit status: 0 = enabled, 1 = disabled, 2 = error.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Script source. Ignored when --declarations or --os is given.
    source: Option<String>,
    /// Engine name, extension or mime type
    #[arg(long, default_value = "expression")]
    engine: String,
    /// Condition kind: enable or disable
    #[arg(long, default_value = "enable")]
    kind: String,
    /// Reason template ({annotation}, {source}, {result})
    #[arg(long)]
    reason: Option<String>,
    /// JSON file holding an array of script declarations
    #[arg(long)]
    declarations: Option<std::path::PathBuf>,
    /// Evaluate an OS condition for these systems instead of a script
    #[arg(long, value_delimiter = ',')]
    os: Vec<String>,
    /// System property override, key=value
    #[arg(short = 'D', value_parser = parse_pair)]
    property: Vec<(String, String)>,
    /// Configuration parameter, key=value
    #[arg(long = "config", value_parser = parse_pair)]
    parameter: Vec<(String, String)>,
    /// Test display name exposed to scripts
    #[arg(long, default_value = "")]
    display_name: String,
    /// Test unique id exposed to scripts
    #[arg(long, default_value = "")]
    unique_id: String,
    /// Test tag exposed to scripts (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Never pre-compile scripts
    #[arg(long)]
    force_evaluation: bool,
    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }

    match run(args) {
        Ok(decision) => {
            println!("{}", serde_json::to_string_pretty(&decision).unwrap_or_default());
            if decision.enabled {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<EvaluationDecision, Box<dyn std::error::Error>> {
    let parameters: HashMap<String, String> = args.parameter.into_iter().collect();
    let mut ctx = Context::from_parameters(parameters);
    ctx.property_overrides = args.property.into_iter().collect();
    if args.force_evaluation {
        ctx.force_script_evaluation = true;
    }

    let kind: ConditionKind = args.kind.parse()?;

    if !args.os.is_empty() {
        let os = args
            .os
            .iter()
            .map(|name| serde_json::from_value::<Os>(name.to_lowercase().into()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(OsDeclaration { kind, os }.evaluate());
    }

    let test = TestInfo {
        display_name: args.display_name,
        unique_id: args.unique_id,
        tags: args.tags,
    };
    let manager = Arc::new(ScriptExecutionManager::with_builtins(&ctx));

    let decision = if let Some(path) = args.declarations {
        let text = std::fs::read_to_string(&path)?;
        let declarations: Vec<ScriptDeclaration> = serde_json::from_str(&text)?;
        info!(count = declarations.len(), path = %path.display(), "loaded declarations");
        let condition = ScriptCondition::new(Arc::clone(&manager), ctx.clone());
        condition.evaluate(&declarations, &test)?
    } else {
        let source = args.source.ok_or("a script source or --declarations is required")?;
        let script = match args.reason {
            Some(reason) => Script::new(kind, args.engine, source, reason)?,
            None => Script::with_default_reason(kind, args.engine, source)?,
        };
        manager.evaluate(&script, &Bindings::for_test(&test, &ctx))?
    };
    manager.close();
    Ok(decision)
}
