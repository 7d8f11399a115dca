use clap::Parser;
use fatima_cmd::clear::{execute_clear, plan_clear, ClearPlan};
use fatima_cmd::cli::{build_context, Context, GlobalArgs};
use fatima_cmd::logging::init_tracing;
use fatima_cmd::output::{emit, exit_with_error};
use fatima_cmd::prompt::{AssumeYes, Confirmer, OperatorConfirmer};
use fatima_cmd::FatimaError;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(
    name = "lcappclear",
    version,
    about = "clear fatima app directories: unused revisions and .backup/.old files"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    /// Show what would be removed without removing it
    #[arg(long)]
    dry_run: bool,
    /// Do not ask for confirmation
    #[arg(long)]
    yes: bool,
}

fn main() -> Result<(), FatimaError> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.global.json;
    if let Err(err) = run(cli) {
        exit_with_error(json, &err);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), FatimaError> {
    let ctx = build_context(&cli.global)?;
    let plan = plan_clear(&ctx.layout)?;
    if !ctx.json {
        for skipped in &plan.skipped {
            eprintln!("cannot read {} : {}", skipped.path.display(), skipped.error);
        }
    }
    if cli.dry_run {
        return emit(
            ctx.json,
            &json!({"dry_run": true, "plan": plan}),
            || print_plan(&plan),
        );
    }
    if plan.is_empty() {
        return emit(
            ctx.json,
            &json!({"dry_run": false, "removed": [], "failed": [], "skipped": plan.skipped}),
            || println!("nothing to clear"),
        );
    }
    let mut confirmer: Box<dyn Confirmer> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(OperatorConfirmer)
    };
    let prompt = format!(
        "remove {} revision folders and {} backup files?",
        plan.revision_dirs.len(),
        plan.stale_files.len()
    );
    if !confirmer.confirm(&prompt)? {
        return emit(
            ctx.json,
            &json!({"dry_run": false, "declined": true}),
            || println!("nothing removed"),
        );
    }
    clear(&ctx, &plan)
}

fn print_plan(plan: &ClearPlan) {
    for dir in &plan.revision_dirs {
        println!("would remove dir : {}", dir.display());
    }
    for file in &plan.stale_files {
        println!("would remove : {}", file.display());
    }
    if plan.is_empty() {
        println!("nothing to clear");
    }
}

fn clear(ctx: &Context, plan: &ClearPlan) -> Result<(), FatimaError> {
    let report = execute_clear(plan);
    if !report.failed.is_empty() {
        for failure in &report.failed {
            eprintln!("fail to remove {} : {}", failure.path.display(), failure.error);
        }
        return Err(FatimaError::ClearIncomplete {
            failed: report.failed.len(),
            total: report.failed.len() + report.removed.len(),
        });
    }
    emit(
        ctx.json,
        &json!({
            "dry_run": false,
            "removed": report.removed,
            "failed": [],
            "skipped": plan.skipped,
        }),
        || {
            for path in &report.removed {
                println!("removed : {}", path.display());
            }
        },
    )
}
