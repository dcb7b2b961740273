//! Terminal output formatting for plans, reports and errors.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use mp_core::{ActionKind, Error, Plan};
use mp_io::ExecutionReport;

pub fn print_error(err: &Error) {
    eprintln!("{} {}", style("Error:").red().bold(), err);
}

/// Render the plan the way it will be applied, one line per action.
pub fn print_plan(plan: &Plan) {
    println!(
        "{}",
        style(format!("The following {} action(s) will be applied:", plan.len())).bold()
    );
    for action in plan.iter() {
        let marker = match action.kind {
            ActionKind::Install { .. } => style("+").green(),
            ActionKind::Upgrade { .. } => style("~").yellow(),
            ActionKind::Remove => style("-").red(),
        };
        println!("  {marker} {action}");
    }
}

/// Summarize what was committed, what was reclaimed, and where execution
/// stopped if it did.
pub fn print_report(report: &ExecutionReport) {
    for action in &report.completed {
        println!("{} {action}", style("done").green());
    }

    for mod_id in &report.removed_orphans {
        println!(
            "{} removed orphaned dependency {mod_id}",
            style("done").green()
        );
    }

    if let Some(failed) = &report.failed {
        println!(
            "{} {} ({})",
            style("failed").red().bold(),
            failed.action,
            failed.error
        );
        println!(
            "  committed: {} action(s); abandoned: the failing action and everything after it",
            report.completed.len()
        );
    }
}

/// Spinner shown while a plan executes.
pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(100));
    bar
}
