//! Handler for `depscan scan`.

use std::path::{Path, PathBuf};

use miette::Result;
use tokio_util::sync::CancellationToken;

use depscan_ops::ops_scan::{self, ScanOptions, ScanReport};
use depscan_resolver::render;
use depscan_util::errors::ScanError;
use depscan_util::progress;

pub struct ScanArgs {
    pub json: bool,
    pub offline: bool,
    pub depth: Option<usize>,
    pub conflicts: bool,
    pub config: Option<PathBuf>,
}

pub async fn exec(dir: &Path, args: &ScanArgs) -> Result<()> {
    let result = run(dir, args).await;
    if result.is_err() && !args.json {
        println!("Scan failed.");
    }
    result
}

async fn run(dir: &Path, args: &ScanArgs) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received, cancelling scan");
                cancel.cancel();
            }
        })
    };

    let opts = ScanOptions {
        offline: args.offline,
        config: args.config.clone(),
    };
    let report = ops_scan::scan(dir, &opts, &cancel).await;
    interrupt.abort();
    let report = report?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, args);
    }

    if report.cancelled {
        return Err(ScanError::Cancelled.into());
    }
    Ok(())
}

fn print_report(report: &ScanReport, args: &ScanArgs) {
    if let Some(tree) = &report.tree {
        print!("{}", render::render_tree(tree, args.depth));
    }

    for warning in &report.warnings {
        progress::status_warn("Warning", &warning.to_string());
    }

    if args.conflicts {
        if report.conflicts.is_empty() {
            println!("No version conflicts.");
        } else {
            print!("{}", report.conflicts);
        }
    }

    let summary = format!(
        "{} packages, {} warnings, {} conflicts",
        report.package_count(),
        report.warnings.len(),
        report.conflicts.len()
    );
    if report.cancelled {
        progress::status_warn("Cancelled", &summary);
    } else {
        progress::status_info("Resolved", &summary);
    }
}
