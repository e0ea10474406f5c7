use std::error::Error;
use std::process;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use split_doc_corpus::cli::Cli;
use split_doc_corpus::config::RunConfig;
use split_doc_corpus::core::analysis::size_profile;
use split_doc_corpus::core::catalog::FileCatalog;
use split_doc_corpus::core::operations::materialize_plan;
use split_doc_corpus::core::partition::{partition_strata, PartitionOptions};
use split_doc_corpus::core::plan::{build_plan, PlanOptions};
use split_doc_corpus::log_formatter::BracketedFormatter;
use split_doc_corpus::report::RunReport;

fn main() {
    // Initialize tracing subscriber with custom bracketed format
    tracing_subscriber::fmt()
        .event_format(BracketedFormatter)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Count constraints are checked before any randomized work
    let config = match RunConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        error!("Run failed: {}", e);
        process::exit(1);
    }
}

fn run(config: &RunConfig) -> Result<(), Box<dyn Error>> {
    info!(
        "Splitting documents under {:?} into {} subsets (seed {})",
        config.input, config.subsets, config.seed
    );

    let catalog = FileCatalog::scan(&config.input, &config.filter, config.include_extensionless);
    if catalog.is_empty() {
        warn!(
            "No matching documents under {:?}; nothing to do",
            config.input
        );
        return Ok(());
    }
    info!("Cataloged {} documents", catalog.len());

    let strata = catalog.strata(config.group_by_ending);
    let partition_options = PartitionOptions {
        group_count: config.subsets,
        suppress_empty: config.suppress_empty,
        caps: config.caps.clone(),
        same_for_all: config.same_for_all,
    };
    let group_set = partition_strata(&strata, &partition_options, config.seed)?;

    // Diagnostics only; the profile never feeds back into the partition
    let profile = size_profile(&group_set, &catalog)?;

    let plan_options = PlanOptions {
        names: config.names.clone(),
        folders_for_extensions: config.ext_folders,
        consistent_names: config.consistent_names,
    };
    let mut name_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let plan = build_plan(&group_set, &plan_options, &mut name_rng);
    info!(
        "Planned {} target folders for {} file placements",
        plan.fragment_count(),
        plan.file_count()
    );

    if let Some(report_path) = &config.report {
        RunReport::new(config.seed, &config.names, &profile, &plan, &catalog)
            .save(report_path)?;
    }

    if config.dry_run {
        info!("Dry run requested; no files copied");
        return Ok(());
    }

    let stats = materialize_plan(&plan, &catalog, &config.output_root)?;
    info!(
        "Created {} folders and copied {} files under {:?}",
        stats.directories_created, stats.files_copied, config.output_root
    );

    Ok(())
}
