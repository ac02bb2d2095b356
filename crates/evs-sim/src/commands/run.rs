use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use evs_core::SysShift;
use evs_pipeline::report::write_canonical_json;
use evs_pipeline::{load_config, CsvSink, PipelineBuilder, TableService};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML run configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// JSON-lines event table.
    #[arg(long)]
    pub events: PathBuf,
    /// Output directory for `minitree.csv`, `summary.json` and, unless the
    /// configuration names another destination, `histograms.json`.
    #[arg(long)]
    pub out: PathBuf,
    /// Skip mini-tree emission regardless of the configuration.
    #[arg(long)]
    pub no_minitree: bool,
    /// Override the configured systematic shift.
    #[arg(long, allow_hyphen_values = true)]
    pub sys_shift: Option<i32>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(&args.out)?;
    let mut config = load_config(&args.config)?;
    if args.no_minitree {
        config.output.minitree = false;
    }
    if let Some(raw) = args.sys_shift {
        config.sys_shift = SysShift::from_raw(raw);
    }
    config.validate()?;
    let plots_in_config = config.output.histograms.is_some();

    let service = TableService::from_path(&args.events)?;
    info!(
        chain = %config.chain,
        events = service.remaining(),
        sys_shift = %config.sys_shift,
        "starting run"
    );

    let mut builder = PipelineBuilder::new()
        .analysis(config.analysis.build())
        .service(Box::new(service));
    if config.output.minitree {
        let sink = CsvSink::create(&args.out.join("minitree.csv"))?;
        builder = builder.sink(Box::new(sink));
    }
    let mut pipeline = builder.config(config).build()?;
    let summary = pipeline.run()?;

    if !plots_in_config {
        write_canonical_json(&args.out.join("histograms.json"), &pipeline.plots())?;
    }
    write_canonical_json(&args.out.join("summary.json"), &summary)?;
    info!(
        processed = summary.counts.processed,
        gen_good = summary.counts.gen_good,
        rec_good = summary.counts.rec_good,
        both_good = summary.counts.both_good,
        emitted = summary.counts.emitted,
        "run complete"
    );
    println!(
        "processed {} events, {} good at both levels ({:.1}%)",
        summary.counts.processed,
        summary.counts.both_good,
        100.0 * summary.both_good_fraction()
    );
    Ok(())
}
