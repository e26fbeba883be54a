//! `login-ingest` - run one ingestion pass and exit.
//!
//! Exit status is non-zero when the database cannot be reached at startup or
//! the queue cannot be fetched. Per-message failures only show up in the log
//! and the summary line.

use anyhow::Context;

use login_ingest::logging::init_logger;
use login_ingest::source::SqsQueueSource;
use login_ingest::storage::PgSink;
use login_ingest::transform::SystemClock;
use login_ingest::{log_info, log_warn};
use login_ingest::{Config, Pipeline, RunContext};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let config = Config::from_env().context("loading configuration")?;
    let run = RunContext::new();
    let ctx = run.log_context();

    log_info!(
        ctx,
        "RUN_START",
        queue = config.queue.url,
        strategy = config.idempotency
    );

    let source = SqsQueueSource::new(config.queue.clone()).context("building queue client")?;
    let mut sink = PgSink::connect(&config.database, config.idempotency, &ctx)
        .await
        .context("connecting to database")?;

    let result = {
        let mut pipeline = Pipeline::new(&source, &mut sink, &SystemClock);
        pipeline.run_once(&run).await
    };

    if let Err(e) = sink.close(&ctx).await {
        log_warn!(ctx, "DB_CLOSE_FAILED", error = e);
    }

    let summary = result.context("ingestion run aborted")?;
    if summary.failed() > 0 {
        log_warn!(ctx, "RUN_HAD_FAILURES", failed = summary.failed());
    }

    Ok(())
}
