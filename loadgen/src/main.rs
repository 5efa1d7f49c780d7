use std::{
    process::ExitCode,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::Parser;
use hdrhistogram::Histogram;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Race many bookings for the same instrument and start time against a scopectl deployment.
///
/// Point `--url` at a load balancer in front of several replicas to exercise the coordinator
/// lock across processes. Exactly one booking should win.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the reservation service
    #[arg(long, default_value = "http://localhost:5000")]
    url: String,

    /// Total number of booking attempts
    #[arg(long, default_value_t = 100)]
    requests: u32,

    /// Number of attempts in flight at once
    #[arg(long, default_value_t = 20)]
    concurrency: u32,

    /// Instrument to book
    #[arg(long, default_value = "Hubble-Acad")]
    instrument: String,

    /// Slot start; defaults to the next whole hour in UTC so repeated runs hit fresh slots
    #[arg(long)]
    start_time_utc: Option<String>,

    /// Per-request timeout
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Serialize)]
struct ReservationCreate<'a> {
    scientist_id: String,
    instrument: &'a str,
    start_time_utc: &'a str,
}

/// What one attempt came back with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Created,
    Rejected,
    Other,
}

impl Outcome {
    fn from_status(status: Option<StatusCode>) -> Self {
        match status {
            Some(StatusCode::CREATED) => Outcome::Created,
            Some(StatusCode::CONFLICT) => Outcome::Rejected,
            _ => Outcome::Other,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct Tally {
    created: u32,
    rejected: u32,
    other: u32,
}

impl Tally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Other => self.other += 1,
        }
    }

    /// More than one winner means two clients hold the same slot.
    fn double_booked(&self) -> bool {
        self.created > 1
    }
}

fn next_hour() -> String {
    use chrono::{DurationRound, TimeDelta, Utc};

    let now = Utc::now();
    now.duration_trunc(TimeDelta::hours(1))
        .map(|hour| hour + TimeDelta::hours(1))
        .unwrap_or(now)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

async fn run(args: &Args, start_time_utc: &str) -> anyhow::Result<(Tally, Vec<Duration>, Duration)> {
    let client = Client::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let url = format!("{}/api/v1/reservations", args.url.trim_end_matches('/'));

    let concurrency = args.concurrency.max(1);
    let requests_per_worker = args.requests / concurrency;
    let remaining_requests = args.requests % concurrency;

    let (tx, mut rx) = mpsc::channel::<(Outcome, Duration)>(args.requests.max(1) as usize);
    let start = Instant::now();

    let mut workers = vec![];
    for i in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        let tx = tx.clone();
        let instrument = args.instrument.clone();
        let start_time_utc = start_time_utc.to_string();
        let num_requests = requests_per_worker + if i < remaining_requests { 1 } else { 0 };

        workers.push(tokio::spawn(async move {
            for n in 0..num_requests {
                let body = ReservationCreate {
                    scientist_id: format!("loadgen-{i}-{n}"),
                    instrument: &instrument,
                    start_time_utc: &start_time_utc,
                };
                let req_start = Instant::now();
                let status = match client.post(&url).json(&body).send().await {
                    Ok(response) => Some(response.status()),
                    Err(e) => {
                        tracing::debug!("Request failed: {}", e);
                        None
                    }
                };
                if tx.send((Outcome::from_status(status), req_start.elapsed())).await.is_err() {
                    tracing::error!("Failed to send result to channel");
                }
            }
        }));
    }
    drop(tx);

    let mut tally = Tally::default();
    let mut durations = Vec::with_capacity(args.requests as usize);
    while let Some((outcome, duration)) = rx.recv().await {
        tally.record(outcome);
        durations.push(duration);
    }

    for worker in workers {
        worker.await.context("worker task failed")?;
    }

    Ok((tally, durations, start.elapsed()))
}

fn report(tally: &Tally, durations: Vec<Duration>, total: Duration) -> anyhow::Result<()> {
    let mut latencies = Histogram::<u64>::new(3).context("failed to create histogram")?;
    for duration in durations {
        latencies
            .record(duration.as_millis() as u64)
            .context("failed to record latency")?;
    }

    println!("total time:     {:.2}s", total.as_secs_f64());
    println!("201 created:    {}", tally.created);
    println!("409 rejected:   {}", tally.rejected);
    println!("other:          {}", tally.other);
    println!(
        "latency ms:     p50={} p90={} p99={} min={} max={} avg={:.1}",
        latencies.value_at_percentile(50.0),
        latencies.value_at_percentile(90.0),
        latencies.value_at_percentile(99.0),
        latencies.min(),
        latencies.max(),
        latencies.mean(),
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "loadgen=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let start_time_utc = args.start_time_utc.clone().unwrap_or_else(next_hour);
    tracing::info!(
        instrument = %args.instrument,
        %start_time_utc,
        requests = args.requests,
        concurrency = args.concurrency,
        "Racing bookings against {}",
        args.url
    );

    let (tally, durations, total) = run(&args, &start_time_utc).await?;
    report(&tally, durations, total)?;

    if tally.double_booked() {
        tracing::error!("{} bookings succeeded for one slot", tally.created);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
