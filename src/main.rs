use clap::Parser;
use gstat::Timestamp;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Send one metric to graphite, reading CARBON_HOST/CARBON_PORT from the environment.
#[derive(Parser, Debug)]
#[command(name = "gstat", version, about, long_about = None)]
struct Args {
    /// Metric name, e.g. app.requests.count
    metric: String,
    /// Numeric value
    value: String,
    /// Seconds since the unix epoch, defaults to now
    timestamp: Option<String>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let timestamp = args
        .timestamp
        .as_deref()
        .map(str::parse::<Timestamp>)
        .transpose();
    let result = match timestamp {
        Ok(timestamp) => gstat::emit(&args.metric, &args.value, timestamp),
        Err(err) => {
            error!(
                "gstat({:?}, {:?}, {:?}) failed. ignoring: {err}",
                args.metric, args.value, args.timestamp
            );
            None
        }
    };
    println!("{}", result.as_deref().unwrap_or("None"));
}
