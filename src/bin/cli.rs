//! bucketkv CLI
//!
//! Command-line tool for inspecting and editing a bucketkv store file.

use std::process;

use bucketkv::{Config, BucketKvError, Store};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// bucketkv CLI
#[derive(Parser, Debug)]
#[command(name = "bucketkv-cli")]
#[command(about = "Inspect and edit a bucketkv store")]
#[command(version)]
struct Args {
    /// Path of the store file
    #[arg(short, long, default_value = "./bucketkv.db")]
    path: String,

    /// Skip compacting the commit log on exit
    #[arg(long)]
    no_compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List bucket names
    Buckets,

    /// Create a bucket if it does not exist
    CreateBucket {
        /// Bucket name
        name: String,
    },

    /// Get a value by key
    Get {
        /// Bucket name
        bucket: String,

        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// Bucket name
        bucket: String,

        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Count keys in a bucket
    Count {
        /// Bucket name
        bucket: String,

        /// Only count keys with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Print key/value pairs in ascending key order
    Scan {
        /// Bucket name
        bucket: String,

        /// Only print keys with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Rewrite the commit log as a single entry
    Compact,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,bucketkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.path)
        .compact_on_close(!args.no_compact)
        .build();

    let store = match Store::open_with_config(config, std::iter::empty::<&[u8]>()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            process::exit(1);
        }
    };

    let outcome = run(&store, args.command);
    let closed = store.close();

    if let Err(e) = outcome.and(closed) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(store: &Store, command: Commands) -> Result<(), BucketKvError> {
    match command {
        Commands::Buckets => {
            for name in store.bucket_names() {
                println!("{}", String::from_utf8_lossy(&name));
            }
        }
        Commands::CreateBucket { name } => {
            store.update(|tx| tx.create_bucket_if_absent(name.as_bytes()).map(|_| ()))?;
        }
        Commands::Get { bucket, key } => {
            let value = store.get(bucket.as_bytes(), key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Put { bucket, key, value } => {
            store.put(bucket.as_bytes(), key.as_bytes(), value.as_bytes())?;
        }
        Commands::Count { bucket, prefix } => {
            let count = match prefix {
                Some(prefix) => store.count_prefix(bucket.as_bytes(), prefix.as_bytes())?,
                None => store.count(bucket.as_bytes())?,
            };
            println!("{}", count);
        }
        Commands::Scan { bucket, prefix } => {
            let print = |key: &[u8], value: &[u8]| {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(value)
                );
                Ok::<_, BucketKvError>(())
            };
            match prefix {
                Some(prefix) => store.each_prefix(bucket.as_bytes(), prefix.as_bytes(), print)?,
                None => store.each(bucket.as_bytes(), print)?,
            }
        }
        Commands::Compact => store.compact()?,
    }
    Ok(())
}
