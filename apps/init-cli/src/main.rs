use bootstrap::{BootstrapCommand, CommandReport, IndexTargeting, ProvisionOptions};
use clap::{Parser, ValueEnum};
use db_infra::orchestrate_bootstrap;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Command {
    Up,
    Status,
    Verify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum IndexTargets {
    /// Every index on `isolates` (historical layout)
    Literal,
    /// Each index on the collection of its own step
    Intended,
}

#[derive(Parser, Debug)]
#[command(name = "isolate-db-init")]
#[command(about = "Provision the isolate tracking MongoDB database")]
struct Args {
    /// Bootstrap command to run
    #[arg(value_enum, default_value = "up")]
    command: Command,

    /// Collection placement for the index steps
    #[arg(long, value_enum, default_value = "literal")]
    index_targets: IndexTargets,

    /// Skip a user or collection that already exists instead of failing
    #[arg(long)]
    if_missing: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn command(&self) -> BootstrapCommand {
        match self.command {
            Command::Up => BootstrapCommand::Up,
            Command::Status => BootstrapCommand::Status,
            Command::Verify => BootstrapCommand::Verify,
        }
    }

    fn options(&self) -> ProvisionOptions {
        ProvisionOptions {
            targeting: match self.index_targets {
                IndexTargets::Literal => IndexTargeting::Literal,
                IndexTargets::Intended => IndexTargeting::Intended,
            },
            if_missing: self.if_missing,
        }
    }

    fn log_filter(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            "bootstrap=info,db_infra=info,isolate_db_init=info,mongodb=warn"
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also land here and must exit 0.
            e.exit();
        }
    };

    init_tracing(args.log_filter());

    // Configuration comes from the container environment:
    // MONGO_INITDB_ROOT_USERNAME, MONGO_INITDB_ROOT_PASSWORD, MONGO_INITDB_DATABASE,
    // MONGODB_USERNAME, MONGODB_PASSWORD, optionally MONGO_HOST and MONGO_PORT.
    match orchestrate_bootstrap(args.command(), args.options()).await {
        Ok(CommandReport::Provisioned(outcome)) => {
            tracing::info!(
                created_user = outcome.user_created,
                collections_created = outcome.collections_created.len(),
                collections_skipped = outcome.collections_skipped.len(),
                indexes = outcome.indexes_applied.len(),
                "bootstrap complete"
            );
        }
        Ok(CommandReport::Status(_)) | Ok(CommandReport::Verified(_)) => {}
        Err(e) => {
            eprintln!("Bootstrap failed: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_historical_layout() {
        let args = Args::try_parse_from(["isolate-db-init"]).unwrap();

        assert_eq!(args.command(), BootstrapCommand::Up);
        assert_eq!(args.options(), ProvisionOptions::default());
        assert!(args.log_filter().contains("bootstrap=info"));
    }

    #[test]
    fn flags_map_to_options() {
        let args = Args::try_parse_from([
            "isolate-db-init",
            "verify",
            "--index-targets",
            "intended",
            "--if-missing",
            "-q",
        ])
        .unwrap();

        assert_eq!(args.command(), BootstrapCommand::Verify);
        assert_eq!(
            args.options(),
            ProvisionOptions {
                targeting: IndexTargeting::Intended,
                if_missing: true,
            }
        );
        assert_eq!(args.log_filter(), "warn");
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Args::try_parse_from(["isolate-db-init", "down"]).is_err());
        assert!(Args::try_parse_from(["isolate-db-init", "--index-targets", "fixed"]).is_err());
    }
}
