use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reducible_cli::{components, format_outcome, Driver};

/// reducible - drive server-side components from the shell
#[derive(Parser, Debug)]
#[command(name = "reducible")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Secret used to sign state tokens (defaults to REDUCIBLE_SECRET)
    #[arg(long, global = true)]
    secret: Option<String>,

    /// Log dispatch and effect activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print the state token
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a demo's initial tree and print its token
    Init {
        /// Demo name, see `components`
        component: String,
    },

    /// Apply one message to a state token
    Dispatch {
        /// Token from a previous command
        #[arg(long)]
        state: String,

        /// Message type, e.g. `increment`
        #[arg(long)]
        msg: String,

        /// Message payload as JSON
        #[arg(long)]
        payload: Option<String>,

        /// Path of the node to deliver to (defaults to the token's root)
        #[arg(long)]
        target: Option<String>,

        /// Show the message chain and changed fields
        #[arg(long)]
        trace: bool,
    },

    /// Decode and render a state token
    Show {
        #[arg(long)]
        state: String,

        /// Print the tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the bundled demos
    Components,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> reducible_cli::commands::Result<String> {
    if let Command::Components = args.command {
        return Ok(components());
    }

    let driver = Driver::new(args.secret)?;
    let quiet = args.quiet;
    let print = |outcome: reducible_cli::Outcome, trace: bool| {
        if quiet {
            format!("{}\n", outcome.token)
        } else {
            format_outcome(&outcome, trace)
        }
    };

    match args.command {
        Command::Init { component } => Ok(print(driver.init(&component)?, false)),
        Command::Dispatch {
            state,
            msg,
            payload,
            target,
            trace,
        } => {
            let outcome =
                driver.dispatch(&state, &msg, payload.as_deref(), target.as_deref())?;
            Ok(print(outcome, trace))
        }
        Command::Show { state, json } => {
            if json {
                Ok(format!("{}\n", driver.show_json(&state)?))
            } else {
                Ok(print(driver.show(&state)?, false))
            }
        }
        Command::Components => Ok(components()),
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
