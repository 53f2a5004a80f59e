//! # reducible-cli
//!
//! A command-line driver for reducible components.
//!
//! Each invocation loads a signed state token, applies at most one message
//! and prints the rendered tree together with the next token, so a whole
//! session can be replayed from a shell.
//!
//! ## Usage
//!
//! ```bash
//! # List the bundled demos
//! reducible components
//!
//! # Start a counter and bump it
//! TOKEN=$(reducible init counter | tail -n1 | cut -d' ' -f2)
//! reducible dispatch --state "$TOKEN" --msg increment --trace
//!
//! # Send a message to a nested component
//! DASH=$(reducible init dashboard -q)
//! reducible dispatch --state "$DASH" --msg increment --target root/counter
//! ```
//!
//! Tokens are signed with `REDUCIBLE_SECRET` (or `--secret`).

pub mod commands;
pub mod demos;
pub mod text;

pub use commands::{components, format_outcome, CliError, Driver, Outcome};
pub use text::TextRenderer;
