//! A parent page nesting a counter and a search box.

use reducible_runtime::{Component, ReducerOutcome};
use reducible_state::{Envelope, Message, Schema, Value};
use serde::{Deserialize, Serialize};

use super::counter::Counter;
use super::search::Search;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub title: String,
}

pub struct Dashboard;

impl Dashboard {
    /// The dashboard with its children at `root/counter` and `root/search`.
    pub fn tree(path: &str) -> Envelope {
        Envelope::initial(Self::ID, &Self::schema(), path)
            .with_child(Envelope::initial(
                Counter::ID,
                &Counter::schema(),
                Envelope::child_path(path, "counter"),
            ))
            .with_child(Envelope::initial(
                Search::ID,
                &Search::schema(),
                Envelope::child_path(path, "search"),
            ))
    }
}

impl Component for Dashboard {
    const ID: &'static str = "Dashboard";
    type State = DashboardState;

    fn schema() -> Schema {
        Schema::builder().field("title", "Dashboard").build()
    }

    fn reduce(&self, state: DashboardState, msg: &Message) -> ReducerOutcome<DashboardState> {
        match msg.kind() {
            "rename" => match msg.payload_field("title").and_then(Value::as_str) {
                Some(title) if !title.trim().is_empty() => ReducerOutcome::state(DashboardState {
                    title: title.trim().to_string(),
                }),
                _ => ReducerOutcome::state(state),
            },
            _ => ReducerOutcome::unhandled(),
        }
    }
}
