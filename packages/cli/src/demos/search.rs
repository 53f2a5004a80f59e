//! Incremental search over a fixed word list.

use reducible_runtime::{Component, ReducerOutcome};
use reducible_state::{Message, Schema, Value};
use serde::{Deserialize, Serialize};

pub const ITEMS: &[&str] = &[
    "Adapter",
    "Component",
    "Counter",
    "Dispatch",
    "Envelope",
    "Helpers",
    "Message",
    "Reducer",
    "Registry",
    "Runtime",
    "State",
    "ViewComponent",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<String>,
}

fn all_items() -> Vec<String> {
    ITEMS.iter().map(|item| item.to_string()).collect()
}

/// Case-insensitive substring match. An empty query matches everything.
pub fn filter_items(query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    ITEMS
        .iter()
        .filter(|item| item.to_lowercase().contains(&needle))
        .map(|item| item.to_string())
        .collect()
}

pub struct Search;

impl Component for Search {
    const ID: &'static str = "IncrementalSearch";
    type State = SearchState;

    fn schema() -> Schema {
        Schema::builder()
            .field("query", "")
            .computed("results", || Value::from(ITEMS.to_vec()))
            .build()
    }

    fn reduce(&self, _state: SearchState, msg: &Message) -> ReducerOutcome<SearchState> {
        match msg.kind() {
            "set_query" => {
                let query = match msg.payload_field("query") {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                ReducerOutcome::state(SearchState {
                    results: filter_items(&query),
                    query,
                })
            }
            "reset" => ReducerOutcome::state(SearchState {
                query: String::new(),
                results: all_items(),
            }),
            _ => ReducerOutcome::unhandled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_case_insensitive() {
        assert_eq!(filter_items("RE"), vec!["Reducer", "Registry"]);
        assert_eq!(filter_items("count"), vec!["Counter"]);
        assert_eq!(filter_items("").len(), ITEMS.len());
        assert!(filter_items("zzz").is_empty());
    }

    #[test]
    fn default_results_are_every_item() {
        let defaults = Search::schema().defaults();
        assert_eq!(defaults.get("results"), Some(&Value::from(ITEMS.to_vec())));
        assert_eq!(defaults.get("query"), Some(&Value::from("")));
    }
}
