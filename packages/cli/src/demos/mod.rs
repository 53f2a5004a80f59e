//! Bundled demo components.

pub mod booking;
pub mod counter;
pub mod dashboard;
pub mod search;

use reducible_runtime::{Component, Registry};
use reducible_state::{Envelope, ROOT_PATH};

use booking::Booking;
use counter::Counter;
use dashboard::Dashboard;
use search::Search;

/// What the CLI knows about one demo.
#[derive(Clone, Copy, Debug)]
pub struct Demo {
    /// Name used on the command line.
    pub name: &'static str,
    pub component_id: &'static str,
    pub summary: &'static str,
    /// Message kinds a user can send.
    pub messages: &'static [&'static str],
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "counter",
        component_id: Counter::ID,
        summary: "click counter; reset logs the time through an effect",
        messages: &["increment", "decrement", "reset"],
    },
    Demo {
        name: "search",
        component_id: Search::ID,
        summary: "incremental search over a word list",
        messages: &["set_query {\"query\": \"..\"}", "reset"],
    },
    Demo {
        name: "booking",
        component_id: Booking::ID,
        summary: "day, time and staff selection with chained lookups",
        messages: &[
            "select_day {\"day\": 12}",
            "select_time {\"time\": \"10:00\"}",
            "select_staff {\"staff\": \"Aki\"}",
        ],
    },
    Demo {
        name: "dashboard",
        component_id: Dashboard::ID,
        summary: "parent with a counter at root/counter and a search at root/search",
        messages: &["rename {\"title\": \"..\"}"],
    },
];

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name == name.trim().to_lowercase())
}

/// Registry holding every demo component.
pub fn registry() -> Registry {
    Registry::builder()
        .register(Counter)
        .register(Search)
        .register(Booking)
        .register(Dashboard)
        .build()
}

/// The initial tree for a demo, rooted at `root`.
pub fn initial_tree(demo: &Demo) -> Envelope {
    let id = demo.component_id;
    if id == Dashboard::ID {
        Dashboard::tree(ROOT_PATH)
    } else if id == Counter::ID {
        Envelope::initial(id, &Counter::schema(), ROOT_PATH)
    } else if id == Search::ID {
        Envelope::initial(id, &Search::schema(), ROOT_PATH)
    } else {
        Envelope::initial(Booking::ID, &Booking::schema(), ROOT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_is_registered() {
        let registry = registry();
        for demo in DEMOS {
            assert!(registry.contains(demo.component_id), "{}", demo.name);
            assert_eq!(initial_tree(demo).component_id, demo.component_id);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(find("Counter").map(|d| d.component_id), Some("Counter"));
        assert!(find("calendar").is_none());
    }
}
