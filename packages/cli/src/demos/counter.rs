//! A click counter that stamps the time of its last reset.

use chrono::SecondsFormat;
use collection_literals::btree;
use reducible_runtime::{Component, Effect, ReducerOutcome};
use reducible_state::{Message, Schema, Value};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
    pub last_updated_at: Option<String>,
}

pub struct Counter;

impl Component for Counter {
    const ID: &'static str = "Counter";
    type State = CounterState;

    fn schema() -> Schema {
        Schema::builder()
            .field("count", 0)
            .field("last_updated_at", Value::Null)
            .build()
    }

    fn reduce(&self, state: CounterState, msg: &Message) -> ReducerOutcome<CounterState> {
        match msg.kind() {
            "increment" => ReducerOutcome::state(CounterState {
                count: state.count + 1,
                ..state
            }),
            "decrement" => ReducerOutcome::state(CounterState {
                count: (state.count - 1).max(0),
                ..state
            }),
            "reset" => {
                let log = Effect::deferred(|ctx, node| {
                    tracing::info!(path = %node.path, "reset count");
                    let at = ctx.now().to_rfc3339_opts(SecondsFormat::Secs, true);
                    Ok(Some(Message::new(
                        "reset_logged",
                        btree! { "at".to_string() => Value::from(at) },
                    )))
                });
                ReducerOutcome::with_effects(CounterState { count: 0, ..state }, vec![log])
            }
            "reset_logged" => ReducerOutcome::state(CounterState {
                last_updated_at: msg
                    .payload_field("at")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                ..state
            }),
            _ => ReducerOutcome::unhandled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(count: i64, kind: &str) -> CounterState {
        let state = CounterState {
            count,
            last_updated_at: None,
        };
        match Counter.reduce(state, &Message::bare(kind)) {
            ReducerOutcome::StateOnly(s) | ReducerOutcome::StateWithEffects(s, _) => s,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn increments_and_decrements() {
        assert_eq!(reduce(1, "increment").count, 2);
        assert_eq!(reduce(1, "decrement").count, 0);
    }

    #[test]
    fn decrement_stops_at_zero() {
        assert_eq!(reduce(0, "decrement").count, 0);
    }

    #[test]
    fn reset_schedules_log() {
        let state = CounterState {
            count: 9,
            last_updated_at: None,
        };
        let outcome = Counter.reduce(state, &Message::bare("reset"));
        assert!(matches!(
            outcome,
            ReducerOutcome::StateWithEffects(CounterState { count: 0, .. }, ref effects) if effects.len() == 1
        ));
    }

    #[test]
    fn unknown_kind_is_unhandled() {
        let state = CounterState {
            count: 0,
            last_updated_at: None,
        };
        assert!(matches!(
            Counter.reduce(state, &Message::bare("jump")),
            ReducerOutcome::Unhandled
        ));
    }
}
