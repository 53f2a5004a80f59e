//! The reducer contract.
//!
//! A component owns a typed state record described by a [`Schema`] and a
//! pure reducer `(state, message) -> outcome`. The runtime only ever talks
//! to components through the object-safe [`ComponentDef`]; typed
//! [`Component`]s are wrapped automatically on registration.

use std::fmt;
use std::sync::Arc;

use reducible_state::{from_value, to_value, Message, Schema, StateMap, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::effect::Effect;
use crate::error::{DispatchError, Result};

/// What a reducer returns.
///
/// `StateOnly(s)` and `StateWithEffects(s, vec![])` are equivalent.
pub enum ReducerOutcome<S> {
    /// The next state, no follow-up work.
    StateOnly(S),
    /// The next state and effects to run against the same node, in order.
    StateWithEffects(S, Vec<Effect>),
    /// The reducer does not handle this message kind.
    Unhandled,
    /// The reducer assembled a result of the wrong shape.
    Invalid(String),
}

/// One element of a sequence-shaped reducer result.
pub enum Returned<S> {
    State(S),
    Effect(Effect),
}

impl<S> ReducerOutcome<S> {
    pub fn state(state: S) -> Self {
        ReducerOutcome::StateOnly(state)
    }

    pub fn with_effects(state: S, effects: Vec<Effect>) -> Self {
        ReducerOutcome::StateWithEffects(state, effects)
    }

    pub fn unhandled() -> Self {
        ReducerOutcome::Unhandled
    }

    /// Interpret a sequence result.
    ///
    /// `[state]` is a bare state and `[state, effect, ...]` carries effects.
    /// An empty sequence, or anything but a state in first position and
    /// effects after it, is `Invalid`.
    pub fn from_sequence(parts: Vec<Returned<S>>) -> Self {
        let mut parts = parts.into_iter();
        let state = match parts.next() {
            Some(Returned::State(state)) => state,
            Some(Returned::Effect(_)) => {
                return ReducerOutcome::Invalid("first element must be the next state".into())
            }
            None => return ReducerOutcome::Invalid("empty result sequence".into()),
        };

        let mut effects = Vec::new();
        for (i, part) in parts.enumerate() {
            match part {
                Returned::Effect(effect) => effects.push(effect),
                Returned::State(_) => {
                    return ReducerOutcome::Invalid(format!(
                        "element {} must be an effect, found a state",
                        i + 1
                    ))
                }
            }
        }

        if effects.is_empty() {
            ReducerOutcome::StateOnly(state)
        } else {
            ReducerOutcome::StateWithEffects(state, effects)
        }
    }

    /// Normalize into `(next_state, effects)`.
    pub fn into_parts(self, component: &str, message: &Message) -> Result<(S, Vec<Effect>)> {
        match self {
            ReducerOutcome::StateOnly(state) => Ok((state, Vec::new())),
            ReducerOutcome::StateWithEffects(state, effects) => Ok((state, effects)),
            ReducerOutcome::Unhandled => Err(DispatchError::UnhandledMessage {
                component: component.to_string(),
                kind: message.kind().to_string(),
            }),
            ReducerOutcome::Invalid(reason) => Err(DispatchError::InvalidReducerResult {
                component: component.to_string(),
                reason,
            }),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ReducerOutcome<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReducerOutcome::StateOnly(s) => f.debug_tuple("StateOnly").field(s).finish(),
            ReducerOutcome::StateWithEffects(s, effects) => f
                .debug_tuple("StateWithEffects")
                .field(s)
                .field(&effects.len())
                .finish(),
            ReducerOutcome::Unhandled => f.write_str("Unhandled"),
            ReducerOutcome::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}

/// A component type with a typed state record.
///
/// Reducers must be pure: no I/O, no clock, no randomness. Return an
/// [`Effect`] for anything of that sort.
///
/// # Example
///
/// ```rust
/// use reducible_runtime::{Component, ReducerOutcome};
/// use reducible_state::{Message, Schema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct CounterState {
///     count: i64,
/// }
///
/// struct Counter;
///
/// impl Component for Counter {
///     const ID: &'static str = "Counter";
///     type State = CounterState;
///
///     fn schema() -> Schema {
///         Schema::builder().field("count", 0).build()
///     }
///
///     fn reduce(&self, state: CounterState, msg: &Message) -> ReducerOutcome<CounterState> {
///         match msg.kind() {
///             "increment" => ReducerOutcome::state(CounterState { count: state.count + 1 }),
///             _ => ReducerOutcome::state(state),
///         }
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Stable identifier written into envelopes.
    const ID: &'static str;

    /// The typed state record. Must serialize to a map.
    type State: Serialize + DeserializeOwned;

    /// Declared fields and defaults.
    fn schema() -> Schema;

    /// Compute the next state for a message.
    fn reduce(&self, state: Self::State, msg: &Message) -> ReducerOutcome<Self::State>;
}

/// Hydrate a component's default state record.
///
/// Reducers use this to reset to schema defaults.
pub fn default_state<C: Component>() -> Result<C::State> {
    hydrate::<C::State>(C::ID, C::schema().build(Some(&StateMap::new())))
}

/// Next state and pending effects of one reduction, as stored in an envelope.
#[derive(Debug)]
pub struct Reduction {
    pub data: StateMap,
    pub effects: Vec<Effect>,
}

/// Object-safe view of a component, as held by the registry.
pub trait ComponentDef: Send + Sync {
    fn id(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Reduce persisted `data` with `msg`.
    ///
    /// The returned data has been passed back through the schema, so only
    /// declared fields remain.
    fn reduce(&self, data: &StateMap, msg: &Message) -> Result<Reduction> {
        self.reduce_built(self.schema().build(Some(data)), msg)
    }

    /// Reduce `state`, which has already been built by this component's
    /// schema. Defaults are not evaluated again.
    fn reduce_built(&self, state: StateMap, msg: &Message) -> Result<Reduction>;
}

fn hydrate<S: DeserializeOwned>(component: &str, state: StateMap) -> Result<S> {
    from_value(Value::Map(state)).map_err(|e| DispatchError::InvalidState {
        component: component.to_string(),
        message: e.to_string(),
    })
}

fn persist<S: Serialize>(component: &str, schema: &Schema, state: &S) -> Result<StateMap> {
    let invalid = |reason: String| DispatchError::InvalidReducerResult {
        component: component.to_string(),
        reason,
    };

    let map = to_value(state)
        .map_err(|e| invalid(e.to_string()))?
        .into_map()
        .ok_or_else(|| invalid("next state does not serialize to a map".to_string()))?;
    Ok(schema.build(Some(&map)))
}

/// Registry wrapper around a typed [`Component`].
pub(crate) struct TypedComponent<C: Component> {
    component: C,
    schema: Schema,
}

impl<C: Component> TypedComponent<C> {
    pub(crate) fn new(component: C) -> Self {
        Self {
            component,
            schema: C::schema(),
        }
    }
}

impl<C: Component> ComponentDef for TypedComponent<C> {
    fn id(&self) -> &str {
        C::ID
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn reduce_built(&self, state: StateMap, msg: &Message) -> Result<Reduction> {
        let state: C::State = hydrate(C::ID, state)?;
        let (next, effects) = self.component.reduce(state, msg).into_parts(C::ID, msg)?;
        Ok(Reduction {
            data: persist(C::ID, &self.schema, &next)?,
            effects,
        })
    }
}

/// Signature of a reducer over raw state maps.
pub type DynamicReducer = Arc<dyn Fn(StateMap, &Message) -> ReducerOutcome<StateMap> + Send + Sync>;

/// A component defined at runtime: an id, a schema and a reducer over
/// untyped state maps.
#[derive(Clone)]
pub struct DynamicComponent {
    id: String,
    schema: Schema,
    reducer: DynamicReducer,
}

impl DynamicComponent {
    pub fn new<F>(id: impl Into<String>, schema: Schema, reducer: F) -> Self
    where
        F: Fn(StateMap, &Message) -> ReducerOutcome<StateMap> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            schema,
            reducer: Arc::new(reducer),
        }
    }
}

impl fmt::Debug for DynamicComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicComponent")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .finish()
    }
}

impl ComponentDef for DynamicComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn reduce_built(&self, state: StateMap, msg: &Message) -> Result<Reduction> {
        let (next, effects) = (self.reducer)(state, msg).into_parts(&self.id, msg)?;
        Ok(Reduction {
            data: self.schema.build(Some(&next)),
            effects,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct CounterState {
        count: i64,
        #[serde(default)]
        last_updated_at: Option<String>,
    }

    struct Counter;

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
                "reset" => match default_state::<Counter>() {
                    Ok(fresh) => ReducerOutcome::state(fresh),
                    Err(e) => ReducerOutcome::Invalid(e.to_string()),
                },
                _ => ReducerOutcome::unhandled(),
            }
        }
    }

    /// Hydrates from a map but hands back a bare number.
    struct Scalar;

    impl Component for Scalar {
        const ID: &'static str = "Scalar";
        type State = serde_json::Value;

        fn schema() -> Schema {
            Schema::builder().field("n", 0).build()
        }

        fn reduce(
            &self,
            _state: serde_json::Value,
            _msg: &Message,
        ) -> ReducerOutcome<serde_json::Value> {
            ReducerOutcome::state(serde_json::Value::from(5))
        }
    }

    #[test]
    fn typed_reduce_round_trips_through_schema() {
        let def = TypedComponent::new(Counter);
        let data = btree! {
            "count".to_string() => Value::from(2),
            "stale".to_string() => Value::from("dropped"),
        };

        let out = def.reduce(&data, &Message::bare("Increment")).unwrap();
        assert_eq!(
            out.data,
            btree! {
                "count".to_string() => Value::from(3),
                "last_updated_at".to_string() => Value::Null,
            }
        );
        assert!(out.effects.is_empty());
    }

    #[test]
    fn default_state_matches_schema() {
        let state = default_state::<Counter>().unwrap();
        assert_eq!(state.count, 0);
        assert!(state.last_updated_at.is_none());
    }

    #[test]
    fn unhandled_kind_is_an_error() {
        let def = TypedComponent::new(Counter);
        let err = def
            .reduce(&StateMap::new(), &Message::bare("Unknown"))
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::UnhandledMessage { ref component, ref kind }
                if component == "Counter" && kind == "unknown"
        ));
    }

    #[test]
    fn non_map_state_is_invalid_result() {
        let def = TypedComponent::new(Scalar);
        let err = def.reduce(&StateMap::new(), &Message::bare("go")).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidReducerResult { .. }));
    }

    #[test]
    fn wrong_shaped_data_is_invalid_state() {
        let def = TypedComponent::new(Counter);
        let data = btree! { "count".to_string() => Value::from("lots") };
        let err = def.reduce(&data, &Message::bare("increment")).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidState { .. }));
    }

    #[test]
    fn sequence_shapes() {
        let one: ReducerOutcome<i64> = ReducerOutcome::from_sequence(vec![Returned::State(1)]);
        assert!(matches!(one, ReducerOutcome::StateOnly(1)));

        let many = ReducerOutcome::from_sequence(vec![
            Returned::State(1),
            Returned::Effect(Effect::emit(Message::bare("a"))),
            Returned::Effect(Effect::emit(Message::bare("b"))),
        ]);
        assert!(matches!(many, ReducerOutcome::StateWithEffects(1, ref e) if e.len() == 2));

        let empty: ReducerOutcome<i64> = ReducerOutcome::from_sequence(vec![]);
        assert!(matches!(empty, ReducerOutcome::Invalid(_)));

        let leading_effect: ReducerOutcome<i64> =
            ReducerOutcome::from_sequence(vec![Returned::Effect(Effect::emit(Message::bare("a")))]);
        assert!(matches!(leading_effect, ReducerOutcome::Invalid(_)));

        let two_states = ReducerOutcome::from_sequence(vec![Returned::State(1), Returned::State(2)]);
        assert!(matches!(two_states, ReducerOutcome::Invalid(ref r) if r.contains("element 1")));
    }

    #[test]
    fn invalid_outcome_maps_to_dispatch_error() {
        let msg = Message::bare("go");
        let err = ReducerOutcome::<i64>::Invalid("bad".into())
            .into_parts("Widget", &msg)
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidReducerResult { ref component, ref reason }
                if component == "Widget" && reason == "bad"
        ));
    }

    #[test]
    fn dynamic_component_filters_undeclared_fields() {
        let def = DynamicComponent::new(
            "Tags",
            Schema::builder().computed("tags", Value::array).build(),
            |mut state, msg| {
                if let Some(Value::Array(tags)) = state.get_mut("tags") {
                    tags.push(Value::from(msg.kind()));
                }
                state.insert("scratch".to_string(), Value::from(true));
                ReducerOutcome::state(state)
            },
        );

        let out = def.reduce(&StateMap::new(), &Message::bare("Added")).unwrap();
        assert_eq!(out.data.get("tags"), Some(&Value::from(vec!["added"])));
        assert!(!out.data.contains_key("scratch"));
    }
}
