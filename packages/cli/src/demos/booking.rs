//! Appointment booking: pick a day, then a time, then a staff member.
//!
//! Availability comes from effects standing in for backend lookups, so a
//! single selection produces a chain of follow-up messages.

use collection_literals::btree;
use reducible_runtime::{Component, Effect, ReducerOutcome, Returned};
use reducible_state::{from_value, to_value, Message, Schema, Value};
use serde::{Deserialize, Serialize};

const YEAR: i64 = 2024;
const MONTH: i64 = 3;
const DAYS: i64 = 30;
const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const STATUS_MARKS: [&str; 3] = ["circle", "triangle", "cross"];
const BASE_TIMES: [&str; 2] = ["10:00", "14:00"];
const BASE_STAFF: [&str; 1] = ["Aki"];
pub const STAFF_OPTIONS: [&str; 3] = ["Aki", "Mika", "Sora"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: i64,
    pub date: String,
    pub weekday: String,
    pub status: String,
    pub year: i64,
    pub month: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookingState {
    pub calendar_days: Vec<CalendarDay>,
    pub selected_day: Option<i64>,
    pub selected_time: Option<String>,
    pub selected_staff: Option<String>,
    pub available_times: Vec<String>,
    pub available_staff: Vec<String>,
}

pub fn calendar_days() -> Vec<CalendarDay> {
    (1..=DAYS)
        .map(|day| CalendarDay {
            day,
            date: format!("{}/{:02}", MONTH, day),
            weekday: WEEKDAYS[((day - 1) % 7) as usize].to_string(),
            status: STATUS_MARKS[(day % 3) as usize].to_string(),
            year: YEAR,
            month: MONTH,
        })
        .collect()
}

fn time_options() -> Vec<String> {
    (9..=18).map(|hour| format!("{:02}:00", hour)).collect()
}

/// Open slots for a day: between one and six consecutive hours.
pub fn available_times(day: i64) -> Vec<String> {
    let options = time_options();
    let count = (day.rem_euclid(6) + 1) as usize;
    let start = day.rem_euclid(options.len() as i64) as usize;
    options.iter().cycle().skip(start).take(count).cloned().collect()
}

/// Staff free at a time: at least two, chosen by a seed derived from the time.
pub fn available_staff(time: &str) -> Vec<String> {
    let size = STAFF_OPTIONS.len();
    let min_count = size.min(2);
    let seed: usize = time.bytes().map(usize::from).sum();
    let range = size - min_count;
    let count = if range == 0 {
        min_count
    } else {
        min_count + seed % (range + 1)
    };
    STAFF_OPTIONS
        .iter()
        .cycle()
        .skip(seed % size)
        .take(count)
        .map(|s| s.to_string())
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn payload_day(msg: &Message) -> Option<i64> {
    match msg.payload_field("day")? {
        Value::Integer(day) => Some(*day),
        Value::String(day) => day.trim().parse().ok(),
        _ => None,
    }
}

fn payload_string(msg: &Message, name: &str) -> Option<String> {
    msg.payload_field(name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn payload_list<T: serde::de::DeserializeOwned>(msg: &Message, name: &str) -> Vec<T> {
    msg.payload_field(name)
        .cloned()
        .and_then(|value| from_value(value).ok())
        .unwrap_or_default()
}

/// An effect that emits `kind` with a payload computed when it runs.
fn lookup<F>(kind: &'static str, compute: F) -> Effect
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    Effect::deferred(move |_ctx, _node| Ok(Some(Message::new(kind, compute()))))
}

pub struct Booking;

impl Component for Booking {
    const ID: &'static str = "Booking";
    type State = BookingState;

    fn schema() -> Schema {
        Schema::builder()
            .computed("calendar_days", || {
                to_value(&calendar_days()).unwrap_or_else(|_| Value::array())
            })
            .field("selected_day", Value::Null)
            .field("selected_time", Value::Null)
            .field("selected_staff", Value::Null)
            .computed("available_times", Value::array)
            .computed("available_staff", Value::array)
            .build()
    }

    fn reduce(&self, state: BookingState, msg: &Message) -> ReducerOutcome<BookingState> {
        match msg.kind() {
            "select_day" => {
                // An unusable or unchanged day leaves the state as is.
                let Some(day) = payload_day(msg).filter(|&d| state.selected_day != Some(d)) else {
                    return ReducerOutcome::state(state);
                };
                let next = BookingState {
                    selected_day: Some(day),
                    selected_time: None,
                    selected_staff: None,
                    available_times: strings(&BASE_TIMES),
                    available_staff: Vec::new(),
                    ..state
                };
                ReducerOutcome::from_sequence(vec![
                    Returned::State(next),
                    Returned::Effect(lookup("calendar_loaded", || {
                        Value::from(btree! {
                            "days".to_string() => to_value(&calendar_days()).unwrap_or_default(),
                        })
                    })),
                    Returned::Effect(lookup("times_loaded", move || {
                        Value::from(btree! {
                            "times".to_string() => Value::from(available_times(day)),
                        })
                    })),
                ])
            }
            "select_time" => {
                let Some(time) = payload_string(msg, "time")
                    .filter(|t| state.selected_time.as_deref() != Some(t.as_str()))
                else {
                    return ReducerOutcome::state(state);
                };
                let effect_time = time.clone();
                let staff = lookup("staff_loaded", move || {
                    Value::from(btree! {
                        "staff".to_string() => Value::from(available_staff(&effect_time)),
                        "time".to_string() => Value::from(effect_time.as_str()),
                    })
                });
                ReducerOutcome::with_effects(
                    BookingState {
                        selected_time: Some(time),
                        selected_staff: None,
                        available_staff: strings(&BASE_STAFF),
                        ..state
                    },
                    vec![staff],
                )
            }
            "times_loaded" => ReducerOutcome::state(BookingState {
                available_times: payload_list(msg, "times"),
                ..state
            }),
            "staff_loaded" => ReducerOutcome::state(BookingState {
                available_staff: payload_list(msg, "staff"),
                ..state
            }),
            "calendar_loaded" => ReducerOutcome::state(BookingState {
                calendar_days: payload_list(msg, "days"),
                ..state
            }),
            "select_staff" => {
                let staff = msg.payload_field("staff").cloned().unwrap_or_default();
                let confirm = Effect::emit(Message::new(
                    "staff_selected",
                    btree! { "staff".to_string() => staff },
                ));
                ReducerOutcome::with_effects(state, vec![confirm])
            }
            "staff_selected" => ReducerOutcome::state(BookingState {
                selected_staff: payload_string(msg, "staff"),
                ..state
            }),
            _ => ReducerOutcome::unhandled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_has_a_month_of_days() {
        let days = calendar_days();
        assert_eq!(days.len(), 30);
        assert_eq!(days[0].date, "3/01");
        assert_eq!(days[0].weekday, "Sun");
        assert_eq!(days[0].status, "triangle");
        assert_eq!(days[2].status, "circle");
    }

    #[test]
    fn times_rotate_with_the_day() {
        assert_eq!(available_times(0), vec!["09:00"]);
        assert_eq!(available_times(1), vec!["10:00", "11:00"]);
        assert_eq!(available_times(5).len(), 6);
        assert_eq!(available_times(9), vec!["18:00", "09:00", "10:00", "11:00"]);
    }

    #[test]
    fn staff_depends_on_time() {
        // "10:00" sums to 251: count 2 + 251 % 2 = 3, rotated by 251 % 3 = 2.
        assert_eq!(available_staff("10:00"), vec!["Sora", "Aki", "Mika"]);
        assert!(available_staff("14:00").len() >= 2);
    }

    #[test]
    fn schema_defaults_hydrate() {
        let value = reducible_state::Value::Map(Booking::schema().defaults());
        let state: BookingState = from_value(value).unwrap();
        assert_eq!(state.calendar_days.len(), 30);
        assert!(state.selected_day.is_none());
        assert!(state.available_times.is_empty());
    }

    #[test]
    fn day_accepts_form_strings() {
        let msg = Message::new("select_day", btree! { "day".to_string() => Value::from("12") });
        assert_eq!(payload_day(&msg), Some(12));
    }

    fn initial_state() -> BookingState {
        from_value(Value::Map(Booking::schema().defaults())).unwrap()
    }

    #[test]
    fn bad_selection_payload_keeps_state() {
        let messages = [
            Message::bare("select_day"),
            Message::new("select_day", btree! { "day".to_string() => Value::from("soon") }),
            Message::bare("select_time"),
        ];

        for msg in messages {
            match Booking.reduce(initial_state(), &msg) {
                ReducerOutcome::StateOnly(state) => assert_eq!(state, initial_state(), "{:?}", msg),
                _ => panic!("expected the state back unchanged for {:?}", msg),
            }
        }
    }
}
