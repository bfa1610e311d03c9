//! Timing and shape logging around a single operation.
//!
//! The extender is applied to every feature-group calculation and to every
//! approach run. It never changes the value it passes through.

use std::future::Future;
use std::time::Instant;

use tracing::info;

use crate::data::DataFrame;

/// Reports the shape of a value when it is tabular.
pub trait Observed {
    fn shape(&self) -> Option<(usize, usize)> {
        None
    }
}

impl Observed for DataFrame {
    fn shape(&self) -> Option<(usize, usize)> {
        Some(DataFrame::shape(self))
    }
}

impl<T: Observed, E> Observed for Result<T, E> {
    fn shape(&self) -> Option<(usize, usize)> {
        self.as_ref().ok().and_then(|value| value.shape())
    }
}

macro_rules! not_tabular {
    ($($ty:ty),* $(,)?) => {
        $(impl Observed for $ty {})*
    };
}

not_tabular!((), bool, i32, i64, u32, u64, usize, f64, String, &str);

#[derive(Debug, Clone, Copy)]
pub struct ObservabilityExtender {
    operation: &'static str,
}

impl Default for ObservabilityExtender {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservabilityExtender {
    pub fn new() -> Self {
        Self::named("calculate_feature")
    }

    /// An extender whose log lines carry the given operation name
    pub fn named(operation: &'static str) -> Self {
        Self { operation }
    }

    /// Run `op` once, logging elapsed time and, for tabular results, the shape.
    pub fn call<R: Observed>(&self, op: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = op();
        self.record(start, &result);
        result
    }

    pub async fn call_async<R, F>(&self, op: F) -> R
    where
        R: Observed,
        F: Future<Output = R>,
    {
        let start = Instant::now();
        let result = op.await;
        self.record(start, &result);
        result
    }

    /// Wrap `op` into a function of the same signature that is observed on every call.
    pub fn wrap<A, R, F>(self, op: F) -> impl Fn(A) -> R
    where
        F: Fn(A) -> R,
        R: Observed,
    {
        move |args| self.call(|| op(args))
    }

    fn record<R: Observed>(&self, start: Instant, result: &R) {
        let elapsed = start.elapsed().as_secs_f64();
        info!("{} elapsed={:.4}s", self.operation, elapsed);

        if let Some((rows, cols)) = result.shape() {
            info!("result shape=({}, {})", rows, cols);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Collects the formatted message of every event it sees.
    #[derive(Clone, Default)]
    pub(crate) struct CapturedLogs(Arc<Mutex<Vec<String>>>);

    impl CapturedLogs {
        pub(crate) fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        pub(crate) fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
            let subscriber = tracing_subscriber::registry().with(self.clone());
            tracing::subscriber::with_default(subscriber, f)
        }
    }

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push(visitor.0);
        }
    }

    fn two_by_two() -> DataFrame {
        DataFrame::new()
            .with_column("a", vec![json!(1), json!(2)])
            .with_column("b", vec![json!(3), json!(4)])
    }

    #[test]
    fn test_wrap_passes_result_through() {
        let add = ObservabilityExtender::new().wrap(|(x, y): (i32, i32)| x + y);
        assert_eq!(add((1, 2)), 3);

        let frame = two_by_two();
        let expected = frame.clone();
        let result = ObservabilityExtender::new().call(move || frame);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_logs_elapsed_and_shape_for_frames() {
        let logs = CapturedLogs::default();
        logs.capture(|| ObservabilityExtender::new().call(two_by_two));

        let messages = logs.messages();
        let elapsed = messages.iter().filter(|m| m.contains("elapsed=")).count();
        let shape = messages.iter().filter(|m| m.contains("(2, 2)")).count();
        assert_eq!(elapsed, 1);
        assert_eq!(shape, 1);
    }

    #[test]
    fn test_no_shape_for_non_tabular_values() {
        let logs = CapturedLogs::default();
        logs.capture(|| ObservabilityExtender::new().call(|| 42));
        logs.capture(|| ObservabilityExtender::new().call(|| "ok"));

        let messages = logs.messages();
        assert_eq!(messages.iter().filter(|m| m.contains("elapsed=")).count(), 2);
        assert!(!messages.iter().any(|m| m.contains("shape")));
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let logs = CapturedLogs::default();
        let result: Result<DataFrame, String> =
            logs.capture(|| ObservabilityExtender::new().call(|| Err("boom".to_string())));

        assert_eq!(result.unwrap_err(), "boom");
        assert!(!logs.messages().iter().any(|m| m.contains("shape")));
    }

    #[test]
    fn test_named_operation_appears_in_log() {
        let logs = CapturedLogs::default();
        logs.capture(|| ObservabilityExtender::named("LoopApproach").call(String::new));
        assert!(logs.messages()[0].starts_with("LoopApproach elapsed="));
    }
}
