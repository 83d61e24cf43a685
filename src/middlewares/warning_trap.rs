// Start of file: /src/middlewares/warning_trap.rs

/*
    * Promotes severe tracing events into request failures.
    *
    * While a wrapped handler future is polled, a subscriber that forwards
    * everything to the previously active dispatcher also inspects each event.
    * The first event at or above the configured level is turned into an
    * `ErrorException` and stored in a slot owned by that request. Both the
    * subscriber and the slot are scoped to the future's polls, so they are
    * released on every exit path, panics included.
*/

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::level_filters::LevelFilter;
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::Interest;
use tracing::{Dispatch, Event, Metadata, Subscriber};

use crate::models::exception::ErrorException;

tokio::task_local! {
    static TRAPPED: TrapSlot;
}

/// Holds the first event trapped while one request was handled.
#[derive(Debug, Clone, Default)]
pub struct TrapSlot(Arc<Mutex<Option<ErrorException>>>);

impl TrapSlot {
    fn offer(&self, exception: ErrorException) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.is_none() {
                *slot = Some(exception);
            }
        }
    }

    pub fn take(&self) -> Option<ErrorException> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[derive(Debug)]
pub struct WarningTrap {
    mask: LevelFilter,
    dispatch: OnceCell<Dispatch>,
}

impl WarningTrap {
    pub fn new(mask: LevelFilter) -> Self {
        Self { mask, dispatch: OnceCell::new() }
    }

    pub fn mask(&self) -> LevelFilter {
        self.mask
    }

    pub fn is_enabled(&self) -> bool {
        self.mask != LevelFilter::OFF
    }

    /// Runs `future` with the trap installed, recording into `slot`.
    ///
    /// The dispatcher that was current on first use is the one everything
    /// is forwarded to from then on.
    pub fn instrument<F: Future>(&self, slot: TrapSlot, future: F) -> impl Future<Output = F::Output> {
        let dispatch: Dispatch = self
            .dispatch
            .get_or_init(|| {
                let inner: Dispatch = tracing::dispatcher::get_default(Dispatch::clone);
                // ? Read before the trap registers, so it is the ceiling of everything else
                let inner_hint: LevelFilter = LevelFilter::current();
                Dispatch::new(TrapSubscriber { inner, inner_hint, mask: self.mask })
            })
            .clone();

        TRAPPED.scope(slot, future.with_subscriber(dispatch))
    }
}

struct TrapSubscriber {
    inner: Dispatch,
    inner_hint: LevelFilter,
    mask: LevelFilter,
}

impl TrapSubscriber {
    fn traps(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= self.mask
    }

    fn trap(&self, event: &Event<'_>) {
        let mut visitor: MessageVisitor = MessageVisitor::default();
        event.record(&mut visitor);

        let metadata: &Metadata<'_> = event.metadata();
        let exception: ErrorException = ErrorException {
            message: visitor.into_message(),
            severity: *metadata.level(),
            target: metadata.target().to_owned(),
            file: metadata.file().map(str::to_owned),
            line: metadata.line(),
        };

        // ? Outside a trapped request there is nowhere to put it
        let _ = TRAPPED.try_with(|slot| slot.offer(exception));
    }
}

impl Subscriber for TrapSubscriber {
    fn register_callsite(&self, metadata: &'static Metadata<'static>) -> Interest {
        // * Trapped events depend on the task, everything else on the inner dispatcher
        if self.traps(metadata) {
            Interest::sometimes()
        } else {
            self.inner.register_callsite(metadata)
        }
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        Some(self.inner_hint.max(self.mask))
    }

    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.traps(metadata) || self.inner.enabled(metadata)
    }

    fn new_span(&self, span: &Attributes<'_>) -> Id {
        self.inner.new_span(span)
    }

    fn record(&self, span: &Id, values: &Record<'_>) {
        self.inner.record(span, values)
    }

    fn record_follows_from(&self, span: &Id, follows: &Id) {
        self.inner.record_follows_from(span, follows)
    }

    fn event(&self, event: &Event<'_>) {
        if self.traps(event.metadata()) {
            self.trap(event);
        }
        if self.inner.enabled(event.metadata()) {
            self.inner.event(event);
        }
    }

    fn enter(&self, span: &Id) {
        self.inner.enter(span)
    }

    fn exit(&self, span: &Id) {
        self.inner.exit(span)
    }

    fn clone_span(&self, id: &Id) -> Id {
        self.inner.clone_span(id)
    }

    fn try_close(&self, id: Id) -> bool {
        self.inner.try_close(id)
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn into_message(self) -> String {
        match self.message {
            Some(message) if self.fields.is_empty() => message,
            Some(message) => format!("{message} {}", self.fields.join(" ")),
            None => self.fields.join(" "),
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

// End of file: /src/middlewares/warning_trap.rs

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::panic::AssertUnwindSafe;
    use tracing::Level;
    use tracing_subscriber::layer::{Layer, SubscriberExt};

    #[tokio::test]
    async fn error_events_are_trapped_with_their_message() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::ERROR);
        let slot: TrapSlot = TrapSlot::default();

        let value: u8 = trap
            .instrument(slot.clone(), async {
                tracing::error!(user = 7, "division by {}", 0);
                42
            })
            .await;

        let trapped: ErrorException = slot.take().expect("event should be trapped");
        assert_eq!(value, 42);
        assert_eq!(trapped.message, "division by 0 user=7");
        assert_eq!(trapped.severity, Level::ERROR);
        assert_eq!(trapped.file.as_deref(), Some(file!()));
        assert!(trapped.line.is_some());
    }

    #[tokio::test]
    async fn events_below_the_mask_pass() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::ERROR);
        let slot: TrapSlot = TrapSlot::default();

        trap.instrument(slot.clone(), async {
            tracing::warn!("just a warning");
            tracing::info!("fyi");
        })
        .await;

        assert!(slot.take().is_none());
    }

    #[tokio::test]
    async fn a_wider_mask_traps_warnings() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::WARN);
        let slot: TrapSlot = TrapSlot::default();

        trap.instrument(slot.clone(), async { tracing::warn!("careful") }).await;

        assert_eq!(slot.take().map(|trapped| trapped.message), Some("careful".to_owned()));
    }

    #[tokio::test]
    async fn first_event_wins() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::ERROR);
        let slot: TrapSlot = TrapSlot::default();

        trap.instrument(slot.clone(), async {
            tracing::error!("first");
            tracing::error!("second");
        })
        .await;

        assert_eq!(slot.take().map(|trapped| trapped.message), Some("first".to_owned()));
    }

    #[tokio::test]
    async fn trap_is_removed_after_the_future() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::ERROR);
        let slot: TrapSlot = TrapSlot::default();

        trap.instrument(slot.clone(), async {}).await;
        tracing::error!("after the request");

        assert!(slot.take().is_none());
    }

    #[tokio::test]
    async fn trap_is_removed_after_a_panic() {
        let trap: WarningTrap = WarningTrap::new(LevelFilter::ERROR);
        let slot: TrapSlot = TrapSlot::default();

        let outcome: std::thread::Result<()> = AssertUnwindSafe(trap.instrument(slot.clone(), async {
            panic!("handler exploded");
        }))
        .catch_unwind()
        .await;
        tracing::error!("after the panic");

        assert!(outcome.is_err());
        assert!(slot.take().is_none());
        assert!(TRAPPED.try_with(|_| ()).is_err());
        assert!(!tracing::dispatcher::get_default(|current| current.is::<TrapSubscriber>()));
    }

    #[test]
    fn inner_subscriber_keeps_its_own_filter() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::ERROR)
            .with(RecordMessages(seen.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let trap: WarningTrap = WarningTrap::new(LevelFilter::WARN);
            let slot: TrapSlot = TrapSlot::default();
            let runtime: tokio::runtime::Runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

            runtime.block_on(trap.instrument(slot.clone(), async {
                tracing::info!("chatter");
                tracing::warn!("careful");
                tracing::error!("broken");
            }));

            assert_eq!(trap.mask(), LevelFilter::WARN);
            assert_eq!(slot.take().map(|trapped| trapped.message), Some("careful".to_owned()));
        });

        assert_eq!(*seen.lock().unwrap(), vec!["broken".to_owned()]);
    }

    struct RecordMessages(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for RecordMessages {
        fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            let mut visitor: MessageVisitor = MessageVisitor::default();
            event.record(&mut visitor);
            if let Ok(mut seen) = self.0.lock() {
                seen.push(visitor.into_message());
            }
        }
    }

    #[test]
    fn off_disables_the_trap() {
        assert!(!WarningTrap::new(LevelFilter::OFF).is_enabled());
        assert!(WarningTrap::new(LevelFilter::ERROR).is_enabled());
    }
}
