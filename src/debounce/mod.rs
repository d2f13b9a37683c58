use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Trailing-edge debounce bookkeeping, independent of any timer API.
///
/// Every `push` supersedes the previous pending value and returns a ticket.
/// When the timer for a ticket fires, `fire` yields the value only if no
/// newer push happened in between.
#[derive(Clone, Debug)]
pub(crate) struct Debouncer<T> {
    pending: Option<(u64, T)>,
    next_ticket: u64,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            next_ticket: 0,
        }
    }
}

impl<T> Debouncer<T> {
    pub fn push(&mut self, value: T) -> u64 {
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending = Some((self.next_ticket, value));
        self.next_ticket
    }

    pub fn fire(&mut self, ticket: u64) -> Option<T> {
        match &self.pending {
            Some((t, _)) if *t == ticket => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Mirror `source` into a signal that only moves once `source` has been
/// stable for `delay_ms`.
///
/// The initial value is available immediately; each later change restarts
/// the window.
pub(crate) fn use_debounced<T>(source: Signal<T>, delay_ms: i32) -> ReadSignal<T>
where
    T: Clone + Send + Sync + 'static,
{
    let (debounced, set_debounced) = signal(source.get_untracked());
    let core = StoredValue::new(Debouncer::<T>::default());
    let timer_id = StoredValue::new(None::<i32>);

    Effect::new(move |prev: Option<()>| {
        let value = source.get();
        if prev.is_none() {
            return;
        }

        if let Some(id) = timer_id.get_value() {
            window().clear_timeout_with_handle(id);
        }

        let Some(ticket) = core.try_update_value(|d| d.push(value)) else {
            return;
        };

        let cb = Closure::once_into_js(move || {
            if let Some(Some(v)) = core.try_update_value(|d| d.fire(ticket)) {
                set_debounced.set(v);
            }
        });
        let id = window()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay_ms,
            )
            .ok();
        timer_id.set_value(id);
    });

    on_cleanup(move || {
        if let Some(Some(id)) = timer_id.try_get_value() {
            window().clear_timeout_with_handle(id);
        }
    });

    debounced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_emits_only_last_value() {
        let mut d = Debouncer::default();
        let tickets: Vec<u64> = ["o", "oc", "och", "ochoa"]
            .into_iter()
            .map(|v| d.push(v.to_string()))
            .collect();

        // Timers for superseded tickets fire first and yield nothing.
        let emitted: Vec<String> = tickets.iter().filter_map(|t| d.fire(*t)).collect();
        assert_eq!(emitted, vec!["ochoa".to_string()]);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_single_update_emits_once() {
        let mut d = Debouncer::default();
        let t = d.push(42);
        assert_eq!(d.fire(t), Some(42));
        assert_eq!(d.fire(t), None);
    }

    #[test]
    fn test_separate_windows_each_emit() {
        let mut d = Debouncer::default();
        let a = d.push("a");
        assert_eq!(d.fire(a), Some("a"));
        let b = d.push("b");
        assert_eq!(d.fire(a), None);
        assert_eq!(d.fire(b), Some("b"));
    }
}
