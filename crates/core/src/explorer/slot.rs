//! Token-guarded, parameter-keyed cache for one query node.

use std::sync::Mutex;

use crate::explorer::snapshot::{NodePhase, NodeSnapshot};
use crate::notifications::NormalizedError;

/// Cache slot for one level of the query cascade.
///
/// A slot holds the last good value for its current parameters, a loading
/// flag, the last normalized error, and a monotonically increasing fetch
/// token. The token is the ordering guarantee for the whole cascade: a
/// completion is applied only when its token still matches the latest one
/// issued, so overlapping fetches can resolve in any order without a stale
/// response ever becoming visible.
///
/// The slot does no fetching itself; the owning service calls [`begin`]
/// before a fetch and [`complete_ok`]/[`complete_err`] after it resolves.
///
/// [`begin`]: QuerySlot::begin
/// [`complete_ok`]: QuerySlot::complete_ok
/// [`complete_err`]: QuerySlot::complete_err
pub(crate) struct QuerySlot<P, T> {
    inner: Mutex<SlotState<P, T>>,
}

struct SlotState<P, T> {
    params: Option<P>,
    items: Vec<T>,
    is_loading: bool,
    error: Option<NormalizedError>,
    fetch_token: u64,
}

impl<P, T> QuerySlot<P, T>
where
    P: Clone + PartialEq,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotState {
                params: None,
                items: Vec::new(),
                is_loading: false,
                error: None,
                fetch_token: 0,
            }),
        }
    }

    /// Returns the slot to idle: no params, no value, no error.
    ///
    /// Bumps the token so an in-flight completion lands stale.
    pub fn reset(&self) {
        let mut state = self.inner.lock().unwrap();
        state.params = None;
        state.items.clear();
        state.error = None;
        state.is_loading = false;
        state.fetch_token += 1;
    }

    /// Starts a fetch for `params` and returns the token the eventual
    /// completion must present.
    ///
    /// Re-fetching the same params keeps the previous value visible while
    /// loading (stale-while-revalidate). A params change clears it: a value
    /// fetched for other params must not be shown as current.
    pub fn begin(&self, params: P) -> u64 {
        let mut state = self.inner.lock().unwrap();
        if state.params.as_ref() != Some(&params) {
            state.items.clear();
            state.error = None;
        }
        state.params = Some(params);
        state.is_loading = true;
        state.fetch_token += 1;
        state.fetch_token
    }

    /// Applies a successful completion. Returns `false` (and changes
    /// nothing) when a newer fetch was issued meanwhile.
    pub fn complete_ok(&self, token: u64, items: Vec<T>) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.fetch_token != token {
            return false;
        }
        state.items = items;
        state.error = None;
        state.is_loading = false;
        true
    }

    /// Applies a failed completion, keeping the previous value. Returns
    /// `false` when the completion is stale.
    pub fn complete_err(&self, token: u64, error: NormalizedError) -> bool {
        let mut state = self.inner.lock().unwrap();
        if state.fetch_token != token {
            return false;
        }
        state.error = Some(error);
        state.is_loading = false;
        true
    }

    pub fn snapshot(&self) -> NodeSnapshot<T> {
        let state = self.inner.lock().unwrap();
        let phase = if state.params.is_none() {
            NodePhase::Idle
        } else if state.is_loading {
            NodePhase::Loading
        } else if state.error.is_some() {
            NodePhase::Error
        } else {
            NodePhase::Ready
        };
        NodeSnapshot {
            phase,
            items: state.items.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }
}
