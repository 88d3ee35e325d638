use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::{MedQaError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Holds a service's ready value once initialization has completed.
///
/// Racing `initialize` calls are serialized by the inner `OnceCell`; only
/// the first runs its initializer. A failed initializer leaves the cell empty.
#[derive(Debug)]
pub struct ReadyCell<T> {
    component: &'static str,
    value: OnceCell<T>,
    initializing: AtomicBool,
}

impl<T> ReadyCell<T> {
    pub const fn new(component: &'static str) -> Self {
        Self {
            component,
            value: OnceCell::const_new(),
            initializing: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ServiceState {
        if self.value.initialized() {
            ServiceState::Ready
        } else if self.initializing.load(Ordering::Acquire) {
            ServiceState::Initializing
        } else {
            ServiceState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.value.initialized()
    }

    pub fn get(&self) -> Result<&T> {
        self.value
            .get()
            .ok_or(MedQaError::NotInitialized(self.component))
    }

    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }
        self.value
            .get_or_try_init(|| async move {
                let _marker = InitializingMarker::set(&self.initializing);
                init().await
            })
            .await
    }
}

/// Clears the initializing flag even when the init future is dropped.
struct InitializingMarker<'a>(&'a AtomicBool);

impl<'a> InitializingMarker<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for InitializingMarker<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
