//! Degraded results.
//!
//! When a primary computation fails but a cheaper approximation is safe,
//! the approximation is returned wrapped in [`Degraded`] so callers can tell
//! a confident result from an approximate one.

use std::fmt;

/// An approximate value produced by a fallback path.
#[derive(Debug, Clone, PartialEq)]
pub struct Degraded<T> {
    /// The approximate value
    pub value: T,
    /// Why the primary path failed
    pub reason: String,
}

impl<T> Degraded<T> {
    /// Wrap a fallback value.
    pub fn new(value: T, reason: impl Into<String>) -> Self {
        Self { value, reason: reason.into() }
    }

    /// Discard the degradation marker.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Map the inner value, keeping the reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Degraded<U> {
        Degraded { value: f(self.value), reason: self.reason }
    }
}

impl<T> fmt::Display for Degraded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "degraded: {}", self.reason)
    }
}

/// Either a confident value or a degraded approximation.
pub type Confidence<T> = Result<T, Degraded<T>>;

/// Split a [`Confidence`] into its value and the degradation reason, if any.
pub fn settle<T>(result: Confidence<T>) -> (T, Option<String>) {
    match result {
        Ok(value) => (value, None),
        Err(degraded) => (degraded.value, Some(degraded.reason)),
    }
}

/// Run `primary`, falling back to `fallback` with the primary's error message.
pub fn with_fallback<T, E, F1, F2>(primary: F1, fallback: F2) -> Confidence<T>
where
    E: fmt::Display,
    F1: FnOnce() -> Result<T, E>,
    F2: FnOnce(&E) -> T,
{
    match primary() {
        Ok(value) => Ok(value),
        Err(e) => {
            let value = fallback(&e);
            Err(Degraded::new(value, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_fallback_primary() {
        let result = with_fallback(|| Ok::<_, String>(42), |_| 0);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_with_fallback_degraded() {
        let result = with_fallback(|| Err::<i32, _>("analyzer failed".to_string()), |_| 7);
        let degraded = result.unwrap_err();
        assert_eq!(degraded.value, 7);
        assert_eq!(degraded.reason, "analyzer failed");
    }

    #[test]
    fn test_settle() {
        assert_eq!(settle::<i32>(Ok(1)), (1, None));
        assert_eq!(settle(Err(Degraded::new(2, "io"))), (2, Some("io".to_string())));
    }

    #[test]
    fn test_degraded_map_and_display() {
        let degraded = Degraded::new(10, "too large").map(|v| v * 2);
        assert_eq!(degraded.value, 20);
        assert_eq!(degraded.to_string(), "degraded: too large");
        assert_eq!(degraded.into_inner(), 20);
    }
}
