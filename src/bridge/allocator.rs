//! Endpoint identifier allocation for dynamic endpoints.

use crate::error::{BridgeError, Result};
use crate::matter::ids::{EndpointId, MAX_ENDPOINT_ID};

/// Hands out auto-assigned endpoint ids in `[first_dynamic, MAX_ENDPOINT_ID]`,
/// wrapping back to `first_dynamic`.
///
/// Unusable until [`initialize`](Self::initialize) runs after the model has
/// set up its fixed endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointIdAllocator {
    state: Option<AllocatorState>,
}

#[derive(Debug, Clone, Copy)]
struct AllocatorState {
    first_dynamic: EndpointId,
    current: EndpointId,
}

impl EndpointIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts allocation right after the last fixed endpoint.
    pub fn initialize(&mut self, last_fixed_endpoint: EndpointId) {
        let first_dynamic = last_fixed_endpoint.saturating_add(1).min(MAX_ENDPOINT_ID);
        self.state = Some(AllocatorState {
            first_dynamic,
            current: first_dynamic,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn first_dynamic(&self) -> Result<EndpointId> {
        Ok(self.state()?.first_dynamic)
    }

    /// Next candidate id.
    pub fn current(&self) -> Result<EndpointId> {
        Ok(self.state()?.current)
    }

    /// Moves to the next candidate, wrapping after `MAX_ENDPOINT_ID`.
    pub fn advance(&mut self) -> Result<EndpointId> {
        let state = self.state.as_mut().ok_or(BridgeError::NotInitialized)?;
        state.current = if state.current >= MAX_ENDPOINT_ID {
            state.first_dynamic
        } else {
            state.current + 1
        };
        Ok(state.current)
    }

    /// Number of distinct ids the allocator cycles through.
    pub fn span(&self) -> Result<usize> {
        let state = self.state()?;
        Ok(usize::from(MAX_ENDPOINT_ID - state.first_dynamic) + 1)
    }

    fn state(&self) -> Result<&AllocatorState> {
        self.state.as_ref().ok_or(BridgeError::NotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_allocator() {
        let mut alloc = EndpointIdAllocator::new();
        assert!(matches!(alloc.current(), Err(BridgeError::NotInitialized)));
        assert!(matches!(alloc.advance(), Err(BridgeError::NotInitialized)));
    }

    #[test]
    fn test_starts_after_fixed_endpoints() {
        let mut alloc = EndpointIdAllocator::new();
        alloc.initialize(1);
        assert_eq!(alloc.current().unwrap(), 2);
        assert_eq!(alloc.advance().unwrap(), 3);
        assert_eq!(alloc.span().unwrap(), 0xFFFD);
    }

    #[test]
    fn test_wraparound_never_goes_below_first() {
        let mut alloc = EndpointIdAllocator::new();
        alloc.initialize(MAX_ENDPOINT_ID - 4);
        let first = alloc.first_dynamic().unwrap();
        let mut seen = vec![alloc.current().unwrap()];
        for _ in 0..10 {
            seen.push(alloc.advance().unwrap());
        }
        assert!(seen.iter().all(|&id| id >= first && id <= MAX_ENDPOINT_ID));
        assert_eq!(&seen[..6], &[first, first + 1, first + 2, first + 3, first, first + 1]);
        assert_eq!(alloc.span().unwrap(), 4);
    }
}
