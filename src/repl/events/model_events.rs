//! # Model Events
//!
//! Events emitted when the search session changes state.
//! The screen view model turns these into view updates.

use crate::repl::view_models::products::ProductsState;

/// Events emitted when models change
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// A new search reset the session
    SearchStarted { query: String },

    /// A page fetch was issued under `generation`
    PageRequested {
        query: String,
        page: u32,
        generation: u64,
    },

    /// The adapted product list was rebuilt or cleared
    ProductsChanged { count: usize },

    /// The session status moved to a new state
    StateChanged { state: ProductsState },

    /// A response arrived for a superseded request and was dropped
    StaleResponseDiscarded { generation: u64 },

    /// Product image bytes became available
    ImageLoaded {
        url: String,
        bytes: usize,
        cached: bool,
    },

    /// Product image could not be fetched
    ImageFailed { url: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_requested_event_should_carry_request_data() {
        let event = ModelEvent::PageRequested {
            query: "phone".to_string(),
            page: 2,
            generation: 5,
        };

        match event {
            ModelEvent::PageRequested {
                query,
                page,
                generation,
            } => {
                assert_eq!(query, "phone");
                assert_eq!(page, 2);
                assert_eq!(generation, 5);
            }
            _ => panic!("Expected PageRequested event"),
        }
    }

    #[test]
    fn state_changed_event_should_compare_by_state() {
        let a = ModelEvent::StateChanged {
            state: ProductsState::Loading,
        };
        let b = ModelEvent::StateChanged {
            state: ProductsState::Finished,
        };
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
