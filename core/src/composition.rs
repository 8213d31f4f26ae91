//! Reducer composition utilities
//!
//! A feature is usually split across several reducers that share one state
//! and one action type: each reducer handles the slice of actions it owns and
//! ignores the rest. [`combine_reducers`] runs them all for every action and
//! concatenates their effects.
//!
//! # Examples
//!
//! ```
//! use boxoffice_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//! use boxoffice_core::composition::combine_reducers;
//!
//! #[derive(Clone, Default)]
//! struct Hall {
//!     sold: u32,
//!     announced: bool,
//! }
//!
//! #[derive(Clone)]
//! enum HallAction {
//!     Sell,
//!     Announce,
//! }
//!
//! struct Sales;
//! struct Announcements;
//!
//! impl Reducer for Sales {
//!     type State = Hall;
//!     type Action = HallAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Hall, action: HallAction, _env: &()) -> SmallVec<[Effect<HallAction>; 4]> {
//!         if matches!(action, HallAction::Sell) {
//!             state.sold += 1;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for Announcements {
//!     type State = Hall;
//!     type Action = HallAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Hall, action: HallAction, _env: &()) -> SmallVec<[Effect<HallAction>; 4]> {
//!         if matches!(action, HallAction::Announce) {
//!             state.announced = true;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(Sales), Box::new(Announcements)]);
//! let mut state = Hall::default();
//! let _ = combined.reduce(&mut state, HallAction::Sell, &());
//! assert_eq!(state.sold, 1);
//! assert!(!state.announced);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A boxed reducer that can be shared with the runtime across threads.
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in order, and all effects are collected and concatenated.
/// `Effect::None` entries are dropped from the combined result.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in this combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether the combination is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}
