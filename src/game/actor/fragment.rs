use std::any::Any;

use smallvec::SmallVec;

use super::{Actor, FrameContext};
use crate::game::error::SimError;
use crate::game::pathfinding::Navigator;

// ============================================================================
// Update bands (higher runs first)
// ============================================================================

pub mod order {
    pub const PREPROCESS: i32 = 10;
    pub const INPUT: i32 = 9;
    pub const PATHFIND: i32 = 8;
    pub const PHYSICS: i32 = 7;
    pub const POST_PHYSICS: i32 = 6;
    pub const ANIMATE: i32 = 5;
    pub const PROCESS: i32 = 4;
    pub const RENDER: i32 = 3;
    pub const DEFAULT: i32 = 2;
    pub const POST_PROCESS: i32 = 1;
}

/// When a fragment wants to be updated.
///
/// Resolved once when the fragment is added to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOrder {
    /// Data-only fragment, never dispatched.
    Passive,
    At(i32),
    /// Dispatched once per listed priority each frame.
    Multi(&'static [i32]),
}

impl UpdateOrder {
    pub fn priorities(self) -> SmallVec<[i32; 2]> {
        match self {
            UpdateOrder::Passive => SmallVec::new(),
            UpdateOrder::At(p) => SmallVec::from_elem(p, 1),
            UpdateOrder::Multi(list) => SmallVec::from_slice(list),
        }
    }
}

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A single-responsibility behavior unit attached to an [`Actor`].
///
/// Every hook has a no-op default, so data-only fragments are an empty impl.
///
/// # Example
///
/// ```rust,ignore
/// struct Blink { timer: f32 }
///
/// impl Fragment for Blink {
///     fn update_order(&self) -> UpdateOrder {
///         UpdateOrder::At(order::ANIMATE)
///     }
///
///     fn update(&mut self, _actor: &mut Actor, ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
///         self.timer += ctx.dt;
///         Ok(())
///     }
/// }
/// ```
pub trait Fragment: AsAny + Send + Sync {
    fn update_order(&self) -> UpdateOrder {
        UpdateOrder::Passive
    }

    /// Called once, right before the fragment is stored on `actor`.
    fn on_attach(&mut self, _actor: &Actor) -> Result<(), SimError> {
        Ok(())
    }

    /// The fragment is detached from `actor` while this runs, so it may freely
    /// borrow the rest of the actor.
    fn update(&mut self, _actor: &mut Actor, _ctx: &mut FrameContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    fn as_navigator(&self) -> Option<&dyn Navigator> {
        None
    }

    fn as_navigator_mut(&mut self) -> Option<&mut dyn Navigator> {
        None
    }
}
