use thiserror::Error;

use crate::game::spatial_grid::GridError;

/// Faults raised while building or updating actors.
///
/// All of these are content or programming bugs. Search failures never show up
/// here: they are empty paths.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("actor is missing required component `{component}`")]
    MissingComponent { component: &'static str },
    #[error("skin `{skin}` has no `{clip}` animation")]
    MissingAnimation { skin: String, clip: String },
    #[error("unknown skin `{0}`")]
    UnknownSkin(String),
    #[error("no usable spawn profile for `{0}`")]
    MissingProfile(String),
    #[error("level has no `{0}` marker")]
    MissingMarker(String),
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl SimError {
    pub fn missing<T: ?Sized>() -> Self {
        SimError::MissingComponent {
            component: std::any::type_name::<T>(),
        }
    }
}
