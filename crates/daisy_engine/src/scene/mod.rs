//! Scene layer: game objects, transforms, and the world that owns ids

mod game_object;

pub use game_object::{advance_animation, GameObject, GameObjectId, GameObjectWorld, Transform};
