pub mod ease;
pub mod entrance;
pub mod tween;

pub use ease::Ease;
pub use entrance::{
    strategy_for, AnimationStyle, CssTransitionEntrance, EntranceDirection, EntranceStrategy,
    LayoutTracks, MotionContext, TweenEntrance,
};
pub use tween::{Lerp, Props, Track, Tween};
