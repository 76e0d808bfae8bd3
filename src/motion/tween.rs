use super::ease::Ease;

/// Values a tween can interpolate.
pub trait Lerp: Copy {
    fn lerp(from: Self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        from + (to - from) * t
    }
}

/// Visual state of one gallery item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Props {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub opacity: f32,
    pub scale: f32,
    /// Gaussian blur radius in pixels.
    pub blur: f32,
}

impl Default for Props {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            opacity: 1.0,
            scale: 1.0,
            blur: 0.0,
        }
    }
}

impl Props {
    /// Fully visible at the given geometry.
    pub fn at(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Same visual state with the geometry of `other`.
    pub fn with_geometry_of(self, other: Props) -> Self {
        Self {
            x: other.x,
            y: other.y,
            width: other.width,
            height: other.height,
            ..self
        }
    }
}

impl Lerp for Props {
    fn lerp(from: Self, to: Self, t: f32) -> Self {
        Self {
            x: f32::lerp(from.x, to.x, t),
            y: f32::lerp(from.y, to.y, t),
            width: f32::lerp(from.width, to.width, t),
            height: f32::lerp(from.height, to.height, t),
            opacity: f32::lerp(from.opacity, to.opacity, t),
            scale: f32::lerp(from.scale, to.scale, t),
            blur: f32::lerp(from.blur, to.blur, t),
        }
    }
}

/// Time-bounded interpolation between two values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween<T> {
    pub from: T,
    pub to: T,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub ease: Ease,
}

impl<T: Lerp> Tween<T> {
    pub fn progress(&self, now_ms: f64) -> f32 {
        if self.duration_ms <= 0.0 {
            return if now_ms >= self.start_ms { 1.0 } else { 0.0 };
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0) as f32
    }

    pub fn sample(&self, now_ms: f64) -> T {
        T::lerp(self.from, self.to, self.ease.apply(self.progress(now_ms)))
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        now_ms >= self.start_ms + self.duration_ms.max(0.0)
    }
}

/// A value with at most one tween in flight.
///
/// Starting a new tween overwrites the running one, picking up from the
/// value last sampled, so rapid retargeting never queues.
#[derive(Debug, Clone)]
pub struct Track<T> {
    value: T,
    tween: Option<Tween<T>>,
}

impl<T: Lerp> Track<T> {
    pub fn new(value: T) -> Self {
        Self { value, tween: None }
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// Where the track is heading: the tween target, or the value at rest.
    pub fn target(&self) -> T {
        self.tween.map(|t| t.to).unwrap_or(self.value)
    }

    pub fn is_active(&self) -> bool {
        self.tween.is_some()
    }

    /// Jump to `value`, cancelling any tween.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.tween = None;
    }

    /// Tween from the current value to `target`.
    pub fn to(&mut self, now_ms: f64, target: T, duration_ms: f64, delay_ms: f64, ease: Ease) {
        let from = self.value;
        self.from_to(now_ms, from, target, duration_ms, delay_ms, ease);
    }

    /// Jump to `from` and tween to `to`. During the delay the track holds
    /// `from`.
    pub fn from_to(
        &mut self,
        now_ms: f64,
        from: T,
        to: T,
        duration_ms: f64,
        delay_ms: f64,
        ease: Ease,
    ) {
        self.value = from;
        self.tween = Some(Tween {
            from,
            to,
            start_ms: now_ms + delay_ms.max(0.0),
            duration_ms: duration_ms.max(0.0),
            ease,
        });
    }

    /// Sample at `now_ms`. Returns true while the tween is still running.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let Some(tween) = self.tween else {
            return false;
        };
        self.value = tween.sample(now_ms);
        if tween.is_done(now_ms) {
            self.value = tween.to;
            self.tween = None;
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_tween() {
        let mut track = Track::new(0.0f32);
        track.to(0.0, 100.0, 100.0, 0.0, Ease::Linear);
        assert!(track.tick(50.0));
        assert!((track.value() - 50.0).abs() < 1e-4);
        assert!(!track.tick(100.0));
        assert_eq!(track.value(), 100.0);
        assert!(!track.is_active());
    }

    #[test]
    fn test_delay_holds_from() {
        let mut track = Track::new(0.0f32);
        track.from_to(0.0, 10.0, 20.0, 100.0, 50.0, Ease::Linear);
        assert!(track.tick(25.0));
        assert_eq!(track.value(), 10.0);
        track.tick(100.0);
        assert!((track.value() - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_overwrite_starts_from_current_sample() {
        let mut track = Track::new(0.0f32);
        track.to(0.0, 100.0, 100.0, 0.0, Ease::Linear);
        track.tick(40.0);
        track.to(40.0, 0.0, 100.0, 0.0, Ease::Linear);
        assert_eq!(track.target(), 0.0);
        track.tick(90.0);
        assert!((track.value() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let mut track = Track::new(Props::default());
        let target = Props::at(10.0, 20.0, 30.0, 40.0);
        track.to(5.0, target, 0.0, 0.0, Ease::Linear);
        assert!(!track.tick(5.0));
        assert_eq!(track.value(), target);
    }

    #[test]
    fn test_props_lerp() {
        let a = Props {
            opacity: 0.0,
            blur: 10.0,
            ..Props::at(0.0, 0.0, 100.0, 100.0)
        };
        let b = Props::at(100.0, 50.0, 100.0, 200.0);
        let mid = Props::lerp(a, b, 0.5);
        assert_eq!(mid.x, 50.0);
        assert_eq!(mid.height, 150.0);
        assert_eq!(mid.opacity, 0.5);
        assert_eq!(mid.blur, 5.0);
    }
}
