use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Easing curve in the `power<N>.<in|out|inOut>` family.
///
/// `power1` is quadratic, `power4` quintic; `linear` (alias `none`) is
/// `power0`. A bare `powerN` eases out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    In(u8),
    Out(u8),
    InOut(u8),
}

impl Ease {
    pub const POWER2_OUT: Ease = Ease::Out(2);
    pub const POWER3_OUT: Ease = Ease::Out(3);

    /// Map linear progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::In(p) => t.powi(p as i32 + 1),
            Ease::Out(p) => 1.0 - (1.0 - t).powi(p as i32 + 1),
            Ease::InOut(p) => {
                let exp = p as i32 + 1;
                if t < 0.5 {
                    (2.0 * t).powi(exp) / 2.0
                } else {
                    1.0 - (2.0 * (1.0 - t)).powi(exp) / 2.0
                }
            }
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Ease::POWER3_OUT
    }
}

impl FromStr for Ease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("linear") || name.eq_ignore_ascii_case("none") {
            return Ok(Ease::Linear);
        }
        let invalid = || Error::InvalidEase(s.to_string());

        let rest = name.strip_prefix("power").ok_or_else(invalid)?;
        let (power, variant) = match rest.split_once('.') {
            Some((power, variant)) => (power, variant),
            None => (rest, "out"),
        };
        let power: u8 = power.parse().map_err(|_| invalid())?;
        if power > 4 {
            return Err(invalid());
        }
        if power == 0 {
            return Ok(Ease::Linear);
        }
        match variant {
            "in" => Ok(Ease::In(power)),
            "out" => Ok(Ease::Out(power)),
            "inOut" | "in-out" => Ok(Ease::InOut(power)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Linear => write!(f, "linear"),
            Ease::In(p) => write!(f, "power{}.in", p),
            Ease::Out(p) => write!(f, "power{}.out", p),
            Ease::InOut(p) => write!(f, "power{}.inOut", p),
        }
    }
}
