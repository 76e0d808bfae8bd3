//! Mountable sections driven by host dispatches.

pub mod carousel;
pub mod gallery;
pub mod marquee;
pub mod modal;

pub use carousel::{Carousel, CarouselState};
pub use gallery::{Gallery, RenderedItem};
pub use marquee::{estimate_sequence_width, Marquee, MarqueeFrame, MarqueeState};
pub use modal::{CardPose, Modal, ModalPhase, ModalTarget};

use crate::host::{Dispatch, Host};

/// Maximum follow-up drains per pump, guarding against dispatch cycles.
const MAX_CASCADE: usize = 8;

pub trait Component {
    /// React to one dispatch. Dispatches addressed to registrations this
    /// component does not hold are ignored.
    fn handle(&mut self, host: &Host, dispatch: &Dispatch);
}

/// Advance the host clock by `ms` and route every resulting dispatch to all
/// `components`, including events queued while handling. Returns the number
/// of dispatches delivered.
pub fn pump(host: &Host, components: &mut [&mut dyn Component], ms: f64) -> usize {
    let mut delivered = 0;
    let mut batch = host.advance(ms);
    for _ in 0..MAX_CASCADE {
        if batch.is_empty() {
            break;
        }
        for dispatch in &batch {
            for component in components.iter_mut() {
                component.handle(host, dispatch);
            }
        }
        delivered += batch.len();
        batch = host.drain();
    }
    delivered
}
