use std::time::Duration;

use crate::compat;

/// Optional vibration capability of the host.
pub trait Haptics {
    /// Fires one pulse. Returns false when the host cannot vibrate.
    fn pulse(&self, duration: Duration) -> bool;
}

/// Vibrates through the platform's `compat::vibrate`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeviceHaptics;

impl Haptics for DeviceHaptics {
    fn pulse(&self, duration: Duration) -> bool {
        compat::vibrate(duration)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every pulse it is asked for.
    #[derive(Clone, Default)]
    pub struct CountingHaptics {
        pub pulses: Rc<RefCell<Vec<Duration>>>,
        pub unsupported: bool,
    }

    impl CountingHaptics {
        pub fn count(&self) -> usize {
            self.pulses.borrow().len()
        }
    }

    impl Haptics for CountingHaptics {
        fn pulse(&self, duration: Duration) -> bool {
            if self.unsupported {
                return false;
            }
            self.pulses.borrow_mut().push(duration);
            true
        }
    }
}
