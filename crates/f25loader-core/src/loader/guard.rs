//! Scoped platform hooks around host operations
//!
//! A host call runs with interrupts enabled and the activity indicator lit.
//! Both are restored when the guard drops, including on early error
//! returns.

/// Global interrupt mask of the loader's execution environment
///
/// The host starts every call with interrupts masked. Multi-step operations
/// unmask them for their duration and mask them again before returning.
pub trait InterruptControl {
    /// Unmask interrupts
    fn enable(&mut self);
    /// Mask interrupts
    fn disable(&mut self);
}

/// Indicator (typically an LED) showing the loader is busy
pub trait ActivityIndicator {
    /// Turn the indicator on
    fn on(&mut self);
    /// Turn the indicator off
    fn off(&mut self);
}

/// Interrupt control for environments without an interrupt mask
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterrupts;

impl InterruptControl for NoInterrupts {
    fn enable(&mut self) {}
    fn disable(&mut self) {}
}

/// Indicator for boards without one
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl ActivityIndicator for NoIndicator {
    fn on(&mut self) {}
    fn off(&mut self) {}
}

/// Interrupts enabled for the guard's lifetime
pub struct InterruptWindow<'a, I: InterruptControl> {
    control: &'a mut I,
}

impl<'a, I: InterruptControl> InterruptWindow<'a, I> {
    /// Enable interrupts until the returned guard drops
    pub fn open(control: &'a mut I) -> Self {
        control.enable();
        Self { control }
    }
}

impl<I: InterruptControl> Drop for InterruptWindow<'_, I> {
    fn drop(&mut self) {
        self.control.disable();
    }
}

/// Indicator lit for the guard's lifetime
pub struct ActivityLight<'a, L: ActivityIndicator> {
    indicator: &'a mut L,
}

impl<'a, L: ActivityIndicator> ActivityLight<'a, L> {
    /// Light the indicator until the returned guard drops
    pub fn on(indicator: &'a mut L) -> Self {
        indicator.on();
        Self { indicator }
    }
}

impl<L: ActivityIndicator> Drop for ActivityLight<'_, L> {
    fn drop(&mut self) {
        self.indicator.off();
    }
}
