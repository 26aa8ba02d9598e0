//! System control

/// Full device restart
///
/// Hardware implementations never return from [`SystemReset::reset`]. The
/// signature is not divergent so that test doubles can record the request.
pub trait SystemReset {
    /// Restart the device from scratch
    fn reset(&mut self);
}
