//! Time-stepping trait definition
//!
//! Both a single [`super::Mpdata`] stepper and a coupled
//! [`super::EulerianFields`] group advance through this interface, so drivers
//! can run either without caring how many advectees are involved.

/// Anything that advances a discrete state by whole timesteps
pub trait TimeStepper: Send {
    /// Advance by one timestep
    ///
    /// Halos are refreshed inside the call; stepping never fails once the
    /// stepper has been constructed.
    fn step(&mut self);

    /// Number of completed timesteps
    fn step_count(&self) -> u64;

    /// Advance by `n_steps` timesteps
    ///
    /// # Arguments
    ///
    /// * `n_steps` - Timesteps to run; zero leaves the state untouched
    fn advance(&mut self, n_steps: u64) {
        for _ in 0..n_steps {
            self.step();
        }
    }
}
