//! Coupled advectees sharing one advector
//!
//! Every member is an [`Mpdata`] stepper holding the same `Arc<VectorField>`,
//! so the advector is immutable for the whole of a group step and the members
//! can advance in parallel.

use super::mpdata::Mpdata;
use super::r#trait::TimeStepper;
use super::step::Step;
use crate::arakawa_c::{ScalarField, VectorField};
use crate::error::{MpdataError, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Named advectees advanced together by one advector
#[derive(Debug, Clone)]
pub struct EulerianFields {
    advector: Arc<VectorField>,
    members: FxHashMap<String, Mpdata>,
    step_count: u64,
}

impl EulerianFields {
    /// Build one stepper per named advectee
    ///
    /// # Arguments
    ///
    /// * `step` - Stage plan shared by every member
    /// * `advector` - Generalised Courant numbers for all members
    /// * `advectees` - `(name, field)` pairs
    /// * `g_factor` - Optional g-factor shared by every member
    ///
    /// # Errors
    ///
    /// Returns [`MpdataError::DuplicateField`] if a name repeats,
    /// [`MpdataError::InvalidOptions`] for an empty group, and any error
    /// [`Mpdata::from_shared`] reports for a member.
    pub fn new(
        step: &Step,
        advector: VectorField,
        advectees: Vec<(String, ScalarField)>,
        g_factor: Option<ScalarField>,
    ) -> Result<Self> {
        if advectees.is_empty() {
            return Err(MpdataError::InvalidOptions(
                "a coupled group needs at least one advectee".into(),
            ));
        }
        let advector = Arc::new(advector);
        let g_factor = g_factor.map(Arc::new);

        let mut members = FxHashMap::default();
        for (name, advectee) in advectees {
            if members.contains_key(&name) {
                return Err(MpdataError::DuplicateField(name));
            }
            let stepper = Mpdata::from_shared(step.clone(), advectee, Arc::clone(&advector), g_factor.clone())?;
            members.insert(name, stepper);
        }

        info!(n_fields = members.len(), "Created coupled Eulerian fields");
        Ok(Self {
            advector,
            members,
            step_count: 0,
        })
    }

    /// Shared advector
    pub fn advector(&self) -> &VectorField {
        &self.advector
    }

    /// Stepper of the named advectee
    pub fn get(&self, name: &str) -> Option<&Mpdata> {
        self.members.get(name)
    }

    /// Current values of the named advectee
    pub fn advectee(&self, name: &str) -> Option<&ScalarField> {
        self.members.get(name).map(Mpdata::advectee)
    }

    /// Member names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.members.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of advectees
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always false for a successfully constructed group
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Swap in a new advector for every member between timesteps
    ///
    /// # Errors
    ///
    /// Fails like [`Mpdata::replace_advector`]; members are only updated once
    /// the advector has passed every member's checks.
    pub fn replace_advector(&mut self, advector: VectorField) -> Result<()> {
        for stepper in self.members.values() {
            stepper.check_advector(&advector)?;
        }
        let advector = Arc::new(advector);
        for stepper in self.members.values_mut() {
            stepper.install_advector(Arc::clone(&advector));
        }
        self.advector = advector;
        Ok(())
    }
}

impl TimeStepper for EulerianFields {
    fn step(&mut self) {
        debug_assert!(self
            .members
            .values()
            .all(|stepper| stepper.shares_advector(&self.advector)));
        self.members
            .par_iter_mut()
            .for_each(|(_, stepper)| stepper.step());
        self.step_count += 1;
        debug!(step = self.step_count, n_fields = self.members.len(), "Coupled step complete");
    }

    fn step_count(&self) -> u64 {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arakawa_c::Grid;
    use crate::solver::{Options, StepBuilder};

    fn group(names: &[&str]) -> Result<EulerianFields> {
        let grid = Grid::new_1d(4).unwrap();
        let step = StepBuilder::new(Options::upwind()).build(grid, 1).unwrap();
        let advector = VectorField::new(grid, &[vec![0.5; 5]], 1).unwrap();
        let advectees = names
            .iter()
            .enumerate()
            .map(|(k, name)| {
                let mut values = vec![0.0; 4];
                values[1] = (k + 1) as f64;
                (name.to_string(), ScalarField::new(grid, &values, 1).unwrap())
            })
            .collect();
        EulerianFields::new(&step, advector, advectees, None)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert_eq!(
            group(&["qv", "qv"]).unwrap_err(),
            MpdataError::DuplicateField("qv".into())
        );
        assert!(group(&[]).is_err());
    }

    #[test]
    fn test_members_advance_together() {
        let mut fields = group(&["th", "qv"]).unwrap();
        assert_eq!(fields.names(), vec!["qv", "th"]);
        fields.step();
        assert_eq!(fields.step_count(), 1);
        assert_eq!(fields.advectee("th").unwrap().to_vec(), vec![0.0, 0.5, 0.5, 0.0]);
        assert_eq!(fields.advectee("qv").unwrap().to_vec(), vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(fields.get("th").unwrap().step_count(), 1);
        assert!(fields.advectee("rho").is_none());
    }

    #[test]
    fn test_replace_advector_reaches_every_member() {
        let mut fields = group(&["a", "b"]).unwrap();
        let grid = *fields.advector().grid();
        let still = VectorField::new(grid, &[vec![0.0; 5]], 1).unwrap();
        fields.replace_advector(still).unwrap();
        fields.advance(3);
        assert_eq!(fields.advectee("a").unwrap().to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(fields.get("b").unwrap().advector().component(0), vec![0.0; 5]);

        let deep = VectorField::new(grid, &[vec![0.0; 5]], 2).unwrap();
        assert!(fields.replace_advector(deep).is_err());
    }
}
