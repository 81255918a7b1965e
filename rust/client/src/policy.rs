use crate::Observation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

pub trait Policy {
    /// Pick one of `action_count` actions for `observation`.
    fn policy(&self, observation: &Observation, action_count: usize) -> usize;
}

/// Uniform over the actions available on the current page.
pub struct RandomPolicy {
    rng: RefCell<StdRng>,
}

impl RandomPolicy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng: RefCell::new(rng),
        }
    }
}

impl Policy for RandomPolicy {
    fn policy(&self, _observation: &Observation, action_count: usize) -> usize {
        if action_count == 0 {
            return 0;
        }
        self.rng.borrow_mut().gen_range(0..action_count)
    }
}
