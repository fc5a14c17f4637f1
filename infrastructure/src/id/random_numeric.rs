use application::IdGenerator;
use domain::DocumentId;
use rand::Rng;

/// Draws ids uniformly from `0..upper_bound` and renders them as decimal strings.
#[derive(Debug, Clone)]
pub struct RandomNumericIdGenerator {
    upper_bound: u64,
}

impl RandomNumericIdGenerator {
    /// `upper_bound` must be non-zero; `StoreConfig::validate` enforces this.
    pub fn new(upper_bound: u64) -> Self {
        Self {
            upper_bound: upper_bound.max(1),
        }
    }

    pub fn upper_bound(&self) -> u64 {
        self.upper_bound
    }
}

impl IdGenerator for RandomNumericIdGenerator {
    fn next_id(&self) -> DocumentId {
        let value = rand::thread_rng().gen_range(0..self.upper_bound);
        DocumentId::new(value.to_string())
    }
}
