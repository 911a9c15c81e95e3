mod mock;

pub use mock::{MockDetector, MockOutcome};
