mod model;
mod state;

pub use model::{Job, JobReport, JobStatus};
pub use state::{JobEvent, JobStateMachine, Transition};
