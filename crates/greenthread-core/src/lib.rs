pub mod derive;
pub mod input;
pub mod prediction;
pub mod schema;

pub use derive::Features;
pub use input::{NumericParseError, RawInput};
pub use prediction::{Prediction, PredictorKind, Provenance};
