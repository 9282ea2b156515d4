pub mod country;
pub mod visit;

pub use country::CountryInfo;
pub use visit::{CountryCount, TrackVisitRequest};
