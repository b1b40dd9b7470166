pub mod decode;
pub mod envelope;
pub mod features;
pub mod onset;
pub mod spectrum;
pub mod tempo;
