//! Messages exchanged between the registry and its external collaborators.
//!
//! - `audio` – commands forwarded from buffered sound effects to the audio thread
pub mod audio;
