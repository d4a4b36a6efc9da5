pub mod generation; // LLM call + retry around recovery
pub mod normalize; // Exercise names, catalog matching, day numbering
pub mod recovery; // Raw text → validated program
