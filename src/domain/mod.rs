// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that describe what the
// system works with. No Burn types, no file I/O, no HTTP.
//
//   lens_array.rs — the 5-D image stack loaded from a .npy file
//                   [n_batches, batch_size, channels, height, width]
//   options.rs    — user-selectable choices (optimizer, pretrain
//                   mode, pretrained model, compute backend)
//   traits.rs     — seams the application layer programs against
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// The batched image stack
pub mod lens_array;

// Enumerated training / evaluation options
pub mod options;

// Core abstractions (traits) that other layers implement
pub mod traits;
