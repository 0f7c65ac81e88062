// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of the system.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O, camera or window calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Ordered class names (label ↔ output index)
pub mod labels;

// The classification of one frame
pub mod prediction;

// The caption drawn on a live frame
pub mod overlay;

// Core abstractions (traits) that other layers implement
pub mod traits;
