// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the file formats the rest of the crate reads and
// writes:
//
//   model_store.rs      — The trained model artifact
//                         One tar.gz holding the weights (Burn
//                         BinBytesRecorder) and a metadata.json
//                         with the label order and the configs
//                         needed to rebuild the network.
//
//   backbone_weights.rs — Pretrained MobileNetV2 weights
//                         Imports a torchvision state dict (with
//                         key remapping) or a Burn .mpk record
//                         into the frozen trunk.
//
//   metrics.rs          — Training metrics logging
//                         Writes epoch-level loss and accuracy
//                         to a CSV file for later plotting.
//
// Reference: Burn Book §5 (Records)
//            Rust Book §9 (Error Handling with anyhow)

/// Single-file model artifact: save and load
pub mod model_store;

/// ImageNet weights for the MobileNetV2 trunk
pub mod backbone_weights;

/// Training metrics CSV logger
pub mod metrics;
