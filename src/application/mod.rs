// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// train a VAE, or evaluate one. No tensor math and no printing
// here; only workflow coordination.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// The reconstruction / loss report workflow
pub mod evaluate_use_case;

// Transfer / continue weight restore shared by both workflows
pub mod pretrain;
