// This binary crate is intentionally minimal.
// All neural network logic lives in the library (src/lib.rs and its modules).
// Run the demos with:
//   cargo run --example xor
//   cargo run --example conv
fn main() {
    println!("cinder-nn: a small trainable neural-network engine in Rust.");
    println!("Run `cargo run --example xor` or `cargo run --example conv` for a demo.");
}
