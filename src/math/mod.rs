pub mod im2col;
pub mod tensor;

pub use tensor::Tensor;
