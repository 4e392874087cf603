//! Backend selection
//!
//! The CPU `NdArray` backend is the default so training and inference run
//! anywhere. Enabling the `wgpu` feature switches both to the GPU.

use burn::backend::Autodiff;

#[cfg(not(feature = "wgpu"))]
pub type DefaultBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type DefaultBackend = burn::backend::Wgpu;

/// The autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device for the selected backend
pub fn default_device() -> <DefaultBackend as burn::tensor::backend::Backend>::Device {
    Default::default()
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(not(feature = "wgpu"))]
    {
        "NdArray (CPU)"
    }
    #[cfg(feature = "wgpu")]
    {
        "Wgpu (GPU)"
    }
}
