#![forbid(unsafe_code)]

pub mod batch;
pub mod config;
pub mod error;
pub mod fit;
pub mod measure;
pub mod place;
pub mod render;
pub mod style;

pub use batch::run_batch;
pub use config::BatchConfig;
pub use error::{TextoverError, TextoverResult};
pub use fit::{FitLimits, fit_scale};
pub use measure::{ParleyMeasurer, TextExtent, TextMeasurer};
pub use place::select_position;
pub use style::{FontStack, PaletteColor, Rgb, Style};
