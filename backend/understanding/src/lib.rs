pub mod ocr;

pub use ocr::{parse_tsv, TesseractEngine};
