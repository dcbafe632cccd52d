pub mod generator;
pub mod pdf_renderer;
pub mod xml_renderer;

pub use generator::DocumentGenerator;
