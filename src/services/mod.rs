pub mod document_reader;
pub mod pdf_image;
pub mod pdf_writer;
pub mod prompts;
pub mod question_parser;

pub use document_reader::{extract_text_from_pdf, OcrEngine, TesseractCli};
pub use pdf_writer::{download_file_name, render_questions_pdf, PDF_MIME};
pub use question_parser::{numbered_entries, parse_sections, Entry, ParsedSections, Section};
