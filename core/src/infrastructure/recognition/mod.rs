pub mod http_ocr;
pub mod vision_llm;
