use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use wasm_bindgen_futures::JsFuture;

use crate::models::FileData;

/// Largest upload accepted by the client.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const TEXT_EXTENSIONS: [&str; 6] = ["csv", "txt", "md", "json", "tsv", "xml"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
    /// Anything else; accepted only if it decodes as text.
    Text,
}

pub fn classify(media_type: &str, file_name: &str) -> FileKind {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    if media_type.starts_with("image/") {
        FileKind::Image
    } else if media_type == "application/pdf" || ext.as_deref() == Some("pdf") {
        FileKind::Pdf
    } else {
        FileKind::Text
    }
}

/// Turns raw file bytes into the attachment the backend expects. Text and
/// the extracted text of a PDF are re-encoded as UTF-8 and labelled
/// `text/plain`; images keep their bytes and media type.
pub fn encode(bytes: &[u8], media_type: &str, file_name: &str) -> Result<FileData, String> {
    let size = bytes.len() as u64;
    if size > MAX_FILE_SIZE {
        return Err("File size exceeds the limit of 10MB.".to_string());
    }

    match classify(media_type, file_name) {
        FileKind::Image => Ok(FileData {
            base64: STANDARD.encode(bytes),
            media_type: media_type.to_string(),
            is_text: false,
            file_name: file_name.to_string(),
            file_size: size,
        }),
        FileKind::Pdf => Ok(text_attachment(&pdf_text(bytes)?, file_name, size)),
        FileKind::Text => {
            let text = match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) if looks_textual(media_type, file_name) => {
                    String::from_utf8_lossy(bytes).into_owned()
                }
                Err(_) => {
                    return Err(
                        "Unsupported file type. Please upload text files (CSV, TXT), PDFs, or images."
                            .to_string(),
                    );
                }
            };
            Ok(text_attachment(&text, file_name, size))
        }
    }
}

fn text_attachment(text: &str, file_name: &str, size: u64) -> FileData {
    FileData {
        base64: STANDARD.encode(text.as_bytes()),
        media_type: "text/plain".to_string(),
        is_text: true,
        file_name: file_name.to_string(),
        file_size: size,
    }
}

/// Text of every page, in page order. Scanned PDFs with no text layer are
/// refused.
fn pdf_text(bytes: &[u8]) -> Result<String, String> {
    const UNREADABLE: &str =
        "Unable to extract text from the PDF. It might be image-based or corrupted.";

    let doc = lopdf::Document::load_mem(bytes).map_err(|e| {
        log::warn!("failed to parse PDF: {e}");
        UNREADABLE.to_string()
    })?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let text = doc.extract_text(&pages).map_err(|e| {
        log::warn!("failed to extract PDF text: {e}");
        UNREADABLE.to_string()
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(UNREADABLE.to_string());
    }
    Ok(text.to_string())
}

fn looks_textual(media_type: &str, file_name: &str) -> bool {
    media_type.starts_with("text/")
        || file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reads a browser `File` and encodes it with [`encode`].
pub async fn read_file(file: web_sys::File) -> Result<FileData, String> {
    if file.size() as u64 > MAX_FILE_SIZE {
        return Err("File size exceeds the limit of 10MB.".to_string());
    }
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Failed to read file: {e:?}"))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    encode(&bytes, &file.type_(), &file.name())
}
