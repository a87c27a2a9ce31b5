//! Plain-text extraction from OOXML word-processing documents.
//!
//! A `.docx` container is a zip archive; the body text lives in
//! `word/document.xml` as `w:t` runs grouped into `w:p` paragraphs.

use crate::{ProviderError, TextExtractor};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

#[derive(Debug, Default)]
pub struct OoxmlExtractor;

#[async_trait::async_trait]
impl TextExtractor for OoxmlExtractor {
    async fn extract_text(&self, document: &[u8]) -> Result<String, ProviderError> {
        extract_docx_text(document)
    }
}

fn extract_docx_text(document: &[u8]) -> Result<String, ProviderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(document))
        .map_err(|e| ProviderError::MalformedResponse(format!("not a docx container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ProviderError::MalformedResponse(format!("missing document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ProviderError::MalformedResponse(format!("document.xml unreadable: {e}")))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                // Paragraph boundary becomes a newline.
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let run = t
                    .unescape()
                    .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ProviderError::MalformedResponse(e.to_string())),
            _ => {}
        }
    }
    Ok(text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn docx_with_body(body_xml: &str) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("word/document.xml", FileOptions::default())
                .unwrap();
            writer
                .write_all(
                    format!(
                        "<?xml version=\"1.0\"?><w:document xmlns:w=\"x\"><w:body>{body_xml}</w:body></w:document>"
                    )
                    .as_bytes(),
                )
                .unwrap();
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn extracts_paragraph_text() {
        let doc = docx_with_body(
            "<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t> world</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Second</w:t></w:r></w:p>",
        );
        let text = extract_docx_text(&doc).unwrap();
        assert_eq!(text, "Hello world\nSecond");
    }

    #[test]
    fn rejects_non_zip_input() {
        let err = extract_docx_text(b"plainly not a zip").unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn rejects_zip_without_document_xml() {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("unrelated.txt", FileOptions::default())
                .unwrap();
            writer.write_all(b"nope").unwrap();
            writer.finish().unwrap();
        }
        let err = extract_docx_text(&buf.into_inner()).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }
}
