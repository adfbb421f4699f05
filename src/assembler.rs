//! Builds the message sequence sent to the model, embedding the optional
//! attachment into the newest user turn.

use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::{ChatMessage, ContentPart, FileAttachment, OutboundContent, OutboundMessage, Role};

/// Standard alphabet; trailing `=` padding is optional, as browsers' `atob`
/// treats it.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Converts the client's conversation log into provider messages.
///
/// The last entry of `messages` is the newest user turn. With an attachment,
/// that entry is replaced by a two-part user turn: the file (decoded text with
/// a header, or an image reference) followed by the newest user text.
pub fn assemble(
    messages: &[ChatMessage],
    attachment: Option<&FileAttachment>,
) -> Result<Vec<OutboundMessage>, AppError> {
    let mut outbound: Vec<OutboundMessage> = messages
        .iter()
        .map(|m| OutboundMessage {
            role: m.role,
            content: OutboundContent::Text(m.content.clone()),
        })
        .collect();

    let Some(file) = attachment else {
        return Ok(outbound);
    };

    let Some(part) = file_part(file)? else {
        warn!(
            file_name = %file.file_name,
            media_type = %file.media_type,
            "attachment is neither text nor an image; sending the message without it"
        );
        return Ok(outbound);
    };

    let user_text = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let turn = OutboundMessage {
        role: Role::User,
        content: OutboundContent::Parts(vec![part, ContentPart::text(user_text)]),
    };
    match outbound.last_mut() {
        Some(last) => *last = turn,
        None => outbound.push(turn),
    }

    debug!(file_name = %file.file_name, is_text = file.is_text, "attachment embedded");
    Ok(outbound)
}

/// The content part for `file`, or `None` when the media type has no
/// embedding.
fn file_part(file: &FileAttachment) -> Result<Option<ContentPart>, AppError> {
    if file.is_text {
        let text = decode_text(&file.base64)?;
        return Ok(Some(ContentPart::text(format!(
            "File contents of {}:\n\n{}",
            file.file_name, text
        ))));
    }

    if file.media_type.starts_with("image/") {
        let bytes = LENIENT
            .decode(file.base64.as_bytes())
            .map_err(|e| AppError::file_processing(format!("invalid base64 image data: {e}")))?;
        // Re-encoded so the provider always receives padded data.
        return Ok(Some(ContentPart::base64_image(&file.media_type, STANDARD.encode(bytes))));
    }

    Ok(None)
}

fn decode_text(encoded: &str) -> Result<String, AppError> {
    let bytes = LENIENT
        .decode(encoded.as_bytes())
        .map_err(|e| AppError::file_processing(format!("invalid base64 data: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::file_processing(format!("file is not valid UTF-8 text: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_file(contents: &str, name: &str) -> FileAttachment {
        FileAttachment {
            base64: STANDARD.encode(contents),
            media_type: "text/plain".into(),
            is_text: true,
            file_name: name.into(),
        }
    }

    fn parts(message: &OutboundMessage) -> &[ContentPart] {
        match &message.content {
            OutboundContent::Parts(parts) => parts,
            OutboundContent::Text(t) => panic!("expected parts, got text {t:?}"),
        }
    }

    #[test]
    fn without_attachment_messages_pass_through() {
        let history = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
            ChatMessage::user("chart my spend"),
        ];
        let out = assemble(&history, None).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].role, Role::Assistant);
        assert_eq!(out[2].content, OutboundContent::Text("chart my spend".into()));
    }

    #[test]
    fn text_attachment_becomes_header_and_user_text() {
        let history = vec![ChatMessage::user("plot this")];
        let file = text_file("a,b\n1,2", "d.csv");

        let out = assemble(&history, Some(&file)).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].role, Role::User);
        assert_eq!(
            parts(&out[0]),
            [
                ContentPart::text("File contents of d.csv:\n\na,b\n1,2"),
                ContentPart::text("plot this"),
            ]
        );
    }

    #[test]
    fn image_attachment_is_passed_by_reference() {
        let history = vec![ChatMessage::user("what is in this?")];
        let data = STANDARD.encode([0x89u8, 0x50, 0x4e, 0x47]);
        let file = FileAttachment {
            base64: data.clone(),
            media_type: "image/png".into(),
            is_text: false,
            file_name: "chart.png".into(),
        };

        let out = assemble(&history, Some(&file)).unwrap();

        assert_eq!(
            parts(&out[0]),
            [ContentPart::base64_image("image/png", data), ContentPart::text("what is in this?")]
        );
    }

    #[test]
    fn user_text_may_be_empty() {
        let history = vec![ChatMessage::user("")];
        let out = assemble(&history, Some(&text_file("x", "notes.md"))).unwrap();
        assert_eq!(parts(&out[0])[1], ContentPart::text(""));
    }

    #[test]
    fn unsupported_binary_is_not_embedded() {
        let history = vec![ChatMessage::user("see attached")];
        let file = FileAttachment {
            base64: STANDARD.encode([0u8, 1, 2]),
            media_type: "application/zip".into(),
            is_text: false,
            file_name: "a.zip".into(),
        };
        let out = assemble(&history, Some(&file)).unwrap();
        assert_eq!(out[0].content, OutboundContent::Text("see attached".into()));
    }

    #[test]
    fn malformed_base64_is_a_file_processing_error() {
        let history = vec![ChatMessage::user("x")];
        let mut file = text_file("", "bad.csv");
        file.base64 = "not base64!!".into();
        let err = assemble(&history, Some(&file)).unwrap_err();
        assert!(matches!(err, AppError::FileProcessing { .. }));
    }

    #[test]
    fn unpadded_base64_is_accepted() {
        let history = vec![ChatMessage::user("x")];
        let mut file = text_file("", "d.csv");
        file.base64 = "YSxiYw".into();
        let out = assemble(&history, Some(&file)).unwrap();
        assert_eq!(parts(&out[0])[0], ContentPart::text("File contents of d.csv:\n\na,bc"));

        let image = FileAttachment {
            base64: "iVBORw".into(),
            media_type: "image/png".into(),
            is_text: false,
            file_name: "c.png".into(),
        };
        let out = assemble(&history, Some(&image)).unwrap();
        assert_eq!(parts(&out[0])[0], ContentPart::base64_image("image/png", "iVBORw=="));
    }

    #[test]
    fn non_utf8_text_is_a_file_processing_error() {
        let history = vec![ChatMessage::user("x")];
        let file = FileAttachment {
            base64: STANDARD.encode([0xffu8, 0xfe, 0xfd]),
            media_type: "text/plain".into(),
            is_text: true,
            file_name: "weird.txt".into(),
        };
        assert!(matches!(
            assemble(&history, Some(&file)),
            Err(AppError::FileProcessing { .. })
        ));
    }

    #[test]
    fn attachment_on_empty_history_adds_a_user_turn() {
        let out = assemble(&[], Some(&text_file("q1,10", "r.csv"))).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(parts(&out[0])[0], ContentPart::text("File contents of r.csv:\n\nq1,10"));
    }
}
